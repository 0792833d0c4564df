//! The user entity and its membership queries.
//!
//! A [`User`] owns a [`MembershipCache`]. Full listings fill it, single
//! lookups read from it first, and nothing expires it except
//! [`User::clear_cached_memberships`]. Cache mutation takes `&mut self`, so
//! sharing one user between tasks needs external synchronization.

use nexus_chat_common::models::{
    CustomData, MembershipInclude, MembershipPageResponse, MembershipsQuery, ObjectMessage,
    PageCursors, PageRequest, RawUser,
};
use serde_json::{Value, json};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::MembershipCache;
use crate::client::Chat;
use crate::error::{ChatError, Result};
use crate::events::Subscription;
use crate::filter::{FilterBuilder, channel_id_equals};
use crate::membership::{ChannelRestrictions, Membership, Restriction, non_empty};
use crate::pagination::{Page, fetch_all};
use crate::types::{
    AllMemberships, MembershipParams, MembershipsPage, RestrictionParams, RestrictionsPage,
    UserFields,
};

#[derive(Debug, Clone)]
pub struct User {
    chat: Chat,
    pub id: String,
    pub name: Option<String>,
    pub external_id: Option<String>,
    pub profile_url: Option<String>,
    pub email: Option<String>,
    pub custom: Option<CustomData>,
    pub status: Option<String>,
    pub kind: Option<String>,
    pub updated: Option<String>,
    /// Milliseconds since the epoch, read from `custom.lastActiveTimestamp`.
    pub last_active_timestamp: Option<i64>,
    memberships: MembershipCache,
}

impl User {
    pub fn from_raw(chat: Chat, raw: RawUser) -> Self {
        let last_active_timestamp = raw
            .custom
            .as_ref()
            .and_then(|c| c.get("lastActiveTimestamp"))
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)));
        Self {
            chat,
            id: raw.id,
            name: non_empty(raw.name),
            external_id: non_empty(raw.external_id),
            profile_url: non_empty(raw.profile_url),
            email: non_empty(raw.email),
            custom: raw.custom,
            status: non_empty(raw.status),
            kind: non_empty(raw.kind),
            updated: non_empty(raw.updated),
            last_active_timestamp,
            memberships: MembershipCache::new(),
        }
    }

    pub fn chat(&self) -> &Chat {
        &self.chat
    }

    /// Whether this is the moderator identity the store uses internally.
    pub fn is_internal_moderator(&self) -> bool {
        let moderation = &self.chat.config().moderation;
        self.id == moderation.moderator_id
            && self.kind.as_deref() == Some(moderation.moderator_type.as_str())
    }

    /// Active means the last recorded activity falls inside the configured interval.
    pub fn is_active(&self) -> bool {
        let interval = self.chat.config().activity.store_user_activity_interval_ms;
        let interval = i64::try_from(interval).unwrap_or(i64::MAX);
        self.last_active_timestamp.is_some_and(|ts| {
            let elapsed = chrono::Utc::now().timestamp_millis().saturating_sub(ts);
            elapsed <= interval
        })
    }

    // ── CRUD ─────────────────────────────────────────────────────────────────

    pub async fn update(&self, fields: UserFields) -> Result<User> {
        self.chat.update_user(&self.id, fields).await
    }

    pub async fn delete(&self, soft: bool) -> Result<Option<User>> {
        self.chat.delete_user(&self.id, soft).await
    }

    // ── Updates ──────────────────────────────────────────────────────────────

    /// Call `callback` with the full list whenever one of `users` changes remotely.
    ///
    /// The changed user is rebuilt from the event and replaces the old entry;
    /// rebuilt users start with an empty membership cache. Replacements
    /// accumulate: each callback sees every update received so far.
    /// Fails with [`ChatError::Runtime`] outside a Tokio runtime.
    pub fn stream_updates_on<F>(users: &[User], callback: F) -> Result<StreamHandle>
    where
        F: Fn(Vec<User>) + Send + 'static,
    {
        let first = users
            .first()
            .ok_or_else(|| ChatError::invalid_argument("cannot stream user updates on an empty list"))?;
        let runtime = tokio::runtime::Handle::try_current()?;
        let chat = first.chat.clone();
        let mut events = chat.listen();
        let subscriptions = users.iter().map(|u| chat.subscribe(&u.id)).collect();
        let mut current = users.to_vec();

        let task = runtime.spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "user update stream lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                let ObjectMessage::Uuid(raw) = event.message else {
                    continue;
                };
                if !current.iter().any(|u| u.id == event.channel || u.id == raw.id) {
                    continue;
                }
                let updated = User::from_raw(chat.clone(), raw);
                debug!(user_id = %updated.id, "user updated");
                for user in current.iter_mut().filter(|u| u.id == updated.id) {
                    *user = updated.clone();
                }
                callback(current.clone());
            }
        });

        Ok(StreamHandle { task, _subscriptions: subscriptions })
    }

    pub fn stream_updates<F>(&self, callback: F) -> Result<StreamHandle>
    where
        F: Fn(User) + Send + 'static,
    {
        Self::stream_updates_on(std::slice::from_ref(self), move |users| {
            if let Some(user) = users.into_iter().next() {
                callback(user);
            }
        })
    }

    // ── Presence ─────────────────────────────────────────────────────────────

    pub async fn where_present(&self) -> Result<Vec<String>> {
        self.chat.where_present(&self.id).await
    }

    pub async fn is_present_on(&self, channel_id: &str) -> Result<bool> {
        self.chat.is_present(&self.id, channel_id).await
    }

    // ── Memberships ──────────────────────────────────────────────────────────

    /// One page of memberships, always from the store. Moderation channels are hidden.
    pub async fn get_memberships(&self, params: MembershipParams) -> Result<MembershipsPage> {
        let prefix = &self.chat.config().moderation.internal_prefix;
        let filter = FilterBuilder::excluding_moderation(prefix)
            .and(params.filter.as_deref())
            .build();

        let response = self
            .chat
            .store()
            .query_memberships(MembershipsQuery {
                owner_id: self.id.clone(),
                filter: Some(filter),
                include: MembershipInclude::memberships().merge(params.include),
                page: params.page,
                limit: params.limit,
                sort: params.sort,
            })
            .await?;

        let memberships = response
            .data
            .into_iter()
            .map(|raw| Membership::from_raw(&self.id, raw))
            .collect::<Result<Vec<_>>>()?;

        Ok(MembershipsPage {
            page: PageCursors { next: response.next, prev: response.prev },
            total: response.total_count,
            status: response.status,
            memberships,
        })
    }

    /// Every membership across all pages.
    ///
    /// With `bust_cache == false` and a non-empty cache, the cache is returned
    /// as-is and `total` is the cache size, not the store's count. Otherwise
    /// all pages are fetched and written into the cache once the walk succeeds.
    pub async fn get_all_memberships(
        &mut self,
        params: MembershipParams,
        bust_cache: bool,
    ) -> Result<AllMemberships> {
        if !bust_cache && !self.memberships.is_empty() {
            debug!(user_id = %self.id, cached = self.memberships.len(), "serving memberships from cache");
            return Ok(AllMemberships {
                total: self.memberships.len() as u64,
                memberships: self.memberships.snapshot(),
            });
        }

        let collected = {
            let this: &User = self;
            fetch_all(|cursor| {
                let mut params = params.clone();
                params.page = cursor.map(PageRequest::Next);
                async move {
                    let page = this.get_memberships(params).await?;
                    Ok::<_, ChatError>(Page {
                        items: page.memberships,
                        next: page.page.next,
                        total: page.total,
                    })
                }
            })
            .await?
        };

        self.memberships.replace_all(collected.items.iter().cloned());
        debug!(
            user_id = %self.id,
            fetched = collected.items.len(),
            pages = collected.pages,
            "membership cache refreshed"
        );

        Ok(AllMemberships { total: collected.total, memberships: collected.items })
    }

    /// Membership in one channel, or `None` if the user is not a member.
    ///
    /// With `use_cache` a cached entry is returned without a remote call. A
    /// membership found remotely is always written into the cache.
    pub async fn get_membership(
        &mut self,
        channel_id: &str,
        use_cache: bool,
    ) -> Result<Option<Membership>> {
        if use_cache {
            if let Some(cached) = self.memberships.get(channel_id) {
                debug!(user_id = %self.id, channel_id, "membership cache hit");
                return Ok(Some(cached.clone()));
            }
        }

        let params = MembershipParams {
            filter: Some(channel_id_equals(channel_id)),
            limit: Some(1),
            ..Default::default()
        };
        let found = self.get_memberships(params).await?.memberships.into_iter().next();
        if let Some(membership) = &found {
            self.memberships.replace_all([membership.clone()]);
        }
        Ok(found)
    }

    pub fn clear_cached_memberships(&mut self) {
        self.memberships.clear();
    }

    pub fn cached_memberships(&self) -> Vec<Membership> {
        self.memberships.snapshot()
    }

    // ── Moderation ───────────────────────────────────────────────────────────

    /// Requires a client initialized with a secret key.
    pub async fn set_restrictions(
        &self,
        channel_id: &str,
        restrictions: ChannelRestrictions,
    ) -> Result<()> {
        self.chat.set_restrictions(&self.id, channel_id, restrictions).await
    }

    async fn get_restrictions(
        &self,
        channel_id: Option<&str>,
        params: RestrictionParams,
    ) -> Result<MembershipPageResponse> {
        let prefix = &self.chat.config().moderation.internal_prefix;
        let filter = match channel_id {
            Some(id) => FilterBuilder::moderation_channel(prefix, id),
            None => FilterBuilder::moderation_wildcard(prefix),
        };
        self.chat
            .store()
            .query_memberships(MembershipsQuery {
                owner_id: self.id.clone(),
                filter: Some(filter.build()),
                include: MembershipInclude::restrictions(),
                page: params.page,
                limit: params.limit,
                sort: params.sort,
            })
            .await
    }

    pub async fn get_channel_restrictions(&self, channel_id: &str) -> Result<ChannelRestrictions> {
        let response = self.get_restrictions(Some(channel_id), RestrictionParams::default()).await?;
        let custom = response.data.first().and_then(|m| m.custom.as_ref());
        Ok(ChannelRestrictions::from_custom(custom))
    }

    pub async fn get_channels_restrictions(
        &self,
        params: RestrictionParams,
    ) -> Result<RestrictionsPage> {
        let response = self.get_restrictions(None, params).await?;
        let prefix = &self.chat.config().moderation.internal_prefix;
        let restrictions = response
            .data
            .iter()
            .map(|raw| Restriction::from_raw(prefix, raw))
            .collect::<Result<Vec<_>>>()?;
        Ok(RestrictionsPage {
            page: PageCursors { next: response.next, prev: response.prev },
            total: response.total_count,
            status: response.status,
            restrictions,
        })
    }

    // ── Other ────────────────────────────────────────────────────────────────

    #[deprecated(note = "report messages or users through the moderation API instead")]
    pub async fn report(&self, reason: &str) -> Result<()> {
        let channel = &self.chat.config().moderation.admin_channel;
        let payload: Value = json!({ "reason": reason, "reportedUserId": self.id });
        self.chat.emit_event(channel, "report", payload).await
    }
}

/// Running user update stream. Stops when stopped or dropped.
#[derive(Debug)]
pub struct StreamHandle {
    task: JoinHandle<()>,
    _subscriptions: Vec<Subscription>,
}

impl StreamHandle {
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
