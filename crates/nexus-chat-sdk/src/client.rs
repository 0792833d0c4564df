//! High-level `Chat` client combining the metadata store, presence and updates.

use std::fmt;
use std::sync::Arc;

use nexus_chat_common::config::ChatConfig;
use nexus_chat_common::models::{ChatEvent, ObjectEvent, RawUser};
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::error::{ChatError, Result};
use crate::events::{Subscription, UpdateHub};
use crate::membership::ChannelRestrictions;
use crate::rest::RestClient;
use crate::store::{MetadataStore, PresenceApi};
use crate::types::UserFields;
use crate::user::User;

const UPDATE_BUFFER: usize = 256;

/// Shared handle to the chat backends. Cloning is cheap.
///
/// ```rust,no_run
/// use nexus_chat_common::config::ChatConfig;
/// use nexus_chat_sdk::Chat;
///
/// #[tokio::main]
/// async fn main() -> nexus_chat_sdk::Result<()> {
///     let chat = Chat::connect(ChatConfig::load()?)?;
///     let mut me = chat.current_user();
///     let all = me.get_all_memberships(Default::default(), true).await?;
///     println!("{} memberships", all.total);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Chat {
    inner: Arc<ChatInner>,
}

struct ChatInner {
    config: ChatConfig,
    store: Arc<dyn MetadataStore>,
    presence: Arc<dyn PresenceApi>,
    hub: UpdateHub,
}

impl fmt::Debug for Chat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chat")
            .field("user_id", &self.inner.config.store.user_id)
            .finish_non_exhaustive()
    }
}

impl Chat {
    pub fn new(
        config: ChatConfig,
        store: Arc<dyn MetadataStore>,
        presence: Arc<dyn PresenceApi>,
    ) -> Self {
        Self {
            inner: Arc::new(ChatInner {
                config,
                store,
                presence,
                hub: UpdateHub::new(UPDATE_BUFFER),
            }),
        }
    }

    /// Build a client backed by the REST store described in `config`.
    pub fn connect(config: ChatConfig) -> Result<Self> {
        let rest = Arc::new(RestClient::new(&config.store)?);
        Ok(Self::new(config, rest.clone(), rest))
    }

    pub fn config(&self) -> &ChatConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &dyn MetadataStore {
        self.inner.store.as_ref()
    }

    /// Whether this client carries the credential moderation writes require.
    pub fn has_elevated_write_credential(&self) -> bool {
        self.inner
            .config
            .store
            .secret_key
            .as_deref()
            .is_some_and(|key| !key.is_empty())
    }

    /// The user this client acts as, with no metadata loaded.
    pub fn current_user(&self) -> User {
        User::from_raw(
            self.clone(),
            RawUser { id: self.inner.config.store.user_id.clone(), ..Default::default() },
        )
    }

    // ── Users ────────────────────────────────────────────────────────────────

    pub async fn update_user(&self, id: &str, fields: UserFields) -> Result<User> {
        let raw = RawUser {
            id: id.to_owned(),
            name: fields.name,
            external_id: fields.external_id,
            profile_url: fields.profile_url,
            email: fields.email,
            custom: fields.custom,
            status: fields.status,
            kind: fields.kind,
            ..Default::default()
        };
        let stored = self.inner.store.set_user(raw).await?;
        Ok(User::from_raw(self.clone(), stored))
    }

    /// Soft deletion marks the user `deleted` and returns it; hard deletion
    /// removes the record and returns `None`.
    pub async fn delete_user(&self, id: &str, soft: bool) -> Result<Option<User>> {
        if soft {
            let fields = UserFields { status: Some("deleted".into()), ..Default::default() };
            return self.update_user(id, fields).await.map(Some);
        }
        self.inner.store.remove_user(id).await?;
        Ok(None)
    }

    // ── Presence & events ────────────────────────────────────────────────────

    pub async fn where_present(&self, user_id: &str) -> Result<Vec<String>> {
        self.inner.presence.where_now(user_id).await
    }

    pub async fn is_present(&self, user_id: &str, channel_id: &str) -> Result<bool> {
        let channels = self.inner.presence.where_now(user_id).await?;
        Ok(channels.iter().any(|c| c == channel_id))
    }

    pub async fn who_is_present(&self, channel_id: &str) -> Result<Vec<String>> {
        self.inner.presence.here_now(channel_id).await
    }

    pub async fn emit_event(&self, channel_id: &str, kind: &str, payload: Value) -> Result<()> {
        let event = ChatEvent { kind: kind.to_owned(), payload };
        self.inner.presence.publish(channel_id, &event).await
    }

    // ── Moderation ───────────────────────────────────────────────────────────

    /// Write or lift a user's restrictions in a channel, then notify the user.
    ///
    /// Restrictions live on a membership of the channel's moderation shadow;
    /// lifting both flags removes that membership.
    pub async fn set_restrictions(
        &self,
        user_id: &str,
        channel_id: &str,
        restrictions: ChannelRestrictions,
    ) -> Result<()> {
        if !self.has_elevated_write_credential() {
            warn!(user_id, channel_id, "restriction write refused without secret key");
            return Err(ChatError::permission_denied("setting moderation restrictions"));
        }

        let moderation_channel =
            format!("{}{channel_id}", self.inner.config.moderation.internal_prefix);
        let restriction = if restrictions.ban {
            "banned"
        } else if restrictions.mute {
            "muted"
        } else {
            "lifted"
        };

        if restrictions.is_restricted() {
            self.inner
                .store
                .set_membership(user_id, &moderation_channel, Some(restrictions.to_custom()))
                .await?;
        } else {
            self.inner.store.remove_membership(user_id, &moderation_channel).await?;
        }
        info!(user_id, channel_id, restriction, "restrictions updated");

        self.emit_event(
            user_id,
            "moderation",
            json!({
                "channelId": moderation_channel,
                "restriction": restriction,
                "reason": restrictions.reason,
            }),
        )
        .await
    }

    // ── Updates ──────────────────────────────────────────────────────────────

    /// Feed an object event received by the transport to every listener.
    pub fn dispatch(&self, event: ObjectEvent) -> usize {
        self.inner.hub.dispatch(event)
    }

    pub fn listen(&self) -> broadcast::Receiver<ObjectEvent> {
        self.inner.hub.listen()
    }

    pub fn subscribe(&self, channel_id: &str) -> Subscription {
        self.inner.hub.subscribe(channel_id)
    }

    pub fn is_subscribed(&self, channel_id: &str) -> bool {
        self.inner.hub.is_subscribed(channel_id)
    }
}
