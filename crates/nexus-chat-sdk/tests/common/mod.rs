#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nexus_chat_common::config::{ChatConfig, StoreConfig};
use nexus_chat_common::models::{
    ChatEvent, Cursor, CustomData, MembershipPageResponse, MembershipsQuery, RawUser,
};
use nexus_chat_sdk::error::{ChatError, Result};
use nexus_chat_sdk::{Chat, MetadataStore, PresenceApi, User};
use serde_json::{Value, json};

pub const PREFIX: &str = "NEXUS_INTERNAL_MODERATION_";

/// Metadata store that answers membership queries from a script and records
/// every call it receives.
#[derive(Default)]
pub struct ScriptedStore {
    pages: Mutex<VecDeque<Result<MembershipPageResponse>>>,
    pub queries: Mutex<Vec<MembershipsQuery>>,
    pub writes: Mutex<Vec<String>>,
}

impl ScriptedStore {
    pub fn push(&self, page: MembershipPageResponse) {
        self.pages.lock().unwrap().push_back(Ok(page));
    }

    pub fn push_err(&self, err: ChatError) {
        self.pages.lock().unwrap().push_back(Err(err));
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn last_query(&self) -> MembershipsQuery {
        self.queries.lock().unwrap().last().cloned().expect("no query recorded")
    }

    pub fn remote_calls(&self) -> usize {
        self.query_count() + self.writes.lock().unwrap().len()
    }
}

#[async_trait]
impl MetadataStore for ScriptedStore {
    async fn query_memberships(&self, query: MembershipsQuery) -> Result<MembershipPageResponse> {
        self.queries.lock().unwrap().push(query);
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ChatError::remote("no scripted page left")))
    }

    async fn set_membership(
        &self,
        user_id: &str,
        channel_id: &str,
        custom: Option<CustomData>,
    ) -> Result<()> {
        let custom = custom.map(Value::Object).unwrap_or(Value::Null);
        self.writes
            .lock()
            .unwrap()
            .push(format!("set_membership {user_id} {channel_id} {custom}"));
        Ok(())
    }

    async fn remove_membership(&self, user_id: &str, channel_id: &str) -> Result<()> {
        self.writes
            .lock()
            .unwrap()
            .push(format!("remove_membership {user_id} {channel_id}"));
        Ok(())
    }

    async fn set_user(&self, user: RawUser) -> Result<RawUser> {
        self.writes.lock().unwrap().push(format!("set_user {}", user.id));
        Ok(user)
    }

    async fn remove_user(&self, user_id: &str) -> Result<()> {
        self.writes.lock().unwrap().push(format!("remove_user {user_id}"));
        Ok(())
    }
}

/// Presence backend with a fixed where-now answer that records publishes.
#[derive(Default)]
pub struct RecordingPresence {
    pub channels: Vec<String>,
    /// Users reported by here-now on any channel.
    pub occupants: Vec<String>,
    pub published: Mutex<Vec<(String, ChatEvent)>>,
}

#[async_trait]
impl PresenceApi for RecordingPresence {
    async fn where_now(&self, _user_id: &str) -> Result<Vec<String>> {
        Ok(self.channels.clone())
    }

    async fn here_now(&self, _channel_id: &str) -> Result<Vec<String>> {
        Ok(self.occupants.clone())
    }

    async fn publish(&self, channel_id: &str, event: &ChatEvent) -> Result<()> {
        self.published
            .lock()
            .unwrap()
            .push((channel_id.to_owned(), event.clone()));
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<ScriptedStore>,
    pub presence: Arc<RecordingPresence>,
    pub chat: Chat,
}

impl Harness {
    pub fn new(secret_key: Option<&str>) -> Self {
        Self::with_presence(secret_key, RecordingPresence::default())
    }

    pub fn with_presence(secret_key: Option<&str>, presence: RecordingPresence) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("nexus_chat_sdk=debug")
            .with_test_writer()
            .try_init();
        let store = Arc::new(ScriptedStore::default());
        let presence = Arc::new(presence);
        let config = ChatConfig::new(StoreConfig {
            base_url: "http://localhost:0".into(),
            subscribe_key: "sub-test".into(),
            publish_key: Some("pub-test".into()),
            secret_key: secret_key.map(str::to_owned),
            user_id: "alice".into(),
            request_timeout_ms: 1_000,
        });
        let chat = Chat::new(config, store.clone(), presence.clone());
        Self { store, presence, chat }
    }

    pub fn user(&self, id: &str) -> User {
        User::from_raw(self.chat.clone(), RawUser { id: id.into(), ..Default::default() })
    }
}

pub fn page(channels: &[&str], next: Option<&str>, total: u64) -> MembershipPageResponse {
    MembershipPageResponse {
        status: Some(200),
        data: channels
            .iter()
            .map(|id| {
                serde_json::from_value(json!({
                    "channel": { "id": id, "name": format!("#{id}") },
                    "status": "joined",
                    "updated": "2024-05-01T10:00:00.000Z"
                }))
                .expect("valid membership")
            })
            .collect(),
        total_count: Some(total),
        next: next.map(Cursor::from),
        prev: None,
    }
}
