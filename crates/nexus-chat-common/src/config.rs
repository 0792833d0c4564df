//! SDK configuration loaded from environment variables and config files.
//!
//! Supports `.env` files for development and environment variables for production.
//! Config precedence: env vars > .env file > nexus-chat.toml > defaults
//!
//! There is no process-wide instance: [`ChatConfig::load`] returns a value that
//! the caller hands to the chat client, so two clients in one process may talk
//! to different stores.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

/// Lower bound for [`ActivityConfig::store_user_activity_interval_ms`].
pub const MIN_ACTIVITY_INTERVAL_MS: u64 = 60_000;

pub const DEFAULT_MODERATION_PREFIX: &str = "NEXUS_INTERNAL_MODERATION_";
pub const DEFAULT_ADMIN_CHANNEL: &str = "NEXUS_INTERNAL_ADMIN_CHANNEL";
pub const DEFAULT_MODERATOR_ID: &str = "NEXUS_INTERNAL_MODERATOR";
pub const DEFAULT_MODERATOR_TYPE: &str = "mod";

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    pub store: StoreConfig,
    pub moderation: ModerationConfig,
    pub activity: ActivityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Base URL of the metadata store REST API.
    pub base_url: String,
    pub subscribe_key: String,
    pub publish_key: Option<String>,
    /// Elevated credential. Only server-side clients carry one; moderation
    /// writes are refused without it.
    pub secret_key: Option<String>,
    /// Identity this client acts as.
    pub user_id: String,
    pub request_timeout_ms: u64,
}

/// Identifiers the store uses to tag moderation-scoped data. They are pasted
/// verbatim into filter expressions, so they must match the store exactly.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ModerationConfig {
    pub internal_prefix: String,
    pub admin_channel: String,
    pub moderator_id: String,
    pub moderator_type: String,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            internal_prefix: DEFAULT_MODERATION_PREFIX.to_owned(),
            admin_channel: DEFAULT_ADMIN_CHANNEL.to_owned(),
            moderator_id: DEFAULT_MODERATOR_ID.to_owned(),
            moderator_type: DEFAULT_MODERATOR_TYPE.to_owned(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ActivityConfig {
    /// A user counts as active if their last activity is at most this many
    /// milliseconds old.
    pub store_user_activity_interval_ms: u64,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self { store_user_activity_interval_ms: 600_000 }
    }
}

impl ChatConfig {
    /// Build a config around explicit store settings, with defaults everywhere else.
    pub fn new(store: StoreConfig) -> Self {
        Self {
            store,
            moderation: ModerationConfig::default(),
            activity: ActivityConfig::default(),
        }
    }

    /// Load configuration from `.env`, an optional `nexus-chat` config file and
    /// `NEXUS_CHAT__*` environment variables (e.g. `NEXUS_CHAT__STORE__USER_ID`).
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        let cfg = defaults()?
            .add_source(File::with_name("nexus-chat").required(false))
            .add_source(
                Environment::with_prefix("NEXUS_CHAT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::finish(cfg)
    }

    /// Load configuration from a TOML document layered over the defaults.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let cfg = defaults()?
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?;
        Self::finish(cfg)
    }

    fn finish(cfg: Config) -> Result<Self, ConfigError> {
        let chat: ChatConfig = cfg.try_deserialize()?;
        chat.validate()?;
        tracing::debug!(
            user_id = %chat.store.user_id,
            base_url = %chat.store.base_url,
            elevated = chat.store.secret_key.is_some(),
            "chat config loaded"
        );
        Ok(chat)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.activity.store_user_activity_interval_ms < MIN_ACTIVITY_INTERVAL_MS {
            return Err(ConfigError::Message(format!(
                "activity.store_user_activity_interval_ms must be at least {MIN_ACTIVITY_INTERVAL_MS}"
            )));
        }
        if self.moderation.internal_prefix.is_empty() {
            return Err(ConfigError::Message(
                "moderation.internal_prefix must not be empty".into(),
            ));
        }
        Ok(())
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("store.base_url", "http://localhost:3000/api/v1")?
        .set_default("store.request_timeout_ms", 10_000)?
        .set_default("moderation.internal_prefix", DEFAULT_MODERATION_PREFIX)?
        .set_default("moderation.admin_channel", DEFAULT_ADMIN_CHANNEL)?
        .set_default("moderation.moderator_id", DEFAULT_MODERATOR_ID)?
        .set_default("moderation.moderator_type", DEFAULT_MODERATOR_TYPE)?
        .set_default("activity.store_user_activity_interval_ms", 600_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_overrides_defaults() {
        let cfg = ChatConfig::from_toml(
            r#"
            [store]
            subscribe_key = "sub-c-1"
            user_id = "alice"
            secret_key = "sec-c-1"

            [moderation]
            internal_prefix = "MOD_"
            "#,
        )
        .expect("config should load");

        assert_eq!(cfg.store.user_id, "alice");
        assert_eq!(cfg.store.secret_key.as_deref(), Some("sec-c-1"));
        assert_eq!(cfg.store.publish_key, None);
        assert_eq!(cfg.store.request_timeout_ms, 10_000);
        assert_eq!(cfg.moderation.internal_prefix, "MOD_");
        assert_eq!(cfg.moderation.admin_channel, DEFAULT_ADMIN_CHANNEL);
        assert_eq!(cfg.activity.store_user_activity_interval_ms, 600_000);
    }

    #[test]
    fn test_missing_identity_is_rejected() {
        let err = ChatConfig::from_toml("[store]\nsubscribe_key = \"sub\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn test_activity_interval_lower_bound() {
        let err = ChatConfig::from_toml(
            r#"
            [store]
            subscribe_key = "sub"
            user_id = "bob"

            [activity]
            store_user_activity_interval_ms = 1000
            "#,
        )
        .expect_err("interval below minimum must fail");
        assert!(err.to_string().contains("at least"));
    }
}
