//! Nexus chat SDK: user memberships with a local cache and paginated sync.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use nexus_chat_common::config::ChatConfig;
//! use nexus_chat_sdk::{Chat, MembershipParams};
//!
//! #[tokio::main]
//! async fn main() -> nexus_chat_sdk::Result<()> {
//!     let chat = Chat::connect(ChatConfig::load()?)?;
//!     let mut user = chat.current_user();
//!
//!     // Walks every page and fills the membership cache.
//!     user.get_all_memberships(MembershipParams::default(), true).await?;
//!
//!     // Served from the cache, no remote call.
//!     if let Some(m) = user.get_membership("general", true).await? {
//!         println!("member of {}", m.channel_id());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod error;
pub mod events;
pub mod filter;
pub mod membership;
pub mod pagination;
pub mod rest;
pub mod store;
pub mod types;
pub mod user;

pub use client::Chat;
pub use error::{ChatError, Result};
pub use membership::{ChannelRestrictions, Membership, Restriction};
pub use rest::RestClient;
pub use store::{MetadataStore, PresenceApi};
pub use types::*;
pub use user::{StreamHandle, User};
