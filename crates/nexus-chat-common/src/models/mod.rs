//! Records exchanged with the remote metadata store.
//!
//! These mirror the store's JSON loosely: nearly every field is optional and
//! custom metadata is an untyped map. The SDK maps them into its own entities
//! and never hands them to callers past that boundary.

pub mod event;
pub mod membership;
pub mod user;

pub use event::*;
pub use membership::*;
pub use user::*;

/// Free-form custom metadata attached to users, channels and memberships.
pub type CustomData = serde_json::Map<String, serde_json::Value>;
