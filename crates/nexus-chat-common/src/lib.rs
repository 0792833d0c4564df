//! # nexus-chat-common
//!
//! Configuration and the raw records exchanged with the remote metadata store.
//! No business logic lives here; the SDK crate normalizes these records into
//! its own strongly-typed entities.

pub mod config;
pub mod models;
