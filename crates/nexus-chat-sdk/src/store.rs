//! Remote collaborators the SDK talks to.
//!
//! [`RestClient`](crate::rest::RestClient) implements both traits over HTTP;
//! tests and embedders can plug in their own.

use async_trait::async_trait;
use nexus_chat_common::models::{
    ChatEvent, CustomData, MembershipPageResponse, MembershipsQuery, RawUser,
};

use crate::error::Result;

/// Object metadata: users and their channel memberships.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Fetch one page of a user's memberships.
    async fn query_memberships(&self, query: MembershipsQuery) -> Result<MembershipPageResponse>;

    /// Create or overwrite a membership with the given custom data.
    async fn set_membership(
        &self,
        user_id: &str,
        channel_id: &str,
        custom: Option<CustomData>,
    ) -> Result<()>;

    async fn remove_membership(&self, user_id: &str, channel_id: &str) -> Result<()>;

    /// Write user metadata and return the stored record.
    async fn set_user(&self, user: RawUser) -> Result<RawUser>;

    async fn remove_user(&self, user_id: &str) -> Result<()>;
}

/// Presence lookups and event publishing.
#[async_trait]
pub trait PresenceApi: Send + Sync {
    /// Channels the user is currently present on.
    async fn where_now(&self, user_id: &str) -> Result<Vec<String>>;

    /// Users currently present on a channel.
    async fn here_now(&self, channel_id: &str) -> Result<Vec<String>>;

    async fn publish(&self, channel_id: &str, event: &ChatEvent) -> Result<()>;
}
