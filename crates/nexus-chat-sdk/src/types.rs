//! Request parameters and response shapes of the user API.

use nexus_chat_common::models::{CustomData, MembershipInclude, PageCursors, PageRequest};
use serde::{Deserialize, Serialize};

use crate::membership::{Membership, Restriction};

// ── Requests ─────────────────────────────────────────────────────────────────

/// Parameters for a membership page query.
#[derive(Debug, Clone, Default)]
pub struct MembershipParams {
    /// Extra filter AND-ed with the moderation exclusion.
    pub filter: Option<String>,
    pub limit: Option<u32>,
    pub sort: Vec<String>,
    pub page: Option<PageRequest>,
    /// Flags requested on top of the ones every membership query carries.
    pub include: MembershipInclude,
}

impl MembershipParams {
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self { filter: Some(filter.into()), ..Self::default() }
    }
}

/// Paging for restriction listings.
#[derive(Debug, Clone, Default)]
pub struct RestrictionParams {
    pub limit: Option<u32>,
    pub sort: Vec<String>,
    pub page: Option<PageRequest>,
}

/// Fields written by a user update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserFields {
    pub name: Option<String>,
    pub external_id: Option<String>,
    pub profile_url: Option<String>,
    pub email: Option<String>,
    pub custom: Option<CustomData>,
    pub status: Option<String>,
    pub kind: Option<String>,
}

// ── Responses ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipsPage {
    pub page: PageCursors,
    pub total: Option<u64>,
    pub status: Option<u16>,
    pub memberships: Vec<Membership>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllMemberships {
    pub total: u64,
    pub memberships: Vec<Membership>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestrictionsPage {
    pub page: PageCursors,
    pub total: Option<u64>,
    pub status: Option<u16>,
    pub restrictions: Vec<Restriction>,
}
