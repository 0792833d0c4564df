//! Membership queries and the pages the store answers them with.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::CustomData;

/// Opaque page token handed out by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(pub String);

impl Cursor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Cursor {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Which page to request relative to a previous response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    Next(Cursor),
    Prev(Cursor),
}

/// Next/previous cursors of a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursors {
    pub next: Option<Cursor>,
    pub prev: Option<Cursor>,
}

/// Optional fields the store should attach to each membership record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipInclude {
    pub total_count: bool,
    pub custom_fields: bool,
    pub channel_fields: bool,
    pub custom_channel_fields: bool,
    pub channel_type_field: bool,
    pub status_field: bool,
    pub channel_status_field: bool,
    pub type_field: bool,
}

impl MembershipInclude {
    /// Everything a full membership listing needs.
    pub fn memberships() -> Self {
        Self {
            total_count: true,
            custom_fields: true,
            channel_fields: true,
            custom_channel_fields: true,
            channel_type_field: true,
            status_field: true,
            channel_status_field: true,
            type_field: false,
        }
    }

    /// Restriction lookups only read membership custom data.
    pub fn restrictions() -> Self {
        Self {
            total_count: true,
            custom_fields: true,
            ..Self::default()
        }
    }

    /// Union of two flag sets.
    pub fn merge(self, other: Self) -> Self {
        Self {
            total_count: self.total_count || other.total_count,
            custom_fields: self.custom_fields || other.custom_fields,
            channel_fields: self.channel_fields || other.channel_fields,
            custom_channel_fields: self.custom_channel_fields || other.custom_channel_fields,
            channel_type_field: self.channel_type_field || other.channel_type_field,
            status_field: self.status_field || other.status_field,
            channel_status_field: self.channel_status_field || other.channel_status_field,
            type_field: self.type_field || other.type_field,
        }
    }

    /// Comma-separated include list as the REST API expects it.
    pub fn to_query_value(&self) -> String {
        let flags = [
            (self.custom_fields, "custom"),
            (self.channel_fields, "channel"),
            (self.custom_channel_fields, "channel.custom"),
            (self.channel_type_field, "channel.type"),
            (self.status_field, "status"),
            (self.channel_status_field, "channel.status"),
            (self.type_field, "type"),
        ];
        flags
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, name)| *name)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// One membership page request as sent to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipsQuery {
    /// User whose memberships are listed.
    pub owner_id: String,
    pub filter: Option<String>,
    pub include: MembershipInclude,
    pub page: Option<PageRequest>,
    pub limit: Option<u32>,
    /// Sort keys such as `channel.id` or `updated:desc`.
    pub sort: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChannel {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub custom: Option<CustomData>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMembership {
    #[serde(default)]
    pub channel: Option<RawChannel>,
    #[serde(default)]
    pub custom: Option<CustomData>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub e_tag: Option<String>,
}

/// A page of membership records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipPageResponse {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub data: Vec<RawMembership>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub next: Option<Cursor>,
    #[serde(default)]
    pub prev: Option<Cursor>,
}
