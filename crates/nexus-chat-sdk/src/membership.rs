//! Memberships and the moderation restrictions derived from them.

use nexus_chat_common::models::{CustomData, RawChannel, RawMembership};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ChatError, Result};

/// The channel side of a membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub custom: Option<CustomData>,
    pub status: Option<String>,
    pub kind: Option<String>,
    pub updated: Option<String>,
}

/// A user's membership in one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    /// User the membership was fetched for.
    pub user_id: String,
    pub channel: ChannelRef,
    pub custom: Option<CustomData>,
    pub status: Option<String>,
    pub kind: Option<String>,
    pub updated: Option<String>,
    pub e_tag: Option<String>,
}

impl Membership {
    /// Normalize a raw store record, tagging it with the user it was fetched for.
    ///
    /// Records without a channel id are rejected: they could never be keyed
    /// in the membership cache.
    pub fn from_raw(user_id: &str, raw: RawMembership) -> Result<Self> {
        let RawChannel { id, name, description, custom, status, kind, updated } =
            raw.channel.unwrap_or_default();
        let id = id.filter(|id| !id.is_empty()).ok_or_else(|| ChatError::MalformedRecord {
            message: format!("membership of user {user_id} has no channel id"),
        })?;

        Ok(Self {
            user_id: user_id.to_owned(),
            channel: ChannelRef {
                id,
                name: non_empty(name),
                description: non_empty(description),
                custom,
                status: non_empty(status),
                kind: non_empty(kind),
                updated: non_empty(updated),
            },
            custom: raw.custom,
            status: non_empty(raw.status),
            kind: non_empty(raw.kind),
            updated: non_empty(raw.updated),
            e_tag: non_empty(raw.e_tag),
        })
    }

    pub fn channel_id(&self) -> &str {
        &self.channel.id
    }

    /// Last update as a timestamp, when the store sent a parseable one.
    pub fn updated_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.updated
            .as_deref()
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc))
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Ban/mute state of a user in one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRestrictions {
    pub ban: bool,
    pub mute: bool,
    pub reason: Option<String>,
}

impl ChannelRestrictions {
    /// Read restriction flags from membership custom data. Missing flags are false.
    pub fn from_custom(custom: Option<&CustomData>) -> Self {
        let Some(custom) = custom else {
            return Self::default();
        };
        Self {
            ban: custom.get("ban").is_some_and(truthy),
            mute: custom.get("mute").is_some_and(truthy),
            reason: custom.get("reason").and_then(|r| match r {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            }),
        }
    }

    pub fn is_restricted(&self) -> bool {
        self.ban || self.mute
    }

    /// Custom data written to the moderation membership.
    pub fn to_custom(&self) -> CustomData {
        let mut custom = CustomData::new();
        custom.insert("ban".into(), Value::Bool(self.ban));
        custom.insert("mute".into(), Value::Bool(self.mute));
        if let Some(reason) = &self.reason {
            custom.insert("reason".into(), Value::String(reason.clone()));
        }
        custom
    }
}

/// Restrictions in one channel, keyed by the user-facing channel id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restriction {
    pub channel_id: String,
    pub ban: bool,
    pub mute: bool,
    pub reason: Option<String>,
}

impl Restriction {
    /// Build from a raw moderation membership, stripping the moderation prefix.
    pub fn from_raw(prefix: &str, raw: &RawMembership) -> Result<Self> {
        let id = raw
            .channel
            .as_ref()
            .and_then(|c| c.id.as_deref())
            .ok_or_else(|| ChatError::MalformedRecord {
                message: "restriction record has no channel id".into(),
            })?;
        let ChannelRestrictions { ban, mute, reason } =
            ChannelRestrictions::from_custom(raw.custom.as_ref());
        Ok(Self {
            channel_id: id.replacen(prefix, "", 1),
            ban,
            mute,
            reason,
        })
    }
}

/// Loose truthiness for flags written by other clients.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawMembership {
        serde_json::from_value(value).expect("valid raw membership")
    }

    #[test]
    fn test_from_raw_normalizes_empty_strings() {
        let m = Membership::from_raw(
            "alice",
            raw(json!({
                "channel": { "id": "general", "name": "", "type": "public" },
                "status": "",
                "updated": "2024-05-01T10:00:00.000Z"
            })),
        )
        .unwrap();
        assert_eq!(m.user_id, "alice");
        assert_eq!(m.channel_id(), "general");
        assert_eq!(m.channel.name, None);
        assert_eq!(m.channel.kind.as_deref(), Some("public"));
        assert_eq!(m.status, None);
        assert!(m.updated_at().is_some());
    }

    #[test]
    fn test_from_raw_rejects_missing_channel() {
        let err = Membership::from_raw("alice", raw(json!({ "custom": {} }))).unwrap_err();
        assert!(matches!(err, ChatError::MalformedRecord { .. }));
    }

    #[test]
    fn test_restrictions_default_to_unrestricted() {
        assert_eq!(ChannelRestrictions::from_custom(None), ChannelRestrictions::default());
        let empty = CustomData::new();
        let r = ChannelRestrictions::from_custom(Some(&empty));
        assert!(!r.ban && !r.mute && r.reason.is_none());
    }

    #[test]
    fn test_restrictions_truthiness() {
        let custom = json!({ "ban": 1, "mute": "", "reason": "spam" });
        let r = ChannelRestrictions::from_custom(custom.as_object());
        assert!(r.ban);
        assert!(!r.mute);
        assert_eq!(r.reason.as_deref(), Some("spam"));
    }

    #[test]
    fn test_restriction_strips_prefix() {
        let r = Restriction::from_raw(
            "MOD_",
            &raw(json!({ "channel": { "id": "MOD_general" }, "custom": { "mute": true } })),
        )
        .unwrap();
        assert_eq!(r.channel_id, "general");
        assert!(r.mute);
        assert!(!r.ban);
    }

    #[test]
    fn test_to_custom_omits_missing_reason() {
        let custom = ChannelRestrictions { ban: true, mute: false, reason: None }.to_custom();
        assert_eq!(Value::Object(custom), json!({ "ban": true, "mute": false }));
    }
}
