//! Fluent builder for membership filter expressions.
//!
//! Every query carries a structural predicate (hide moderation channels, or
//! select exactly those) which is AND-ed with whatever the caller asked for.
//! Caller filters are passed through untouched; a malformed one is reported
//! by the store when the query runs.

/// Builds the predicate string sent with a membership query.
///
/// ```
/// use nexus_chat_sdk::filter::FilterBuilder;
///
/// let filter = FilterBuilder::excluding_moderation("MOD_")
///     .and(Some("channel.type == 'group'"))
///     .build();
/// assert_eq!(filter, "!(channel.id LIKE 'MOD_*') && (channel.type == 'group')");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterBuilder {
    structural: String,
    caller: Option<String>,
}

impl FilterBuilder {
    pub fn new(structural: impl Into<String>) -> Self {
        Self { structural: structural.into(), caller: None }
    }

    /// Hide every channel living under the moderation prefix.
    pub fn excluding_moderation(prefix: &str) -> Self {
        Self::new(format!("!(channel.id LIKE '{prefix}*')"))
    }

    /// Select the moderation shadow of one channel.
    pub fn moderation_channel(prefix: &str, channel_id: &str) -> Self {
        Self::new(format!("channel.id == '{prefix}{channel_id}'"))
    }

    /// Select every moderation shadow channel.
    pub fn moderation_wildcard(prefix: &str) -> Self {
        Self::new(format!("channel.id LIKE '{prefix}*'"))
    }

    /// AND a caller filter onto the structural predicate. Empty filters are ignored.
    pub fn and(mut self, caller: Option<&str>) -> Self {
        self.caller = caller.filter(|f| !f.is_empty()).map(str::to_owned);
        self
    }

    pub fn build(self) -> String {
        match self.caller {
            Some(caller) => format!("{} && ({caller})", self.structural),
            None => self.structural,
        }
    }
}

/// Caller filter matching a single channel id.
pub fn channel_id_equals(channel_id: &str) -> String {
    format!("channel.id == '{channel_id}'")
}
