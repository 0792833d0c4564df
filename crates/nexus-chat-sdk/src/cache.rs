//! Per-user membership cache keyed by channel id.
//!
//! The cache is owned by a single [`User`](crate::user::User) and has no
//! internal locking; mutation goes through `&mut self`. Entries never expire.
//! A full listing overwrites the keys it returns and leaves every other key in
//! place, so channels the user has since left linger until [`clear`] is called.
//!
//! [`clear`]: MembershipCache::clear

use std::collections::HashMap;

use crate::membership::Membership;

#[derive(Debug, Clone, Default)]
pub struct MembershipCache {
    entries: HashMap<String, Membership>,
}

impl MembershipCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, channel_id: &str) -> Option<&Membership> {
        self.entries.get(channel_id)
    }

    /// Insert or overwrite one entry per membership. Absent keys are kept.
    pub fn replace_all<I>(&mut self, memberships: I)
    where
        I: IntoIterator<Item = Membership>,
    {
        for membership in memberships {
            self.entries.insert(membership.channel.id.clone(), membership);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Every cached membership, in no particular order.
    pub fn snapshot(&self) -> Vec<Membership> {
        self.entries.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
