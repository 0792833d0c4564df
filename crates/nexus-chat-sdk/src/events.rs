//! In-process fan-out of object update events.
//!
//! Whatever transport the embedder runs feeds events in through
//! [`UpdateHub::dispatch`]; listeners get them from a broadcast receiver.
//! Channel subscriptions are reference counted so several streams may watch
//! the same user.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use nexus_chat_common::models::ObjectEvent;
use tokio::sync::broadcast;
use tracing::debug;

type Subscriptions = Arc<Mutex<HashMap<String, usize>>>;

pub struct UpdateHub {
    sender: broadcast::Sender<ObjectEvent>,
    subscriptions: Subscriptions,
}

impl UpdateHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, subscriptions: Arc::default() }
    }

    /// Receive every event dispatched from now on.
    pub fn listen(&self) -> broadcast::Receiver<ObjectEvent> {
        self.sender.subscribe()
    }

    /// Deliver an event to all listeners. Returns how many received it.
    pub fn dispatch(&self, event: ObjectEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Register interest in a channel until the returned guard is dropped.
    pub fn subscribe(&self, channel: &str) -> Subscription {
        let mut subs = lock(&self.subscriptions);
        let count = subs.entry(channel.to_owned()).or_insert(0);
        *count += 1;
        debug!(channel, refs = *count, "subscribed");
        Subscription {
            channel: channel.to_owned(),
            subscriptions: Arc::clone(&self.subscriptions),
        }
    }

    pub fn is_subscribed(&self, channel: &str) -> bool {
        lock(&self.subscriptions).contains_key(channel)
    }

    pub fn subscribed_channels(&self) -> Vec<String> {
        lock(&self.subscriptions).keys().cloned().collect()
    }
}

fn lock(subs: &Subscriptions) -> MutexGuard<'_, HashMap<String, usize>> {
    subs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Keeps a channel subscribed while alive.
#[derive(Debug)]
pub struct Subscription {
    channel: String,
    subscriptions: Subscriptions,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut subs = lock(&self.subscriptions);
        if let Some(count) = subs.get_mut(&self.channel) {
            *count -= 1;
            if *count == 0 {
                subs.remove(&self.channel);
                debug!(channel = %self.channel, "unsubscribed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_chat_common::models::{ObjectMessage, RawUser};

    #[test]
    fn test_subscriptions_are_reference_counted() {
        let hub = UpdateHub::new(8);
        let a = hub.subscribe("alice");
        let b = hub.subscribe("alice");
        assert!(hub.is_subscribed("alice"));
        drop(a);
        assert!(hub.is_subscribed("alice"));
        drop(b);
        assert!(!hub.is_subscribed("alice"));
        assert!(hub.subscribed_channels().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_reaches_listeners() {
        let hub = UpdateHub::new(8);
        assert_eq!(hub.dispatch(event("x")), 0);

        let mut rx = hub.listen();
        assert_eq!(hub.dispatch(event("alice")), 1);
        let got = rx.recv().await.unwrap();
        assert_eq!(got.channel, "alice");
    }

    fn event(channel: &str) -> ObjectEvent {
        ObjectEvent {
            channel: channel.into(),
            message: ObjectMessage::Uuid(RawUser { id: channel.into(), ..Default::default() }),
        }
    }
}
