//! # Notification Channel
//!
//! The publishing side: an ordered list of subscriber callbacks that
//! `trigger` fans out to synchronously.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::subscriber::{ChannelSubscription, SubscriberError, SubscriptionId};

/// A subscriber callback.
pub type SubscriberFn<T> = Arc<dyn Fn(&T) -> Result<(), SubscriberError> + Send + Sync>;

/// Errors returned by [`NotificationChannel::trigger`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotificationError {
    /// A subscriber failed; later subscribers were not called.
    #[error("Subscriber {subscription} failed: {source}")]
    SubscriberFailed {
        subscription: SubscriptionId,
        #[source]
        source: SubscriberError,
    },
}

pub(crate) struct SubscriberEntry<T> {
    pub(crate) id: SubscriptionId,
    callback: SubscriberFn<T>,
}

/// Synchronous, ordered fan-out of notifications to subscribers.
pub struct NotificationChannel<T> {
    /// Subscribers in subscription order.
    subscribers: Arc<RwLock<Vec<SubscriberEntry<T>>>>,

    /// Next subscription id.
    next_id: AtomicU64,

    /// Total notifications triggered.
    triggered: AtomicU64,
}

impl<T> NotificationChannel<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(Vec::new())),
            next_id: AtomicU64::new(1),
            triggered: AtomicU64::new(0),
        }
    }

    /// Append a subscriber. It will be called after all earlier subscribers.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        let id = self.allocate_id();
        self.subscribers.write().push(SubscriberEntry {
            id,
            callback: Arc::new(callback),
        });
        debug!(subscription = %id, "New subscription created");
        id
    }

    /// Remove a subscriber. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|entry| entry.id != id);
        before != subscribers.len()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Number of `trigger` calls so far, including failed ones.
    #[must_use]
    pub fn notifications_triggered(&self) -> u64 {
        self.triggered.load(Ordering::Relaxed)
    }

    /// Call every subscriber with `message`, in subscription order.
    ///
    /// Returns the number of subscribers that were called. The subscriber list
    /// is snapshotted first, so callbacks may subscribe or trigger other
    /// channels without deadlocking.
    pub fn trigger(&self, message: &T) -> Result<usize, NotificationError> {
        self.triggered.fetch_add(1, Ordering::Relaxed);

        let snapshot: Vec<(SubscriptionId, SubscriberFn<T>)> = self
            .subscribers
            .read()
            .iter()
            .map(|entry| (entry.id, Arc::clone(&entry.callback)))
            .collect();

        for (id, callback) in &snapshot {
            if let Err(source) = callback(message) {
                warn!(subscription = %id, error = %source, "Subscriber failed");
                return Err(NotificationError::SubscriberFailed {
                    subscription: *id,
                    source,
                });
            }
        }

        debug!(receivers = snapshot.len(), "Notification triggered");
        Ok(snapshot.len())
    }

    fn allocate_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl<T: Clone + Send + 'static> NotificationChannel<T> {
    /// Subscribe with a queue instead of a callback.
    ///
    /// Each notification is cloned into the returned subscription, which can be
    /// drained from an async task.
    #[must_use]
    pub fn subscribe_channel(&self) -> ChannelSubscription<T> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = self.subscribe(move |message: &T| {
            sender
                .send(message.clone())
                .map_err(|_| SubscriberError::Closed)
        });
        ChannelSubscription::new(id, receiver, Arc::downgrade(&self.subscribers))
    }
}

impl<T> Default for NotificationChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_trigger_no_subscribers() {
        let channel: NotificationChannel<u32> = NotificationChannel::new();
        assert_eq!(channel.trigger(&1).unwrap(), 0);
        assert_eq!(channel.notifications_triggered(), 1);
    }

    #[test]
    fn test_subscribers_called_in_order() {
        let channel = NotificationChannel::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            channel.subscribe(move |value: &u32| {
                log.lock().push(format!("{name}:{value}"));
                Ok(())
            });
        }

        assert_eq!(channel.trigger(&5).unwrap(), 3);
        assert_eq!(*log.lock(), vec!["first:5", "second:5", "third:5"]);
    }

    #[test]
    fn test_failing_subscriber_stops_fan_out() {
        let channel = NotificationChannel::new();
        let calls = Arc::new(Mutex::new(0u32));

        let failing = channel.subscribe(|_: &u32| Err(SubscriberError::Delivery("down".into())));
        let counter = Arc::clone(&calls);
        channel.subscribe(move |_: &u32| {
            *counter.lock() += 1;
            Ok(())
        });

        let err = channel.trigger(&1).unwrap_err();
        assert_eq!(
            err,
            NotificationError::SubscriberFailed {
                subscription: failing,
                source: SubscriberError::Delivery("down".into()),
            }
        );
        assert_eq!(*calls.lock(), 0);
    }

    #[test]
    fn test_unsubscribe() {
        let channel: NotificationChannel<u32> = NotificationChannel::new();
        let id = channel.subscribe(|_| Ok(()));
        assert_eq!(channel.subscriber_count(), 1);

        assert!(channel.unsubscribe(id));
        assert!(!channel.unsubscribe(id));
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[test]
    fn test_subscribe_from_inside_callback() {
        let channel = Arc::new(NotificationChannel::<u32>::new());
        let inner = Arc::clone(&channel);
        channel.subscribe(move |_| {
            inner.subscribe(|_| Ok(()));
            Ok(())
        });

        channel.trigger(&1).unwrap();
        assert_eq!(channel.subscriber_count(), 2);
    }
}
