//! # Subscriptions
//!
//! Subscription handles and the async bridge used by consumers that want to
//! receive outgoing messages on a Tokio task instead of inside `trigger`.

use std::fmt;
use std::sync::Weak;

use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::publisher::SubscriberEntry;

/// Identifies one subscriber of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Errors a subscriber can report back to the triggering call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriberError {
    /// The subscriber could not hand the message on.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// The receiving side of a channel subscription is gone.
    #[error("Subscription receiver closed")]
    Closed,
}

/// A subscription that forwards every notification into an unbounded queue.
///
/// Dropping the handle removes the subscriber from its channel.
pub struct ChannelSubscription<T> {
    id: SubscriptionId,
    receiver: mpsc::UnboundedReceiver<T>,
    subscribers: Weak<RwLock<Vec<SubscriberEntry<T>>>>,
}

impl<T> ChannelSubscription<T> {
    pub(crate) fn new(
        id: SubscriptionId,
        receiver: mpsc::UnboundedReceiver<T>,
        subscribers: Weak<RwLock<Vec<SubscriberEntry<T>>>>,
    ) -> Self {
        Self {
            id,
            receiver,
            subscribers,
        }
    }

    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Receive the next message.
    ///
    /// Returns `None` once the channel has been dropped and the queue drained.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Receive without waiting.
    ///
    /// - `Ok(Some(msg))` - a message was queued
    /// - `Ok(None)` - nothing queued yet
    /// - `Err(SubscriberError::Closed)` - the channel is gone and the queue is empty
    pub fn try_recv(&mut self) -> Result<Option<T>, SubscriberError> {
        match self.receiver.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(SubscriberError::Closed),
        }
    }
}

impl<T> Drop for ChannelSubscription<T> {
    fn drop(&mut self) {
        let Some(subscribers) = self.subscribers.upgrade() else {
            return;
        };
        subscribers.write().retain(|entry| entry.id != self.id);
        debug!(subscription = %self.id, "Channel subscription dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::NotificationChannel;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_channel_subscription_recv() {
        let channel = NotificationChannel::new();
        let mut sub = channel.subscribe_channel();

        channel.trigger(&"hello".to_string()).unwrap();

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("message");
        assert_eq!(received, "hello");
    }

    #[test]
    fn test_try_recv_empty() {
        let channel: NotificationChannel<u32> = NotificationChannel::new();
        let mut sub = channel.subscribe_channel();
        assert!(matches!(sub.try_recv(), Ok(None)));
    }

    #[test]
    fn test_drop_unsubscribes() {
        let channel: NotificationChannel<u32> = NotificationChannel::new();
        {
            let _sub1 = channel.subscribe_channel();
            let _sub2 = channel.subscribe_channel();
            assert_eq!(channel.subscriber_count(), 2);
        }
        assert_eq!(channel.subscriber_count(), 0);

        // No closed receivers left behind to fail the fan-out.
        assert_eq!(channel.trigger(&1).unwrap(), 0);
    }

    #[test]
    fn test_try_recv_after_channel_dropped() {
        let channel: NotificationChannel<u32> = NotificationChannel::new();
        let mut sub = channel.subscribe_channel();
        channel.trigger(&7).unwrap();
        drop(channel);

        assert_eq!(sub.try_recv().unwrap(), Some(7));
        assert_eq!(sub.try_recv(), Err(SubscriberError::Closed));
    }
}
