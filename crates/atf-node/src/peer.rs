//! # Peer Node
//!
//! One ATF participant: identity, registry, dispatch engine and outgoing
//! notification channel. Each peer owns its own channel; nothing is global.

use std::sync::Arc;

use atf_bundle_processor::{
    forward_to_communicator, BundleProcessor, Communicator, NodeIdentity, OutgoingMessage,
    SelfTestMessageFactory, UseCaseRegistry,
};
use shared_bus::{ChannelSubscription, NotificationChannel, NotificationError, SubscriptionId};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// An ATF participant.
pub struct PeerNode {
    name: String,
    processor: Arc<BundleProcessor>,
}

impl PeerNode {
    /// A peer with the built-in use cases.
    pub fn new(name: impl Into<String>, identity: NodeIdentity) -> Self {
        Self::with_registry(name, identity, Arc::new(UseCaseRegistry::with_builtin_handlers()))
    }

    pub fn with_registry(
        name: impl Into<String>,
        identity: NodeIdentity,
        registry: Arc<UseCaseRegistry>,
    ) -> Self {
        let notifications = Arc::new(NotificationChannel::new());
        Self {
            name: name.into(),
            processor: Arc::new(BundleProcessor::new(identity, registry, notifications)),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn identity(&self) -> &NodeIdentity {
        self.processor.identity()
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.identity().address
    }

    #[must_use]
    pub fn processor(&self) -> &Arc<BundleProcessor> {
        &self.processor
    }

    #[must_use]
    pub fn notifications(&self) -> &Arc<NotificationChannel<OutgoingMessage>> {
        self.processor.notifications()
    }

    /// Send everything this peer publishes through `communicator`, inside
    /// `trigger`.
    pub fn connect(&self, communicator: Arc<dyn Communicator>) -> SubscriptionId {
        self.notifications()
            .subscribe(forward_to_communicator(communicator, self.address()))
    }

    /// Queue everything this peer publishes and send it from a Tokio task.
    ///
    /// The task runs until `shutdown` turns true or the channel is dropped.
    pub fn spawn_delivery_loop(
        &self,
        communicator: Arc<dyn Communicator>,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let subscription = self.notifications().subscribe_channel();
        let forward = forward_to_communicator(communicator, self.address());
        tokio::spawn(delivery_loop(self.name.clone(), subscription, forward, shutdown))
    }

    /// Publish a self-test message addressed to `receiver`.
    ///
    /// Returns the id of the self-test header.
    pub fn send_self_test(&self, receiver: &NodeIdentity) -> Result<String, NotificationError> {
        let message = SelfTestMessageFactory::create(self.identity(), receiver, None);
        let message_id = message
            .header()
            .and_then(|header| header.id.clone())
            .unwrap_or_default();

        let notified = self.notifications().trigger(&message)?;
        info!(
            peer = %self.name,
            message_id = %message_id,
            receiver = %receiver.address,
            subscribers = notified,
            "Self-test sent"
        );
        Ok(message_id)
    }
}

async fn delivery_loop<F>(
    peer: String,
    mut subscription: ChannelSubscription<OutgoingMessage>,
    forward: F,
    mut shutdown: watch::Receiver<bool>,
) where
    F: Fn(&OutgoingMessage) -> Result<(), shared_bus::SubscriberError>,
{
    debug!(peer = %peer, subscription = %subscription.id(), "Delivery loop started");
    loop {
        tokio::select! {
            message = subscription.recv() => {
                let Some(message) = message else { break };
                if let Err(err) = forward(&message) {
                    warn!(peer = %peer, receiver = %message.receiver, error = %err, "Delivery failed");
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    debug!(peer = %peer, "Delivery loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use atf_bundle_processor::RecordingCommunicator;
    use shared_types::SELF_TEST_DELIVERY_CODE;

    fn peer(name: &str) -> PeerNode {
        PeerNode::new(
            name,
            NodeIdentity::new(
                format!("{name}@gematik.kim.de"),
                name,
                format!("https://{name}.example.com/endpoint"),
            ),
        )
    }

    #[test]
    fn test_send_self_test_through_connected_communicator() {
        let sender = peer("sender");
        let receiver = peer("receiver");
        let communicator = Arc::new(RecordingCommunicator::new());
        sender.connect(communicator.clone());

        let message_id = sender.send_self_test(receiver.identity()).unwrap();
        assert!(!message_id.is_empty());

        let sent = communicator.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].sender, "sender@gematik.kim.de");
        assert_eq!(sent[0].receiver, "receiver@gematik.kim.de");
        assert_eq!(sent[0].message_type, SELF_TEST_DELIVERY_CODE);
        assert!(sent[0].payload.contains(&message_id));
    }

    #[tokio::test]
    async fn test_delivery_loop_forwards_and_stops() {
        let sender = peer("sender");
        let receiver = peer("receiver");
        let communicator = Arc::new(RecordingCommunicator::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = sender.spawn_delivery_loop(communicator.clone(), shutdown_rx);

        sender.send_self_test(receiver.identity()).unwrap();

        for _ in 0..100 {
            if communicator.sent_count() == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(communicator.sent_count(), 1);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
