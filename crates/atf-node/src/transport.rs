//! # In-Process Transport
//!
//! A [`Communicator`] that delivers serialized envelopes straight into the
//! bundle processor registered for the receiver's address.
//!
//! Peers are held weakly: a peer's notification channel owns a handle to the
//! transport, so strong references here would keep both peers alive forever.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use atf_bundle_processor::{
    BundleProcessor, BundleProcessorApi, Communicator, CommunicatorError, DispatchError,
    DispatchOutcome,
};
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tracing::{debug, warn};

/// One message the transport handed to a peer, and what the peer made of it.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub sender: String,
    pub receiver: String,
    pub message_type: String,
    pub outcome: Result<DispatchOutcome, DispatchError>,
}

/// Routes messages between peers living in the same process.
pub struct InProcessTransport {
    peers: RwLock<HashMap<String, Weak<BundleProcessor>>>,
    deliveries: Mutex<Vec<Delivery>>,
    delivered: watch::Sender<usize>,
}

impl Default for InProcessTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl InProcessTransport {
    #[must_use]
    pub fn new() -> Self {
        let (delivered, _) = watch::channel(0);
        Self {
            peers: RwLock::new(HashMap::new()),
            deliveries: Mutex::new(Vec::new()),
            delivered,
        }
    }

    /// Make `processor` reachable under `address`.
    pub fn attach(&self, address: impl Into<String>, processor: &Arc<BundleProcessor>) {
        let address = address.into();
        debug!(address = %address, "Peer attached to transport");
        self.peers.write().insert(address, Arc::downgrade(processor));
    }

    /// Every delivery so far, in order.
    #[must_use]
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }

    /// Watch the number of completed deliveries.
    #[must_use]
    pub fn watch_deliveries(&self) -> watch::Receiver<usize> {
        self.delivered.subscribe()
    }

    fn record(&self, delivery: Delivery) {
        let count = {
            let mut deliveries = self.deliveries.lock();
            deliveries.push(delivery);
            deliveries.len()
        };
        self.delivered.send_replace(count);
    }
}

impl Communicator for InProcessTransport {
    fn send(
        &self,
        sender: &str,
        receiver: &str,
        message_type: &str,
        payload: &str,
    ) -> Result<(), CommunicatorError> {
        let processor = self
            .peers
            .read()
            .get(receiver)
            .and_then(Weak::upgrade)
            .ok_or_else(|| CommunicatorError::UnknownReceiver(receiver.to_string()))?;

        debug!(sender, receiver, message_type, "Delivering message");
        let outcome = processor.process_json(payload);

        let result = match &outcome {
            Ok(DispatchOutcome::Rejected(err)) => {
                warn!(sender, receiver, error = %err, "Receiver rejected message");
                Ok(())
            }
            Ok(DispatchOutcome::Done(_)) => Ok(()),
            Err(err) => Err(CommunicatorError::Delivery(err.to_string())),
        };

        self.record(Delivery {
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            message_type: message_type.to_string(),
            outcome,
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atf_bundle_processor::{NodeIdentity, SelfTestMessageFactory};

    fn identity(name: &str) -> NodeIdentity {
        NodeIdentity::new(
            format!("{name}@gematik.kim.de"),
            name,
            format!("https://{name}.example.com/endpoint"),
        )
    }

    #[test]
    fn test_unknown_receiver() {
        let transport = InProcessTransport::new();
        assert_eq!(
            transport.send("a", "nobody@kim.de", "t", "{}"),
            Err(CommunicatorError::UnknownReceiver("nobody@kim.de".into()))
        );
        assert!(transport.deliveries().is_empty());
    }

    #[test]
    fn test_dropped_peer_is_unreachable() {
        let transport = InProcessTransport::new();
        let receiver = Arc::new(BundleProcessor::with_builtin_handlers(identity("receiver")));
        transport.attach("receiver@gematik.kim.de", &receiver);
        drop(receiver);

        assert!(matches!(
            transport.send("a", "receiver@gematik.kim.de", "t", "{}"),
            Err(CommunicatorError::UnknownReceiver(_))
        ));
    }

    #[test]
    fn test_delivery_is_processed_and_recorded() {
        let transport = InProcessTransport::new();
        let receiver = Arc::new(BundleProcessor::with_builtin_handlers(identity("receiver")));
        transport.attach("receiver@gematik.kim.de", &receiver);
        let mut watch = transport.watch_deliveries();

        let message = SelfTestMessageFactory::create(&identity("sender"), &identity("receiver"), None);
        let payload = message.bundle.to_json_pretty().unwrap();
        transport
            .send("sender@gematik.kim.de", &message.receiver, &message.message_type, &payload)
            .unwrap();

        let deliveries = transport.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert!(deliveries[0].outcome.as_ref().unwrap().summary().unwrap().acknowledged());
        assert!(watch.has_changed().unwrap());
        assert_eq!(*watch.borrow_and_update(), 1);
    }

    #[test]
    fn test_rejection_is_not_a_transport_error() {
        let transport = InProcessTransport::new();
        let receiver = Arc::new(BundleProcessor::with_builtin_handlers(identity("receiver")));
        transport.attach("receiver@gematik.kim.de", &receiver);

        assert!(transport
            .send("a", "receiver@gematik.kim.de", "t", "{\"resourceType\":\"Bundle\"}")
            .is_ok());
        assert!(transport.deliveries()[0]
            .outcome
            .as_ref()
            .unwrap()
            .is_rejected());
    }
}
