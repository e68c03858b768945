//! Bridge from the outgoing notification channel to a [`Communicator`].

use std::sync::Arc;

use shared_bus::{NotificationChannel, SubscriberError, SubscriptionId};
use tracing::{debug, error};

use crate::domain::OutgoingMessage;
use crate::ports::Communicator;

/// A subscriber callback that serializes each message and sends it.
///
/// `sender` is the address of the node publishing on the channel.
pub fn forward_to_communicator(
    communicator: Arc<dyn Communicator>,
    sender: impl Into<String>,
) -> impl Fn(&OutgoingMessage) -> Result<(), SubscriberError> + Send + Sync + 'static {
    let sender = sender.into();
    move |message: &OutgoingMessage| {
        let payload = message.bundle.to_json_pretty().map_err(|e| {
            error!(receiver = %message.receiver, error = %e, "Cannot serialize outgoing message");
            SubscriberError::Delivery(e.to_string())
        })?;

        communicator
            .send(&sender, &message.receiver, &message.message_type, &payload)
            .map_err(|e| {
                error!(
                    sender = %sender,
                    receiver = %message.receiver,
                    error = %e,
                    "Transport rejected outgoing message"
                );
                SubscriberError::Delivery(e.to_string())
            })?;

        debug!(sender = %sender, receiver = %message.receiver, "Outgoing message sent");
        Ok(())
    }
}

/// Subscribe a communicator to a channel.
pub fn connect_communicator(
    channel: &NotificationChannel<OutgoingMessage>,
    communicator: Arc<dyn Communicator>,
    sender: impl Into<String>,
) -> SubscriptionId {
    channel.subscribe(forward_to_communicator(communicator, sender))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::RecordingCommunicator;
    use crate::domain::{NodeIdentity, SelfTestMessageFactory};
    use crate::ports::CommunicatorError;
    use shared_types::{Bundle, SELF_TEST_DELIVERY_CODE};

    fn message() -> OutgoingMessage {
        SelfTestMessageFactory::create(
            &NodeIdentity::new("a@kim.de", "A", "https://a.example.com"),
            &NodeIdentity::new("b@kim.de", "B", "https://b.example.com"),
            None,
        )
    }

    #[test]
    fn test_forward_serializes_and_sends() {
        let communicator = Arc::new(RecordingCommunicator::new());
        let channel = NotificationChannel::new();
        connect_communicator(&channel, communicator.clone(), "a@kim.de");

        let message = message();
        channel.trigger(&message).unwrap();

        let sent = communicator.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].sender, "a@kim.de");
        assert_eq!(sent[0].receiver, "b@kim.de");
        assert_eq!(sent[0].message_type, SELF_TEST_DELIVERY_CODE);
        assert_eq!(Bundle::from_json(&sent[0].payload).unwrap(), message.bundle);
    }

    #[test]
    fn test_transport_failure_becomes_subscriber_error() {
        let communicator = Arc::new(RecordingCommunicator::failing(CommunicatorError::Delivery(
            "mailbox full".into(),
        )));
        let forward = forward_to_communicator(communicator, "a@kim.de");
        assert_eq!(
            forward(&message()),
            Err(SubscriberError::Delivery("Delivery failed: mailbox full".into()))
        );
    }
}
