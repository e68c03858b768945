//! Communicator adapters.

use parking_lot::Mutex;
use tracing::info;

use crate::ports::{Communicator, CommunicatorError};

/// Logs every message instead of transmitting it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingCommunicator;

impl Communicator for LoggingCommunicator {
    fn send(
        &self,
        sender: &str,
        receiver: &str,
        message_type: &str,
        payload: &str,
    ) -> Result<(), CommunicatorError> {
        info!(
            sender,
            receiver,
            message_type,
            payload_bytes = payload.len(),
            "Message handed to transport"
        );
        Ok(())
    }
}

/// One call to [`RecordingCommunicator::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub sender: String,
    pub receiver: String,
    pub message_type: String,
    pub payload: String,
}

/// Records every message; optionally fails every send.
#[derive(Debug, Default)]
pub struct RecordingCommunicator {
    sent: Mutex<Vec<SentMessage>>,
    failure: Option<CommunicatorError>,
}

impl RecordingCommunicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A communicator whose sends all fail with `error`.
    #[must_use]
    pub fn failing(error: CommunicatorError) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failure: Some(error),
        }
    }

    /// Messages sent so far, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

impl Communicator for RecordingCommunicator {
    fn send(
        &self,
        sender: &str,
        receiver: &str,
        message_type: &str,
        payload: &str,
    ) -> Result<(), CommunicatorError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        self.sent.lock().push(SentMessage {
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            message_type: message_type.to_string(),
            payload: payload.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_communicator() {
        let communicator = RecordingCommunicator::new();
        communicator.send("a", "b", "t", "{}").unwrap();
        assert_eq!(
            communicator.sent(),
            vec![SentMessage {
                sender: "a".into(),
                receiver: "b".into(),
                message_type: "t".into(),
                payload: "{}".into(),
            }]
        );
    }

    #[test]
    fn test_failing_communicator_records_nothing() {
        let communicator =
            RecordingCommunicator::failing(CommunicatorError::UnknownReceiver("b".into()));
        assert!(communicator.send("a", "b", "t", "{}").is_err());
        assert_eq!(communicator.sent_count(), 0);
    }

    #[test]
    fn test_logging_communicator_accepts() {
        assert!(LoggingCommunicator.send("a", "b", "t", "{}").is_ok());
    }
}
