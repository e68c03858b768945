//! Outbound (driven) ports of the bundle processor.
//!
//! - [`UseCaseHandler`]: business logic for one use-case code
//! - [`Communicator`]: the physical transport

use shared_types::{Bundle, MessageHeader};
use thiserror::Error;

use crate::domain::UseCaseResult;

/// Business logic for one (code system, code) pair.
///
/// Handlers receive an envelope that already passed validation and must not
/// re-check profile or structure. Failures are reported as `fatal`/`invalid`
/// issues in the result, never by panicking.
pub trait UseCaseHandler: Send + Sync {
    fn handle(&self, header: &MessageHeader, envelope: &Bundle) -> UseCaseResult;

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Transport failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommunicatorError {
    /// No route to the receiver.
    #[error("Unknown receiver: {0}")]
    UnknownReceiver(String),

    /// The transport accepted the message but could not deliver it.
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Hands serialized envelopes to the transport.
///
/// Fire-and-forget: only success or failure is reported.
pub trait Communicator: Send + Sync {
    fn send(
        &self,
        sender: &str,
        receiver: &str,
        message_type: &str,
        payload: &str,
    ) -> Result<(), CommunicatorError>;
}
