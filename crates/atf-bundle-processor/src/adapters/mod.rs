//! Adapters layer for the bundle processor.
//!
//! Transport implementations and the bridge from the outgoing notification
//! channel to a transport.

pub mod communicator;
pub mod publisher;

pub use communicator::{LoggingCommunicator, RecordingCommunicator, SentMessage};
pub use publisher::{connect_communicator, forward_to_communicator};
