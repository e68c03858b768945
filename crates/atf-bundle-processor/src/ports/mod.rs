//! Ports layer for the bundle processor.
//!
//! - Inbound (driving): the processing API
//! - Outbound (driven): use-case handlers and the transport

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
