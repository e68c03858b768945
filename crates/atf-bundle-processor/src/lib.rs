//! # ATF Bundle Processor
//!
//! Validates inbound App Transport Framework (ATF) envelopes, routes them to a
//! use-case handler by `(eventCoding.system, eventCoding.code)` and sends a
//! correlated receipt back to the original sender when the handler reports
//! issues.
//!
//! ## Processing Rules
//!
//! | Situation | Result | Receipt |
//! |-----------|--------|---------|
//! | Not a bundle, wrong profile, no header | `DispatchOutcome::Rejected` | no |
//! | No handler for the use case | one `error`/`processing` issue | yes |
//! | Handler returns issues | all issues in one outcome report | yes |
//! | Handler returns no issues | done | no |
//! | Receipt cannot be addressed | `DispatchError::MissingAddressInformation` | no |
//! | A subscriber fails | `DispatchError::Notification` | partially |
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      OUTER LAYER                                │
//! │  adapters/ - Communicator implementations, channel bridge       │
//! │  service.rs - BundleProcessor (dispatch engine)                 │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MIDDLE LAYER                               │
//! │  ports/inbound.rs  - BundleProcessorApi trait                   │
//! │  ports/outbound.rs - UseCaseHandler, Communicator traits        │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      INNER LAYER                                │
//! │  domain/parser.rs         - EnvelopeValidator                   │
//! │  domain/registry.rs       - UseCaseRegistry                     │
//! │  domain/outcome.rs        - build_outcome                       │
//! │  domain/acknowledgment.rs - AcknowledgmentComposer              │
//! │  handlers/                - built-in use cases                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use atf_bundle_processor::{
//!     connect_communicator, BundleProcessor, BundleProcessorApi, LoggingCommunicator, NodeIdentity,
//! };
//!
//! let identity = NodeIdentity::new("receiver@gematik.kim.de", "Receiver", "https://receiver.example.com/endpoint");
//! let processor = BundleProcessor::with_builtin_handlers(identity.clone());
//! connect_communicator(processor.notifications(), Arc::new(LoggingCommunicator), identity.address);
//!
//! let outcome = processor.process_raw(&bytes)?;
//! ```

pub mod adapters;
pub mod domain;
pub mod handlers;
pub mod ports;
pub mod service;

pub use adapters::{
    connect_communicator, forward_to_communicator, LoggingCommunicator, RecordingCommunicator,
    SentMessage,
};
pub use domain::{
    build_outcome, AcknowledgmentComposer, DispatchError, DispatchOutcome, DispatchRoute,
    DispatchState, DispatchSummary, EnvelopeError, EnvelopeValidator, MessageBundleBuilder,
    MessageHeaderBuilder, NodeIdentity, OutgoingMessage, SelfTestMessageFactory, UseCaseCode,
    UseCaseRegistry, UseCaseResult, ValidatedEnvelope,
};
pub use handlers::{ReceiptAcknowledgmentHandler, SelfTestDeliveryHandler};
pub use ports::{BundleProcessorApi, Communicator, CommunicatorError, UseCaseHandler};
pub use service::BundleProcessor;
