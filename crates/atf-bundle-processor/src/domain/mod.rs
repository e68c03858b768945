//! # Domain Layer - Bundle Processor
//!
//! ## Components
//!
//! - `parser`: raw document to [`ValidatedEnvelope`], or [`EnvelopeError`]
//! - `registry`: [`UseCaseRegistry`], use-case code to handler
//! - `outcome`: [`build_outcome`], correlated outcome reports
//! - `acknowledgment`: [`AcknowledgmentComposer`], receipts to the original sender
//! - `builders`: header and message bundle builders
//! - `self_test`: [`SelfTestMessageFactory`]
//! - `value_objects`: codes, identities, dispatch states and results
//! - `errors`: [`EnvelopeError`], [`DispatchError`]

pub mod acknowledgment;
pub mod builders;
pub mod errors;
pub mod outcome;
pub mod parser;
pub mod registry;
pub mod value_objects;

pub use acknowledgment::AcknowledgmentComposer;
pub use builders::{MessageBundleBuilder, MessageHeaderBuilder};
pub use errors::*;
pub use outcome::build_outcome;
pub use parser::{EnvelopeValidator, ValidatedEnvelope};
pub use registry::UseCaseRegistry;
pub use self_test::SelfTestMessageFactory;
pub use value_objects::*;
