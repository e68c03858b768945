//! # Inbound Port - BundleProcessorApi
//!
//! Driving port for inbound ATF messages.
//!
//! | Method | Input |
//! |--------|-------|
//! | `process_raw` | bytes as received from the transport |
//! | `process_json` | a JSON document |
//! | `process_bundle` | an already typed bundle |
//!
//! All three return `Ok(DispatchOutcome::Rejected(..))` for envelopes that
//! cannot be routed and `Err(..)` only when a receipt could not be addressed
//! or published.

use std::sync::Arc;

use shared_types::Bundle;

use crate::domain::{DispatchError, DispatchOutcome, UseCaseCode};
use crate::ports::outbound::UseCaseHandler;

/// Primary API of the bundle processor.
pub trait BundleProcessorApi: Send + Sync {
    fn process_raw(&self, bytes: &[u8]) -> Result<DispatchOutcome, DispatchError>;

    fn process_json(&self, json: &str) -> Result<DispatchOutcome, DispatchError> {
        self.process_raw(json.as_bytes())
    }

    fn process_bundle(&self, bundle: Bundle) -> Result<DispatchOutcome, DispatchError>;

    /// Install or replace the handler for a use case.
    ///
    /// Returns the replaced handler, if any. Takes effect for the next call.
    fn register_use_case(
        &self,
        code: UseCaseCode,
        handler: Arc<dyn UseCaseHandler>,
    ) -> Option<Arc<dyn UseCaseHandler>>;
}
