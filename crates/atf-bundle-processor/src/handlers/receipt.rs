//! Handler for incoming receipts.
//!
//! A receipt ends an exchange. It is logged and never answered, otherwise two
//! peers would acknowledge each other's acknowledgments forever.

use shared_types::{Bundle, MessageHeader, OperationOutcome, Resource};
use tracing::{info, warn};

use crate::domain::UseCaseResult;
use crate::ports::UseCaseHandler;

/// Consumes `atf;Empfangsbestaetigung` messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReceiptAcknowledgmentHandler;

impl ReceiptAcknowledgmentHandler {
    /// The outcome a receipt reports: the focused one, or the first in the bundle.
    fn find_outcome<'a>(header: &MessageHeader, envelope: &'a Bundle) -> Option<&'a OperationOutcome> {
        header
            .focus_locators()
            .filter_map(|locator| envelope.resolve(locator))
            .filter_map(|entry| entry.resource.as_ref())
            .find_map(Resource::as_operation_outcome)
            .or_else(|| envelope.resources().find_map(Resource::as_operation_outcome))
    }
}

impl UseCaseHandler for ReceiptAcknowledgmentHandler {
    fn handle(&self, header: &MessageHeader, envelope: &Bundle) -> UseCaseResult {
        let message_id = header.id.as_deref().unwrap_or_default();

        let Some(outcome) = Self::find_outcome(header, envelope) else {
            warn!(message_id, "Receipt carries no OperationOutcome");
            return UseCaseResult::default();
        };

        info!(
            message_id,
            correlation_id = outcome.correlation_id().unwrap_or("<none>"),
            issues = outcome.issue.len(),
            has_errors = outcome.has_errors(),
            "Receipt received"
        );
        for issue in &outcome.issue {
            info!(
                message_id,
                severity = issue.severity.as_str(),
                code = ?issue.code,
                diagnostics = issue.diagnostics.as_deref().unwrap_or_default(),
                "Receipt issue"
            );
        }

        UseCaseResult::default()
    }

    fn name(&self) -> &str {
        "receipt-acknowledgment"
    }
}
