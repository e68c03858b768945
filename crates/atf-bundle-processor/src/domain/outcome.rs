//! Outcome reports.

use shared_types::{
    new_resource_id, Extension, Meta, OperationOutcome, OperationOutcomeIssue,
    MESSAGE_ID_EXTENSION, OPERATION_OUTCOME_PROFILE,
};

/// Builds an outcome report answering the message with `correlation_id`.
///
/// The report gets a fresh id; `issues` are kept in the given order.
pub fn build_outcome(correlation_id: &str, issues: Vec<OperationOutcomeIssue>) -> OperationOutcome {
    OperationOutcome {
        id: Some(new_resource_id()),
        meta: Some(Meta::with_profile(OPERATION_OUTCOME_PROFILE)),
        extension: vec![Extension::string(MESSAGE_ID_EXTENSION, correlation_id)],
        issue: issues,
    }
}
