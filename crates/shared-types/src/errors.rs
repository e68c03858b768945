//! # Error Types
//!
//! Errors raised while turning JSON documents into typed resources.

use thiserror::Error;

/// Errors that can occur while parsing or serializing resources.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The document is not valid JSON or does not fit the resource shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document has no `resourceType` discriminator.
    #[error("Missing resourceType")]
    MissingResourceType,

    /// The document is a different resource than the one requested.
    #[error("Unexpected resourceType: expected {expected}, found {found}")]
    UnexpectedResourceType { expected: String, found: String },

    /// A known resource type whose fields could not be decoded.
    #[error("Invalid {resource_type} resource: {reason}")]
    InvalidResource {
        resource_type: String,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_type_display() {
        let err = ResourceError::UnexpectedResourceType {
            expected: "Bundle".to_string(),
            found: "Patient".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Bundle"));
        assert!(msg.contains("Patient"));
    }
}
