//! Error types for the bundle processor.

use shared_bus::NotificationError;
use shared_types::ResourceError;
use thiserror::Error;

/// Reasons an inbound envelope is rejected before routing.
///
/// A rejected envelope is never acknowledged: without a usable header there is
/// nobody to address a receipt to.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The document is not a structurally valid message bundle.
    #[error("Malformed envelope: {reason}")]
    MalformedEnvelope { reason: String },

    /// `meta.profile[0]` is absent or not the ATF bundle profile.
    #[error("Unsupported envelope profile: {}", found.as_deref().unwrap_or("<none>"))]
    UnsupportedProfile { found: Option<String> },

    /// No entry carries a `MessageHeader`.
    #[error("Envelope contains no MessageHeader entry")]
    MissingHeader,
}

impl EnvelopeError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedEnvelope {
            reason: reason.into(),
        }
    }

    /// Label used for the rejection metric.
    #[must_use]
    pub fn reason_label(&self) -> &'static str {
        match self {
            Self::MalformedEnvelope { .. } => "malformed",
            Self::UnsupportedProfile { .. } => "unsupported_profile",
            Self::MissingHeader => "missing_header",
        }
    }
}

impl From<ResourceError> for EnvelopeError {
    fn from(err: ResourceError) -> Self {
        Self::malformed(err.to_string())
    }
}

/// Failures that abort a `process` call after the envelope was accepted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The original header lacks what is needed to address a receipt.
    #[error("Cannot address acknowledgment: original header has no {field}")]
    MissingAddressInformation { field: &'static str },

    /// A subscriber of the outgoing channel failed.
    #[error(transparent)]
    Notification(#[from] NotificationError),
}
