//! # OperationOutcome
//!
//! The structured report carried by receipts. Issue order is significant and
//! preserved exactly as built.

use serde::{Deserialize, Serialize};

use crate::constants::MESSAGE_ID_EXTENSION;
use crate::entities::{Extension, Meta};

/// How severe an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Fatal,
    Error,
    Warning,
    Information,
}

impl IssueSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fatal => "fatal",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Information => "information",
        }
    }
}

/// Category of an issue (FHIR `issue-type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    Invalid,
    Structure,
    Required,
    Value,
    Invariant,
    Security,
    Login,
    Unknown,
    Expired,
    Forbidden,
    Suppressed,
    Processing,
    NotSupported,
    Duplicate,
    MultipleMatches,
    NotFound,
    Deleted,
    TooLong,
    CodeInvalid,
    Extension,
    TooCostly,
    BusinessRule,
    Conflict,
    Transient,
    LockError,
    NoStore,
    Exception,
    Timeout,
    Incomplete,
    Throttled,
    Informational,
}

/// One diagnostic line of an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcomeIssue {
    pub severity: IssueSeverity,
    pub code: IssueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

impl OperationOutcomeIssue {
    pub fn new(severity: IssueSeverity, code: IssueType, diagnostics: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            diagnostics: Some(diagnostics.into()),
        }
    }

    /// An `information`/`informational` issue.
    pub fn informational(diagnostics: impl Into<String>) -> Self {
        Self::new(IssueSeverity::Information, IssueType::Informational, diagnostics)
    }
}

/// A structured processing report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
    #[serde(default)]
    pub issue: Vec<OperationOutcomeIssue>,
}

impl OperationOutcome {
    /// The id of the message this outcome answers, if embedded.
    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        self.extension
            .iter()
            .find(|ext| ext.url == MESSAGE_ID_EXTENSION)
            .and_then(|ext| ext.value_string.as_deref())
    }

    /// The most severe issue level, `None` for an empty outcome.
    #[must_use]
    pub fn highest_severity(&self) -> Option<IssueSeverity> {
        self.issue.iter().map(|issue| issue.severity).min()
    }

    /// True if any issue is `fatal` or `error`.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        matches!(
            self.highest_severity(),
            Some(IssueSeverity::Fatal | IssueSeverity::Error)
        )
    }
}
