//! Value objects of the dispatch domain.

use std::fmt;

use shared_types::{
    Bundle, Coding, MessageHeader, MessageSource, OperationOutcomeIssue, Reference, Resource,
};

use super::errors::EnvelopeError;

// =============================================================================
// USE CASE CODE
// =============================================================================

/// Composite routing key: code system URI plus code.
///
/// Two codes are equal only if both parts are byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UseCaseCode {
    pub system: String,
    pub code: String,
}

impl UseCaseCode {
    pub fn new(system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            code: code.into(),
        }
    }

    /// Reads the code from a header's `eventCoding`.
    ///
    /// Returns `None` unless both system and code are present and non-empty.
    #[must_use]
    pub fn from_header(header: &MessageHeader) -> Option<Self> {
        let coding = header.event_coding.as_ref()?;
        let system = coding.system.as_deref().filter(|s| !s.is_empty())?;
        let code = coding.code.as_deref().filter(|c| !c.is_empty())?;
        Some(Self::new(system, code))
    }

    /// The code as an `eventCoding` with the given display text.
    #[must_use]
    pub fn to_coding(&self, display: &str) -> Coding {
        Coding::new(&self.system, &self.code, display)
    }
}

impl fmt::Display for UseCaseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.system, self.code)
    }
}

// =============================================================================
// NODE IDENTITY
// =============================================================================

/// Who this node is on the wire: its address, display name and endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    pub address: String,
    pub display: String,
    pub endpoint: String,
}

impl NodeIdentity {
    pub fn new(
        address: impl Into<String>,
        display: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            display: display.into(),
            endpoint: endpoint.into(),
        }
    }

    /// This node as a `sender`/`receiver` reference.
    #[must_use]
    pub fn reference(&self) -> Reference {
        Reference::participant(&self.address, &self.display)
    }

    /// This node as a header `source`.
    #[must_use]
    pub fn source(&self) -> MessageSource {
        MessageSource::endpoint(&self.endpoint)
    }
}

// =============================================================================
// HANDLER RESULT
// =============================================================================

/// What a use-case handler produced.
///
/// An empty `issues` list means no acknowledgment is required.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UseCaseResult {
    pub resources: Vec<Resource>,
    pub issues: Vec<OperationOutcomeIssue>,
}

impl UseCaseResult {
    /// A result with issues and nothing else.
    pub fn with_issues(issues: Vec<OperationOutcomeIssue>) -> Self {
        Self {
            resources: Vec::new(),
            issues,
        }
    }

    #[must_use]
    pub fn requires_acknowledgment(&self) -> bool {
        !self.issues.is_empty()
    }
}

// =============================================================================
// OUTGOING MESSAGE
// =============================================================================

/// An envelope ready to be handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub bundle: Bundle,
    /// Address of the receiving participant.
    pub receiver: String,
    /// Use-case label passed to the transport.
    pub message_type: String,
}

impl OutgoingMessage {
    /// The header of the outgoing envelope.
    #[must_use]
    pub fn header(&self) -> Option<&MessageHeader> {
        self.bundle.message_headers().next()
    }
}

// =============================================================================
// DISPATCH STATE
// =============================================================================

/// Stages one inbound envelope passes through.
///
/// ```text
/// Parsing ──→ Validated ──→ Routing ──→ Handling ──→ Acknowledging ──→ Done
///    │                         │            │              ↑
///    ↓                         ↓            └─→ Done       │
/// Rejected                 Unsupported ────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Parsing,
    Validated,
    Rejected,
    Routing,
    Handling,
    Unsupported,
    Acknowledging,
    Done,
}

impl DispatchState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Done)
    }

    #[must_use]
    pub fn can_transition_to(self, next: DispatchState) -> bool {
        use DispatchState::*;
        matches!(
            (self, next),
            (Parsing, Validated)
                | (Parsing, Rejected)
                | (Validated, Routing)
                | (Routing, Handling)
                | (Routing, Unsupported)
                | (Handling, Acknowledging)
                | (Handling, Done)
                | (Unsupported, Acknowledging)
                | (Acknowledging, Done)
        )
    }
}

/// How a use case was routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchRoute {
    /// A registered handler ran.
    Handled,
    /// No handler is registered for the code.
    Unsupported,
}

impl DispatchRoute {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Handled => "handled",
            Self::Unsupported => "unsupported",
        }
    }
}

// =============================================================================
// DISPATCH RESULT
// =============================================================================

/// Result of one `process` call that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The envelope was rejected before routing. Nothing was sent.
    Rejected(EnvelopeError),
    /// The envelope was routed.
    Done(DispatchSummary),
}

impl DispatchOutcome {
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    #[must_use]
    pub fn summary(&self) -> Option<&DispatchSummary> {
        match self {
            Self::Done(summary) => Some(summary),
            Self::Rejected(_) => None,
        }
    }

    #[must_use]
    pub fn rejection(&self) -> Option<&EnvelopeError> {
        match self {
            Self::Rejected(err) => Some(err),
            Self::Done(_) => None,
        }
    }
}

/// What happened to a routed envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchSummary {
    /// Id of the inbound header.
    pub message_id: String,
    pub use_case: UseCaseCode,
    pub route: DispatchRoute,
    /// Resources returned by the handler.
    pub resources: Vec<Resource>,
    /// Issues reported back to the sender, in order.
    pub issues: Vec<OperationOutcomeIssue>,
    /// The receipt that was published, if any.
    pub acknowledgment: Option<OutgoingMessage>,
    /// Subscribers that received the receipt.
    pub notified: usize,
}

impl DispatchSummary {
    #[must_use]
    pub fn acknowledged(&self) -> bool {
        self.acknowledgment.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{SERVICE_IDENTIFIER_CS, SELF_TEST_DELIVERY_CODE};

    #[test]
    fn test_use_case_code_from_header() {
        let header = MessageHeader {
            event_coding: Some(Coding::new(SERVICE_IDENTIFIER_CS, SELF_TEST_DELIVERY_CODE, "x")),
            ..Default::default()
        };
        assert_eq!(
            UseCaseCode::from_header(&header),
            Some(UseCaseCode::new(SERVICE_IDENTIFIER_CS, SELF_TEST_DELIVERY_CODE))
        );
    }

    #[test]
    fn test_use_case_code_requires_both_parts() {
        let header = MessageHeader {
            event_coding: Some(Coding {
                system: Some(SERVICE_IDENTIFIER_CS.into()),
                code: Some(String::new()),
                display: None,
            }),
            ..Default::default()
        };
        assert_eq!(UseCaseCode::from_header(&header), None);
        assert_eq!(UseCaseCode::from_header(&MessageHeader::default()), None);
    }

    #[test]
    fn test_use_case_code_is_case_sensitive() {
        assert_ne!(
            UseCaseCode::new("s", "Selbsttest;Lieferung"),
            UseCaseCode::new("s", "selbsttest;lieferung")
        );
    }

    #[test]
    fn test_state_transitions() {
        use DispatchState::*;
        assert!(Parsing.can_transition_to(Rejected));
        assert!(Unsupported.can_transition_to(Acknowledging));
        assert!(Handling.can_transition_to(Done));
        assert!(!Rejected.can_transition_to(Acknowledging));
        assert!(!Unsupported.can_transition_to(Done));
        assert!(Done.is_terminal());
        assert!(!Acknowledging.is_terminal());
    }

    #[test]
    fn test_node_identity_reference() {
        let node = NodeIdentity::new("a@kim.de", "A", "https://a.example.com");
        assert_eq!(node.reference().address(), Some("a@kim.de"));
        assert_eq!(node.source().endpoint_url.as_deref(), Some("https://a.example.com"));
    }
}
