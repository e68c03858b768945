//! # Dispatch Engine
//!
//! Runs one inbound envelope to completion:
//!
//! ```text
//! parse/validate ──✗──→ Rejected (logged, nothing sent)
//!       │
//!       ↓
//!  route by (system, code)
//!       ├── hit ──→ handler ──→ issues? ──no──→ Done
//!       │                          │
//!       │                         yes
//!       │                          ↓
//!       └── miss ──→ error/processing issue ──→ outcome ──→ receipt ──→ notify ──→ Done
//! ```
//!
//! The engine never transmits anything itself; receipts leave through the
//! [`NotificationChannel`] only.

use std::sync::Arc;

use atf_telemetry::{
    HistogramTimer, ACKNOWLEDGMENTS_PUBLISHED, DISPATCH_DURATION, ENVELOPES_RECEIVED,
    ENVELOPES_REJECTED, USE_CASES_DISPATCHED,
};
use shared_bus::NotificationChannel;
use shared_types::{Bundle, IssueSeverity, IssueType, OperationOutcomeIssue};
use tracing::{debug, info, warn};

use crate::domain::{
    build_outcome, AcknowledgmentComposer, DispatchError, DispatchOutcome, DispatchRoute,
    DispatchState, DispatchSummary, EnvelopeError, EnvelopeValidator, NodeIdentity,
    OutgoingMessage, UseCaseCode, UseCaseRegistry, UseCaseResult, ValidatedEnvelope,
};
use crate::ports::{BundleProcessorApi, UseCaseHandler};

/// Diagnostics for a use case without a registered handler.
pub fn unsupported_use_case_diagnostics(code: &UseCaseCode) -> String {
    format!(
        "Die empfangene Nachricht mit dem {} kann nicht verarbeitet werden, da der Use-Case nicht unterstützt wird.",
        code.code
    )
}

/// Validates, routes and acknowledges inbound ATF envelopes for one node.
pub struct BundleProcessor {
    validator: EnvelopeValidator,
    registry: Arc<UseCaseRegistry>,
    composer: AcknowledgmentComposer,
    notifications: Arc<NotificationChannel<OutgoingMessage>>,
}

impl BundleProcessor {
    pub fn new(
        identity: NodeIdentity,
        registry: Arc<UseCaseRegistry>,
        notifications: Arc<NotificationChannel<OutgoingMessage>>,
    ) -> Self {
        Self {
            validator: EnvelopeValidator::default(),
            registry,
            composer: AcknowledgmentComposer::new(identity),
            notifications,
        }
    }

    /// A processor with the built-in handlers and its own channel.
    pub fn with_builtin_handlers(identity: NodeIdentity) -> Self {
        Self::new(
            identity,
            Arc::new(UseCaseRegistry::with_builtin_handlers()),
            Arc::new(NotificationChannel::new()),
        )
    }

    #[must_use]
    pub fn identity(&self) -> &NodeIdentity {
        self.composer.identity()
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<UseCaseRegistry> {
        &self.registry
    }

    /// The channel outgoing receipts are published on.
    #[must_use]
    pub fn notifications(&self) -> &Arc<NotificationChannel<OutgoingMessage>> {
        &self.notifications
    }

    fn process_with(
        &self,
        validate: impl FnOnce(&EnvelopeValidator) -> Result<ValidatedEnvelope, EnvelopeError>,
    ) -> Result<DispatchOutcome, DispatchError> {
        let _timer = HistogramTimer::new(&DISPATCH_DURATION);
        ENVELOPES_RECEIVED.inc();

        let mut state = DispatchState::Parsing;
        let envelope = match validate(&self.validator) {
            Ok(envelope) => envelope,
            Err(err) => {
                advance(&mut state, DispatchState::Rejected);
                ENVELOPES_REJECTED
                    .with_label_values(&[err.reason_label()])
                    .inc();
                warn!(error = %err, "Envelope rejected");
                return Ok(DispatchOutcome::Rejected(err));
            }
        };
        advance(&mut state, DispatchState::Validated);

        self.dispatch(envelope, state).map(DispatchOutcome::Done)
    }

    fn dispatch(
        &self,
        envelope: ValidatedEnvelope,
        mut state: DispatchState,
    ) -> Result<DispatchSummary, DispatchError> {
        let message_id = envelope.message_id().to_string();
        let use_case = envelope.use_case().clone();
        advance(&mut state, DispatchState::Routing);

        let (route, result) = match self.registry.lookup_code(&use_case) {
            Some(handler) => {
                advance(&mut state, DispatchState::Handling);
                debug!(
                    message_id = %message_id,
                    system = %use_case.system,
                    code = %use_case.code,
                    handler = handler.name(),
                    "Dispatching use case"
                );
                let result = handler.handle(envelope.header(), envelope.bundle());
                (DispatchRoute::Handled, result)
            }
            None => {
                advance(&mut state, DispatchState::Unsupported);
                warn!(
                    message_id = %message_id,
                    system = %use_case.system,
                    code = %use_case.code,
                    "Unsupported use case"
                );
                let issue = OperationOutcomeIssue::new(
                    IssueSeverity::Error,
                    IssueType::Processing,
                    unsupported_use_case_diagnostics(&use_case),
                );
                (DispatchRoute::Unsupported, UseCaseResult::with_issues(vec![issue]))
            }
        };

        USE_CASES_DISPATCHED
            .with_label_values(&[code_label(&use_case, route), route.as_str()])
            .inc();

        let mut summary = DispatchSummary {
            message_id,
            use_case,
            route,
            resources: result.resources,
            issues: Vec::new(),
            acknowledgment: None,
            notified: 0,
        };

        if result.issues.is_empty() {
            advance(&mut state, DispatchState::Done);
            info!(
                message_id = %summary.message_id,
                code = %summary.use_case.code,
                "Use case handled, no acknowledgment required"
            );
            return Ok(summary);
        }

        advance(&mut state, DispatchState::Acknowledging);
        summary.issues = result.issues;
        let report = build_outcome(&summary.message_id, summary.issues.clone());
        let message = self
            .composer
            .compose_acknowledgment(report, envelope.header())?;

        let notified = self.notifications.trigger(&message)?;
        ACKNOWLEDGMENTS_PUBLISHED.inc();
        info!(
            message_id = %summary.message_id,
            code = %summary.use_case.code,
            receiver = %message.receiver,
            issues = summary.issues.len(),
            subscribers = notified,
            "Acknowledgment published"
        );

        advance(&mut state, DispatchState::Done);
        summary.acknowledgment = Some(message);
        summary.notified = notified;
        Ok(summary)
    }
}

/// Metric label for a dispatched code.
///
/// Unregistered codes are chosen by the remote peer, so they all share one
/// series. Handled codes are bounded by the registry.
fn code_label(use_case: &UseCaseCode, route: DispatchRoute) -> &str {
    match route {
        DispatchRoute::Handled => use_case.code.as_str(),
        DispatchRoute::Unsupported => DispatchRoute::Unsupported.as_str(),
    }
}

fn advance(state: &mut DispatchState, next: DispatchState) {
    debug_assert!(
        state.can_transition_to(next),
        "invalid dispatch transition {state:?} -> {next:?}"
    );
    debug!(from = ?state, to = ?next, "Dispatch state");
    *state = next;
}

impl BundleProcessorApi for BundleProcessor {
    fn process_raw(&self, bytes: &[u8]) -> Result<DispatchOutcome, DispatchError> {
        self.process_with(|validator| validator.parse_slice(bytes))
    }

    fn process_bundle(&self, bundle: Bundle) -> Result<DispatchOutcome, DispatchError> {
        self.process_with(|validator| validator.validate(bundle))
    }

    fn register_use_case(
        &self,
        code: UseCaseCode,
        handler: Arc<dyn UseCaseHandler>,
    ) -> Option<Arc<dyn UseCaseHandler>> {
        self.registry.register_code(code, handler)
    }
}

impl std::fmt::Debug for BundleProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleProcessor")
            .field("identity", self.identity())
            .field("registry", &self.registry)
            .field("subscribers", &self.notifications.subscriber_count())
            .finish()
    }
}
