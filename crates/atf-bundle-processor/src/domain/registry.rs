//! # Use-Case Registry
//!
//! Maps [`UseCaseCode`]s to handlers.
//!
//! Single writer, many readers: `lookup` clones the handler `Arc` and
//! releases the lock before the handler runs, so a slow handler never blocks
//! registration and a handler may itself register further use cases.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use shared_types::{
    OPERATION_IDENTIFIER_CS, RECEIPT_ACKNOWLEDGMENT_CODE, SELF_TEST_DELIVERY_CODE,
    SERVICE_IDENTIFIER_CS,
};
use tracing::{debug, info};

use super::value_objects::UseCaseCode;
use crate::handlers::{ReceiptAcknowledgmentHandler, SelfTestDeliveryHandler};
use crate::ports::UseCaseHandler;

/// Handlers by use-case code.
#[derive(Default)]
pub struct UseCaseRegistry {
    handlers: RwLock<HashMap<UseCaseCode, Arc<dyn UseCaseHandler>>>,
}

impl UseCaseRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the receipt-acknowledgment and self-test handlers.
    #[must_use]
    pub fn with_builtin_handlers() -> Self {
        let registry = Self::new();
        registry.register(
            OPERATION_IDENTIFIER_CS,
            RECEIPT_ACKNOWLEDGMENT_CODE,
            Arc::new(ReceiptAcknowledgmentHandler),
        );
        registry.register(
            SERVICE_IDENTIFIER_CS,
            SELF_TEST_DELIVERY_CODE,
            Arc::new(SelfTestDeliveryHandler),
        );
        registry
    }

    /// Install a handler, replacing any handler for the same code.
    pub fn register(
        &self,
        system: &str,
        code: &str,
        handler: Arc<dyn UseCaseHandler>,
    ) -> Option<Arc<dyn UseCaseHandler>> {
        self.register_code(UseCaseCode::new(system, code), handler)
    }

    /// Same as [`register`](Self::register) with a prepared code.
    pub fn register_code(
        &self,
        code: UseCaseCode,
        handler: Arc<dyn UseCaseHandler>,
    ) -> Option<Arc<dyn UseCaseHandler>> {
        let name = handler.name().to_string();
        let previous = self.handlers.write().insert(code.clone(), handler);
        match &previous {
            Some(_) => info!(use_case = %code, handler = %name, "Use-case handler replaced"),
            None => debug!(use_case = %code, handler = %name, "Use-case handler registered"),
        }
        previous
    }

    /// Remove the handler for a code.
    pub fn unregister(&self, system: &str, code: &str) -> Option<Arc<dyn UseCaseHandler>> {
        self.handlers.write().remove(&UseCaseCode::new(system, code))
    }

    /// The handler for a code, compared by exact string equality.
    #[must_use]
    pub fn lookup(&self, system: &str, code: &str) -> Option<Arc<dyn UseCaseHandler>> {
        self.lookup_code(&UseCaseCode::new(system, code))
    }

    #[must_use]
    pub fn lookup_code(&self, code: &UseCaseCode) -> Option<Arc<dyn UseCaseHandler>> {
        self.handlers.read().get(code).cloned()
    }

    #[must_use]
    pub fn contains(&self, system: &str, code: &str) -> bool {
        self.handlers
            .read()
            .contains_key(&UseCaseCode::new(system, code))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Registered codes, sorted.
    #[must_use]
    pub fn codes(&self) -> Vec<UseCaseCode> {
        let mut codes: Vec<_> = self.handlers.read().keys().cloned().collect();
        codes.sort();
        codes
    }
}

impl std::fmt::Debug for UseCaseRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UseCaseRegistry")
            .field("codes", &self.codes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UseCaseResult;
    use shared_types::{Bundle, MessageHeader, OperationOutcomeIssue};

    struct FixedHandler(&'static str);

    impl UseCaseHandler for FixedHandler {
        fn handle(&self, _header: &MessageHeader, _envelope: &Bundle) -> UseCaseResult {
            UseCaseResult::with_issues(vec![OperationOutcomeIssue::informational(self.0)])
        }
    }

    fn run(handler: &Arc<dyn UseCaseHandler>) -> String {
        let result = handler.handle(&MessageHeader::default(), &Bundle::default());
        result.issues[0].diagnostics.clone().unwrap()
    }

    #[test]
    fn test_builtin_handlers() {
        let registry = UseCaseRegistry::with_builtin_handlers();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(OPERATION_IDENTIFIER_CS, RECEIPT_ACKNOWLEDGMENT_CODE));
        assert!(registry.contains(SERVICE_IDENTIFIER_CS, SELF_TEST_DELIVERY_CODE));
    }

    #[test]
    fn test_lookup_miss() {
        let registry = UseCaseRegistry::with_builtin_handlers();
        assert!(registry.lookup(SERVICE_IDENTIFIER_CS, "Unbekannt").is_none());
        // Same code under another system is a different use case.
        assert!(registry
            .lookup(OPERATION_IDENTIFIER_CS, SELF_TEST_DELIVERY_CODE)
            .is_none());
    }

    #[test]
    fn test_reregistering_replaces_handler() {
        let registry = UseCaseRegistry::new();
        assert!(registry.register("s", "c", Arc::new(FixedHandler("old"))).is_none());

        let previous = registry.register("s", "c", Arc::new(FixedHandler("new"))).unwrap();
        assert_eq!(run(&previous), "old");
        assert_eq!(run(&registry.lookup("s", "c").unwrap()), "new");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister() {
        let registry = UseCaseRegistry::new();
        registry.register("s", "c", Arc::new(FixedHandler("x")));
        assert!(registry.unregister("s", "c").is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_lookup_releases_lock_before_handle() {
        struct RegisteringHandler(Arc<UseCaseRegistry>);

        impl UseCaseHandler for RegisteringHandler {
            fn handle(&self, _header: &MessageHeader, _envelope: &Bundle) -> UseCaseResult {
                self.0.register("s", "late", Arc::new(FixedHandler("late")));
                UseCaseResult::default()
            }
        }

        let registry = Arc::new(UseCaseRegistry::new());
        registry.register("s", "c", Arc::new(RegisteringHandler(Arc::clone(&registry))));

        let handler = registry.lookup("s", "c").unwrap();
        handler.handle(&MessageHeader::default(), &Bundle::default());
        assert!(registry.contains("s", "late"));
    }
}
