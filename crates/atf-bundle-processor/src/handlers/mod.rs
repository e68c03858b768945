//! Built-in use-case handlers.
//!
//! | Code system | Code | Handler |
//! |-------------|------|---------|
//! | `operation-identifier-cs` | `atf;Empfangsbestaetigung` | [`ReceiptAcknowledgmentHandler`] |
//! | `service-identifier-cs` | `Selbsttest;Lieferung` | [`SelfTestDeliveryHandler`] |

mod receipt;

pub use receipt::ReceiptAcknowledgmentHandler;
pub use self_test::{SelfTestDeliveryHandler, SELF_TEST_ACCEPTED, SELF_TEST_FOCUS_NOT_FOUND};
