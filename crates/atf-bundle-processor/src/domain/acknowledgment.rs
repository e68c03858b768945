//! Receipt acknowledgments.
//!
//! A receipt is a fresh message bundle whose only payload is the outcome
//! report. It is addressed back to whoever sent the original message:
//!
//! | Receipt field | Taken from |
//! |---------------|------------|
//! | `destination.endpointUrl` | original `source.endpointUrl` |
//! | `destination.receiver` | original `sender` |
//! | `sender`, `source` | this node's identity |
//! | `focus` | locator of the outcome report |

use shared_types::{
    Coding, MessageHeader, OperationOutcome, Resource, OPERATION_IDENTIFIER_CS,
    RECEIPT_ACKNOWLEDGMENT_CODE, RECEIPT_ACKNOWLEDGMENT_DISPLAY,
};
use tracing::error;

use super::builders::{MessageBundleBuilder, MessageHeaderBuilder};
use super::errors::DispatchError;
use super::value_objects::{NodeIdentity, OutgoingMessage};

/// Wraps outcome reports into receipts sent by one node.
#[derive(Debug, Clone)]
pub struct AcknowledgmentComposer {
    identity: NodeIdentity,
}

impl AcknowledgmentComposer {
    pub fn new(identity: NodeIdentity) -> Self {
        Self { identity }
    }

    #[must_use]
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Build the receipt for `original` carrying `report`.
    ///
    /// Fails with [`DispatchError::MissingAddressInformation`] when the
    /// original header has no source endpoint or no sender address.
    pub fn compose_acknowledgment(
        &self,
        report: OperationOutcome,
        original: &MessageHeader,
    ) -> Result<OutgoingMessage, DispatchError> {
        let endpoint = original.source_endpoint().ok_or_else(|| {
            error!(message_id = ?original.id, "Original header has no source endpoint");
            DispatchError::MissingAddressInformation {
                field: "source.endpointUrl",
            }
        })?;
        let (receiver, address) = original
            .sender
            .as_ref()
            .and_then(|sender| sender.address().map(|address| (sender, address)))
            .ok_or_else(|| {
                error!(message_id = ?original.id, "Original header has no sender address");
                DispatchError::MissingAddressInformation {
                    field: "sender.identifier.value",
                }
            })?;

        let report_id = report.id.clone().unwrap_or_default();
        let header = MessageHeaderBuilder::new(Coding::new(
            OPERATION_IDENTIFIER_CS,
            RECEIPT_ACKNOWLEDGMENT_CODE,
            RECEIPT_ACKNOWLEDGMENT_DISPLAY,
        ))
        .sender(self.identity.reference())
        .source(self.identity.source())
        .destination(endpoint, receiver.clone())
        .focus(&report_id)
        .build();

        let bundle = MessageBundleBuilder::new(header)
            .payload(Resource::OperationOutcome(report))
            .build();

        Ok(OutgoingMessage {
            bundle,
            receiver: address.to_string(),
            message_type: RECEIPT_ACKNOWLEDGMENT_CODE.to_string(),
        })
    }
}
