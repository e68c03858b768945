//! # Self-Test Exchange
//!
//! Wires a sender and a receiver peer through an [`InProcessTransport`] and
//! runs one self-test:
//!
//! ```text
//! sender ──Selbsttest;Lieferung──→ receiver
//!    ↑                                │
//!    └────atf;Empfangsbestaetigung────┘
//! ```
//!
//! The receiver answers with an informational receipt; the sender consumes it
//! with the receipt handler and the exchange ends.

use std::sync::Arc;
use std::time::Duration;

use atf_bundle_processor::{DispatchOutcome, DispatchRoute};
use shared_types::{IssueSeverity, Resource, RECEIPT_ACKNOWLEDGMENT_CODE, SELF_TEST_DELIVERY_CODE};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::{DeliveryMode, NodeConfig};
use crate::peer::PeerNode;
use crate::transport::{Delivery, InProcessTransport};

/// Deliveries of one complete exchange: request and receipt.
const EXPECTED_DELIVERIES: usize = 2;

/// Default time allowed for an asynchronous exchange.
pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Exchange failures.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("Self-test could not be sent: {0}")]
    Send(#[from] shared_bus::NotificationError),

    #[error("Exchange did not complete within {0:?}")]
    Timeout(Duration),
}

/// The two peers and the transport between them.
pub struct Network {
    pub sender: PeerNode,
    pub receiver: PeerNode,
    pub transport: Arc<InProcessTransport>,
}

impl Network {
    /// Build both peers and attach them to a fresh transport.
    ///
    /// Delivery is not connected yet; see [`connect_sync`](Self::connect_sync)
    /// and [`run_async`](Self::run_async).
    pub fn new(config: &NodeConfig) -> Self {
        let sender = PeerNode::new("sender", config.sender.identity());
        let receiver = PeerNode::new("receiver", config.receiver.identity());
        let transport = Arc::new(InProcessTransport::new());
        transport.attach(sender.address(), sender.processor());
        transport.attach(receiver.address(), receiver.processor());
        Self {
            sender,
            receiver,
            transport,
        }
    }

    /// Deliver inside `trigger` on both peers.
    pub fn connect_sync(&self) {
        self.sender.connect(self.transport.clone());
        self.receiver.connect(self.transport.clone());
    }

    /// Run the exchange with synchronous delivery.
    pub fn run_sync(&self) -> Result<ExchangeReport, ExchangeError> {
        self.connect_sync();
        let message_id = self
            .sender
            .send_self_test(self.receiver.identity())?;
        Ok(ExchangeReport::new(message_id, self.transport.deliveries()))
    }

    /// Run the exchange with one delivery task per peer.
    pub async fn run_async(&self, timeout: Duration) -> Result<ExchangeReport, ExchangeError> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let loops = [
            self.sender
                .spawn_delivery_loop(self.transport.clone(), shutdown_rx.clone()),
            self.receiver
                .spawn_delivery_loop(self.transport.clone(), shutdown_rx),
        ];

        let mut delivered = self.transport.watch_deliveries();
        let message_id = self
            .sender
            .send_self_test(self.receiver.identity())?;

        // The watch guard must not outlive this statement: deliveries still in
        // flight need the write side.
        let completed = tokio::time::timeout(
            timeout,
            delivered.wait_for(|count| *count >= EXPECTED_DELIVERIES),
        )
        .await
        .map(|waited| waited.is_ok())
        .unwrap_or(false);

        let _ = shutdown_tx.send(true);
        for handle in loops {
            if let Err(err) = handle.await {
                warn!(error = %err, "Delivery loop ended abnormally");
            }
        }

        if !completed {
            return Err(ExchangeError::Timeout(timeout));
        }
        Ok(ExchangeReport::new(message_id, self.transport.deliveries()))
    }
}

/// What happened during one self-test exchange.
#[derive(Debug, Clone)]
pub struct ExchangeReport {
    /// Header id of the self-test message.
    pub message_id: String,
    pub deliveries: Vec<Delivery>,
}

impl ExchangeReport {
    fn new(message_id: String, deliveries: Vec<Delivery>) -> Self {
        Self {
            message_id,
            deliveries,
        }
    }

    /// The self-test as delivered to the receiver.
    #[must_use]
    pub fn request(&self) -> Option<&Delivery> {
        self.deliveries
            .iter()
            .find(|d| d.message_type == SELF_TEST_DELIVERY_CODE)
    }

    /// The receipt as delivered back to the sender.
    #[must_use]
    pub fn receipt(&self) -> Option<&Delivery> {
        self.deliveries
            .iter()
            .find(|d| d.message_type == RECEIPT_ACKNOWLEDGMENT_CODE)
    }

    /// Highest severity the receiver reported for the self-test.
    #[must_use]
    pub fn receipt_severity(&self) -> Option<IssueSeverity> {
        let summary = match &self.request()?.outcome {
            Ok(DispatchOutcome::Done(summary)) => summary,
            _ => return None,
        };
        let report = summary
            .acknowledgment
            .as_ref()?
            .bundle
            .resources()
            .find_map(Resource::as_operation_outcome)?;
        report.highest_severity()
    }

    /// True when the receiver handled the self-test and the sender consumed
    /// the receipt without answering it.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let handled = |delivery: Option<&Delivery>| {
            matches!(
                delivery.map(|d| &d.outcome),
                Some(Ok(DispatchOutcome::Done(summary))) if summary.route == DispatchRoute::Handled
            )
        };
        let receipt_terminal = matches!(
            self.receipt().map(|d| &d.outcome),
            Some(Ok(DispatchOutcome::Done(summary))) if !summary.acknowledged()
        );
        handled(self.request()) && handled(self.receipt()) && receipt_terminal
    }

    pub fn log(&self) {
        for delivery in &self.deliveries {
            match &delivery.outcome {
                Ok(DispatchOutcome::Done(summary)) => info!(
                    sender = %delivery.sender,
                    receiver = %delivery.receiver,
                    message_type = %delivery.message_type,
                    route = summary.route.as_str(),
                    acknowledged = summary.acknowledged(),
                    "Delivery processed"
                ),
                Ok(DispatchOutcome::Rejected(err)) => warn!(
                    sender = %delivery.sender,
                    receiver = %delivery.receiver,
                    error = %err,
                    "Delivery rejected"
                ),
                Err(err) => warn!(
                    sender = %delivery.sender,
                    receiver = %delivery.receiver,
                    error = %err,
                    "Delivery failed"
                ),
            }
        }
    }
}

/// Build the network from `config` and run one exchange in its delivery mode.
pub async fn run_exchange(config: &NodeConfig) -> Result<ExchangeReport, ExchangeError> {
    let network = Network::new(config);
    match config.delivery {
        DeliveryMode::Sync => network.run_sync(),
        DeliveryMode::Async => network.run_async(DEFAULT_EXCHANGE_TIMEOUT).await,
    }
}
