//! # ATF Node
//!
//! Runs one self-test exchange between two in-process peers and exits.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging and metrics (`ATF_LOG_LEVEL`, `ATF_JSON_LOGS`, ...)
//! 2. Load and validate the peer configuration (`ATF_SENDER_*`, `ATF_RECEIVER_*`)
//! 3. Build both peers and the transport
//! 4. Send the self-test and wait for the receipt
//! 5. Report the exchange; exit non-zero if it did not complete

use anyhow::{bail, Context, Result};
use atf_node::{run_exchange, NodeConfig};
use atf_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    let config = NodeConfig::from_env().context("Invalid node configuration")?;
    config.validate().context("Invalid node configuration")?;
    info!(
        sender = %config.sender.address,
        receiver = %config.receiver.address,
        delivery = ?config.delivery,
        "Starting ATF self-test exchange"
    );

    let report = run_exchange(&config)
        .await
        .context("Self-test exchange failed")?;
    report.log();

    if let Ok(metrics) = encode_metrics() {
        debug!(metrics = %metrics, "Dispatch metrics");
    }

    if !report.is_complete() {
        bail!(
            "Self-test {} did not complete ({} deliveries)",
            report.message_id,
            report.deliveries.len()
        );
    }

    info!(
        message_id = %report.message_id,
        severity = report.receipt_severity().map(|s| s.as_str()).unwrap_or("none"),
        "Self-test exchange complete"
    );
    Ok(())
}
