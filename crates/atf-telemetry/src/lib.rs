//! # ATF Telemetry
//!
//! Logging and metrics for ATF peers.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use atf_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&TelemetryConfig::from_env())?;
//!     // Envelopes processed from here on are logged and counted
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `atf-node` | Service name in logs |
//! | `ATF_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` as fallback) |
//! | `ATF_JSON_LOGS` | `false` | JSON log lines (`true` inside containers) |
//! | `ATF_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, ACKNOWLEDGMENTS_PUBLISHED,
    DISPATCH_DURATION, ENVELOPES_RECEIVED, ENVELOPES_REJECTED, USE_CASES_DISPATCHED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and register the metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    init_logging(config)?;
    register_metrics()?;
    Ok(())
}
