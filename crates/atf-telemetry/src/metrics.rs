//! Prometheus metrics for the ATF dispatch engine.
//!
//! All metrics follow the naming convention: `atf_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: envelopes received, acknowledgments published
//! - **CounterVec**: rejections by reason, dispatches by code and route
//! - **Histogram**: time spent processing one envelope

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // INBOUND ENVELOPES
    // =========================================================================

    /// Envelopes handed to the dispatch engine
    pub static ref ENVELOPES_RECEIVED: Counter = Counter::new(
        "atf_dispatch_envelopes_received_total",
        "Total number of envelopes handed to the dispatch engine"
    ).expect("metric creation failed");

    /// Envelopes rejected before dispatch
    pub static ref ENVELOPES_REJECTED: CounterVec = CounterVec::new(
        Opts::new("atf_dispatch_envelopes_rejected_total", "Envelopes rejected before dispatch"),
        &["reason"]  // malformed / unsupported_profile / missing_header
    ).expect("metric creation failed");

    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Use cases dispatched, by event code and route
    pub static ref USE_CASES_DISPATCHED: CounterVec = CounterVec::new(
        Opts::new("atf_dispatch_use_cases_total", "Use cases dispatched by code and route"),
        &["code", "route"]  // route: handled / unsupported; code is "unsupported" for unregistered codes
    ).expect("metric creation failed");

    /// Time spent processing one envelope, parse to publish
    pub static ref DISPATCH_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "atf_dispatch_duration_seconds",
            "Time spent processing one envelope"
        ).buckets(exponential_buckets(0.0001, 2.0, 14).unwrap_or_default())
    ).expect("metric creation failed");

    // =========================================================================
    // ACKNOWLEDGMENTS
    // =========================================================================

    /// Acknowledgments handed to the notification channel
    pub static ref ACKNOWLEDGMENTS_PUBLISHED: Counter = Counter::new(
        "atf_dispatch_acknowledgments_published_total",
        "Total number of acknowledgments published"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless: collectors that are already
/// registered are skipped.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(ENVELOPES_RECEIVED.clone()),
        Box::new(ENVELOPES_REJECTED.clone()),
        Box::new(USE_CASES_DISPATCHED.clone()),
        Box::new(DISPATCH_DURATION.clone()),
        Box::new(ACKNOWLEDGMENTS_PUBLISHED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_twice() {
        register_metrics().unwrap();
        register_metrics().unwrap();
    }

    #[test]
    fn test_counter_vec_labels() {
        USE_CASES_DISPATCHED
            .with_label_values(&["Selbsttest;Lieferung", "handled"])
            .inc();
        assert!(
            USE_CASES_DISPATCHED
                .with_label_values(&["Selbsttest;Lieferung", "handled"])
                .get()
                >= 1.0
        );
    }

    #[test]
    fn test_encode_contains_registered_metric() {
        register_metrics().unwrap();
        ENVELOPES_RECEIVED.inc();
        let text = encode_metrics().unwrap();
        assert!(text.contains("atf_dispatch_envelopes_received_total"));
    }

    #[test]
    fn test_histogram_timer() {
        let before = DISPATCH_DURATION.get_sample_count();
        {
            let _timer = HistogramTimer::new(&DISPATCH_DURATION);
        }
        assert!(DISPATCH_DURATION.get_sample_count() > before);
    }
}
