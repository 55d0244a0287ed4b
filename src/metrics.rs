//! Prometheus metrics for the estimation engine.
//!
//! ## Usage
//!
//! Call [`init_metrics`] once at process startup. The helper functions
//! (`inc_estimate`, `inc_primary_failure`, …) are no-ops if `init_metrics`
//! was never called, so estimation is always safe to run and observability
//! simply degrades gracefully.
//!
//! ## Metrics Exposed
//!
//! | Name | Type | Labels |
//! |------|------|--------|
//! | `shipping_estimates_total` | Counter | `source` |
//! | `shipping_primary_failures_total` | Counter | `reason` |
//! | `shipping_fallback_tier_total` | Counter | `tier` |
//! | `shipping_primary_duration_seconds` | Histogram | `backend` |

use crate::EstimatorError;
use prometheus::{
    core::Collector, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

/// All Prometheus metrics for the engine, bundled so they can be stored in a
/// single [`OnceLock`] and initialised atomically.
pub struct Metrics {
    /// Prometheus registry that owns all metric descriptors.
    pub registry: Registry,
    /// Quotes returned, by the path that produced them.
    pub estimates_total: CounterVec,
    /// Primary-path failures by error kind.
    pub primary_failures: CounterVec,
    /// Fallback quotes by pricing tier.
    pub fallback_tiers: CounterVec,
    /// Completion call latency.
    pub primary_duration: HistogramVec,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

fn init_err(e: prometheus::Error) -> EstimatorError {
    EstimatorError::Other(format!("metrics init failed: {e}"))
}

fn register_err(e: prometheus::Error) -> EstimatorError {
    EstimatorError::Other(format!("metrics registration failed: {e}"))
}

/// Initialise all metrics and register them with a private registry.
///
/// Calling it a second time is a no-op (returns `Ok(())`).
///
/// # Errors
///
/// Returns [`EstimatorError::Other`] if metric construction or registration
/// fails.
pub fn init_metrics() -> Result<(), EstimatorError> {
    if METRICS.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let estimates_total = CounterVec::new(
        Opts::new("shipping_estimates_total", "Quotes returned by source"),
        &["source"],
    )
    .map_err(init_err)?;
    registry
        .register(Box::new(estimates_total.clone()))
        .map_err(register_err)?;

    let primary_failures = CounterVec::new(
        Opts::new(
            "shipping_primary_failures_total",
            "Primary estimator failures that fell back to rules",
        ),
        &["reason"],
    )
    .map_err(init_err)?;
    registry
        .register(Box::new(primary_failures.clone()))
        .map_err(register_err)?;

    let fallback_tiers = CounterVec::new(
        Opts::new("shipping_fallback_tier_total", "Fallback quotes by pricing tier"),
        &["tier"],
    )
    .map_err(init_err)?;
    registry
        .register(Box::new(fallback_tiers.clone()))
        .map_err(register_err)?;

    let primary_duration = HistogramVec::new(
        HistogramOpts::new(
            "shipping_primary_duration_seconds",
            "Completion service call duration",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 16.0]),
        &["backend"],
    )
    .map_err(init_err)?;
    registry
        .register(Box::new(primary_duration.clone()))
        .map_err(register_err)?;

    // If another thread raced us, the first one wins; both produce identical
    // descriptors.
    let _ = METRICS.set(Metrics {
        registry,
        estimates_total,
        primary_failures,
        fallback_tiers,
        primary_duration,
    });

    Ok(())
}

fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

/// Count a quote returned to the caller. `source` is `primary`, `fallback` or `cache`.
pub fn inc_estimate(source: &str) {
    if let Some(m) = metrics() {
        if let Ok(c) = m.estimates_total.get_metric_with_label_values(&[source]) {
            c.inc();
        }
    }
}

/// Count a primary-path failure by [`EstimatorError::kind`].
pub fn inc_primary_failure(reason: &str) {
    if let Some(m) = metrics() {
        if let Ok(c) = m.primary_failures.get_metric_with_label_values(&[reason]) {
            c.inc();
        }
    }
}

/// Count a fallback quote by tier label.
pub fn inc_fallback_tier(tier: &str) {
    if let Some(m) = metrics() {
        if let Ok(c) = m.fallback_tiers.get_metric_with_label_values(&[tier]) {
            c.inc();
        }
    }
}

/// Record how long a completion call took.
pub fn record_primary_latency(backend: &str, d: Duration) {
    if let Some(m) = metrics() {
        if let Ok(h) = m.primary_duration.get_metric_with_label_values(&[backend]) {
            h.observe(d.as_secs_f64());
        }
    }
}

/// Gather and encode all metrics in the Prometheus text exposition format.
///
/// Returns an empty string if metrics have not been initialised or encoding fails.
pub fn gather_metrics() -> String {
    let Some(m) = metrics() else {
        return String::new();
    };
    let families = m.registry.gather();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Snapshot of counter values keyed by label value.
#[derive(Debug, Default)]
pub struct MetricsSummary {
    /// Quotes by source.
    pub estimates_total: HashMap<String, u64>,
    /// Primary failures by reason.
    pub primary_failures: HashMap<String, u64>,
    /// Fallback quotes by tier.
    pub fallback_tiers: HashMap<String, u64>,
}

fn collect_counter(counter: &CounterVec, label: &str) -> HashMap<String, u64> {
    let mut out = HashMap::new();
    for family in counter.collect() {
        for metric in family.get_metric() {
            let key = metric
                .get_label()
                .iter()
                .find(|l| l.get_name() == label)
                .map_or("unknown", |l| l.get_value());
            out.insert(key.to_string(), metric.get_counter().get_value() as u64);
        }
    }
    out
}

/// Return current counter values. Zeroed if metrics were never initialised.
pub fn get_metrics_summary() -> MetricsSummary {
    let Some(m) = metrics() else {
        return MetricsSummary::default();
    };
    MetricsSummary {
        estimates_total: collect_counter(&m.estimates_total, "source"),
        primary_failures: collect_counter(&m.primary_failures, "reason"),
        fallback_tiers: collect_counter(&m.fallback_tiers, "tier"),
    }
}
