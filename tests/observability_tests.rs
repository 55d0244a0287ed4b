//! Observability integration tests
//!
//! Tests in this module verify:
//! - `init_metrics()` succeeds and is idempotent
//! - `gather_metrics()` returns valid Prometheus text format
//! - Every quote is counted by source, and fallbacks by tier and reason
//!
//! Behaviour before `init_metrics()` lives in `metrics_uninitialized.rs`,
//! a separate test binary in which nothing initialises the registry.
//!
//! Counters are process-global and tests run in parallel, so assertions
//! check that a counter grew rather than its exact total.

use std::sync::Arc;

use shipping_fee_engine::{metrics, EstimateRequest, ShippingEstimator, StaticCompletion};

fn count(map: &std::collections::HashMap<String, u64>, key: &str) -> u64 {
    map.get(key).copied().unwrap_or(0)
}

// ── init_metrics ──────────────────────────────────────────────────────

#[test]
fn test_init_metrics_succeeds_on_first_call() {
    let result = metrics::init_metrics();
    assert!(result.is_ok(), "init_metrics should succeed: {result:?}");
}

#[test]
fn test_init_metrics_double_call_is_idempotent() {
    let _ = metrics::init_metrics();
    let result = metrics::init_metrics();
    assert!(
        result.is_ok(),
        "second init_metrics must be a no-op returning Ok"
    );
}

// ── gather_metrics ────────────────────────────────────────────────────

#[test]
fn test_gather_metrics_returns_valid_prometheus_format() {
    let _ = metrics::init_metrics();
    metrics::inc_estimate("test-gather");

    let output = metrics::gather_metrics();
    assert!(
        output.contains("shipping_estimates_total"),
        "Prometheus output must contain the estimates counter"
    );
    assert!(output.contains("# TYPE shipping_estimates_total counter"));
}

// ── Orchestrator accounting ───────────────────────────────────────────

#[tokio::test]
async fn test_fallback_quote_counted_by_source_and_tier() {
    metrics::init_metrics().expect("test: metrics init");
    let before = metrics::get_metrics_summary();

    let estimator = ShippingEstimator::rules_only();
    estimator
        .estimate_shipping_fee(&EstimateRequest::new("Pangasinan", "Davao City", "Davao"))
        .await;

    let after = metrics::get_metrics_summary();
    assert!(count(&after.estimates_total, "fallback") > count(&before.estimates_total, "fallback"));
    assert!(
        count(&after.fallback_tiers, "luzon_mindanao")
            > count(&before.fallback_tiers, "luzon_mindanao")
    );
}

#[tokio::test]
async fn test_primary_failure_counted_by_reason() {
    metrics::init_metrics().expect("test: metrics init");
    let before = metrics::get_metrics_summary();

    let estimator = ShippingEstimator::with_service(Arc::new(StaticCompletion::reply("{}")));
    estimator
        .estimate_shipping_fee(&EstimateRequest::new("Manila", "Manila", ""))
        .await;

    let after = metrics::get_metrics_summary();
    assert!(
        count(&after.primary_failures, "malformed") > count(&before.primary_failures, "malformed")
    );
}

#[tokio::test]
async fn test_primary_success_counted_and_timed() {
    metrics::init_metrics().expect("test: metrics init");
    let before = metrics::get_metrics_summary();

    let estimator = ShippingEstimator::with_service(Arc::new(StaticCompletion::reply(
        r#"{"shippingFee": 60}"#,
    )));
    let quote = estimator
        .estimate_shipping_fee(&EstimateRequest::new("Manila", "Cebu City", "Cebu"))
        .await;
    assert_eq!(quote.shipping_fee, 60.0);

    let after = metrics::get_metrics_summary();
    assert!(count(&after.estimates_total, "primary") > count(&before.estimates_total, "primary"));
    assert!(metrics::gather_metrics().contains("shipping_primary_duration_seconds"));
}
