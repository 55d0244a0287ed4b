//! Metrics behaviour when `init_metrics()` was never called.
//!
//! This binary must never initialise the registry: every test here relies
//! on the process-global `OnceLock` staying empty.

use std::time::Duration;

use shipping_fee_engine::{metrics, EstimateRequest, ShippingEstimator};

#[test]
fn test_helpers_are_noops_before_init() {
    metrics::inc_estimate("fallback");
    metrics::inc_primary_failure("timeout");
    metrics::inc_fallback_tier("default");
    metrics::record_primary_latency("static", Duration::from_millis(1));

    assert_eq!(metrics::gather_metrics(), "");
    let summary = metrics::get_metrics_summary();
    assert!(summary.estimates_total.is_empty());
    assert!(summary.primary_failures.is_empty());
    assert!(summary.fallback_tiers.is_empty());
}

#[tokio::test]
async fn test_estimation_works_without_metrics() {
    let quote = ShippingEstimator::rules_only()
        .estimate_shipping_fee(&EstimateRequest::new("Manila", "Lipa", "Batangas"))
        .await;
    assert_eq!(quote.shipping_fee, 55.0);
    assert_eq!(metrics::gather_metrics(), "");
}
