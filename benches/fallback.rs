//! Rule-engine and orchestrator benchmarks.
//!
//! The fallback path runs on every primary failure, so it must stay cheap
//! relative to a completion round-trip (hundreds of milliseconds).

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use tokio::runtime::Runtime;
use shipping_fee_engine::fallback::classify;
use shipping_fee_engine::geo::normalize;
use shipping_fee_engine::{
    EstimateRequest, QuoteCache, RuleEstimator, ShippingEstimator, StaticCompletion,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sample_requests() -> Vec<EstimateRequest> {
    vec![
        EstimateRequest::new("Manila", "Manila", "Metro Manila"),
        EstimateRequest::new("Quezon City", "Lipa", "Batangas").with_weight(2.0),
        EstimateRequest::new("Metro Manila", "Cebu City", "Cebu").with_weight(3.5),
        EstimateRequest::new("Cebu City", "Davao City", "Davao del Sur"),
        EstimateRequest::new("Cagayan de Oro", "Zamboanga City", "Zamboanga del Sur"),
        EstimateRequest::new("", "Somewhere", "Atlantis").with_weight(12.0),
    ]
}

// ---------------------------------------------------------------------------
// Bench: location normalization and tier classification
// ---------------------------------------------------------------------------

fn bench_normalize(c: &mut Criterion) {
    c.bench_function("normalize_location", |b| {
        b.iter(|| normalize(black_box("  Las Piñas City,   METRO Manila ")))
    });
}

fn bench_classify(c: &mut Criterion) {
    let requests = sample_requests();
    let mut group = c.benchmark_group("classify");
    for (i, req) in requests.iter().enumerate() {
        group.bench_with_input(BenchmarkId::new("request", i), req, |b, req| {
            b.iter(|| classify(black_box(req)))
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Bench: full fallback quote
// ---------------------------------------------------------------------------

fn bench_rule_quote(c: &mut Criterion) {
    let estimator = RuleEstimator::new();
    let requests = sample_requests();
    c.bench_function("rule_quote_batch", |b| {
        b.iter(|| {
            for req in &requests {
                black_box(estimator.quote(black_box(req)));
            }
        })
    });
}

// ---------------------------------------------------------------------------
// Bench: orchestrator overhead with an instant primary, cached and uncached
// ---------------------------------------------------------------------------

fn bench_orchestrator(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let service = Arc::new(StaticCompletion::reply(r#"{"shippingFee": 95, "estimatedDays": 3}"#));
    let uncached = ShippingEstimator::with_service(service.clone());
    let cached = ShippingEstimator::with_service(service).with_cache(QuoteCache::new(1000, 3600));
    let req = EstimateRequest::new("Metro Manila", "Cebu City", "Cebu");

    let mut group = c.benchmark_group("orchestrator");
    group.bench_function("primary_uncached", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(uncached.estimate_shipping_fee(&req).await) })
    });
    group.bench_function("primary_cached", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(cached.estimate_shipping_fee(&req).await) })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_normalize,
    bench_classify,
    bench_rule_quote,
    bench_orchestrator
);
criterion_main!(benches);
