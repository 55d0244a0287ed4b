//! Demo binary for shipping-fee-engine
//!
//! Builds an estimator from an optional TOML file and quotes a handful of
//! sample checkouts.
//!
//! ## Usage
//!
//! ```text
//! shipping-fee-engine [--config shipping.toml]
//! ```
//!
//! ## Environment Variables
//!
//! - `LOG_FORMAT=json`: structured JSON output (overrides the config file)
//! - `RUST_LOG=info`: log level filter (default: info)
//! - `OPENAI_API_KEY` / `ANTHROPIC_API_KEY`: enables the primary estimator

use shipping_fee_engine::config::{loader, EngineConfig};
use shipping_fee_engine::{init_tracing, metrics, EstimateRequest, ShippingEstimator};
use std::path::PathBuf;
use tracing::{debug, info};

fn config_path() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    None
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match config_path() {
        Some(path) => loader::load_from_file(&path)?,
        None => EngineConfig::default(),
    };

    if std::env::var_os("LOG_FORMAT").is_none() {
        std::env::set_var("LOG_FORMAT", config.observability.log_format.as_env_value());
    }
    let _ = init_tracing();
    metrics::init_metrics()?;

    let estimator = ShippingEstimator::from_config(&config);
    info!(primary = estimator.has_primary(), "Starting shipping-fee-engine demo");

    let demo_requests = vec![
        EstimateRequest::new("Manila", "Manila", "Metro Manila").with_weight(1.0),
        EstimateRequest::new("Quezon City", "Lipa", "Batangas").with_weight(2.0),
        EstimateRequest::new("Metro Manila", "Cebu City", "Cebu").with_weight(3.5),
        EstimateRequest::new("Cebu City", "Davao City", "Davao del Sur"),
        EstimateRequest::new("Iloilo City", "Bacolod", "Negros Occidental").with_weight(5.0),
        EstimateRequest::new("", "Somewhere", "Atlantis"),
    ];

    info!(count = demo_requests.len(), "Quoting demo requests");

    for req in &demo_requests {
        let quote = estimator.estimate_shipping_fee(req).await;
        info!(
            seller = req.effective_seller(),
            buyer_city = %req.buyer_city,
            buyer_province = %req.buyer_province,
            quote = %serde_json::to_string(&quote)?,
            "Quote"
        );
    }

    let summary = metrics::get_metrics_summary();
    info!(
        estimates = ?summary.estimates_total,
        primary_failures = ?summary.primary_failures,
        fallback_tiers = ?summary.fallback_tiers,
        "Demo complete"
    );
    debug!(metrics = %metrics::gather_metrics(), "Prometheus snapshot");

    Ok(())
}
