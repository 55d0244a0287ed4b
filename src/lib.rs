//! # shipping-fee-engine
//!
//! Shipping-fee estimation for a Philippine marketplace checkout.
//!
//! ## Architecture
//!
//! Two estimators behind one orchestrator, tried in a fixed order:
//! ```text
//! EstimateRequest → [QuoteCache] → AiEstimator ──(any failure)──→ RuleEstimator → EstimateResult
//! ```
//!
//! The orchestrator ([`ShippingEstimator`]) never returns an error: when the
//! completion service is missing, slow, or returns garbage, the deterministic
//! [`RuleEstimator`] produces the quote instead.

// ── Lint policy ───────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(missing_docs)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub mod cache;
pub mod completion;
pub mod config;
pub mod estimator;
pub mod fallback;
pub mod geo;
pub mod metrics;
pub mod primary;

// Re-exports for convenience
pub use cache::QuoteCache;
pub use completion::{AnthropicCompletion, CompletionService, OpenAiCompletion, StaticCompletion};
pub use estimator::{Estimator, ShippingEstimator};
pub use fallback::{RuleEstimator, Tier};
pub use geo::{MacroRegion, Place};
pub use primary::AiEstimator;

/// Minimum fee any estimate may carry, in PHP.
pub const MIN_SHIPPING_FEE: f64 = 40.0;

/// Weight assumed when the request does not carry one, in kilograms.
pub const DEFAULT_WEIGHT_KG: f64 = 1.0;

/// Seller location assumed when the seller did not fill one in.
pub const DEFAULT_SELLER_LOCATION: &str = "Metro Manila";

/// Initialise the global tracing subscriber.
///
/// Reads the `LOG_FORMAT` environment variable to choose output format:
/// - `"json"`: structured JSON output for log aggregators
/// - anything else (including unset): human-readable pretty output
///
/// Filter level is controlled by `RUST_LOG` (e.g. `RUST_LOG=info`).
///
/// # Errors
///
/// Returns [`EstimatorError::Other`] if the global subscriber has already
/// been set (e.g. by a previous call or a test harness).
///
/// # Example
///
/// ```no_run
/// # use shipping_fee_engine::{init_tracing, EstimatorError};
/// # fn example() -> Result<(), EstimatorError> {
/// init_tracing()?;
/// # Ok(()) }
/// ```
pub fn init_tracing() -> Result<(), EstimatorError> {
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let result = match format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .with_current_span(true)
            .with_span_list(true)
            .try_init(),
        _ => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init(),
    };

    result.map_err(|e| EstimatorError::Other(format!("tracing init failed: {e}")))
}

/// Engine errors.
///
/// None of these ever reach a caller of [`ShippingEstimator::estimate`];
/// they describe why the primary path was abandoned and are surfaced through
/// logs and metrics instead.
#[derive(Error, Debug)]
pub enum EstimatorError {
    /// No completion service is configured (e.g. the API key is not set).
    #[error("estimation service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The completion call failed at the network or HTTP level.
    #[error("estimation service request failed: {0}")]
    Transport(String),

    /// The completion call did not finish within the configured bound.
    #[error("estimation service timed out after {0:?}")]
    Timeout(Duration),

    /// The service answered, but not with a usable quote.
    #[error("malformed estimation response: {0}")]
    MalformedResponse(String),

    /// The request carries a value outside its documented domain.
    #[error("invalid estimate request: {0}")]
    InvalidRequest(String),

    /// A configuration value is missing or invalid.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Catch-all for errors that do not fit a specific variant.
    #[error("{0}")]
    Other(String),
}

impl EstimatorError {
    /// Stable, low-cardinality label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable(_) => "unavailable",
            Self::Transport(_) => "transport",
            Self::Timeout(_) => "timeout",
            Self::MalformedResponse(_) => "malformed",
            Self::InvalidRequest(_) => "invalid_request",
            Self::ConfigError(_) => "config",
            Self::Other(_) => "other",
        }
    }
}

/// Inputs supplied by the checkout workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    /// Free-text seller location. Blank means [`DEFAULT_SELLER_LOCATION`].
    #[serde(default)]
    pub seller_location: String,
    /// Free-text buyer city.
    #[serde(default)]
    pub buyer_city: String,
    /// Free-text buyer province.
    #[serde(default)]
    pub buyer_province: String,
    /// Total package weight in kilograms. `None` means [`DEFAULT_WEIGHT_KG`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_weight: Option<f64>,
}

impl EstimateRequest {
    /// Create a request with the default weight.
    pub fn new(
        seller_location: impl Into<String>,
        buyer_city: impl Into<String>,
        buyer_province: impl Into<String>,
    ) -> Self {
        Self {
            seller_location: seller_location.into(),
            buyer_city: buyer_city.into(),
            buyer_province: buyer_province.into(),
            total_weight: None,
        }
    }

    /// Set the total package weight in kilograms.
    pub fn with_weight(mut self, kg: f64) -> Self {
        self.total_weight = Some(kg);
        self
    }

    /// Check the request against its documented domain.
    ///
    /// # Errors
    ///
    /// Returns [`EstimatorError::InvalidRequest`] if a weight is present but
    /// is not a finite number greater than zero.
    pub fn validate(&self) -> Result<(), EstimatorError> {
        match self.total_weight {
            Some(w) if !w.is_finite() || w <= 0.0 => Err(EstimatorError::InvalidRequest(format!(
                "totalWeight must be a positive number, got {w}"
            ))),
            _ => Ok(()),
        }
    }

    /// Weight used for pricing: the request's weight when valid, otherwise
    /// [`DEFAULT_WEIGHT_KG`].
    pub fn effective_weight(&self) -> f64 {
        match self.total_weight {
            Some(w) if w.is_finite() && w > 0.0 => w,
            _ => DEFAULT_WEIGHT_KG,
        }
    }

    /// Seller location used for pricing, substituting the metro hub when the
    /// field carries no letters or digits (blank, punctuation, zero-width marks).
    pub fn effective_seller(&self) -> &str {
        let trimmed = self.seller_location.trim();
        if !trimmed.chars().any(char::is_alphanumeric) {
            DEFAULT_SELLER_LOCATION
        } else {
            trimmed
        }
    }
}

/// Courier service level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourierType {
    /// Regular ground/sea service.
    #[default]
    Standard,
    /// Expedited service.
    Express,
}

impl CourierType {
    /// Parse a case-insensitive label; unknown labels yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Some(Self::Standard),
            "express" => Some(Self::Express),
            _ => None,
        }
    }

    /// Lowercase label as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Express => "express",
        }
    }
}

impl fmt::Display for CourierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse distance bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    /// Same city, province, or the hub's neighbouring provinces.
    Short,
    /// Same island group, or unrecognised locations.
    #[default]
    Medium,
    /// Across island groups.
    Long,
}

impl Distance {
    /// Parse a case-insensitive label; unknown labels yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Some(Self::Short),
            "medium" => Some(Self::Medium),
            "long" => Some(Self::Long),
            _ => None,
        }
    }

    /// Lowercase label as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quote returned to the checkout workflow. Both estimators produce this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResult {
    /// Always `true` once the result has left the orchestrator.
    pub success: bool,
    /// Fee in PHP, at least [`MIN_SHIPPING_FEE`], rounded to centavos.
    pub shipping_fee: f64,
    /// Expected delivery time in days, at least 1.
    pub estimated_days: u32,
    /// Courier service level.
    pub courier_type: CourierType,
    /// Distance bucket.
    pub distance: Distance,
    /// Short human-readable rationale.
    pub explanation: String,
}

/// Apply the fee floor and round to two decimal places.
///
/// NaN collapses to the floor. Fees too large to represent saturate at
/// `f64::MAX`, so a heavier package never prices below a lighter one.
pub fn finalize_fee(fee: f64) -> f64 {
    if fee.is_nan() {
        return MIN_SHIPPING_FEE;
    }
    let fee = fee.clamp(MIN_SHIPPING_FEE, f64::MAX);
    let cents = fee * 100.0;
    if !cents.is_finite() {
        // Magnitudes this large have no fractional part to round.
        return fee;
    }
    cents.round() / 100.0
}
