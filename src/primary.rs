//! # AI-backed primary estimator
//!
//! ## Responsibility
//! Ask a completion service for a quote and turn its JSON reply into an
//! [`EstimateResult`], rejecting anything that is not a usable quote.
//!
//! ## Guarantees
//! - One attempt per call, no retries
//! - A returned quote always has fee ≥ 40 (rounded to centavos) and days ≥ 1
//! - Every failure is returned as an [`EstimatorError`]; nothing panics
//!
//! ## NOT Responsible For
//! - Falling back (that belongs to `estimator`)
//! - Timeouts beyond the backend's own (the orchestrator bounds the call)

use crate::completion::CompletionService;
use crate::{finalize_fee, CourierType, Distance, EstimateRequest, EstimateResult, EstimatorError};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// System instruction sent with every request.
pub const SYSTEM_PROMPT: &str = "You are a shipping cost calculator for domestic deliveries \
within the Philippines. Always respond with a single valid JSON object and nothing else.";

/// Days used when the reply omits `estimatedDays` or gives a non-positive value.
pub const DEFAULT_DAYS: u32 = 3;

/// Explanation used when the reply omits one.
pub const DEFAULT_EXPLANATION: &str = "Estimated based on location and package weight";

/// Longest delivery estimate accepted from the service, in days.
const MAX_DAYS: f64 = 60.0;

/// Estimator that delegates to a [`CompletionService`].
#[derive(Clone)]
pub struct AiEstimator {
    service: Arc<dyn CompletionService>,
}

impl AiEstimator {
    /// Wrap a completion backend.
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }

    /// Name of the underlying backend.
    pub fn backend(&self) -> &'static str {
        self.service.name()
    }

    /// Request one quote from the service.
    ///
    /// # Errors
    ///
    /// Propagates the backend's error, or [`EstimatorError::MalformedResponse`]
    /// when the reply is not a JSON object with a numeric `shippingFee`.
    pub async fn quote(&self, req: &EstimateRequest) -> Result<EstimateResult, EstimatorError> {
        let prompt = build_prompt(req);
        let reply = self.service.complete(SYSTEM_PROMPT, &prompt).await?;
        debug!(backend = self.backend(), reply_len = reply.len(), "completion received");
        parse_reply(&reply)
    }
}

/// Render the user prompt for a request.
pub fn build_prompt(req: &EstimateRequest) -> String {
    fn or_unknown(s: &str) -> &str {
        let s = s.trim();
        if s.is_empty() {
            "(not provided)"
        } else {
            s
        }
    }

    format!(
        "Estimate the domestic shipping fee in Philippine pesos for this package.\n\
         \n\
         Seller location: {seller}\n\
         Buyer city: {city}\n\
         Buyer province: {province}\n\
         Total weight: {weight} kg\n\
         \n\
         Consider the distance between the two locations, whether the package crosses \
         between Luzon, Visayas and Mindanao, and the weight. The minimum fee is 40 pesos.\n\
         \n\
         Respond with ONLY a JSON object in exactly this format:\n\
         {{\"shippingFee\": <number>, \"estimatedDays\": <integer>, \
         \"courierType\": \"standard\" | \"express\", \
         \"distance\": \"short\" | \"medium\" | \"long\", \
         \"explanation\": \"<one short sentence>\"}}",
        seller = req.effective_seller(),
        city = or_unknown(&req.buyer_city),
        province = or_unknown(&req.buyer_province),
        weight = req.effective_weight(),
    )
}

/// Parse and validate a completion reply.
///
/// The reply must be exactly one JSON object (surrounding whitespace is
/// allowed). `shippingFee` is required and must be a number or a numeric
/// string. Other fields fall back to defaults when missing or unrecognised.
///
/// # Errors
///
/// [`EstimatorError::MalformedResponse`] on invalid JSON, a non-object
/// payload, or a missing / non-numeric / non-finite `shippingFee`.
pub fn parse_reply(reply: &str) -> Result<EstimateResult, EstimatorError> {
    let value: Value = serde_json::from_str(reply.trim())
        .map_err(|e| EstimatorError::MalformedResponse(format!("reply is not JSON: {e}")))?;

    let obj = value.as_object().ok_or_else(|| {
        EstimatorError::MalformedResponse("reply is not a JSON object".to_string())
    })?;

    let fee = obj
        .get("shippingFee")
        .ok_or_else(|| EstimatorError::MalformedResponse("shippingFee missing".to_string()))
        .and_then(|v| {
            as_number(v).ok_or_else(|| {
                EstimatorError::MalformedResponse(format!("shippingFee is not numeric: {v}"))
            })
        })?;

    let estimated_days = obj
        .get("estimatedDays")
        .and_then(as_number)
        .filter(|d| *d >= 1.0)
        .map(|d| d.round().min(MAX_DAYS) as u32)
        .unwrap_or(DEFAULT_DAYS);

    let courier_type = obj
        .get("courierType")
        .and_then(Value::as_str)
        .and_then(CourierType::parse)
        .unwrap_or_default();

    let distance = obj
        .get("distance")
        .and_then(Value::as_str)
        .and_then(Distance::parse)
        .unwrap_or_default();

    let explanation = obj
        .get("explanation")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_EXPLANATION)
        .to_string();

    Ok(EstimateResult {
        success: true,
        shipping_fee: finalize_fee(fee),
        estimated_days,
        courier_type,
        distance,
        explanation,
    })
}

fn as_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::StaticCompletion;

    #[test]
    fn test_parse_full_reply() {
        let q = parse_reply(
            r#"{"shippingFee": 125.456, "estimatedDays": 4, "courierType": "express",
                "distance": "long", "explanation": "Luzon to Visayas by sea"}"#,
        )
        .expect("test: reply must parse");
        assert_eq!(q.shipping_fee, 125.46);
        assert_eq!(q.estimated_days, 4);
        assert_eq!(q.courier_type, CourierType::Express);
        assert_eq!(q.distance, Distance::Long);
        assert_eq!(q.explanation, "Luzon to Visayas by sea");
        assert!(q.success);
    }

    #[test]
    fn test_parse_fills_defaults() {
        let q = parse_reply(r#"{"shippingFee": 80}"#).expect("test: reply must parse");
        assert_eq!(q.estimated_days, DEFAULT_DAYS);
        assert_eq!(q.courier_type, CourierType::Standard);
        assert_eq!(q.distance, Distance::Medium);
        assert_eq!(q.explanation, DEFAULT_EXPLANATION);
    }

    #[test]
    fn test_parse_clamps_fee_floor() {
        let q = parse_reply(r#"{"shippingFee": 12.5}"#).expect("test: reply must parse");
        assert_eq!(q.shipping_fee, 40.0);
        let q = parse_reply(r#"{"shippingFee": -100}"#).expect("test: reply must parse");
        assert_eq!(q.shipping_fee, 40.0);
    }

    #[test]
    fn test_parse_accepts_numeric_string_fee() {
        let q = parse_reply(r#"{"shippingFee": " 95.5 "}"#).expect("test: reply must parse");
        assert_eq!(q.shipping_fee, 95.5);
    }

    #[test]
    fn test_parse_rejects_missing_fee() {
        let err = parse_reply(r#"{"estimatedDays": 2}"#).expect_err("test: reply must be rejected");
        assert_eq!(err.kind(), "malformed");
    }

    #[test]
    fn test_parse_rejects_non_numeric_fee() {
        for body in [
            r#"{"shippingFee": "cheap"}"#,
            r#"{"shippingFee": null}"#,
            r#"{"shippingFee": [1]}"#,
            r#"{"shippingFee": true}"#,
        ] {
            assert_eq!(parse_reply(body).expect_err("test: reply must be rejected").kind(), "malformed", "{body}");
        }
    }

    #[test]
    fn test_parse_rejects_non_json_and_non_object() {
        assert!(parse_reply("The fee is 120 pesos.").is_err());
        assert!(parse_reply("```json\n{\"shippingFee\": 1}\n```").is_err());
        assert!(parse_reply("[120]").is_err());
        assert!(parse_reply("").is_err());
    }

    #[test]
    fn test_parse_replaces_bad_days_and_labels() {
        let q = parse_reply(
            r#"{"shippingFee": 60, "estimatedDays": 0, "courierType": "drone", "distance": "far", "explanation": "  "}"#,
        )
        .expect("test: reply must parse");
        assert_eq!(q.estimated_days, DEFAULT_DAYS);
        assert_eq!(q.courier_type, CourierType::Standard);
        assert_eq!(q.distance, Distance::Medium);
        assert_eq!(q.explanation, DEFAULT_EXPLANATION);
    }

    #[test]
    fn test_parse_rounds_fractional_days() {
        let q = parse_reply(r#"{"shippingFee": 60, "estimatedDays": 2.6}"#).expect("test: reply must parse");
        assert_eq!(q.estimated_days, 3);
        let q = parse_reply(r#"{"shippingFee": 60, "estimatedDays": "2"}"#).expect("test: reply must parse");
        assert_eq!(q.estimated_days, 2);
    }

    #[test]
    fn test_prompt_embeds_all_inputs() {
        let req = EstimateRequest::new("Cebu City", "Davao City", "Davao").with_weight(3.5);
        let prompt = build_prompt(&req);
        assert!(prompt.contains("Seller location: Cebu City"));
        assert!(prompt.contains("Buyer city: Davao City"));
        assert!(prompt.contains("Buyer province: Davao"));
        assert!(prompt.contains("Total weight: 3.5 kg"));
        assert!(prompt.contains("\"shippingFee\""));
    }

    #[test]
    fn test_prompt_defaults_blank_inputs() {
        let prompt = build_prompt(&EstimateRequest::new("", "", ""));
        assert!(prompt.contains("Seller location: Metro Manila"));
        assert!(prompt.contains("Buyer city: (not provided)"));
        assert!(prompt.contains("Total weight: 1 kg"));
    }

    #[tokio::test]
    async fn test_quote_through_static_backend() {
        let estimator = AiEstimator::new(Arc::new(StaticCompletion::reply(
            r#"{"shippingFee": 150, "estimatedDays": 5, "distance": "long"}"#,
        )));
        let q = estimator
            .quote(&EstimateRequest::new("Manila", "Davao City", "Davao"))
            .await
            .expect("test: static backend quote");
        assert_eq!(q.shipping_fee, 150.0);
        assert_eq!(q.estimated_days, 5);
        assert_eq!(estimator.backend(), "static");
    }

    #[tokio::test]
    async fn test_quote_propagates_backend_error() {
        let estimator = AiEstimator::new(Arc::new(StaticCompletion::failing("boom")));
        let err = estimator
            .quote(&EstimateRequest::new("Manila", "Cebu", "Cebu"))
            .await
            .expect_err("test: failing backend");
        assert_eq!(err.kind(), "transport");
    }
}
