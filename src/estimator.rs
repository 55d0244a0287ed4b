//! # Estimation orchestrator
//!
//! ## Responsibility
//! Compose the primary (AI-backed) estimator and the rule-based fallback
//! into one call that always produces a quote.
//!
//! ## Guarantees
//! - [`ShippingEstimator::estimate`] cannot fail (`Result<_, Infallible>`)
//! - The primary path gets exactly one attempt, bounded by a timeout
//! - Every abandoned primary attempt is logged and counted by reason
//! - Returned quotes have `success == true`, fee ≥ 40, days ≥ 1
//!
//! ## NOT Responsible For
//! - Prompt construction and reply parsing (that belongs to `primary`)
//! - Tier rules (that belongs to `fallback`)

use crate::cache::QuoteCache;
use crate::completion::{AnthropicCompletion, CompletionService, OpenAiCompletion};
use crate::config::{EngineConfig, PrimaryConfig, Provider};
use crate::fallback::{classify, RuleEstimator};
use crate::primary::AiEstimator;
use crate::{finalize_fee, metrics, EstimateRequest, EstimateResult, EstimatorError};
use async_trait::async_trait;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Bound on one primary attempt when none is configured.
pub const DEFAULT_PRIMARY_TIMEOUT: Duration = Duration::from_secs(8);

/// A source of shipping quotes.
///
/// The trait is object-safe so the orchestrator can hold the primary path as
/// `Arc<dyn Estimator>` chosen at construction time.
#[async_trait]
pub trait Estimator: Send + Sync {
    /// Short name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Produce a quote, or explain why not.
    async fn estimate(&self, req: &EstimateRequest) -> Result<EstimateResult, EstimatorError>;
}

#[async_trait]
impl Estimator for AiEstimator {
    fn name(&self) -> &'static str {
        self.backend()
    }

    async fn estimate(&self, req: &EstimateRequest) -> Result<EstimateResult, EstimatorError> {
        self.quote(req).await
    }
}

#[async_trait]
impl Estimator for RuleEstimator {
    fn name(&self) -> &'static str {
        "rules"
    }

    async fn estimate(&self, req: &EstimateRequest) -> Result<EstimateResult, EstimatorError> {
        Ok(self.quote(req))
    }
}

/// Try-primary-then-fallback estimator used by checkout.
///
/// ## Example
///
/// ```
/// use shipping_fee_engine::{EstimateRequest, ShippingEstimator};
///
/// # #[tokio::main]
/// # async fn main() {
/// let estimator = ShippingEstimator::rules_only();
/// let quote = estimator
///     .estimate_shipping_fee(&EstimateRequest::new("Manila", "Lipa", "Batangas"))
///     .await;
/// assert_eq!(quote.shipping_fee, 55.0);
/// # }
/// ```
#[derive(Clone)]
pub struct ShippingEstimator {
    primary: Option<Arc<dyn Estimator>>,
    fallback: RuleEstimator,
    cache: Option<QuoteCache>,
    timeout: Duration,
}

impl ShippingEstimator {
    /// Orchestrator with an optional primary path and no cache.
    pub fn new(primary: Option<Arc<dyn Estimator>>) -> Self {
        Self {
            primary,
            fallback: RuleEstimator::new(),
            cache: None,
            timeout: DEFAULT_PRIMARY_TIMEOUT,
        }
    }

    /// Orchestrator that always uses the rule engine.
    pub fn rules_only() -> Self {
        Self::new(None)
    }

    /// Orchestrator with `primary` tried before the rule engine.
    pub fn with_primary(primary: Arc<dyn Estimator>) -> Self {
        Self::new(Some(primary))
    }

    /// Orchestrator whose primary path asks `service` for quotes.
    pub fn with_service(service: Arc<dyn CompletionService>) -> Self {
        Self::new(Some(Arc::new(AiEstimator::new(service))))
    }

    /// Memoize primary-path quotes in `cache`.
    pub fn with_cache(mut self, cache: QuoteCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Bound each primary attempt by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build from configuration, reading the API key from the environment.
    ///
    /// A missing key is not an error: it is logged once at `warn` and the
    /// orchestrator runs rules-only.
    pub fn from_config(config: &EngineConfig) -> Self {
        let primary = match build_service(&config.primary) {
            Ok(Some(service)) => {
                info!(
                    backend = service.name(),
                    model = %config.primary.model,
                    timeout_ms = config.primary.timeout_ms,
                    "primary estimator enabled"
                );
                Some(Arc::new(AiEstimator::new(service)) as Arc<dyn Estimator>)
            }
            Ok(None) => {
                info!("primary estimator disabled by configuration");
                None
            }
            Err(e) => {
                warn!(error = %e, "primary estimator unavailable, using rule-based quotes");
                None
            }
        };

        let mut estimator =
            Self::new(primary).with_timeout(Duration::from_millis(config.primary.timeout_ms));
        if config.cache.enabled && estimator.primary.is_some() {
            estimator.cache = Some(QuoteCache::new(
                config.cache.max_entries,
                config.cache.ttl_s,
            ));
        }
        estimator
    }

    /// Whether a primary path is configured.
    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// Produce a quote. The error type is uninhabited: this never fails.
    pub async fn estimate(&self, req: &EstimateRequest) -> Result<EstimateResult, Infallible> {
        if let Err(e) = req.validate() {
            warn!(error = %e, "invalid request field replaced by default");
        }

        let Some(primary) = &self.primary else {
            debug!("no primary estimator configured");
            return Ok(self.fallback_quote(req));
        };

        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(req)) {
            metrics::inc_estimate("cache");
            return Ok(hit);
        }

        let started = Instant::now();
        let outcome = match tokio::time::timeout(self.timeout, primary.estimate(req)).await {
            Ok(result) => result,
            Err(_) => Err(EstimatorError::Timeout(self.timeout)),
        };
        metrics::record_primary_latency(primary.name(), started.elapsed());

        match outcome {
            Ok(mut quote) => {
                quote.success = true;
                quote.shipping_fee = finalize_fee(quote.shipping_fee);
                quote.estimated_days = quote.estimated_days.max(1);

                if let Some(cache) = &self.cache {
                    cache.set(req, quote.clone());
                }
                metrics::inc_estimate("primary");
                debug!(
                    backend = primary.name(),
                    fee = quote.shipping_fee,
                    days = quote.estimated_days,
                    "primary quote"
                );
                Ok(quote)
            }
            Err(e) => {
                log_primary_failure(primary.name(), &e);
                metrics::inc_primary_failure(e.kind());
                Ok(self.fallback_quote(req))
            }
        }
    }

    /// [`estimate`](Self::estimate) without the `Result` wrapper.
    pub async fn estimate_shipping_fee(&self, req: &EstimateRequest) -> EstimateResult {
        match self.estimate(req).await {
            Ok(quote) => quote,
            Err(never) => match never {},
        }
    }

    /// Quote from the rule engine directly, counted as a fallback.
    pub fn fallback_quote(&self, req: &EstimateRequest) -> EstimateResult {
        metrics::inc_estimate("fallback");
        metrics::inc_fallback_tier(classify(req).label());
        self.fallback.quote(req)
    }
}

impl Default for ShippingEstimator {
    fn default() -> Self {
        Self::rules_only()
    }
}

fn log_primary_failure(backend: &str, e: &EstimatorError) {
    match e {
        EstimatorError::Transport(_) | EstimatorError::Timeout(_) => {
            error!(backend, reason = e.kind(), error = %e, "primary estimator failed, falling back");
        }
        _ => {
            warn!(backend, reason = e.kind(), error = %e, "primary estimator failed, falling back");
        }
    }
}

/// Construct the configured completion backend.
///
/// `Ok(None)` when the provider is disabled; `Err(ServiceUnavailable)` when
/// the credential is missing.
fn build_service(
    config: &PrimaryConfig,
) -> Result<Option<Arc<dyn CompletionService>>, EstimatorError> {
    let Some(var) = config.key_env() else {
        return Ok(None);
    };
    let timeout = Duration::from_millis(config.timeout_ms);

    let service: Arc<dyn CompletionService> = match config.provider {
        Provider::Disabled => return Ok(None),
        Provider::OpenAi => {
            let mut s = OpenAiCompletion::from_env(var, config.model.clone())?
                .with_max_tokens(config.max_tokens)
                .with_temperature(config.temperature)
                .with_timeout(timeout);
            if let Some(url) = &config.base_url {
                s = s.with_base_url(url.clone());
            }
            Arc::new(s)
        }
        Provider::Anthropic => {
            let mut s = AnthropicCompletion::from_env(var, config.model.clone())?
                .with_max_tokens(config.max_tokens)
                .with_temperature(config.temperature)
                .with_timeout(timeout);
            if let Some(url) = &config.base_url {
                s = s.with_base_url(url.clone());
            }
            Arc::new(s)
        }
    };
    Ok(Some(service))
}
