//! # Engine configuration
//!
//! ## Responsibility
//! Parse and validate the TOML file that decides which completion backend
//! the primary estimator uses, how long it may take, and whether quotes are
//! cached.
//!
//! ## Guarantees
//! - Deterministic: same TOML input always produces the same `EngineConfig`
//! - Validated: all semantic constraints are checked before a config is accepted
//! - Every field has a default, so an empty file is a valid config
//! - Schema-exportable: JSON Schema output enables IDE autocomplete
//!
//! ## NOT Responsible For
//! - Reading API keys (credentials stay in the environment; the config only
//!   names the variable)
//! - Building the estimator (that belongs to `estimator`)

pub mod loader;
pub mod validation;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ── Default value functions ──────────────────────────────────────────────

/// Default completion model.
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

/// Default output budget: 200 tokens.
fn default_max_tokens() -> u32 {
    crate::completion::DEFAULT_MAX_TOKENS
}

/// Default temperature: 0.3.
fn default_temperature() -> f32 {
    crate::completion::DEFAULT_TEMPERATURE
}

/// Default primary timeout: 8000ms.
fn default_timeout_ms() -> u64 {
    8000
}

/// Default cache TTL: one hour.
fn default_ttl_s() -> u64 {
    3600
}

/// Default cache size: 10 000 quotes.
fn default_max_entries() -> usize {
    10_000
}

/// Default enabled state: true.
fn default_true() -> bool {
    true
}

// ── Top-level config ─────────────────────────────────────────────────────

/// Root configuration for the estimation engine.
///
/// # Example
///
/// ```toml
/// [primary]
/// provider = "open_ai"
/// model = "gpt-4o-mini"
/// timeout_ms = 5000
///
/// [cache]
/// ttl_s = 900
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct EngineConfig {
    /// Primary (AI-backed) estimator settings.
    #[serde(default)]
    pub primary: PrimaryConfig,
    /// Quote cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging settings.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ── Primary estimator ────────────────────────────────────────────────────

/// Completion backend used by the primary estimator.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// OpenAI chat completions.
    #[default]
    OpenAi,
    /// Anthropic messages API.
    Anthropic,
    /// No primary estimator; every quote comes from the rule engine.
    Disabled,
}

impl Provider {
    /// Environment variable holding the API key when `api_key_env` is not set.
    pub fn default_key_env(&self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Disabled => None,
        }
    }
}

/// Primary estimator configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct PrimaryConfig {
    /// Which completion backend to call.
    #[serde(default)]
    pub provider: Provider,
    /// Model name passed to the backend.
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable to read the API key from. `None` uses the
    /// provider's conventional variable.
    pub api_key_env: Option<String>,
    /// Override for the backend's base URL.
    pub base_url: Option<String>,
    /// Maximum tokens the backend may generate.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Upper bound on one primary attempt, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for PrimaryConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: default_model(),
            api_key_env: None,
            base_url: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl PrimaryConfig {
    /// Environment variable the API key is read from, if any.
    pub fn key_env(&self) -> Option<&str> {
        self.api_key_env
            .as_deref()
            .or_else(|| self.provider.default_key_env())
    }
}

// ── Cache ────────────────────────────────────────────────────────────────

/// Quote cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CacheConfig {
    /// Whether primary-path quotes are memoized.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Time-to-live per entry, in seconds.
    #[serde(default = "default_ttl_s")]
    pub ttl_s: u64,
    /// Maximum number of cached quotes.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            ttl_s: default_ttl_s(),
            max_entries: default_max_entries(),
        }
    }
}

// ── Observability ────────────────────────────────────────────────────────

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ObservabilityConfig {
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Value understood by [`crate::init_tracing`] via `LOG_FORMAT`.
    pub fn as_env_value(&self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

/// Export the JSON Schema for [`EngineConfig`].
///
/// # Errors
///
/// Returns `serde_json::Error` if schema serialization fails.
pub fn export_schema() -> Result<String, serde_json::Error> {
    let schema = schemars::schema_for!(EngineConfig);
    serde_json::to_string_pretty(&schema)
}
