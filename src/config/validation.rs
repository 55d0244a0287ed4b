//! Configuration validation engine.
//!
//! ## Responsibility
//! Validate semantic constraints on a parsed [`EngineConfig`] that cannot be
//! expressed through the type system alone.
//!
//! ## Guarantees
//! - Every validation rule has at least one test that triggers it
//! - Validation collects *all* errors before returning (no short-circuit)
//! - Error messages include the field path and the invalid value

use super::{EngineConfig, Provider};

/// Longest primary timeout accepted; checkout should not wait longer.
pub const MAX_TIMEOUT_MS: u64 = 60_000;

/// Errors arising from configuration parsing, validation, or I/O.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parsing failed.
    #[error("Parse error in {file}: {source}")]
    Parse {
        /// Path of the file that failed to parse.
        file: String,
        /// Underlying TOML deserialization error.
        #[source]
        source: toml::de::Error,
    },

    /// One or more semantic validation rules failed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A specific field has an out-of-range or contradictory value.
    #[error("Field '{field}' has invalid value {value}: {reason}")]
    InvalidField {
        /// Dot-separated field path (e.g., "primary.timeout_ms").
        field: String,
        /// String representation of the invalid value.
        value: String,
        /// Human-readable explanation of the constraint.
        reason: String,
    },

    /// File I/O error.
    #[error("IO error reading {file}: {source}")]
    Io {
        /// Path of the file that could not be read.
        file: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidField {
        field: field.into(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Validate all semantic constraints on an [`EngineConfig`].
///
/// # Returns
///
/// - `Ok(())` if all constraints pass.
/// - `Err(Vec<ConfigError>)` with every violation found.
pub fn validate(config: &EngineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let primary = &config.primary;

    // ── Primary estimator ────────────────────────────────────────────
    if primary.provider != Provider::Disabled {
        if primary.model.trim().is_empty() {
            errors.push(invalid("primary.model", "\"\"", "must not be empty"));
        }

        if primary.max_tokens == 0 {
            errors.push(invalid("primary.max_tokens", 0, "must be at least 1"));
        }

        if !(0.0..=2.0).contains(&primary.temperature) {
            errors.push(invalid(
                "primary.temperature",
                primary.temperature,
                "must be between 0.0 and 2.0",
            ));
        }

        if primary.timeout_ms == 0 || primary.timeout_ms > MAX_TIMEOUT_MS {
            errors.push(invalid(
                "primary.timeout_ms",
                primary.timeout_ms,
                "must be between 1 and 60000",
            ));
        }

        if let Some(url) = &primary.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                errors.push(invalid(
                    "primary.base_url",
                    url,
                    "must start with http:// or https://",
                ));
            }
        }

        if let Some(var) = &primary.api_key_env {
            if var.trim().is_empty() {
                errors.push(invalid("primary.api_key_env", "\"\"", "must not be empty"));
            }
        }
    }

    // ── Cache ────────────────────────────────────────────────────────
    if config.cache.enabled {
        if config.cache.ttl_s == 0 {
            errors.push(invalid("cache.ttl_s", 0, "must be at least 1 second"));
        }
        if config.cache.max_entries == 0 {
            errors.push(invalid("cache.max_entries", 0, "must be at least 1"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
