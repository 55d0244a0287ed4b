//! Configuration file loading.
//!
//! ## Responsibility
//! Read a TOML file from disk, parse it into an [`EngineConfig`], and run
//! validation before returning.
//!
//! ## Guarantees
//! - A successfully loaded config is always validated
//! - I/O errors and parse errors are distinguished in the error type
//! - File path is included in every error message

use std::path::Path;

use super::validation::{self, ConfigError};
use super::EngineConfig;

/// Load an [`EngineConfig`] from a TOML file.
///
/// # Errors
///
/// - [`ConfigError::Io`] if the file cannot be read.
/// - [`ConfigError::Parse`] if the TOML is malformed.
/// - [`ConfigError::Validation`] if semantic constraints are violated.
///
/// # Example
///
/// ```rust,ignore
/// use shipping_fee_engine::config::loader::load_from_file;
/// use std::path::Path;
///
/// let config = load_from_file(Path::new("shipping.toml"))?;
/// println!("Primary provider: {:?}", config.primary.provider);
/// ```
pub fn load_from_file(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        file: path.display().to_string(),
        source: e,
    })?;

    load_from_str(&content, &path.display().to_string())
}

/// Load an [`EngineConfig`] from a TOML string.
///
/// `source_name` identifies the source in error messages. A validation
/// failure lists every violated field, one per line, under that name.
///
/// # Errors
///
/// - [`ConfigError::Parse`] if the TOML is malformed.
/// - [`ConfigError::Validation`] if semantic constraints are violated.
pub fn load_from_str(content: &str, source_name: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
        file: source_name.to_string(),
        source: e,
    })?;

    validation::validate(&config).map_err(|errors| {
        let lines: Vec<String> = errors.iter().map(|e| format!("  {e}")).collect();
        ConfigError::Validation(format!(
            "{source_name}: {} problem(s)\n{}",
            errors.len(),
            lines.join("\n")
        ))
    })?;

    Ok(config)
}
