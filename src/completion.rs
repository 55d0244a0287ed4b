//! Completion service abstraction and implementations
//!
//! Provides the [`CompletionService`] trait the primary estimator talks to:
//! - [`OpenAiCompletion`]: OpenAI chat completions API
//! - [`AnthropicCompletion`]: Anthropic messages API
//! - [`StaticCompletion`]: canned reply, for tests and offline demos
//!
//! ## Environment Variables
//!
//! - `OPENAI_API_KEY`: read by [`OpenAiCompletion::new`]
//! - `ANTHROPIC_API_KEY`: read by [`AnthropicCompletion::new`]
//!
//! A missing key is reported as [`EstimatorError::ServiceUnavailable`], never
//! a panic, so callers can fall back to the rule engine.

use crate::EstimatorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default upper bound on one completion request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Default output budget; a quote is a small JSON object.
pub const DEFAULT_MAX_TOKENS: u32 = 200;

/// Default sampling temperature, low for repeatable numbers.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Text completion backend.
///
/// Implementations must be thread-safe (Send + Sync) so one instance can be
/// shared by concurrent checkouts behind an `Arc<dyn CompletionService>`.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Send a system instruction and a user prompt, returning the raw reply text.
    async fn complete(&self, system: &str, user: &str) -> Result<String, EstimatorError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Read an API key from the environment, treating empty values as absent.
fn api_key_from_env(var: &str) -> Result<String, EstimatorError> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(EstimatorError::ServiceUnavailable(format!(
            "{var} environment variable not set"
        ))),
    }
}

async fn error_for_status(
    backend: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, EstimatorError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    Err(EstimatorError::Transport(format!(
        "{backend} API error {status}: {error_text}"
    )))
}

fn map_send_error(backend: &str, timeout: Duration, e: reqwest::Error) -> EstimatorError {
    if e.is_timeout() {
        EstimatorError::Timeout(timeout)
    } else {
        EstimatorError::Transport(format!("{backend} request failed: {e}"))
    }
}

// ============================================================================
// OpenAI
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI chat completions backend.
///
/// ## Example
///
/// ```no_run
/// use shipping_fee_engine::OpenAiCompletion;
/// use std::time::Duration;
///
/// let service = OpenAiCompletion::new("gpt-4o-mini")?
///     .with_max_tokens(200)
///     .with_timeout(Duration::from_secs(5));
/// # Ok::<(), shipping_fee_engine::EstimatorError>(())
/// ```
pub struct OpenAiCompletion {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl OpenAiCompletion {
    /// Create a backend using `OPENAI_API_KEY`.
    ///
    /// # Errors
    ///
    /// [`EstimatorError::ServiceUnavailable`] if the variable is unset or empty.
    pub fn new(model: impl Into<String>) -> Result<Self, EstimatorError> {
        Self::from_env("OPENAI_API_KEY", model)
    }

    /// Create a backend reading the key from a custom environment variable.
    ///
    /// # Errors
    ///
    /// [`EstimatorError::ServiceUnavailable`] if the variable is unset or empty.
    pub fn from_env(var: &str, model: impl Into<String>) -> Result<Self, EstimatorError> {
        Ok(Self::with_api_key(api_key_from_env(var)?, model))
    }

    /// Create a backend with an explicit key.
    pub fn with_api_key(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the API base URL (proxies, compatible servers, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set maximum tokens to generate
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set temperature (0.0 - 2.0)
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(&self, system: &str, user: &str) -> Result<String, EstimatorError> {
        let request = OpenAiRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_send_error("OpenAI", self.timeout, e))?;

        let response = error_for_status("OpenAI", response).await?;

        let api_response: OpenAiResponse = response.json().await.map_err(|e| {
            EstimatorError::MalformedResponse(format!("failed to parse OpenAI response: {e}"))
        })?;

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                EstimatorError::MalformedResponse("no content in OpenAI response".to_string())
            })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ============================================================================
// Anthropic
// ============================================================================

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Anthropic messages API backend.
pub struct AnthropicCompletion {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl AnthropicCompletion {
    /// Create a backend using `ANTHROPIC_API_KEY`.
    ///
    /// # Errors
    ///
    /// [`EstimatorError::ServiceUnavailable`] if the variable is unset or empty.
    pub fn new(model: impl Into<String>) -> Result<Self, EstimatorError> {
        Self::from_env("ANTHROPIC_API_KEY", model)
    }

    /// Create a backend reading the key from a custom environment variable.
    ///
    /// # Errors
    ///
    /// [`EstimatorError::ServiceUnavailable`] if the variable is unset or empty.
    pub fn from_env(var: &str, model: impl Into<String>) -> Result<Self, EstimatorError> {
        Ok(Self::with_api_key(api_key_from_env(var)?, model))
    }

    /// Create a backend with an explicit key.
    pub fn with_api_key(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.anthropic.com/v1".to_string(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set maximum tokens to generate
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set temperature (0.0 - 1.0)
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CompletionService for AnthropicCompletion {
    async fn complete(&self, system: &str, user: &str) -> Result<String, EstimatorError> {
        let request = AnthropicRequest {
            model: &self.model,
            system,
            messages: vec![ChatMessage {
                role: "user",
                content: user,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_send_error("Anthropic", self.timeout, e))?;

        let response = error_for_status("Anthropic", response).await?;

        let api_response: AnthropicResponse = response.json().await.map_err(|e| {
            EstimatorError::MalformedResponse(format!("failed to parse Anthropic response: {e}"))
        })?;

        let text: String = api_response
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect();

        if text.is_empty() {
            return Err(EstimatorError::MalformedResponse(
                "no text in Anthropic response".to_string(),
            ));
        }
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

// ============================================================================
// Static (testing)
// ============================================================================

/// Backend that returns a fixed reply, or fails with a fixed error kind.
///
/// Useful for exercising the primary path without network access.
pub struct StaticCompletion {
    reply: Result<String, String>,
    delay: Duration,
}

impl StaticCompletion {
    /// Always answer with `reply`.
    pub fn reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            delay: Duration::ZERO,
        }
    }

    /// Always fail with a transport error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            delay: Duration::ZERO,
        }
    }

    /// Sleep before answering, to simulate a slow service.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl CompletionService for StaticCompletion {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, EstimatorError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.clone().map_err(EstimatorError::Transport)
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_completion_replies() {
        let service = StaticCompletion::reply("{\"shippingFee\": 99}");
        let reply = service
            .complete("sys", "user")
            .await
            .expect("test: static reply");
        assert_eq!(reply, "{\"shippingFee\": 99}");
        assert_eq!(service.name(), "static");
    }

    #[tokio::test]
    async fn test_static_completion_fails_as_transport() {
        let service = StaticCompletion::failing("connection refused");
        let err = service
            .complete("sys", "user")
            .await
            .expect_err("test: static failure");
        assert!(matches!(err, EstimatorError::Transport(ref m) if m == "connection refused"));
    }

    #[test]
    fn test_missing_env_key_is_service_unavailable() {
        let err = OpenAiCompletion::from_env("SHIPPING_TEST_KEY_THAT_IS_NEVER_SET", "m")
            .err()
            .expect("test: unset key must fail");
        assert_eq!(err.kind(), "unavailable");
        let err = AnthropicCompletion::from_env("SHIPPING_TEST_KEY_THAT_IS_NEVER_SET", "m")
            .err()
            .expect("test: unset key must fail");
        assert_eq!(err.kind(), "unavailable");
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let service = OpenAiCompletion::with_api_key("k", "m").with_base_url("http://x/v1/");
        assert_eq!(service.base_url, "http://x/v1");
    }

    #[test]
    fn test_openai_request_shape() {
        let request = OpenAiRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage {
                role: "system",
                content: "json only",
            }],
            max_tokens: 200,
            temperature: 0.3,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };
        let json = serde_json::to_value(&request).expect("test: serialize request");
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][0]["role"], "system");
    }
}
