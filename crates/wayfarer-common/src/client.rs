//! Chat client configuration and request/response types.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::chat::Message;
use crate::tools::Tool;

/// Controls how the model selects which tool to call, if any.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[non_exhaustive]
pub enum ToolChoice {
    /// Let the model decide whether to call a tool and which one.
    #[serde(rename = "auto")]
    Auto,
    /// Disable tool calling for this request.
    #[serde(rename = "none")]
    None,
    /// Require the model to call at least one tool.
    #[serde(rename = "required")]
    Required,
}

impl From<ToolChoice> for serde_json::Value {
    fn from(tool_choice: ToolChoice) -> Self {
        match tool_choice {
            ToolChoice::Auto => Self::String("auto".to_string()),
            ToolChoice::None => Self::String("none".to_string()),
            ToolChoice::Required => Self::String("required".to_string()),
        }
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum FinishReason {
    /// Generation completed naturally.
    #[serde(rename = "stop")]
    Stop,
    /// Truncated at the token limit.
    #[serde(rename = "length")]
    Length,
    /// The model requested tool calls.
    #[serde(rename = "tool_calls")]
    ToolCalls,
    /// Blocked by the provider's content filter.
    #[serde(rename = "content_filter")]
    ContentFilter,
}

impl FromStr for FinishReason {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stop" => Ok(Self::Stop),
            "length" => Ok(Self::Length),
            "tool_calls" => Ok(Self::ToolCalls),
            "content_filter" => Ok(Self::ContentFilter),
            _ => anyhow::bail!("unknown finish reason: {s}"),
        }
    }
}

/// Exponential backoff parameters for the transport retry middleware.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts before failing.
    pub max_retries: u32,
    /// Initial delay before the first retry.
    pub initial_delay: Duration,
    /// Cap on the exponentially growing delay.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Token usage statistics for one completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens generated in the completion.
    pub completion_tokens: u32,
    /// Prompt plus completion.
    pub total_tokens: u32,
}

/// A chat completion request: conversation history plus generation options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The conversation messages to send to the model.
    pub messages: Arc<[Message]>,
    /// The model or deployment identifier.
    pub model: Option<String>,
    /// Sampling temperature (0.0 to 2.0).
    pub temperature: Option<f32>,
    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,
    /// Nucleus sampling threshold (0.0 to 1.0).
    pub top_p: Option<f32>,
    /// Tools available for the model to call.
    pub tools: Option<Vec<Tool>>,
    /// Strategy for tool selection.
    pub tool_choice: Option<ToolChoice>,
}

impl ChatRequest {
    /// Creates a request with the given messages and no options set.
    pub fn new(messages: impl Into<Arc<[Message]>>) -> Self {
        Self {
            messages: messages.into(),
            model: None,
            temperature: None,
            max_tokens: None,
            top_p: None,
            tools: None,
            tool_choice: None,
        }
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the maximum tokens to generate.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the tools available for this request.
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Sets the tool selection strategy.
    #[must_use]
    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = Some(tool_choice);
        self
    }

    /// Whether tools are present and non-empty.
    #[must_use]
    pub fn has_tools(&self) -> bool {
        self.tools.as_ref().is_some_and(|t| !t.is_empty())
    }

    /// Validates the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the message list is empty or a sampling parameter
    /// is out of range.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.messages.is_empty() {
            anyhow::bail!("chat request must have at least one message");
        }
        if let Some(temp) = self.temperature
            && !(0.0..=2.0).contains(&temp)
        {
            anyhow::bail!("temperature must be between 0.0 and 2.0, got {temp}");
        }
        if let Some(top_p) = self.top_p
            && !(0.0..=1.0).contains(&top_p)
        {
            anyhow::bail!("top_p must be between 0.0 and 1.0, got {top_p}");
        }
        Ok(())
    }
}

impl From<(&Config, Arc<[Message]>)> for ChatRequest {
    fn from((config, messages): (&Config, Arc<[Message]>)) -> Self {
        Self {
            messages,
            model: Some(config.model.clone()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: config.top_p,
            tools: None,
            tool_choice: None,
        }
    }
}

impl From<(&Config, Vec<Message>)> for ChatRequest {
    fn from((config, messages): (&Config, Vec<Message>)) -> Self {
        (config, Into::<Arc<[Message]>>::into(messages)).into()
    }
}

/// A completed chat response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated assistant message, including any tool call requests.
    pub message: Message,
    /// The model that produced the response.
    pub model: String,
    /// Token usage, when the provider reports it.
    pub usage: Option<Usage>,
    /// Why generation stopped.
    pub finish_reason: Option<FinishReason>,
    /// When the response was created.
    pub created_at: DateTime<Utc>,
    /// Provider-assigned response ID.
    pub response_id: Option<String>,
}

/// Configuration for a chat client.
///
/// Holds connection details and default generation parameters. The API key
/// uses `SecretString` and is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Provider label, e.g. "azure" or "github".
    pub provider: String,
    /// Model name, or the deployment name for Azure.
    pub model: String,
    /// Service endpoint URL.
    pub endpoint: Option<String>,
    /// API key, stored securely and skipped on serialization.
    #[serde(skip_serializing, default)]
    pub api_key: Option<SecretString>,
    /// API version query parameter (Azure only).
    pub api_version: Option<String>,
    /// Bound on each HTTP request. `None` falls back to the client default.
    pub timeout_seconds: Option<u64>,
    /// Transport retry policy.
    #[serde(skip)]
    pub retry_config: RetryConfig,
    /// Default sampling temperature.
    pub temperature: Option<f32>,
    /// Default maximum tokens.
    pub max_tokens: Option<u32>,
    /// Default nucleus sampling threshold.
    pub top_p: Option<f32>,
}

impl Config {
    /// Creates a configuration for the given provider and model.
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            endpoint: None,
            api_key: None,
            api_version: None,
            timeout_seconds: None,
            retry_config: RetryConfig::default(),
            temperature: None,
            max_tokens: None,
            top_p: None,
        }
    }

    /// Sets the service endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(api_key.into().into()));
        self
    }

    /// Sets the API version (Azure).
    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }

    /// Sets the default sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the default maximum tokens.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Validates the configuration parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if a sampling parameter is out of range.
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(temp) = self.temperature
            && !(0.0..=2.0).contains(&temp)
        {
            anyhow::bail!("temperature must be between 0.0 and 2.0, got {temp}");
        }
        if let Some(top_p) = self.top_p
            && !(0.0..=1.0).contains(&top_p)
        {
            anyhow::bail!("top_p must be between 0.0 and 1.0, got {top_p}");
        }
        Ok(())
    }
}

impl fmt::Display for ChatRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(_) => write!(f, "error serializing ChatRequest to JSON"),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::chat::MessageRole;
    use uuid::Uuid;

    fn user_msg() -> Message {
        Message::new(Uuid::new_v4(), MessageRole::User, "hello")
    }

    #[test]
    fn request_from_config_carries_defaults() {
        let config = Config::new("azure", "gpt-4o-mini")
            .with_temperature(0.7)
            .with_max_tokens(800);

        let request: ChatRequest = (&config, vec![user_msg()]).into();
        assert_eq!(request.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(800));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn empty_request_is_invalid() {
        let request = ChatRequest::new(Vec::<Message>::new());
        assert!(request.validate().is_err());
    }

    #[test]
    fn temperature_range_is_enforced() {
        let request = ChatRequest::new(vec![user_msg()]).with_temperature(3.0);
        assert!(request.validate().is_err());

        let config = Config::new("azure", "m").with_temperature(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn has_tools_ignores_empty_vec() {
        let request = ChatRequest::new(vec![user_msg()]).with_tools(vec![]);
        assert!(!request.has_tools());
    }

    #[test]
    fn api_key_is_not_serialized() {
        let config = Config::new("azure", "m").with_api_key("super-secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("super-secret"));
    }

    #[test]
    fn finish_reason_parses_wire_strings() {
        assert_eq!(
            "tool_calls".parse::<FinishReason>().unwrap(),
            FinishReason::ToolCalls
        );
        assert!("bogus".parse::<FinishReason>().is_err());
    }
}
