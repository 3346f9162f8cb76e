//! # wayfarer-client
//!
//! Chat completion clients for the wayfarer travel agent.
//!
//! This crate provides a unified interface for talking to chat completion
//! providers through the [`ChatClient`] trait. Two providers are supported:
//!
//! - [`AzureOpenAIClient`]: Azure OpenAI deployments, authenticated with an
//!   `api-key` header and addressed by deployment name and API version
//! - [`OpenAIClient`]: any OpenAI-compatible endpoint, such as GitHub
//!   Models, authenticated with a bearer token
//!
//! ## Example
//!
//! ```no_run
//! use wayfarer_client::{ChatClient, OpenAIClient};
//! use wayfarer_common::{Config, Thread};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::new("github", "gpt-4o-mini")
//!     .with_api_key("your-token")
//!     .with_endpoint("https://models.github.ai/inference");
//!
//! let client = OpenAIClient::new(config)?;
//!
//! let thread = Thread::new();
//! let request = (client.config(), vec![thread.user_message("Hello!")]).into();
//!
//! let response = client.chat(&request).await?;
//! println!("Response: {}", response.message.content);
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use async_trait::async_trait;

use wayfarer_common::{ChatRequest, ChatResponse, Config};

pub mod azure;
pub mod error;
pub mod openai;
pub mod wire;

pub use azure::AzureOpenAIClient;
pub use error::ClientError;
pub use openai::OpenAIClient;

/// Trait for chat completion client implementations.
///
/// Implementations must be thread-safe; the agent holds them behind a shared
/// reference across turns.
#[must_use = "ChatClient must be used to make requests"]
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Get the client's configuration.
    fn config(&self) -> &Config;

    /// Send a chat completion request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails validation, network
    /// communication fails, the API returns an error status, or the response
    /// cannot be parsed.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;

    /// Check if the client supports tool/function calling.
    fn supports_tools(&self) -> bool;

    /// Validate a configuration object.
    ///
    /// # Errors
    ///
    /// Returns an error if `temperature` or `top_p` is out of range.
    fn validate_config(&self, config: &Config) -> Result<()> {
        if config
            .temperature
            .is_some_and(|t| !(0.0..=2.0).contains(&t))
        {
            return Err(ClientError::InvalidTemperature.into());
        }

        if config.top_p.is_some_and(|p| !(0.0..=1.0).contains(&p)) {
            return Err(ClientError::InvalidTopP.into());
        }

        Ok(())
    }

    /// Validate a chat request before sending.
    ///
    /// Checks that at least one message is present and that tools are not
    /// used if the client doesn't support them.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    fn validate_request(&self, request: &ChatRequest) -> Result<()> {
        request
            .validate()
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;

        if !self.supports_tools() && request.has_tools() {
            return Err(ClientError::ToolsNotSupported.into());
        }

        Ok(())
    }
}

// Lets callers pick a provider at runtime and still hand the agent a single
// client type.
#[async_trait]
impl ChatClient for Box<dyn ChatClient> {
    fn config(&self) -> &Config {
        (**self).config()
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        (**self).chat(request).await
    }

    fn supports_tools(&self) -> bool {
        (**self).supports_tools()
    }
}
