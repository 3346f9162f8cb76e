//! Client for OpenAI-compatible endpoints.
//!
//! Works with any service implementing the chat completions specification
//! behind bearer-token authentication, including GitHub Models
//! (`https://models.github.ai/inference`).
//!
//! # Security
//!
//! The API key is stored with the `secrecy` crate, which prevents accidental
//! logging and zeroes memory on drop. Access requires an explicit
//! `expose_secret()` call.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use secrecy::{ExposeSecret, SecretString};

use wayfarer_common::client::{ChatRequest, ChatResponse, Config};

use crate::ChatClient;
use crate::error::ClientError;
use crate::wire::{self, ChatCompletionRequest, ChatCompletionResponse};

/// Client for OpenAI-compatible chat completion APIs.
#[derive(Clone)]
pub struct OpenAIClient {
    client: ClientWithMiddleware,
    api_key: Arc<SecretString>,
    base_url: String,
    config: Arc<Config>,
}

// Custom Debug implementation to avoid exposing the API key
impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OpenAIClient {
    /// Create a new client from a configuration.
    ///
    /// The configuration must carry an API key and an endpoint URL.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use wayfarer_client::OpenAIClient;
    /// use wayfarer_common::client::Config;
    ///
    /// let config = Config::new("github", "gpt-4o-mini")
    ///     .with_api_key("github_pat_...")
    ///     .with_endpoint("https://models.github.ai/inference");
    ///
    /// let client = OpenAIClient::new(config)?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the API key or endpoint is missing, the endpoint
    /// is not a valid URL, or HTTP client creation fails.
    pub fn new(config: Config) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ClientError::ConfigurationError("API key is required".to_string()))?;

        let base_url = config
            .endpoint
            .clone()
            .ok_or_else(|| ClientError::ConfigurationError("endpoint is required".to_string()))?;
        let base_url = base_url.trim_end_matches('/').to_string();

        url::Url::parse(&base_url).map_err(|e| {
            ClientError::ConfigurationError(format!("invalid endpoint URL '{base_url}': {e}"))
        })?;

        let client = wire::build_http_client(&config)?;

        Ok(Self {
            client,
            api_key: Arc::new(api_key),
            base_url,
            config: Arc::new(config),
        })
    }

    /// Set the model to use for chat completions.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).model = model.into();
        self
    }

    async fn make_request(
        &self,
        body: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ClientError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request_builder = self.client.post(&url).header(
            "Authorization",
            format!("Bearer {}", self.api_key.expose_secret()),
        );

        wire::send_chat(request_builder, body).await
    }
}

#[async_trait]
impl ChatClient for OpenAIClient {
    fn config(&self) -> &Config {
        &self.config
    }

    fn supports_tools(&self) -> bool {
        true
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.validate_request(request)?;

        let wire_request = ChatCompletionRequest::from((request, self.config.as_ref()));
        let response = self.make_request(&wire_request).await?;

        let thread_id = request
            .messages
            .first()
            .ok_or_else(|| {
                ClientError::InvalidRequest("request must contain at least one message".to_string())
            })?
            .thread_id;

        Ok(wire::into_chat_response(response, thread_id)?)
    }
}
