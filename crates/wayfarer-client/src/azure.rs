//! Client for Azure OpenAI deployments.
//!
//! Azure speaks the same chat completions dialect as OpenAI but differs in
//! addressing and authentication: requests go to
//! `{endpoint}/openai/deployments/{deployment}/chat/completions` with an
//! `api-version` query parameter, and the key travels in an `api-key` header
//! instead of a bearer token. The deployment name takes the place of the
//! model identifier.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use secrecy::{ExposeSecret, SecretString};

use wayfarer_common::client::{ChatRequest, ChatResponse, Config};

use crate::ChatClient;
use crate::error::ClientError;
use crate::wire::{self, ChatCompletionRequest, ChatCompletionResponse};

/// Default service API version, matching current stable Azure OpenAI.
pub const DEFAULT_API_VERSION: &str = "2024-10-21";

/// Client for Azure OpenAI chat completions.
#[derive(Clone)]
pub struct AzureOpenAIClient {
    client: ClientWithMiddleware,
    api_key: Arc<SecretString>,
    /// Fully resolved URL including deployment path and api-version query.
    completions_url: String,
    config: Arc<Config>,
}

// Custom Debug implementation to avoid exposing the API key
impl std::fmt::Debug for AzureOpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureOpenAIClient")
            .field("api_key", &"[REDACTED]")
            .field("completions_url", &self.completions_url)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AzureOpenAIClient {
    /// Create a new client from a configuration.
    ///
    /// The configuration must carry an API key and the resource endpoint;
    /// `config.model` names the deployment. When `api_version` is unset,
    /// [`DEFAULT_API_VERSION`] applies.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use wayfarer_client::AzureOpenAIClient;
    /// use wayfarer_common::client::Config;
    ///
    /// let config = Config::new("azure", "gpt-4o-mini")
    ///     .with_api_key("...")
    ///     .with_endpoint("https://my-resource.openai.azure.com")
    ///     .with_api_version("2024-10-21");
    ///
    /// let client = AzureOpenAIClient::new(config)?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the API key or endpoint is missing, the resulting
    /// URL is invalid, or HTTP client creation fails.
    pub fn new(config: Config) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ClientError::ConfigurationError("API key is required".to_string()))?;

        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| ClientError::ConfigurationError("endpoint is required".to_string()))?;
        let endpoint = endpoint.trim_end_matches('/');

        if config.model.is_empty() {
            return Err(
                ClientError::ConfigurationError("deployment name is required".to_string()).into(),
            );
        }

        let api_version = config
            .api_version
            .clone()
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        let mut completions_url = url::Url::parse(&format!(
            "{endpoint}/openai/deployments/{}/chat/completions",
            config.model
        ))
        .map_err(|e| {
            ClientError::ConfigurationError(format!("invalid endpoint URL '{endpoint}': {e}"))
        })?;
        completions_url
            .query_pairs_mut()
            .append_pair("api-version", &api_version);

        let client = wire::build_http_client(&config)?;

        Ok(Self {
            client,
            api_key: Arc::new(api_key),
            completions_url: completions_url.into(),
            config: Arc::new(config),
        })
    }

    async fn make_request(
        &self,
        body: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ClientError> {
        let request_builder = self
            .client
            .post(&self.completions_url)
            .header("api-key", self.api_key.expose_secret());

        wire::send_chat(request_builder, body).await
    }
}

#[async_trait]
impl ChatClient for AzureOpenAIClient {
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

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use wayfarer_common::chat::Thread;
    use wayfarer_common::client::RetryConfig;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(endpoint: &str) -> Config {
        Config::new("azure", "gpt-4o-mini")
            .with_api_key("azure-test-key")
            .with_endpoint(endpoint)
            .with_api_version("2024-10-21")
            .with_retry_config(RetryConfig {
                max_retries: 0,
                ..RetryConfig::default()
            })
    }

    #[tokio::test]
    async fn request_uses_deployment_path_and_api_key_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4o-mini/chat/completions"))
            .and(query_param("api-version", "2024-10-21"))
            .and(header("api-key", "azure-test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-azure",
                "object": "chat.completion",
                "created": 1_677_652_288,
                "model": "gpt-4o-mini",
                "choices": [{
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": "Barcelona it is."
                    },
                    "finish_reason": "stop"
                }]
            })))
            .mount(&mock_server)
            .await;

        let client = AzureOpenAIClient::new(test_config(&mock_server.uri())).unwrap();

        let thread = Thread::new();
        let request = ChatRequest::new(vec![thread.user_message("Pick somewhere")]);
        let response = client.chat(&request).await.unwrap();

        assert_eq!(response.message.content, "Barcelona it is.");
        assert_eq!(response.response_id.as_deref(), Some("chatcmpl-azure"));
    }

    #[tokio::test]
    async fn service_errors_map_to_service_unavailable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4o-mini/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "error": {"message": "overloaded"}
            })))
            .mount(&mock_server)
            .await;

        let client = AzureOpenAIClient::new(test_config(&mock_server.uri())).unwrap();

        let thread = Thread::new();
        let request = ChatRequest::new(vec![thread.user_message("hi")]);

        let err = client.chat(&request).await.unwrap_err();
        let client_err = err.downcast_ref::<ClientError>().unwrap();
        assert!(client_err.is_retryable());
    }

    #[test]
    fn api_version_defaults_when_unset() {
        let config = Config::new("azure", "dep")
            .with_api_key("k")
            .with_endpoint("https://example.openai.azure.com");
        let client = AzureOpenAIClient::new(config).unwrap();
        assert!(
            client
                .completions_url
                .contains(&format!("api-version={DEFAULT_API_VERSION}"))
        );
    }

    #[test]
    fn missing_endpoint_is_rejected() {
        let config = Config::new("azure", "dep").with_api_key("k");
        assert!(AzureOpenAIClient::new(config).is_err());
    }
}
