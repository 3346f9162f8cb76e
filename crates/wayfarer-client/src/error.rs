//! Error types for the client library.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Error response from the API.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// The error detail object from the API.
    pub error: ErrorDetail,
}

/// Detailed error information from the API.
#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    /// The error message text describing what went wrong.
    pub message: String,
}

/// Errors that can occur when talking to a chat completion API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Network or HTTP request failure.
    ///
    /// DNS resolution, connection failures, or socket errors. Typically
    /// retryable.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Middleware layer error, from the retry stack.
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),

    /// JSON serialization or deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// API authentication failure (HTTP 401).
    ///
    /// The API key is missing, invalid, or revoked.
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Rate limit exceeded (HTTP 429).
    #[error("Rate limit exceeded: {retry_after:?}")]
    RateLimitError {
        /// Suggested wait time before retrying, if provided by the API.
        retry_after: Option<Duration>,
    },

    /// Client configuration issue.
    ///
    /// Invalid endpoint URL, missing required fields, or incompatible
    /// settings.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The request took longer than the configured timeout.
    #[error("Timeout error")]
    TimeoutError,

    /// Malformed request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unexpected or malformed API response.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// API service unavailable (5xx errors).
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Error returned by the API that fits no more specific category.
    #[error("Request error: {0}")]
    RequestError(String),

    /// Tools requested but not supported by this model or provider.
    #[error("Tool execution not supported")]
    ToolsNotSupported,

    /// Temperature parameter out of valid range.
    #[error("Temperature must be between 0.0 & 2.0")]
    InvalidTemperature,

    /// `top_p` parameter out of valid range.
    #[error("TopP must be between 0.0 & 1.0")]
    InvalidTopP,
}

impl ClientError {
    /// Check if this error is potentially retryable.
    ///
    /// Returns `true` for network errors, timeouts, rate limits, and service
    /// unavailable errors.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError(_)
                | Self::MiddlewareError(_)
                | Self::TimeoutError
                | Self::RateLimitError { .. }
                | Self::ServiceUnavailable(_)
        )
    }

    /// Check if this is an authentication error.
    pub const fn is_authentication_error(&self) -> bool {
        matches!(self, Self::AuthenticationError(_))
    }

    /// Get the retry-after duration if this is a rate limit error.
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimitError { retry_after } => *retry_after,
            _ => None,
        }
    }
}
