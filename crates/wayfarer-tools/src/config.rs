//! Configuration for the SerpAPI-backed lookup tools.

use std::time::Duration;

use secrecy::SecretString;

/// Default search endpoint; override with [`SearchConfig::with_base_url`]
/// for testing or proxying.
pub const DEFAULT_BASE_URL: &str = "https://serpapi.com/search";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings shared by the hotel and flight search tools.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    api_key: SecretString,
    base_url: String,
    timeout: Duration,
}

impl SearchConfig {
    /// Creates a configuration for the given API key, with the production
    /// endpoint and a 30 second request timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into().into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the search endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the HTTP client the tools issue their lookups with.
    pub(crate) fn build_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder().timeout(self.timeout()).build()
    }
}
