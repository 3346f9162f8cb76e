//! Environment-backed settings for the CLI.
//!
//! Credentials and endpoints come from the environment (or flags, mostly
//! for testing) and are validated up front so a missing variable fails
//! before any conversation starts.

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};

use wayfarer_client::{AzureOpenAIClient, ChatClient, OpenAIClient};
use wayfarer_common::Config;
use wayfarer_tools::SearchConfig;

/// Which chat completion provider to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    /// Azure OpenAI deployment.
    Azure,
    /// GitHub Models, or any OpenAI-compatible endpoint.
    Github,
}

/// Model provider credentials and addressing.
#[derive(Debug, Args)]
pub struct ProviderSettings {
    /// Chat completion provider
    #[arg(long, env = "WAYFARER_PROVIDER", value_enum, default_value = "azure")]
    pub provider: Provider,

    /// Azure OpenAI API key
    #[arg(long, env = "AZURE_OPENAI_API_KEY", hide_env_values = true)]
    pub azure_api_key: Option<String>,

    /// Azure OpenAI resource endpoint
    #[arg(long, env = "AZURE_OPENAI_ENDPOINT")]
    pub azure_endpoint: Option<String>,

    /// Azure OpenAI chat deployment name
    #[arg(long, env = "AZURE_OPENAI_CHAT_DEPLOYMENT_NAME")]
    pub azure_deployment: Option<String>,

    /// Azure OpenAI API version
    #[arg(long, env = "AZURE_OPENAI_API_VERSION")]
    pub azure_api_version: Option<String>,

    /// GitHub Models token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitHub Models inference endpoint
    #[arg(
        long,
        env = "GITHUB_ENDPOINT",
        default_value = "https://models.github.ai/inference"
    )]
    pub github_endpoint: String,

    /// Model to request from GitHub Models
    #[arg(long, env = "GITHUB_MODEL_ID", default_value = "gpt-4o-mini")]
    pub github_model: String,
}

impl ProviderSettings {
    /// Builds the provider configuration, failing on any missing credential.
    pub fn to_config(&self) -> Result<Config> {
        match self.provider {
            Provider::Azure => {
                let api_key = self
                    .azure_api_key
                    .clone()
                    .context("AZURE_OPENAI_API_KEY must be set for the azure provider")?;
                let endpoint = self
                    .azure_endpoint
                    .clone()
                    .context("AZURE_OPENAI_ENDPOINT must be set for the azure provider")?;
                let deployment = self.azure_deployment.clone().context(
                    "AZURE_OPENAI_CHAT_DEPLOYMENT_NAME must be set for the azure provider",
                )?;

                let mut config = Config::new("azure", deployment)
                    .with_api_key(api_key)
                    .with_endpoint(endpoint);
                if let Some(api_version) = &self.azure_api_version {
                    config = config.with_api_version(api_version.clone());
                }
                Ok(config)
            }
            Provider::Github => {
                let token = self
                    .github_token
                    .clone()
                    .context("GITHUB_TOKEN must be set for the github provider")?;

                Ok(Config::new("github", self.github_model.clone())
                    .with_api_key(token)
                    .with_endpoint(self.github_endpoint.clone()))
            }
        }
    }

    /// Builds the chat client for the selected provider.
    pub fn build_client(&self) -> Result<Box<dyn ChatClient>> {
        let config = self.to_config()?;
        Ok(match self.provider {
            Provider::Azure => Box::new(AzureOpenAIClient::new(config)?),
            Provider::Github => Box::new(OpenAIClient::new(config)?),
        })
    }
}

/// SerpAPI credentials for the lookup tools.
#[derive(Debug, Args)]
pub struct SearchSettings {
    /// SerpAPI key for hotel and flight lookups
    #[arg(long, env = "SERP_API_KEY", hide_env_values = true)]
    pub serp_api_key: Option<String>,

    /// SerpAPI endpoint override
    #[arg(long, env = "SERP_API_BASE_URL")]
    pub serp_base_url: Option<String>,
}

impl SearchSettings {
    /// Builds the search configuration, failing when the key is missing.
    pub fn to_search_config(&self) -> Result<SearchConfig> {
        let Some(api_key) = self.serp_api_key.clone() else {
            bail!("SERP_API_KEY must be set to search hotels and flights");
        };
        if api_key.is_empty() {
            bail!("SERP_API_KEY must not be empty");
        }

        let mut config = SearchConfig::new(api_key);
        if let Some(base_url) = &self.serp_base_url {
            config = config.with_base_url(base_url.clone());
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;

    fn empty_provider_settings(provider: Provider) -> ProviderSettings {
        ProviderSettings {
            provider,
            azure_api_key: None,
            azure_endpoint: None,
            azure_deployment: None,
            azure_api_version: None,
            github_token: None,
            github_endpoint: "https://models.github.ai/inference".to_string(),
            github_model: "gpt-4o-mini".to_string(),
        }
    }

    #[test]
    fn azure_requires_key_endpoint_and_deployment() {
        let mut settings = empty_provider_settings(Provider::Azure);
        let err = settings.to_config().unwrap_err();
        assert!(err.to_string().contains("AZURE_OPENAI_API_KEY"));

        settings.azure_api_key = Some("k".to_string());
        let err = settings.to_config().unwrap_err();
        assert!(err.to_string().contains("AZURE_OPENAI_ENDPOINT"));

        settings.azure_endpoint = Some("https://r.openai.azure.com".to_string());
        let err = settings.to_config().unwrap_err();
        assert!(err.to_string().contains("AZURE_OPENAI_CHAT_DEPLOYMENT_NAME"));

        settings.azure_deployment = Some("gpt-4o-mini".to_string());
        let config = settings.to_config().unwrap();
        assert_eq!(config.provider, "azure");
        assert_eq!(config.model, "gpt-4o-mini");
    }

    #[test]
    fn github_requires_only_the_token() {
        let mut settings = empty_provider_settings(Provider::Github);
        let err = settings.to_config().unwrap_err();
        assert!(err.to_string().contains("GITHUB_TOKEN"));

        settings.github_token = Some("github_pat_x".to_string());
        let config = settings.to_config().unwrap();
        assert_eq!(config.provider, "github");
        assert_eq!(
            config.endpoint.as_deref(),
            Some("https://models.github.ai/inference")
        );
    }

    #[test]
    fn search_settings_require_a_key() {
        let settings = SearchSettings {
            serp_api_key: None,
            serp_base_url: None,
        };
        assert!(settings.to_search_config().is_err());

        let settings = SearchSettings {
            serp_api_key: Some("serp-key".to_string()),
            serp_base_url: Some("http://localhost:1234/search".to_string()),
        };
        assert!(settings.to_search_config().is_ok());
    }
}
