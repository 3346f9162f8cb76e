use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, error};
use secrecy::ExposeSecret;
use serde_json::Value;

use crate::config::SearchConfig;
use crate::{REQUEST_FAILED, ToolImplementation};
use wayfarer_common::tools::{Function, Parameters, Property, Tool};

/// Default per-conversation cap on hotel lookups.
const DEFAULT_MAX_INVOCATIONS: u32 = 3;

/// A tool that searches hotels through the SerpAPI Google Hotels engine.
///
/// The query is fixed to one adult, USD prices and the US English locale.
/// On success the tool returns the serialized `properties` array of the
/// response; any failure, transport or otherwise, is reported to the model
/// as the `"request failed"` marker.
pub struct HotelSearchTool {
    client: reqwest::Client,
    config: SearchConfig,
    max_invocations: u32,
}

impl HotelSearchTool {
    /// Creates the tool with a cap of three lookups per conversation.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: SearchConfig) -> Result<Self> {
        let client = config.build_client()?;
        Ok(Self {
            client,
            config,
            max_invocations: DEFAULT_MAX_INVOCATIONS,
        })
    }

    /// Overrides the per-conversation invocation cap.
    #[must_use]
    pub const fn with_max_invocations(mut self, max_invocations: u32) -> Self {
        self.max_invocations = max_invocations;
        self
    }

    async fn search(&self, query: &str, check_in_date: &str, check_out_date: &str) -> String {
        let params = [
            ("engine", "google_hotels"),
            ("q", query),
            ("check_in_date", check_in_date),
            ("check_out_date", check_out_date),
            ("adults", "1"),
            ("currency", "USD"),
            ("gl", "us"),
            ("hl", "en"),
            ("api_key", self.config.api_key().expose_secret()),
        ];

        let response = match self
            .client
            .get(self.config.base_url())
            .query(&params)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("hotel search request failed: {e}");
                return REQUEST_FAILED.to_string();
            }
        };

        if !response.status().is_success() {
            error!("hotel search returned status {}", response.status());
            return REQUEST_FAILED.to_string();
        }

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                error!("hotel search returned unparseable body: {e}");
                return REQUEST_FAILED.to_string();
            }
        };

        match body.get("properties") {
            Some(properties) => {
                debug!("hotel search for '{query}' returned properties");
                properties.to_string()
            }
            None => {
                error!("hotel search response has no 'properties' field");
                REQUEST_FAILED.to_string()
            }
        }
    }
}

#[async_trait]
impl ToolImplementation for HotelSearchTool {
    fn get_definition(&self) -> Tool {
        let mut properties = HashMap::new();
        properties.insert(
            "query".to_string(),
            Property::string("The location or hotel name to search for, e.g. 'Hotels in Paris'"),
        );
        properties.insert(
            "check_in_date".to_string(),
            Property::string("Check-in date in YYYY-MM-DD format"),
        );
        properties.insert(
            "check_out_date".to_string(),
            Property::string("Check-out date in YYYY-MM-DD format"),
        );

        Tool {
            r#type: "function".to_string(),
            function: Function {
                name: "search_hotels".to_string(),
                description: "Search for hotels at a destination for the given dates.".to_string(),
                parameters: Parameters::new(
                    properties,
                    vec![
                        "query".to_string(),
                        "check_in_date".to_string(),
                        "check_out_date".to_string(),
                    ],
                )
                .into(),
            },
        }
    }

    async fn execute(&self, args: &Value) -> Result<String> {
        let obj = args
            .as_object()
            .ok_or_else(|| anyhow::anyhow!("Expected object arguments"))?;

        let query = obj
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("Missing or invalid 'query' parameter"))?;
        let check_in_date = obj
            .get("check_in_date")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("Missing or invalid 'check_in_date' parameter"))?;
        let check_out_date = obj
            .get("check_out_date")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("Missing or invalid 'check_out_date' parameter"))?;

        Ok(self.search(query, check_in_date, check_out_date).await)
    }

    fn max_invocations(&self) -> Option<u32> {
        Some(self.max_invocations)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tool_for(server: &MockServer) -> HotelSearchTool {
        let config = SearchConfig::new("serp-test-key")
            .with_base_url(format!("{}/search", server.uri()));
        HotelSearchTool::new(config).unwrap()
    }

    fn args() -> Value {
        json!({
            "query": "Hotels in Tokyo",
            "check_in_date": "2026-09-10",
            "check_out_date": "2026-09-12"
        })
    }

    #[tokio::test]
    async fn returns_properties_on_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("engine", "google_hotels"))
            .and(query_param("q", "Hotels in Tokyo"))
            .and(query_param("check_in_date", "2026-09-10"))
            .and(query_param("check_out_date", "2026-09-12"))
            .and(query_param("adults", "1"))
            .and(query_param("currency", "USD"))
            .and(query_param("gl", "us"))
            .and(query_param("hl", "en"))
            .and(query_param("api_key", "serp-test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "properties": [
                    {"name": "Hotel Sakura", "rate_per_night": {"lowest": "$120"}},
                    {"name": "Tokyo Bay Inn", "rate_per_night": {"lowest": "$95"}}
                ]
            })))
            .mount(&mock_server)
            .await;

        let tool = tool_for(&mock_server);
        let result = tool.execute(&args()).await.unwrap();

        assert!(result.contains("Hotel Sakura"));
        assert!(result.contains("Tokyo Bay Inn"));
    }

    #[tokio::test]
    async fn non_success_status_becomes_failure_marker() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let tool = tool_for(&mock_server);
        assert_eq!(tool.execute(&args()).await.unwrap(), REQUEST_FAILED);
    }

    #[tokio::test]
    async fn missing_properties_field_becomes_failure_marker() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"search_metadata": {}})))
            .mount(&mock_server)
            .await;

        let tool = tool_for(&mock_server);
        assert_eq!(tool.execute(&args()).await.unwrap(), REQUEST_FAILED);
    }

    #[tokio::test]
    async fn unreachable_endpoint_becomes_failure_marker() {
        let config = SearchConfig::new("key").with_base_url("http://127.0.0.1:1/search");
        let tool = HotelSearchTool::new(config).unwrap();
        assert_eq!(tool.execute(&args()).await.unwrap(), REQUEST_FAILED);
    }

    #[tokio::test]
    async fn missing_arguments_are_errors() {
        let mock_server = MockServer::start().await;
        let tool = tool_for(&mock_server);

        let result = tool.execute(&json!({"query": "Hotels in Tokyo"})).await;
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("check_in_date")
        );
    }

    #[test]
    fn default_cap_is_three() {
        let tool = HotelSearchTool::new(SearchConfig::new("k")).unwrap();
        assert_eq!(tool.max_invocations(), Some(3));

        let tool = tool.with_max_invocations(5);
        assert_eq!(tool.max_invocations(), Some(5));
    }
}
