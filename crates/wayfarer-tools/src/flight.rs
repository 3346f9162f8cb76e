use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, error};
use secrecy::ExposeSecret;
use serde_json::Value;

use crate::config::SearchConfig;
use crate::{REQUEST_FAILED, ToolImplementation};
use wayfarer_common::tools::{Function, Parameters, Property, Tool};

/// Default per-conversation cap on flight lookups.
const DEFAULT_MAX_INVOCATIONS: u32 = 3;

/// A tool that searches round-trip flights through the SerpAPI Google
/// Flights engine.
///
/// The round trip is resolved as two lookups, outbound and return, with the
/// airports swapped for the return leg. The result concatenates the legs
/// under `# outbound` and `# return` headings. A failed leg is logged and
/// its section omitted; if both legs fail the `"request failed"` marker is
/// returned instead of an empty result.
pub struct FlightSearchTool {
    client: reqwest::Client,
    config: SearchConfig,
    max_invocations: u32,
}

impl FlightSearchTool {
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

    async fn search_leg(
        &self,
        departure_id: &str,
        arrival_id: &str,
        outbound_date: &str,
        return_date: &str,
    ) -> Option<Value> {
        let params = [
            ("engine", "google_flights"),
            ("departure_id", departure_id),
            ("arrival_id", arrival_id),
            ("outbound_date", outbound_date),
            ("return_date", return_date),
            ("currency", "USD"),
            ("hl", "en"),
            ("api_key", self.config.api_key().expose_secret()),
        ];

        let response = self
            .client
            .get(self.config.base_url())
            .query(&params)
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            error!(
                "flight search {departure_id} -> {arrival_id} returned status {}",
                response.status()
            );
            return None;
        }

        response.json().await.ok()
    }

    async fn search(
        &self,
        origin: &str,
        destination: &str,
        outbound_date: &str,
        return_date: &str,
    ) -> String {
        let mut result = String::new();

        match self
            .search_leg(origin, destination, outbound_date, return_date)
            .await
        {
            Some(body) => {
                debug!("outbound leg {origin} -> {destination} resolved");
                result.push_str("# outbound \n ");
                result.push_str(&body.to_string());
            }
            None => error!("error with outbound request"),
        }

        match self
            .search_leg(destination, origin, outbound_date, return_date)
            .await
        {
            Some(body) => {
                debug!("return leg {destination} -> {origin} resolved");
                result.push_str("\n # return \n");
                result.push_str(&body.to_string());
            }
            None => error!("error with return request"),
        }

        if result.is_empty() {
            REQUEST_FAILED.to_string()
        } else {
            result
        }
    }
}

#[async_trait]
impl ToolImplementation for FlightSearchTool {
    fn get_definition(&self) -> Tool {
        let mut properties = HashMap::new();
        properties.insert(
            "origin".to_string(),
            Property::string("IATA code of the departure airport, e.g. 'JFK'"),
        );
        properties.insert(
            "destination".to_string(),
            Property::string("IATA code of the arrival airport, e.g. 'CDG'"),
        );
        properties.insert(
            "outbound_date".to_string(),
            Property::string("Departure date in YYYY-MM-DD format"),
        );
        properties.insert(
            "return_date".to_string(),
            Property::string("Return date in YYYY-MM-DD format"),
        );

        Tool {
            r#type: "function".to_string(),
            function: Function {
                name: "search_flights".to_string(),
                description: "Search for round-trip flights between two airports.".to_string(),
                parameters: Parameters::new(
                    properties,
                    vec![
                        "origin".to_string(),
                        "destination".to_string(),
                        "outbound_date".to_string(),
                        "return_date".to_string(),
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

        let get = |key: &str| -> Result<&str> {
            obj.get(key)
                .and_then(|v| v.as_str())
                .ok_or_else(|| anyhow::anyhow!("Missing or invalid '{key}' parameter"))
        };

        let origin = get("origin")?;
        let destination = get("destination")?;
        let outbound_date = get("outbound_date")?;
        let return_date = get("return_date")?;

        Ok(self
            .search(origin, destination, outbound_date, return_date)
            .await)
    }

    fn max_invocations(&self) -> Option<u32> {
        Some(self.max_invocations)
    }
}
