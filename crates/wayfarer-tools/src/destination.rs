use anyhow::Result;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde_json::Value;

use crate::ToolImplementation;
use wayfarer_common::tools::{Function, Parameters, Tool};

/// The fixed set of destinations the picker draws from.
pub const DESTINATIONS: [&str; 10] = [
    "Barcelona, Spain",
    "Paris, France",
    "Berlin, Germany",
    "Tokyo, Japan",
    "Sydney, Australia",
    "New York, USA",
    "Cairo, Egypt",
    "Cape Town, South Africa",
    "Rio de Janeiro, Brazil",
    "Bali, Indonesia",
];

/// A tool that picks a vacation destination uniformly at random.
///
/// Takes no arguments and cannot fail; the only side effect is consuming
/// randomness.
pub struct RandomDestinationTool;

impl RandomDestinationTool {
    fn pick() -> &'static str {
        DESTINATIONS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(DESTINATIONS[0])
    }
}

#[async_trait]
impl ToolImplementation for RandomDestinationTool {
    fn get_definition(&self) -> Tool {
        Tool {
            r#type: "function".to_string(),
            function: Function {
                name: "get_random_destination".to_string(),
                description: "Get a random vacation destination.".to_string(),
                parameters: Parameters::empty().into(),
            },
        }
    }

    async fn execute(&self, _args: &Value) -> Result<String> {
        Ok(Self::pick().to_string())
    }
}
