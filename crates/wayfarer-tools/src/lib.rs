//! # wayfarer-tools
//!
//! Tool execution framework for the wayfarer travel agent.
//!
//! This crate provides the registry and executor that serve tools to the
//! model, plus the built-in travel lookups:
//!
//! - [`RandomDestinationTool`]: picks a vacation destination from a fixed
//!   list
//! - [`HotelSearchTool`]: queries the SerpAPI Google Hotels engine
//! - [`FlightSearchTool`]: queries the SerpAPI Google Flights engine for a
//!   round trip, one leg at a time
//!
//! ## Core Components
//!
//! - [`ToolImplementation`]: trait for defining tools with execution logic
//! - [`ToolRegistry`]: thread-safe registry of tool definitions
//! - [`ToolExecutor`]: executes tool calls, parsing arguments and enforcing
//!   per-conversation invocation caps
//!
//! ## Example: Creating and Executing a Custom Tool
//!
//! ```rust
//! use wayfarer_tools::{ToolImplementation, ToolExecutor};
//! use wayfarer_common::tools::{Tool, Function};
//! use serde_json::{json, Value};
//! use async_trait::async_trait;
//! use anyhow::Result;
//!
//! struct GreetingTool;
//!
//! #[async_trait]
//! impl ToolImplementation for GreetingTool {
//!     fn get_definition(&self) -> Tool {
//!         Tool {
//!             r#type: "function".to_string(),
//!             function: Function {
//!                 name: "greet".to_string(),
//!                 description: "Greet a person by name".to_string(),
//!                 parameters: json!({
//!                     "type": "object",
//!                     "properties": {
//!                         "name": {
//!                             "type": "string",
//!                             "description": "The person's name"
//!                         }
//!                     },
//!                     "required": ["name"]
//!                 }),
//!             },
//!         }
//!     }
//!
//!     async fn execute(&self, args: &Value) -> Result<String> {
//!         let name = args["name"].as_str().unwrap_or("stranger");
//!         Ok(format!("Hello, {}!", name))
//!     }
//! }
//!
//! let mut executor = ToolExecutor::new();
//! executor.add_tool(GreetingTool);
//! let tools = executor.get_all_tools();
//! ```
//!
//! ## Failure Convention
//!
//! Built-in lookup tools never propagate transport or API failures to the
//! caller. Failures are encoded as strings in the tool result (the
//! `"request failed"` marker, or an omitted flight leg) so the model can
//! react to them in conversation.
//!
//! ## Invocation Caps
//!
//! A tool may declare a per-conversation invocation cap via
//! [`ToolImplementation::max_invocations`]. The executor counts calls per
//! tool and, once the cap is hit, returns a refusal string instead of
//! executing. [`ToolExecutor::reset_invocations`] starts a fresh
//! conversation.
//!
//! ## Thread Safety
//!
//! The [`ToolRegistry`] uses `DashMap` for concurrent access, making it safe
//! to use from multiple async tasks without additional synchronization.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use wayfarer_common::tools::{FunctionCall, Tool, ToolCall};

mod config;
mod destination;
mod flight;
mod hotel;

pub use config::SearchConfig;
pub use destination::RandomDestinationTool;
pub use flight::FlightSearchTool;
pub use hotel::HotelSearchTool;

/// Marker returned when a lookup against the remote search API does not
/// produce a usable result.
pub const REQUEST_FAILED: &str = "request failed";

#[async_trait]
pub trait ToolImplementation: Send + Sync {
    fn get_definition(&self) -> Tool;

    async fn execute(&self, args: &Value) -> Result<String>;

    /// Per-conversation invocation cap, `None` for unlimited.
    fn max_invocations(&self) -> Option<u32> {
        None
    }
}

pub struct ToolRegistry {
    tools: Arc<DashMap<String, Arc<dyn ToolImplementation>>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: Arc::new(DashMap::new()),
        }
    }

    pub fn register(&self, tool: Arc<dyn ToolImplementation>) {
        let name = tool.get_definition().function.name;
        self.tools.insert(name, tool);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolImplementation>> {
        self.tools.get(name).map(|r| r.value().clone())
    }

    #[must_use]
    pub fn get_all_definitions(&self) -> Vec<Tool> {
        self.tools.iter().map(|t| t.get_definition()).collect()
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn ToolImplementation>> {
        self.tools.remove(name).map(|(_, tool)| tool)
    }

    pub fn clear(&mut self) {
        self.tools.clear();
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    #[must_use]
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.key().clone()).collect()
    }
}

/// Executes tool calls against registered implementations.
///
/// Tracks how often each tool has been invoked in the current conversation
/// so per-tool caps can be enforced.
pub struct ToolExecutor {
    registry: ToolRegistry,
    invocations: DashMap<String, u32>,
}

impl ToolExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: ToolRegistry::new(),
            invocations: DashMap::new(),
        }
    }

    pub fn add_tool<T: ToolImplementation + 'static>(&mut self, tool: T) {
        self.registry.register(Arc::new(tool));
    }

    pub fn add_tool_arc(&mut self, tool: Arc<dyn ToolImplementation>) {
        self.registry.register(tool);
    }

    #[must_use]
    pub fn has_tool(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    #[must_use]
    pub fn get_all_tools(&self) -> Vec<Tool> {
        self.registry.get_all_definitions()
    }

    #[must_use]
    pub fn tool_names(&self) -> Vec<String> {
        self.registry.tool_names()
    }

    pub fn remove_tool(&mut self, name: &str) -> Option<Arc<dyn ToolImplementation>> {
        self.registry.remove(name)
    }

    pub fn reset_tools(&mut self) {
        self.registry.clear();
        self.invocations.clear();
    }

    /// Clears the per-tool invocation counts, starting a fresh conversation.
    pub fn reset_invocations(&self) {
        self.invocations.clear();
    }

    /// Execute a tool call.
    ///
    /// When the tool has exhausted its invocation cap, the call is not
    /// executed and a refusal string is returned for the model to read.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool is not found, the arguments cannot be
    /// parsed, or execution fails.
    pub async fn execute_tool(&self, tool_call: &ToolCall) -> Result<String> {
        let function = &tool_call.function;

        let tool = self
            .registry
            .get(&function.name)
            .ok_or_else(|| anyhow::anyhow!("Unknown tool: '{}'", function.name))?;

        if let Some(cap) = tool.max_invocations() {
            let count = self
                .invocations
                .get(&function.name)
                .map_or(0, |c| *c.value());
            if count >= cap {
                log::warn!(
                    "tool '{}' reached its invocation cap of {cap}, refusing call",
                    function.name
                );
                return Ok(format!(
                    "Tool '{}' has reached its limit of {cap} calls for this conversation.",
                    function.name
                ));
            }
        }

        let args = Self::parse_arguments(function)?;

        let result = tool.execute(&args).await;
        if result.is_ok() {
            *self.invocations.entry(function.name.clone()).or_insert(0) += 1;
        }
        result
    }

    fn parse_arguments(function: &FunctionCall) -> Result<Value> {
        let json = function.arguments_json();
        if json == "{}" {
            Ok(Value::Object(serde_json::Map::new()))
        } else {
            serde_json::from_str(json).or_else(|_| Ok(Value::String(json.to_string())))
        }
    }
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}
