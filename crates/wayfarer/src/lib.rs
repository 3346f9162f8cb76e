//! # wayfarer
//!
//! Conversation driver for the wayfarer travel agent.
//!
//! [`ChatAgent`] wraps a [`ChatClient`](wayfarer_client::ChatClient) and
//! drives the tool-call loop: it sends the conversation to the model,
//! executes whichever tools the model requests, feeds the results back, and
//! repeats until the model produces a plain text answer. The scheduling and
//! ordering of tool calls is entirely the model's decision.
//!
//! ## Example
//!
//! ```no_run
//! use wayfarer::ChatAgent;
//! use wayfarer_client::OpenAIClient;
//! use wayfarer_common::Config;
//! use wayfarer_tools::RandomDestinationTool;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::new("github", "gpt-4o-mini")
//!     .with_api_key("your-token")
//!     .with_endpoint("https://models.github.ai/inference");
//!
//! let agent = ChatAgent::new(OpenAIClient::new(config)?)
//!     .with_name("TravelAgent")
//!     .with_instructions("You are a helpful AI agent that plans vacations.")
//!     .with_tool(RandomDestinationTool);
//!
//! let mut thread = agent.new_thread();
//! let response = agent.run_on_thread(&mut thread, "Plan me a day trip").await?;
//! println!("{}", response.text());
//!
//! // The same thread carries the context into the next run
//! let followup = agent
//!     .run_on_thread(&mut thread, "I don't like that destination, pick another")
//!     .await?;
//! println!("{}", followup.text());
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod error;

pub use agent::{ChatAgent, DEFAULT_MAX_TURNS, DEFAULT_TURN_TIMEOUT_SECONDS, RunResponse};
pub use error::AgentError;
