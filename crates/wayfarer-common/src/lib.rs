//! # wayfarer-common
//!
//! Shared data model for the wayfarer travel agent: conversation threads and
//! messages, tool schemas and tool calls, and the chat request/response types
//! exchanged with an LLM provider.

pub mod chat;
pub mod client;
pub mod tools;

pub use chat::{Message, MessageRole, Thread};
pub use client::{ChatRequest, ChatResponse, Config, FinishReason, RetryConfig, ToolChoice, Usage};
pub use tools::{Function, FunctionCall, Parameters, Property, Tool, ToolCall};
