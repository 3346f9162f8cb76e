//! Threads and messages.
//!
//! A [`Thread`] is the opaque handle that preserves multi-turn conversation
//! history: it owns an ordered list of [`Message`]s and mints new messages
//! that are linked to it. Threads live in memory only and are dropped at
//! process exit.
//!
//! Messages carry one of four roles. Tool calls may only be attached to
//! assistant messages, and tool-result messages must reference the call they
//! answer; both rules are enforced at construction time.
//!
//! ```
//! use wayfarer_common::chat::Thread;
//!
//! let mut thread = Thread::new();
//! let msg = thread.user_message("Plan me a day trip");
//! thread.add_message(msg).unwrap();
//! assert_eq!(thread.messages().len(), 1);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::tools::ToolCall;

/// The role of a message sender, serialized lowercase per the OpenAI wire
/// convention.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageRole {
    /// Instructions that define the agent's behavior for the run.
    #[serde(rename = "system")]
    System,
    /// Input from the end user.
    #[serde(rename = "user")]
    User,
    /// A model reply, possibly carrying tool call requests.
    #[serde(rename = "assistant")]
    Assistant,
    /// The result of executing a tool the model asked for.
    #[serde(rename = "tool")]
    Tool,
}

/// A single message in a thread.
#[derive(Debug, Serialize, Deserialize, Clone, TypedBuilder)]
pub struct Message {
    /// Unique identifier for this message.
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,

    /// ID of the thread this message belongs to. Must match the thread it is
    /// added to; enforced by [`Thread::add_message`].
    pub thread_id: Uuid,

    /// The role of the message sender.
    pub role: MessageRole,

    /// The text content. For tool messages this is the tool's result string;
    /// it may be empty on assistant messages that only carry tool calls.
    pub content: String,

    /// Tool calls requested by an assistant message. Inline storage for the
    /// common case of one or two calls.
    #[builder(default)]
    pub tool_calls: SmallVec<[ToolCall; 2]>,

    /// For tool messages: the ID of the [`ToolCall`] this result answers.
    #[builder(default)]
    pub tool_call_id: Option<String>,

    /// For tool messages: the name of the function that was invoked.
    #[builder(default)]
    pub name: Option<String>,

    /// Creation time, UTC.
    #[builder(default = Utc::now())]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a new message with the given role and content.
    pub fn new(thread_id: Uuid, role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            thread_id,
            role,
            content: content.into(),
            tool_calls: SmallVec::new(),
            tool_call_id: None,
            name: None,
            timestamp: Utc::now(),
        }
    }

    /// Creates a system message.
    pub fn system(thread_id: Uuid, content: impl Into<String>) -> Self {
        Self::new(thread_id, MessageRole::System, content)
    }

    /// Creates a user message.
    pub fn user(thread_id: Uuid, content: impl Into<String>) -> Self {
        Self::new(thread_id, MessageRole::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(thread_id: Uuid, content: impl Into<String>) -> Self {
        Self::new(thread_id, MessageRole::Assistant, content)
    }

    /// Creates a tool result message answering a specific tool call.
    ///
    /// # Errors
    ///
    /// Returns an error if `tool_call_id` or `function_name` is empty.
    pub fn tool(
        thread_id: Uuid,
        content: impl Into<String>,
        tool_call_id: String,
        function_name: String,
    ) -> anyhow::Result<Self> {
        if tool_call_id.is_empty() {
            anyhow::bail!("tool call ID cannot be empty");
        }
        if function_name.is_empty() {
            anyhow::bail!("function name cannot be empty for tool messages");
        }
        let mut msg = Self::new(thread_id, MessageRole::Tool, content);
        msg.tool_call_id = Some(tool_call_id);
        msg.name = Some(function_name);
        Ok(msg)
    }

    /// Attaches tool calls to this message.
    ///
    /// # Errors
    ///
    /// Returns an error unless this is an assistant message.
    pub fn with_tool_calls(
        mut self,
        tool_calls: impl Into<SmallVec<[ToolCall; 2]>>,
    ) -> anyhow::Result<Self> {
        if self.role != MessageRole::Assistant {
            anyhow::bail!(
                "tool calls can only be attached to assistant messages, found {:?}",
                self.role
            );
        }
        self.tool_calls = tool_calls.into();
        Ok(self)
    }
}

/// An in-memory conversation thread.
///
/// Passing the same thread to successive agent runs preserves context across
/// turns; the accumulated messages are resent with every model call.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Thread {
    /// Unique identifier; messages must carry it to be accepted.
    pub id: Uuid,
    /// When this thread was created.
    pub created_at: DateTime<Utc>,
    /// When a message was last added.
    pub updated_at: DateTime<Utc>,
    messages: Vec<Message>,
}

impl Thread {
    /// Creates a new empty thread with a generated ID.
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
        }
    }

    /// Appends a message to this thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the message belongs to a different thread.
    pub fn add_message(&mut self, message: Message) -> anyhow::Result<()> {
        if message.thread_id != self.id {
            anyhow::bail!(
                "message thread_id {} does not match thread id {}",
                message.thread_id,
                self.id
            );
        }
        self.messages.push(message);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// The messages accumulated so far, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether the thread holds no messages yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Creates a system message linked to this thread.
    pub fn system_message(&self, content: impl Into<String>) -> Message {
        Message::system(self.id, content)
    }

    /// Creates a user message linked to this thread.
    pub fn user_message(&self, content: impl Into<String>) -> Message {
        Message::user(self.id, content)
    }

    /// Creates an assistant message linked to this thread.
    pub fn assistant_message(&self, content: impl Into<String>) -> Message {
        Message::assistant(self.id, content)
    }

    /// Creates a tool result message linked to this thread.
    ///
    /// # Errors
    ///
    /// Returns an error if `tool_call_id` or `function_name` is empty.
    pub fn tool_message(
        &self,
        content: impl Into<String>,
        tool_call_id: String,
        function_name: String,
    ) -> anyhow::Result<Message> {
        Message::tool(self.id, content, tool_call_id, function_name)
    }
}

impl Default for Thread {
    fn default() -> Self {
        Self::new()
    }
}
