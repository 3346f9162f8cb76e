use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use log::{debug, info};

use wayfarer_client::{ChatClient, ClientError};
use wayfarer_common::chat::{Message, Thread};
use wayfarer_common::client::{ChatRequest, ChatResponse, ToolChoice};
use wayfarer_common::tools::Tool;
use wayfarer_tools::{ToolExecutor, ToolImplementation};

use crate::error::AgentError;

/// Default bound on tool-call rounds within one run.
pub const DEFAULT_MAX_TURNS: u32 = 8;

/// Default bound on a single model call, in seconds.
pub const DEFAULT_TURN_TIMEOUT_SECONDS: u64 = 120;

/// The result of one agent run.
///
/// Holds every message the run appended to the thread: the user message,
/// assistant messages, and any tool results produced along the way.
#[derive(Debug, Clone)]
pub struct RunResponse {
    /// Messages appended during the run, oldest first.
    pub messages: Vec<Message>,
}

impl RunResponse {
    /// The text of the final assistant message.
    #[must_use]
    pub fn text(&self) -> &str {
        self.messages.last().map_or("", |m| m.content.as_str())
    }
}

/// A tool-calling travel agent over a [`ChatClient`].
///
/// Drives the conversation loop: sends the thread to the model, executes
/// any tool calls it requests, feeds the results back, and repeats until
/// the model answers in plain text. Passing the same [`Thread`] to
/// successive runs preserves context across them.
pub struct ChatAgent<C: ChatClient> {
    pub client: C,
    /// Agent display name, included for logging only.
    pub name: String,
    /// System instructions seeded into every fresh thread.
    pub instructions: String,
    /// Bound on tool-call rounds per run, `None` for unlimited.
    pub max_turns: Option<u32>,
    /// Bound on a single model call, in seconds.
    pub turn_timeout_seconds: u64,
    pub tool_choice: ToolChoice,
    pub tool_executor: ToolExecutor,
}

impl<C: ChatClient> ChatAgent<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            name: "Agent".to_string(),
            instructions: String::new(),
            max_turns: Some(DEFAULT_MAX_TURNS),
            turn_timeout_seconds: DEFAULT_TURN_TIMEOUT_SECONDS,
            tool_choice: ToolChoice::Auto,
            tool_executor: ToolExecutor::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    #[must_use]
    pub fn with_tool<T: ToolImplementation + 'static>(mut self, tool: T) -> Self {
        self.tool_executor.add_tool(tool);
        self
    }

    #[must_use]
    pub const fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    #[must_use]
    pub const fn with_turn_timeout(mut self, seconds: u64) -> Self {
        self.turn_timeout_seconds = seconds;
        self
    }

    pub fn add_tool<T: ToolImplementation + 'static>(&mut self, tool: T) {
        self.tool_executor.add_tool(tool);
    }

    /// The definitions of every registered tool.
    #[must_use]
    pub fn tools(&self) -> Vec<Tool> {
        self.tool_executor.get_all_tools()
    }

    /// Creates a fresh thread for use with [`run_on_thread`].
    ///
    /// [`run_on_thread`]: Self::run_on_thread
    #[must_use]
    pub fn new_thread(&self) -> Thread {
        Thread::new()
    }

    /// Runs the agent once on a throwaway thread.
    ///
    /// # Errors
    ///
    /// See [`run_on_thread`](Self::run_on_thread).
    pub async fn run(&self, message: impl Into<String> + Send) -> Result<RunResponse> {
        let mut thread = self.new_thread();
        self.run_on_thread(&mut thread, message).await
    }

    /// Runs the agent on an existing thread, preserving its history.
    ///
    /// Appends the user message, then alternates model calls and tool
    /// executions until the model replies without tool calls. All messages
    /// produced along the way are appended to the thread and returned.
    ///
    /// # Errors
    ///
    /// Returns an error if a model call fails or times out, the tool-call
    /// rounds exceed `max_turns`, or the final assistant message is empty.
    pub async fn run_on_thread(
        &self,
        thread: &mut Thread,
        message: impl Into<String> + Send,
    ) -> Result<RunResponse> {
        if thread.is_empty() {
            // Fresh conversation: seed instructions and start tool caps over
            self.tool_executor.reset_invocations();
            if !self.instructions.is_empty() {
                thread.add_message(thread.system_message(self.instructions.clone()))?;
            }
        }

        let run_start_index = thread.messages().len();
        thread.add_message(thread.user_message(message))?;

        let tools = self.tool_executor.get_all_tools();
        let mut turn_count: u32 = 0;
        let start_time = Instant::now();

        loop {
            let messages_arc: Arc<[Message]> = thread.messages().to_vec().into();
            let mut request = ChatRequest::from((self.client.config(), messages_arc));
            if !tools.is_empty() {
                request = request
                    .with_tools(tools.clone())
                    .with_tool_choice(self.tool_choice.clone());
            }

            info!(
                "[{}] executing chat turn ({}/{})",
                self.name,
                turn_count + 1,
                self.max_turns
                    .map_or("unlimited".to_string(), |max| max.to_string()),
            );
            debug!(
                "Chat request:\n {}",
                serde_json::to_string_pretty(&request)?
            );

            let response = self.chat_bounded(&request).await?;
            debug!(
                "Assistant response:\n {}",
                serde_json::to_string_pretty(&response)?
            );

            let tool_calls = response.message.tool_calls.clone();
            thread.add_message(response.message)?;

            if tool_calls.is_empty() {
                let last = thread.messages().last();
                if last.is_none_or(|m| m.content.is_empty()) {
                    return Err(AgentError::EmptyResponse.into());
                }
                debug!(
                    "No tool calls in response, run completed in {} turns ({:.2?})",
                    turn_count + 1,
                    start_time.elapsed()
                );
                return Ok(RunResponse {
                    messages: thread.messages()[run_start_index..].to_vec(),
                });
            }

            for tool_call in &tool_calls {
                let tool_name = &tool_call.function.name;
                debug!("Tool call: {tool_name} (id: {})", tool_call.id);
                debug!("Tool arguments: {}", tool_call.function.arguments);

                let content = match self.tool_executor.execute_tool(tool_call).await {
                    Ok(result) => {
                        debug!("Tool {tool_name} executed successfully");
                        result
                    }
                    Err(e) => {
                        debug!("Tool {tool_name} execution failed: {e}");
                        format!("Tool execution failed: {e}")
                    }
                };

                let tool_message = thread.tool_message(
                    content,
                    tool_call.id.clone(),
                    tool_call.function.name.clone(),
                )?;
                thread.add_message(tool_message)?;
            }

            turn_count += 1;
            if let Some(max) = self.max_turns
                && turn_count >= max
            {
                return Err(AgentError::MaxTurnsExceeded(format!(
                    "{turn_count} turns executed (configured max: {max})"
                ))
                .into());
            }
        }
    }

    /// Sends a chat request under the turn timeout, retrying transient
    /// failures per the client's retry configuration.
    async fn chat_bounded(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let deadline = Duration::from_secs(self.turn_timeout_seconds);
        match tokio::time::timeout(deadline, self.chat_with_retry(request)).await {
            Ok(result) => result,
            Err(_) => Err(AgentError::TurnTimeout(self.turn_timeout_seconds).into()),
        }
    }

    async fn chat_with_retry(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let mut last_error = None;
        let config = self.client.config();

        for attempt in 0..=config.retry_config.max_retries {
            match self.client.chat(request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    let is_retryable = e
                        .downcast_ref::<ClientError>()
                        .is_some_and(ClientError::is_retryable);

                    if attempt < config.retry_config.max_retries && is_retryable {
                        debug!(
                            "Request failed (attempt {}), retrying in {:?}: {}",
                            attempt + 1,
                            config.retry_config.initial_delay,
                            e
                        );
                        last_error = Some(e);
                        tokio::time::sleep(config.retry_config.initial_delay).await;
                        continue;
                    }
                    last_error = Some(e);
                    break;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AgentError::EmptyResponse.into()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use std::sync::Mutex;

    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::{Value, json};
    use smallvec::smallvec;
    use wayfarer_common::MessageRole;
    use wayfarer_common::client::Config;
    use wayfarer_common::tools::{Function, ToolCall};

    /// Replays a scripted sequence of responses and records every request.
    struct ScriptedClient {
        config: Config,
        script: Mutex<Vec<ScriptedReply>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    enum ScriptedReply {
        Text(&'static str),
        ToolCall(&'static str, &'static str),
    }

    impl ScriptedClient {
        fn new(script: Vec<ScriptedReply>) -> Self {
            Self {
                config: Config::new("mock", "mock-model"),
                script: Mutex::new(script),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedClient {
        fn config(&self) -> &Config {
            &self.config
        }

        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
            self.requests.lock().unwrap().push(request.clone());

            let thread_id = request.messages[0].thread_id;
            let reply = self.script.lock().unwrap().remove(0);
            let message = match reply {
                ScriptedReply::Text(text) => Message::assistant(thread_id, text),
                ScriptedReply::ToolCall(name, args) => {
                    let call = ToolCall::new(name, args);
                    Message::assistant(thread_id, "")
                        .with_tool_calls(smallvec![call])
                        .unwrap()
                }
            };

            Ok(ChatResponse {
                message,
                model: "mock-model".to_string(),
                usage: None,
                finish_reason: None,
                created_at: Utc::now(),
                response_id: None,
            })
        }

        fn supports_tools(&self) -> bool {
            true
        }
    }

    struct FixedDestinationTool;

    #[async_trait]
    impl ToolImplementation for FixedDestinationTool {
        fn get_definition(&self) -> Tool {
            Tool {
                r#type: "function".to_string(),
                function: Function {
                    name: "get_random_destination".to_string(),
                    description: "Pick a destination".to_string(),
                    parameters: json!({"type": "object", "properties": {}, "required": []}),
                },
            }
        }

        async fn execute(&self, _args: &Value) -> Result<String> {
            Ok("Barcelona, Spain".to_string())
        }
    }

    struct FailingTool;

    #[async_trait]
    impl ToolImplementation for FailingTool {
        fn get_definition(&self) -> Tool {
            Tool {
                r#type: "function".to_string(),
                function: Function {
                    name: "broken".to_string(),
                    description: "Always fails".to_string(),
                    parameters: json!({"type": "object"}),
                },
            }
        }

        async fn execute(&self, _args: &Value) -> Result<String> {
            anyhow::bail!("backing service exploded")
        }
    }

    #[tokio::test]
    async fn plain_reply_ends_the_run() {
        let client = ScriptedClient::new(vec![ScriptedReply::Text("Here is your trip plan.")]);
        let agent = ChatAgent::new(client).with_instructions("You plan trips.");

        let response = agent.run("Plan me a day trip").await.unwrap();
        assert_eq!(response.text(), "Here is your trip plan.");
        // User message plus assistant reply
        assert_eq!(response.messages.len(), 2);
    }

    #[tokio::test]
    async fn instructions_are_seeded_as_system_message() {
        let client = ScriptedClient::new(vec![ScriptedReply::Text("ok")]);
        let agent = ChatAgent::new(client).with_instructions("You are a travel planner.");

        let mut thread = agent.new_thread();
        agent.run_on_thread(&mut thread, "hi").await.unwrap();

        let requests = agent.client.requests();
        assert_eq!(requests[0].messages[0].role, MessageRole::System);
        assert_eq!(requests[0].messages[0].content, "You are a travel planner.");
        assert_eq!(requests[0].messages[1].role, MessageRole::User);
    }

    #[tokio::test]
    async fn tool_calls_are_executed_and_fed_back() {
        let client = ScriptedClient::new(vec![
            ScriptedReply::ToolCall("get_random_destination", "{}"),
            ScriptedReply::Text("How about Barcelona?"),
        ]);
        let agent = ChatAgent::new(client).with_tool(FixedDestinationTool);

        let response = agent.run("Pick somewhere for me").await.unwrap();
        assert_eq!(response.text(), "How about Barcelona?");

        // user, assistant tool call, tool result, final assistant
        assert_eq!(response.messages.len(), 4);
        let tool_msg = &response.messages[2];
        assert_eq!(tool_msg.role, MessageRole::Tool);
        assert_eq!(tool_msg.content, "Barcelona, Spain");
        assert_eq!(tool_msg.name.as_deref(), Some("get_random_destination"));

        // The second request must carry the tool result back to the model
        let requests = agent.client.requests();
        assert_eq!(requests.len(), 2);
        assert!(
            requests[1]
                .messages
                .iter()
                .any(|m| m.role == MessageRole::Tool && m.content == "Barcelona, Spain")
        );
        // Tool definitions are attached to every request
        assert!(requests[0].has_tools());
        assert!(requests[1].has_tools());
    }

    #[tokio::test]
    async fn tool_failure_is_reported_to_the_model() {
        let client = ScriptedClient::new(vec![
            ScriptedReply::ToolCall("broken", "{}"),
            ScriptedReply::Text("Something went wrong, sorry."),
        ]);
        let agent = ChatAgent::new(client).with_tool(FailingTool);

        let response = agent.run("try it").await.unwrap();
        let tool_msg = response
            .messages
            .iter()
            .find(|m| m.role == MessageRole::Tool)
            .unwrap();
        assert!(tool_msg.content.contains("Tool execution failed"));
        assert!(tool_msg.content.contains("backing service exploded"));
    }

    #[tokio::test]
    async fn thread_preserves_context_across_runs() {
        let client = ScriptedClient::new(vec![
            ScriptedReply::Text("Barcelona, Spain"),
            ScriptedReply::Text("Day 1: Sagrada Familia."),
        ]);
        let agent = ChatAgent::new(client).with_instructions("You plan trips.");

        let mut thread = agent.new_thread();
        let first = agent
            .run_on_thread(&mut thread, "Pick a destination")
            .await
            .unwrap();
        assert_eq!(first.text(), "Barcelona, Spain");

        let second = agent
            .run_on_thread(&mut thread, "Plan me a day trip there")
            .await
            .unwrap();
        assert_eq!(second.text(), "Day 1: Sagrada Familia.");

        // The second request replays the whole first exchange
        let requests = agent.client.requests();
        let replayed: Vec<&str> = requests[1]
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(
            replayed,
            vec![
                "You plan trips.",
                "Pick a destination",
                "Barcelona, Spain",
                "Plan me a day trip there",
            ]
        );
    }

    #[tokio::test]
    async fn runaway_tool_loop_hits_max_turns() {
        let script = (0..10)
            .map(|_| ScriptedReply::ToolCall("get_random_destination", "{}"))
            .collect();
        let agent = ChatAgent::new(ScriptedClient::new(script))
            .with_tool(FixedDestinationTool)
            .with_max_turns(3);

        let err = agent.run("go").await.unwrap_err();
        assert!(err.to_string().contains("Maximum turns exceeded"));
    }

    #[tokio::test]
    async fn empty_terminal_reply_is_an_error() {
        let client = ScriptedClient::new(vec![ScriptedReply::Text("")]);
        let agent = ChatAgent::new(client);

        let err = agent.run("hello").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AgentError>(),
            Some(AgentError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn slow_model_call_times_out() {
        struct SlowClient {
            config: Config,
        }

        #[async_trait]
        impl ChatClient for SlowClient {
            fn config(&self) -> &Config {
                &self.config
            }

            async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                let thread_id = request.messages[0].thread_id;
                Ok(ChatResponse {
                    message: Message::assistant(thread_id, "too late"),
                    model: "mock".to_string(),
                    usage: None,
                    finish_reason: None,
                    created_at: Utc::now(),
                    response_id: None,
                })
            }

            fn supports_tools(&self) -> bool {
                true
            }
        }

        tokio::time::pause();
        let agent = ChatAgent::new(SlowClient {
            config: Config::new("mock", "m"),
        })
        .with_turn_timeout(1);

        let err = agent.run("hello").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AgentError>(),
            Some(AgentError::TurnTimeout(1))
        ));
    }
}
