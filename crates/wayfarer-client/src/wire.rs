//! Wire types for the chat completions API.
//!
//! Both supported providers (Azure OpenAI and OpenAI-compatible endpoints
//! such as GitHub Models) speak the same chat completions dialect; only
//! authentication and URL construction differ. The shared serialization
//! types and request plumbing live here.

use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use reqwest_middleware::ClientWithMiddleware;
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use reqwest_retry_after::RetryAfterMiddleware;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use typed_builder::TypedBuilder;
use uuid::Uuid;

use wayfarer_common::chat::{Message, MessageRole};
use wayfarer_common::client::{ChatRequest, ChatResponse, Config, Usage};
use wayfarer_common::tools::{FunctionCall, Tool, ToolCall};

use crate::error::{ClientError, ErrorResponse};

/// Bound applied when the configuration does not set a timeout. Every
/// request gets a deadline.
pub(crate) const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// OpenAI-compatible message format.
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
pub struct OpenAIMessage {
    /// The role of the message author.
    pub role: MessageRole,
    /// The text content; absent on assistant messages that only carry tool
    /// calls.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Optional name of the message author, the function name on tool
    /// messages.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tool calls requested by the assistant.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<SmallVec<[OpenAIToolCall; 2]>>,
    /// ID of the tool call this message answers, on tool messages.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl From<&Message> for OpenAIMessage {
    fn from(message: &Message) -> Self {
        let tool_calls = if message.tool_calls.is_empty() {
            None
        } else {
            Some(
                message
                    .tool_calls
                    .iter()
                    .map(OpenAIToolCall::from)
                    .collect(),
            )
        };

        let content = if message.content.is_empty() {
            None
        } else {
            Some(message.content.clone())
        };

        OpenAIMessage::builder()
            .role(message.role)
            .content(content)
            .name(message.name.clone())
            .tool_calls(tool_calls)
            .tool_call_id(message.tool_call_id.clone())
            .build()
    }
}

/// OpenAI-compatible tool call format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIToolCall {
    /// Unique identifier for this tool call.
    pub id: String,
    /// Type of the tool call, typically "function".
    #[serde(rename = "type", default = "default_tool_call_type")]
    pub r#type: String,
    /// The function to call with its arguments.
    pub function: OpenAIFunction,
}

impl From<&ToolCall> for OpenAIToolCall {
    fn from(tool_call: &ToolCall) -> Self {
        Self {
            id: tool_call.id.clone(),
            r#type: tool_call.call_type.clone(),
            function: OpenAIFunction {
                name: tool_call.function.name.clone(),
                arguments: tool_call.function.arguments.clone(),
            },
        }
    }
}

fn default_tool_call_type() -> String {
    "function".to_string()
}

/// OpenAI-compatible function call format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIFunction {
    /// The name of the function to call.
    pub name: String,
    /// The arguments as a JSON-serialized string.
    pub arguments: String,
}

/// Request body for the chat completions endpoint.
#[derive(Debug, Clone, Serialize, TypedBuilder)]
pub struct ChatCompletionRequest {
    /// The model identifier; for Azure the deployment carries this in the
    /// URL but the field is still accepted.
    pub model: String,
    /// The conversation messages in wire format.
    pub messages: Vec<OpenAIMessage>,
    /// Maximum tokens to generate.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature 0.0 to 2.0.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling threshold 0.0 to 1.0.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Tools available for function calling.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// Tool selection strategy.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<serde_json::Value>,
}

impl From<(&ChatRequest, &Config)> for ChatCompletionRequest {
    fn from((request, config): (&ChatRequest, &Config)) -> Self {
        let messages: Vec<OpenAIMessage> =
            request.messages.iter().map(OpenAIMessage::from).collect();

        ChatCompletionRequest::builder()
            .model(
                request
                    .model
                    .clone()
                    .unwrap_or_else(|| config.model.clone()),
            )
            .messages(messages)
            .max_tokens(request.max_tokens.or(config.max_tokens))
            .temperature(request.temperature.or(config.temperature))
            .top_p(request.top_p.or(config.top_p))
            .tools(request.tools.clone())
            .tool_choice(request.tool_choice.as_ref().map(|tc| tc.clone().into()))
            .build()
    }
}

/// A single choice from a chat completion response.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    /// The index of this choice in the response array.
    pub index: u32,
    /// The generated message for this choice.
    pub message: OpenAIMessage,
    /// Why generation stopped: "stop", "length", "tool_calls", or
    /// "content_filter".
    pub finish_reason: Option<String>,
}

/// Response body from the chat completions endpoint.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    /// Unique identifier for this completion.
    pub id: String,
    /// Object type, typically "chat.completion".
    pub object: String,
    /// Unix timestamp of when the completion was created.
    pub created: u64,
    /// The model that generated this completion.
    pub model: String,
    /// Array of generated completions.
    pub choices: Vec<ChatChoice>,
    /// Token usage statistics, if reported.
    pub usage: Option<Usage>,
}

/// Builds the middleware-wrapped HTTP client shared by both providers.
///
/// `RetryAfterMiddleware` is registered before `RetryTransientMiddleware` so
/// Retry-After headers are honored before falling back to exponential
/// backoff.
pub(crate) fn build_http_client(config: &Config) -> Result<ClientWithMiddleware, ClientError> {
    let retry_policy = ExponentialBackoff::builder()
        .retry_bounds(
            config.retry_config.initial_delay,
            config.retry_config.max_delay,
        )
        .build_with_max_retries(config.retry_config.max_retries);

    let timeout = config.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS);
    let reqwest_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout))
        .build()?;

    Ok(reqwest_middleware::ClientBuilder::new(reqwest_client)
        .with(RetryAfterMiddleware::new())
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Sends a prepared chat completions request and parses the response,
/// mapping HTTP error statuses onto [`ClientError`] variants.
pub(crate) async fn send_chat(
    request_builder: reqwest_middleware::RequestBuilder,
    body: &ChatCompletionRequest,
) -> Result<ChatCompletionResponse, ClientError> {
    let response = request_builder
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(body).map_err(ClientError::SerializationError)?)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.map_err(|e| {
            warn!("Failed to read error response body: {e}");
            ClientError::NetworkError(e)
        })?;

        // Prefer the structured error message, fall back to the raw body
        let error_message = match serde_json::from_str::<ErrorResponse>(&error_text) {
            Ok(parsed) => parsed.error.message,
            Err(parse_err) => {
                debug!("Failed to parse error response as JSON: {parse_err}. Using raw text.");
                error_text
            }
        };

        error!(
            "API request failed with status {}: {}",
            status.as_u16(),
            error_message
        );

        return Err(match status.as_u16() {
            401 => ClientError::AuthenticationError(error_message),
            429 => ClientError::RateLimitError { retry_after: None },
            500..=599 => ClientError::ServiceUnavailable(error_message),
            _ => ClientError::RequestError(error_message),
        });
    }

    let response_text = response.text().await?;
    debug!("Raw API response: {response_text}");
    serde_json::from_str(&response_text).map_err(ClientError::SerializationError)
}

/// Converts a wire message back to the internal format.
///
/// Tool call arguments are passed through unparsed; the executor validates
/// them at invocation time.
pub(crate) fn message_from_wire(openai_msg: &OpenAIMessage, thread_id: Uuid) -> Message {
    let tool_calls = openai_msg
        .tool_calls
        .as_ref()
        .map(|tcs| {
            let mut result = SmallVec::with_capacity(tcs.len());
            for tc in tcs {
                result.push(ToolCall {
                    id: tc.id.clone(),
                    call_type: tc.r#type.clone(),
                    function: FunctionCall {
                        name: tc.function.name.clone(),
                        arguments: tc.function.arguments.clone(),
                    },
                });
            }
            result
        })
        .unwrap_or_default();

    Message {
        id: Uuid::new_v4(),
        thread_id,
        role: openai_msg.role,
        content: openai_msg.content.clone().unwrap_or_default(),
        tool_calls,
        tool_call_id: openai_msg.tool_call_id.clone(),
        name: openai_msg.name.clone(),
        timestamp: Utc::now(),
    }
}

/// Assembles a [`ChatResponse`] from the parsed completion body.
pub(crate) fn into_chat_response(
    response: ChatCompletionResponse,
    thread_id: Uuid,
) -> Result<ChatResponse, ClientError> {
    let choice = response.choices.first().ok_or_else(|| {
        warn!(
            "Received empty choices array from API. Response ID: {}, Model: {}",
            response.id, response.model
        );
        ClientError::InvalidResponse("API returned no choices in response".to_string())
    })?;

    let message = message_from_wire(&choice.message, thread_id);

    let finish_reason = choice
        .finish_reason
        .as_ref()
        .and_then(|reason| reason.parse().ok());

    Ok(ChatResponse {
        message,
        model: response.model,
        usage: response.usage,
        finish_reason,
        created_at: DateTime::from_timestamp(i64::try_from(response.created).unwrap_or(0), 0)
            .unwrap_or_else(Utc::now),
        response_id: Some(response.id),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use wayfarer_common::chat::Thread;

    #[test]
    fn empty_content_is_omitted_from_wire() {
        let thread = Thread::new();
        let msg = thread
            .assistant_message("")
            .with_tool_calls(vec![ToolCall::new("search_hotels", "{}")])
            .unwrap();

        let wire = OpenAIMessage::from(&msg);
        assert!(wire.content.is_none());
        assert_eq!(wire.tool_calls.as_ref().unwrap().len(), 1);

        let json = serde_json::to_value(&wire).unwrap();
        assert!(json.get("content").is_none());
        assert_eq!(json["tool_calls"][0]["type"], "function");
    }

    #[test]
    fn tool_result_messages_carry_call_id_and_name() {
        let thread = Thread::new();
        let msg = thread
            .tool_message("sunny", "call_1".to_string(), "get_weather".to_string())
            .unwrap();

        let wire = OpenAIMessage::from(&msg);
        assert_eq!(wire.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(wire.name.as_deref(), Some("get_weather"));
        assert_eq!(wire.content.as_deref(), Some("sunny"));
    }

    #[test]
    fn request_falls_back_to_config_defaults() {
        let thread = Thread::new();
        let config = Config::new("azure", "gpt-4o-mini")
            .with_temperature(0.2)
            .with_max_tokens(512);
        let request = ChatRequest::new(vec![thread.user_message("hi")]);

        let wire = ChatCompletionRequest::from((&request, &config));
        assert_eq!(wire.model, "gpt-4o-mini");
        assert_eq!(wire.temperature, Some(0.2));
        assert_eq!(wire.max_tokens, Some(512));
        assert!(wire.tools.is_none());
    }

    #[test]
    fn wire_message_converts_back_with_tool_calls() {
        let thread_id = Uuid::new_v4();
        let wire: OpenAIMessage = serde_json::from_value(serde_json::json!({
            "role": "assistant",
            "tool_calls": [{
                "id": "call_abc",
                "type": "function",
                "function": {
                    "name": "get_random_destination",
                    "arguments": "{}"
                }
            }]
        }))
        .unwrap();

        let msg = message_from_wire(&wire, thread_id);
        assert_eq!(msg.thread_id, thread_id);
        assert_eq!(msg.role, MessageRole::Assistant);
        assert_eq!(msg.content, "");
        assert_eq!(msg.tool_calls.len(), 1);
        assert_eq!(msg.tool_calls[0].id, "call_abc");
        assert_eq!(msg.tool_calls[0].function.name, "get_random_destination");
    }

    #[test]
    fn missing_tool_call_type_defaults_to_function() {
        let wire: OpenAIToolCall = serde_json::from_value(serde_json::json!({
            "id": "call_1",
            "function": {"name": "f", "arguments": "{}"}
        }))
        .unwrap();
        assert_eq!(wire.r#type, "function");
    }

    #[test]
    fn empty_choices_is_an_invalid_response() {
        let response = ChatCompletionResponse {
            id: "chatcmpl-1".to_string(),
            object: "chat.completion".to_string(),
            created: 0,
            model: "gpt-4o-mini".to_string(),
            choices: vec![],
            usage: None,
        };
        let err = into_chat_response(response, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }
}
