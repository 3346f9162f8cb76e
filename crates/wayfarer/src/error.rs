use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Tool execution error: {0}")]
    ToolError(String),

    #[error("Maximum turns exceeded: {0}")]
    MaxTurnsExceeded(String),

    #[error("Model call exceeded the turn timeout of {0} seconds")]
    TurnTimeout(u64),

    #[error("Model returned a message with no content")]
    EmptyResponse,

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}
