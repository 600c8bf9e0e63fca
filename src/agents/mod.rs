//! AI-powered agents.
//!
//! Agents turn computed analysis into prose using an AI model. The
//! analysis itself never depends on them: an agent failure is handled at
//! the call site and never invalidates numbers already computed.

pub mod backend;
pub mod narrator;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during agent execution.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("AI backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("AI response unparseable: {0}")]
    ResponseParseError(String),

    #[error("AI returned an empty response")]
    EmptyResponse,

    #[error("Unsupported AI backend: {0}")]
    UnsupportedBackend(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),
}

/// Core trait for all AI agents.
#[async_trait]
pub trait Agent {
    type Input;
    type Output;

    /// Agent identifier for logging.
    fn name(&self) -> &'static str;

    /// Execute the agent's task.
    async fn execute(&self, input: Self::Input) -> Result<Self::Output, AgentError>;
}
