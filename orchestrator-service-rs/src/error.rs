// orchestrator-service-rs/src/error.rs

use llm_service::ReasoningError;
use thiserror::Error;

/// Request-level failure returned by `Orchestrator::handle`.
///
/// Adapter failures and deadline expiry never show up here: they are
/// recorded as evidence and only lower the answer's confidence.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("invalid question: {0}")]
    InvalidQuestion(String),

    #[error("reasoning engine failure: {0}")]
    Reasoning(#[from] ReasoningError),
}

impl OrchestrationError {
    /// Short machine-readable kind, for logs and the CLI exit path.
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestrationError::InvalidQuestion(_) => "invalid_question",
            OrchestrationError::Reasoning(ReasoningError::Timeout(_)) => "reasoning_timeout",
            OrchestrationError::Reasoning(_) => "reasoning_failure",
        }
    }
}
