// llm-service-rs/src/lib.rs
// Reasoning engine access for the orchestrator: the client trait, its HTTP
// implementation and the system prompts.

pub mod llm_client;
pub mod prompts;

pub use llm_client::{HttpReasoningClient, LlmConfig, Provider, ReasoningClient, ReasoningError};
pub use prompts::PromptStyle;
