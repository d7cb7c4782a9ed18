// orchestrator-service-rs/src/lib.rs
// Agent orchestrator for cluster observability questions.
//
// question -> ToolSelector -> ExecutionCoordinator -> ContextBuilder
//          -> ReasoningClient -> ResponseParser -> AgentResponse

pub mod context_builder;
pub mod coordinator;
pub mod error;
pub mod orchestrator;
pub mod queries;
pub mod response_parser;
pub mod selector;
pub mod terms;

pub use context_builder::ContextBuilder;
pub use coordinator::ExecutionCoordinator;
pub use error::OrchestrationError;
pub use orchestrator::Orchestrator;
pub use response_parser::{ConfidencePolicy, ResponseParser};
pub use selector::ToolSelector;
