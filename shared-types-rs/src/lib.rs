// shared-types-rs/src/lib.rs
// Data model for one question's trip through the orchestrator:
// Question -> ToolPlan -> EvidenceSet -> ReasoningContext -> AgentResponse

pub mod adapter;
pub mod evidence;
pub mod plan;
pub mod question;
pub mod response;

pub use adapter::{AdapterId, UnknownAdapter};
pub use evidence::{EvidenceResult, EvidenceSet, FailureKind};
pub use plan::{PlanError, ToolParams, ToolPlan, ToolRequest};
pub use question::Question;
pub use response::{AgentResponse, Confidence, ReasoningContext, ToolUsage};
