// shared-types-rs/src/response.rs
// Reasoning input and the final structured answer

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::adapter::AdapterId;
use crate::evidence::{EvidenceResult, EvidenceSet};

/// Bounded text handed to the reasoning engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningContext {
    text: String,
    max_len: usize,
    truncated: Vec<AdapterId>,
}

impl ReasoningContext {
    pub fn new(text: String, max_len: usize, truncated: Vec<AdapterId>) -> Self {
        Self {
            text,
            max_len,
            truncated,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Size ceiling the context was built against.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Adapters whose payload was cut to fit.
    pub fn truncated(&self) -> &[AdapterId] {
        &self.truncated
    }
}

impl fmt::Display for ReasoningContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
    Unknown,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
            Confidence::Unknown => "unknown",
        }
    }

    /// Parse an explicit marker word; anything else is `None`.
    pub fn from_marker(word: &str) -> Option<Self> {
        match word.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Confidence::High),
            "medium" | "moderate" => Some(Confidence::Medium),
            "low" => Some(Confidence::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-adapter usage record mirrored from the EvidenceSet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolUsage {
    pub adapter: AdapterId,
    pub success: bool,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&EvidenceResult> for ToolUsage {
    fn from(result: &EvidenceResult) -> Self {
        Self {
            adapter: result.adapter(),
            success: result.is_success(),
            elapsed_ms: result.elapsed_ms(),
            error: result.error().map(str::to_string),
        }
    }
}

impl ToolUsage {
    pub fn from_evidence(evidence: &EvidenceSet) -> Vec<ToolUsage> {
        evidence.iter().map(ToolUsage::from).collect()
    }
}

/// Final structured diagnosis returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub answer: String,
    pub confidence: Confidence,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub observations: Vec<String>,
    #[serde(default)]
    pub evidence_refs: Vec<AdapterId>,
    #[serde(default)]
    pub tool_usage: Vec<ToolUsage>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl AgentResponse {
    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}
