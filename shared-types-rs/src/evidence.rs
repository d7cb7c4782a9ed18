// shared-types-rs/src/evidence.rs
// Outcome of adapter invocations for one question

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::adapter::AdapterId;

/// Why an invocation produced no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The backend answered with an error or could not be reached.
    Adapter,
    /// The invocation exceeded its own per-adapter timeout.
    Timeout,
    /// The plan-wide deadline expired while the invocation was still pending.
    DeadlineExceeded,
    /// No adapter is registered for the requested identifier.
    Unavailable,
}

/// Result of one adapter invocation. Fields are private: once produced the
/// record is read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceResult {
    adapter: AdapterId,
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    failure: Option<FailureKind>,
    elapsed_ms: u64,
}

impl EvidenceResult {
    pub fn succeeded(adapter: AdapterId, payload: Value, elapsed: Duration) -> Self {
        Self {
            adapter,
            success: true,
            payload: Some(payload),
            error: None,
            failure: None,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn failed(
        adapter: AdapterId,
        kind: FailureKind,
        error: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            adapter,
            success: false,
            payload: None,
            error: Some(error.into()),
            failure: Some(kind),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn adapter(&self) -> AdapterId {
        self.adapter
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn failure(&self) -> Option<FailureKind> {
        self.failure
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }
}

/// Every EvidenceResult gathered for one question, in completion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSet {
    results: Vec<EvidenceResult>,
}

impl EvidenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: EvidenceResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[EvidenceResult] {
        &self.results
    }

    pub fn iter(&self) -> impl Iterator<Item = &EvidenceResult> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, adapter: AdapterId) -> Option<&EvidenceResult> {
        self.results.iter().find(|r| r.adapter == adapter)
    }

    pub fn contains(&self, adapter: AdapterId) -> bool {
        self.get(adapter).is_some()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }

    pub fn success_count(&self) -> usize {
        self.results.len() - self.failed_count()
    }

    /// True when at least one invocation ran and none of them succeeded.
    pub fn all_failed(&self) -> bool {
        !self.results.is_empty() && self.failed_count() == self.results.len()
    }

    /// Share of failed invocations in `[0, 1]`; zero for an empty set.
    pub fn failure_ratio(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.failed_count() as f64 / self.results.len() as f64
    }

    /// Results sorted into canonical adapter order, independent of the order
    /// in which invocations completed.
    pub fn canonical(&self) -> Vec<&EvidenceResult> {
        let mut ordered: Vec<&EvidenceResult> = self.results.iter().collect();
        ordered.sort_by_key(|r| r.adapter);
        ordered
    }
}

impl FromIterator<EvidenceResult> for EvidenceSet {
    fn from_iter<I: IntoIterator<Item = EvidenceResult>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}
