// shared-types-rs/src/plan.rs
// ToolRequest / ToolPlan: the adapter invocations chosen for one question

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::adapter::AdapterId;

/// Adapter-specific parameters. A `BTreeMap` keeps key order stable so two
/// plans built from the same question compare and serialize identically.
pub type ToolParams = BTreeMap<String, Value>;

/// A single adapter invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    pub adapter: AdapterId,
    #[serde(default)]
    pub params: ToolParams,
}

impl ToolRequest {
    pub fn new(adapter: AdapterId) -> Self {
        Self {
            adapter,
            params: ToolParams::new(),
        }
    }

    /// Set a parameter, skipping `None` so optional hints never show up as nulls.
    pub fn param(mut self, key: &str, value: impl Into<Option<Value>>) -> Self {
        if let Some(value) = value.into() {
            self.params.insert(key.to_string(), value);
        }
        self
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.params.get(key).and_then(Value::as_u64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("adapter {0} is already present in the plan")]
    DuplicateAdapter(AdapterId),
}

/// Ordered set of ToolRequests with at most one request per adapter.
/// Serialized as a plain list; deserializing rejects duplicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ToolRequest>", into = "Vec<ToolRequest>")]
pub struct ToolPlan {
    requests: Vec<ToolRequest>,
}

impl ToolPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: ToolRequest) -> Result<(), PlanError> {
        if self.contains(request.adapter) {
            return Err(PlanError::DuplicateAdapter(request.adapter));
        }
        self.requests.push(request);
        Ok(())
    }

    pub fn contains(&self, adapter: AdapterId) -> bool {
        self.requests.iter().any(|r| r.adapter == adapter)
    }

    pub fn get(&self, adapter: AdapterId) -> Option<&ToolRequest> {
        self.requests.iter().find(|r| r.adapter == adapter)
    }

    pub fn adapters(&self) -> Vec<AdapterId> {
        self.requests.iter().map(|r| r.adapter).collect()
    }

    pub fn requests(&self) -> &[ToolRequest] {
        &self.requests
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolRequest> {
        self.requests.iter()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Keep only the first `max` requests.
    pub fn truncate(&mut self, max: usize) {
        self.requests.truncate(max);
    }
}

impl TryFrom<Vec<ToolRequest>> for ToolPlan {
    type Error = PlanError;

    fn try_from(requests: Vec<ToolRequest>) -> Result<Self, Self::Error> {
        let mut plan = ToolPlan::new();
        for request in requests {
            plan.push(request)?;
        }
        Ok(plan)
    }
}

impl From<ToolPlan> for Vec<ToolRequest> {
    fn from(plan: ToolPlan) -> Self {
        plan.requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_duplicate_adapters() {
        let mut plan = ToolPlan::new();
        plan.push(ToolRequest::new(AdapterId::Logs)).unwrap();
        let err = plan.push(ToolRequest::new(AdapterId::Logs)).unwrap_err();
        assert_eq!(err, PlanError::DuplicateAdapter(AdapterId::Logs));
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn deserializing_checks_duplicates() {
        let plan: ToolPlan = serde_json::from_value(json!([
            {"adapter": "cluster_pods"},
            {"adapter": "logs", "params": {"limit": 10}}
        ]))
        .unwrap();
        assert_eq!(plan.adapters(), vec![AdapterId::ClusterPods, AdapterId::Logs]);
        assert_eq!(serde_json::to_value(&plan).unwrap()[1]["params"]["limit"], 10);

        let err = serde_json::from_value::<ToolPlan>(json!([
            {"adapter": "logs"},
            {"adapter": "logs"}
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("already present"));
    }

    #[test]
    fn none_params_are_skipped() {
        let request = ToolRequest::new(AdapterId::ClusterPods)
            .param("namespace", None::<Value>)
            .param("pod", Some(json!("api")));
        assert!(!request.params.contains_key("namespace"));
        assert_eq!(request.get_str("pod"), Some("api"));
    }
}
