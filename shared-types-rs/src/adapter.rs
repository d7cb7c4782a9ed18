// shared-types-rs/src/adapter.rs
// Identifiers for the evidence sources the orchestrator can invoke

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One invocable evidence adapter.
///
/// Declaration order is the canonical priority order: plans are emitted,
/// truncated and rendered in this order. Cluster state outranks metrics,
/// metrics outrank alerts, alerts outrank logs, and the knowledge base
/// comes last. `Ord` is derived from it, so sorting a list of ids yields
/// the canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterId {
    ClusterPods,
    ClusterEvents,
    MetricsInstant,
    MetricsRange,
    Alerts,
    Logs,
    KnowledgeBase,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown adapter identifier: {0}")]
pub struct UnknownAdapter(pub String);

impl AdapterId {
    /// Every adapter, in canonical priority order.
    pub const ALL: [AdapterId; 7] = [
        AdapterId::ClusterPods,
        AdapterId::ClusterEvents,
        AdapterId::MetricsInstant,
        AdapterId::MetricsRange,
        AdapterId::Alerts,
        AdapterId::Logs,
        AdapterId::KnowledgeBase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterId::ClusterPods => "cluster_pods",
            AdapterId::ClusterEvents => "cluster_events",
            AdapterId::MetricsInstant => "metrics_instant",
            AdapterId::MetricsRange => "metrics_range",
            AdapterId::Alerts => "alerts",
            AdapterId::Logs => "logs",
            AdapterId::KnowledgeBase => "knowledge_base",
        }
    }

    /// Position in the canonical order (0 = highest priority).
    pub fn priority(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for AdapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdapterId {
    type Err = UnknownAdapter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        AdapterId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| UnknownAdapter(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_follows_priority_policy() {
        let mut ids = vec![
            AdapterId::KnowledgeBase,
            AdapterId::Logs,
            AdapterId::MetricsRange,
            AdapterId::ClusterEvents,
            AdapterId::Alerts,
            AdapterId::ClusterPods,
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                AdapterId::ClusterPods,
                AdapterId::ClusterEvents,
                AdapterId::MetricsRange,
                AdapterId::Alerts,
                AdapterId::Logs,
                AdapterId::KnowledgeBase,
            ]
        );
        assert_eq!(AdapterId::ClusterPods.priority(), 0);
    }

    #[test]
    fn parses_names_leniently() {
        assert_eq!("logs".parse::<AdapterId>().unwrap(), AdapterId::Logs);
        assert_eq!(
            "Metrics-Instant".parse::<AdapterId>().unwrap(),
            AdapterId::MetricsInstant
        );
        assert!("traces".parse::<AdapterId>().is_err());
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&AdapterId::KnowledgeBase).unwrap();
        assert_eq!(json, "\"knowledge_base\"");
    }
}
