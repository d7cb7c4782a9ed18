//! Knowledge-base adapter backed by a small built-in runbook catalogue.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{json, Value};
use shared_types::{AdapterId, ToolParams};

use crate::config::KnowledgeBaseConfig;
use crate::core::{params, required_str, u64_or, EvidenceAdapter};
use crate::error::{Result, ServiceError};

const DEFAULT_TOP_K: u64 = 3;

#[derive(Debug, Clone, Serialize)]
pub struct Runbook {
    pub title: &'static str,
    pub summary: &'static str,
    pub steps: &'static [&'static str],
    pub tags: &'static [&'static str],
}

static CATALOGUE: Lazy<Vec<Runbook>> = Lazy::new(|| {
    vec![
        Runbook {
            title: "High Pod Restart Count Troubleshooting",
            summary: "Diagnose and resolve pods that restart repeatedly",
            steps: &[
                "Check pod logs for crash reasons",
                "Review resource limits and requests",
                "Examine liveness and readiness probe configuration",
                "Check for OOMKilled events",
                "Review the application startup sequence",
            ],
            tags: &["kubernetes", "pod", "restart", "crash", "crashloopbackoff", "oom"],
        },
        Runbook {
            title: "Memory Pressure Investigation",
            summary: "Investigate and relieve memory pressure on nodes and pods",
            steps: &[
                "Check node memory metrics",
                "Identify top memory consumers",
                "Review pod memory limits",
                "Look for memory leaks",
                "Consider horizontal scaling",
            ],
            tags: &["memory", "oom", "performance", "node", "evicted"],
        },
        Runbook {
            title: "High CPU Usage Triage",
            summary: "Find the workload driving CPU saturation and throttle or scale it",
            steps: &[
                "Compare container CPU usage against limits",
                "Check for CPU throttling",
                "Correlate with recent deployments",
                "Scale out or raise limits if the load is legitimate",
            ],
            tags: &["cpu", "throttling", "performance", "latency", "load"],
        },
        Runbook {
            title: "Disk Space Exhaustion",
            summary: "Recover a node or volume that is running out of space",
            steps: &[
                "Identify the filesystem close to capacity",
                "Clean up unused images and logs",
                "Expand the persistent volume if supported",
            ],
            tags: &["disk", "storage", "filesystem", "volume", "evicted"],
        },
        Runbook {
            title: "Service Unreachable",
            summary: "Restore traffic to a service that returns errors or times out",
            steps: &[
                "Check endpoints behind the service",
                "Verify readiness of the backing pods",
                "Inspect network policies and ingress rules",
                "Review recent error logs",
            ],
            tags: &["network", "service", "down", "error", "timeout", "latency"],
        },
    ]
});

fn tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(str::to_string)
        .collect()
}

/// Rank runbooks by keyword overlap with `query`, keeping those that match at all.
pub fn search(query: &str, top_k: usize) -> Vec<Value> {
    let wanted = tokens(query);
    let mut scored: Vec<(f64, &Runbook)> = CATALOGUE
        .iter()
        .filter_map(|runbook| {
            let hits = runbook
                .tags
                .iter()
                .filter(|tag| wanted.iter().any(|w| w.starts_with(*tag)))
                .count();
            (hits > 0).then(|| (hits as f64 / runbook.tags.len() as f64, runbook))
        })
        .collect();

    // stable sort keeps catalogue order between equal scores
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored
        .into_iter()
        .take(top_k)
        .map(|(score, runbook)| {
            json!({
                "title": runbook.title,
                "summary": runbook.summary,
                "steps": runbook.steps,
                "relevance_score": (score * 100.0).round() / 100.0,
            })
        })
        .collect()
}

pub struct KnowledgeBaseAdapter {
    config: KnowledgeBaseConfig,
}

impl KnowledgeBaseAdapter {
    pub fn new(config: KnowledgeBaseConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EvidenceAdapter for KnowledgeBaseAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::KnowledgeBase
    }

    async fn query(&self, params: &ToolParams, _timeout: Duration) -> Result<Value> {
        if !self.config.enabled {
            return Err(ServiceError::disabled("Knowledge base is not enabled"));
        }

        let query = required_str(params, params::QUERY)?;
        let top_k = u64_or(params, params::TOP_K, DEFAULT_TOP_K) as usize;
        let results = search(query, top_k);

        Ok(json!({
            "query": query,
            "count": results.len(),
            "results": results,
        }))
    }
}
