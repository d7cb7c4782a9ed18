// orchestrator-service-rs/src/selector.rs
// Tool Selector: Question -> ToolPlan
//
// Selection is a declarative table of (signal predicate -> adapter) rows
// kept in canonical priority order. The plan is emitted in table order and
// truncated to `max_adapters`, so when more rows match than the cap allows
// the lowest-priority adapters are the ones dropped:
//
//   cluster state > metrics > alerts > logs > knowledge base
//
// This order decides which evidence survives truncation and therefore
// shapes answer quality. Changing it is a policy change.

use config_rs::OrchestratorConfig;
use serde_json::json;
use shared_types::{AdapterId, Question, ToolPlan, ToolRequest};
use tool_sdk::core::params;

use crate::queries;
use crate::terms::Terms;

pub const TEMPORAL_TERMS: &[&str] = &[
    "current",
    "currently",
    "now",
    "right now",
    "at the moment",
    "present",
];
pub const METRIC_TERMS: &[&str] = &[
    "cpu",
    "memory",
    "ram",
    "latency",
    "throughput",
    "rate",
    "metric",
    "performance",
    "slow",
    "usage",
    "disk",
    "storage",
    "filesystem",
    "network",
    "traffic",
    "bandwidth",
    "load",
    "process",
    "temperature",
];
pub const FAILURE_TERMS: &[&str] = &[
    "restart",
    "crash",
    "crashloopbackoff",
    "fail",
    "error",
    "down",
    "killed",
    "oomkilled",
    "evicted",
    "oom",
    "event",
    "backoff",
];
pub const ERROR_TERMS: &[&str] = &["error", "exception", "crash", "fail", "log", "panic"];
pub const ALERT_TERMS: &[&str] = &["alert", "firing", "paging", "page", "incident"];
pub const KNOWLEDGE_TERMS: &[&str] = &["how to", "runbook", "procedure", "steps", "guide"];

/// What the question talks about, computed once per question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Signals {
    pub temporal: bool,
    pub metrics: bool,
    pub failure: bool,
    pub errors: bool,
    pub alerts: bool,
    pub knowledge: bool,
    pub include_logs: bool,
}

impl Signals {
    pub fn detect(question: &Question) -> Self {
        let terms = Terms::new(&question.text);
        Self {
            temporal: terms.any(TEMPORAL_TERMS),
            metrics: terms.any(METRIC_TERMS),
            failure: terms.any(FAILURE_TERMS),
            errors: terms.any(ERROR_TERMS),
            alerts: terms.any(ALERT_TERMS),
            knowledge: terms.any(KNOWLEDGE_TERMS),
            include_logs: question.include_logs,
        }
    }

    /// No vocabulary matched and no logs were asked for.
    pub fn is_empty(&self) -> bool {
        *self == Signals::default()
    }
}

struct SelectionRule {
    adapter: AdapterId,
    applies: fn(&Signals) -> bool,
}

/// Canonical priority order. Kept in step with `AdapterId`'s ordering.
const SELECTION_RULES: &[SelectionRule] = &[
    SelectionRule {
        adapter: AdapterId::ClusterPods,
        applies: |_| true,
    },
    SelectionRule {
        adapter: AdapterId::ClusterEvents,
        applies: |s| s.failure,
    },
    SelectionRule {
        adapter: AdapterId::MetricsInstant,
        applies: |s| s.temporal,
    },
    SelectionRule {
        adapter: AdapterId::MetricsRange,
        applies: |s| s.metrics && !s.temporal,
    },
    SelectionRule {
        adapter: AdapterId::Alerts,
        applies: |s| s.alerts,
    },
    SelectionRule {
        adapter: AdapterId::Logs,
        applies: |s| s.include_logs || s.errors,
    },
    SelectionRule {
        adapter: AdapterId::KnowledgeBase,
        applies: |s| s.knowledge,
    },
];

/// Baseline evidence when nothing in the question points anywhere.
const DEFAULT_PLAN: &[AdapterId] = &[AdapterId::ClusterPods, AdapterId::MetricsRange];

#[derive(Debug, Clone)]
pub struct ToolSelector {
    default_window_minutes: u32,
    metrics_step_seconds: u32,
    max_adapters: usize,
    log_line_limit: u32,
    kb_top_k: u32,
}

impl ToolSelector {
    pub fn new(config: &OrchestratorConfig) -> Self {
        Self {
            default_window_minutes: config.default_window_minutes,
            metrics_step_seconds: config.metrics_step_seconds,
            max_adapters: config.max_adapters.max(1),
            log_line_limit: config.log_line_limit,
            kb_top_k: config.kb_top_k,
        }
    }

    /// Adapters for a question, in canonical order, before the cap.
    pub fn matching_adapters(&self, question: &Question) -> Vec<AdapterId> {
        let signals = Signals::detect(question);
        if signals.is_empty() {
            return DEFAULT_PLAN.to_vec();
        }
        SELECTION_RULES
            .iter()
            .filter(|rule| (rule.applies)(&signals))
            .map(|rule| rule.adapter)
            .collect()
    }

    /// Pure: the same question always yields the same plan.
    pub fn select(&self, question: &Question) -> ToolPlan {
        let mut plan = ToolPlan::new();
        for adapter in self.matching_adapters(question) {
            // Rule rows are unique per adapter, so push cannot collide.
            if let Err(e) = plan.push(self.request_for(adapter, question)) {
                log::warn!("Skipping adapter while planning: {}", e);
            }
        }

        let matched = plan.len();
        plan.truncate(self.max_adapters);
        if plan.len() < matched {
            log::debug!(
                "Plan truncated from {} to {} adapters (max_adapters)",
                matched,
                plan.len()
            );
        }
        plan
    }

    fn window_minutes(&self, question: &Question) -> u32 {
        question
            .time_window_minutes
            .filter(|m| *m > 0)
            .unwrap_or(self.default_window_minutes)
    }

    fn request_for(&self, adapter: AdapterId, question: &Question) -> ToolRequest {
        let namespace = question.namespace_hint().map(|ns| json!(ns));
        let service = question.service_hint().map(|svc| json!(svc));
        let window = json!(self.window_minutes(question));

        let request = ToolRequest::new(adapter);
        match adapter {
            AdapterId::ClusterPods => request
                .param(params::NAMESPACE, namespace)
                .param(params::SERVICE, service),
            AdapterId::ClusterEvents => request
                .param(params::NAMESPACE, namespace)
                .param(params::SERVICE, service)
                .param(params::WINDOW_MINUTES, window),
            AdapterId::MetricsInstant => {
                request.param(params::QUERY, json!(queries::metrics_query(question)))
            }
            AdapterId::MetricsRange => request
                .param(params::QUERY, json!(queries::metrics_query(question)))
                .param(params::WINDOW_MINUTES, window)
                .param(params::STEP_SECONDS, json!(self.metrics_step_seconds)),
            AdapterId::Alerts => request.param(params::NAMESPACE, namespace),
            AdapterId::Logs => request
                .param(params::QUERY, json!(queries::logs_query(question)))
                .param(params::WINDOW_MINUTES, window)
                .param(params::LIMIT, json!(self.log_line_limit)),
            AdapterId::KnowledgeBase => request
                .param(params::QUERY, json!(question.text.trim()))
                .param(params::TOP_K, json!(self.kb_top_k)),
        }
    }
}
