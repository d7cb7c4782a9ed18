// orchestrator-service-rs/src/context_builder.rs
// Context Builder: Question + EvidenceSet -> ReasoningContext
//
// Layout (markdown):
//
//   ## User Question
//   <text>
//
//   ## Context                       (only with hints)
//   - Namespace: ..
//
//   ## Tool Results
//
//   ### <adapter> (ok, 12ms)
//   ```json
//   {..}
//   ```
//
//   ### <adapter> (failed, timeout)
//   unavailable: <reason>
//
// Blocks follow canonical adapter order. Each block body is cut to a fair
// share of the remaining budget, never more than `max_block_chars`, so one
// oversized payload cannot crowd out the others. Sizes are bytes.

use config_rs::OrchestratorConfig;
use serde_json::Value;
use shared_types::{AdapterId, EvidenceResult, EvidenceSet, FailureKind, Question, ReasoningContext};

const TRUNCATION_MARKER: &str = "\n... [truncated]";
const RESULTS_HEADING: &str = "## Tool Results\n\n";
const NO_EVIDENCE: &str = "No evidence sources were queried.\n";

#[derive(Debug, Clone)]
pub struct ContextBuilder {
    max_context_chars: usize,
    max_block_chars: usize,
    max_log_entries: usize,
    default_window_minutes: u32,
}

impl ContextBuilder {
    pub fn new(config: &OrchestratorConfig) -> Self {
        Self {
            max_context_chars: config.max_context_chars,
            max_block_chars: config.max_block_chars.min(config.max_context_chars),
            max_log_entries: config.max_log_entries,
            default_window_minutes: config.default_window_minutes,
        }
    }

    /// Pure and deterministic: completion order of `evidence` does not
    /// affect the output.
    pub fn build(&self, question: &Question, evidence: &EvidenceSet) -> ReasoningContext {
        let mut text = self.header(question);
        text.push_str(RESULTS_HEADING);

        let ordered = evidence.canonical();
        let mut truncated = Vec::new();
        // Where each block ends, so the final cut can tell what it removed.
        let mut block_ends = Vec::with_capacity(ordered.len());

        if ordered.is_empty() {
            text.push_str(NO_EVIDENCE);
        } else {
            let headings: Vec<String> = ordered.iter().map(|r| block_heading(r)).collect();
            let framing: usize = headings.iter().map(String::len).sum::<usize>()
                + ordered.len() * BLOCK_FRAMING.len();
            let remaining = self
                .max_context_chars
                .saturating_sub(text.len())
                .saturating_sub(framing);
            let share = (remaining / ordered.len()).min(self.max_block_chars);

            for (result, heading) in ordered.iter().zip(headings) {
                let (body, cut) = self.block_body(result, share);
                if cut {
                    truncated.push(result.adapter());
                }
                text.push_str(&heading);
                if result.is_success() {
                    text.push_str("```json\n");
                    text.push_str(&body);
                    text.push_str("\n```\n\n");
                } else {
                    text.push_str(&body);
                    text.push_str("\n\n");
                }
                block_ends.push((result.adapter(), text.len()));
            }
        }

        if text.len() > self.max_context_chars {
            log::warn!(
                "Context of {} bytes exceeds {} after block truncation, cutting tail",
                text.len(),
                self.max_context_chars
            );
            let end = floor_char_boundary(&text, self.max_context_chars);
            text.truncate(end);
            for (adapter, block_end) in block_ends {
                if block_end > end && !truncated.contains(&adapter) {
                    truncated.push(adapter);
                }
            }
        }

        log::debug!(
            "Built reasoning context: {} bytes, truncated blocks: {:?}",
            text.len(),
            truncated
        );
        ReasoningContext::new(text, self.max_context_chars, truncated)
    }

    fn header(&self, question: &Question) -> String {
        let question_text = clip(question.text.trim(), self.max_block_chars).0;
        let mut header = format!("## User Question\n{}\n\n", question_text);

        let namespace = question.namespace_hint();
        let service = question.service_hint();
        if namespace.is_some() || service.is_some() || question.time_window_minutes.is_some() {
            header.push_str("## Context\n");
            if let Some(ns) = namespace {
                header.push_str(&format!("- Namespace: {}\n", ns));
            }
            if let Some(svc) = service {
                header.push_str(&format!("- Service/Pod: {}\n", svc));
            }
            let window = question
                .time_window_minutes
                .filter(|m| *m > 0)
                .unwrap_or(self.default_window_minutes);
            header.push_str(&format!("- Time Range: Last {} minutes\n\n", window));
        }
        header
    }

    /// Rendered body for one result and whether it had to be cut.
    fn block_body(&self, result: &EvidenceResult, budget: usize) -> (String, bool) {
        match (result.payload(), result.is_success()) {
            (Some(payload), true) => {
                let (payload, dropped) = self.trim_payload(result.adapter(), payload);
                let rendered = serde_json::to_string_pretty(&payload)
                    .unwrap_or_else(|_| payload.to_string());
                let (body, cut) = clip(&rendered, budget);
                (body, cut || dropped)
            }
            _ => {
                let reason = result.error().unwrap_or("no reason reported");
                clip(&format!("unavailable: {}", reason), budget)
            }
        }
    }

    /// Keep only the newest `max_log_entries` log lines. Entries arrive
    /// oldest first, so the tail is kept.
    fn trim_payload(&self, adapter: AdapterId, payload: &Value) -> (Value, bool) {
        if adapter != AdapterId::Logs {
            return (payload.clone(), false);
        }
        let Some(entries) = payload.get("entries").and_then(Value::as_array) else {
            return (payload.clone(), false);
        };
        if entries.len() <= self.max_log_entries {
            return (payload.clone(), false);
        }

        let kept = entries[entries.len() - self.max_log_entries..].to_vec();
        let mut trimmed = payload.clone();
        if let Some(obj) = trimmed.as_object_mut() {
            obj.insert("omitted_entries".to_string(), Value::from(entries.len() - kept.len()));
            obj.insert("entries".to_string(), Value::Array(kept));
        }
        (trimmed, true)
    }
}

/// Fixed bytes around every block besides its heading and body.
const BLOCK_FRAMING: &str = "```json\n\n```\n\n";

fn block_heading(result: &EvidenceResult) -> String {
    if result.is_success() {
        format!("### {} (ok, {}ms)\n", result.adapter(), result.elapsed_ms())
    } else {
        let kind = match result.failure() {
            Some(FailureKind::Timeout) => "timeout",
            Some(FailureKind::DeadlineExceeded) => "deadline exceeded",
            Some(FailureKind::Unavailable) => "not configured",
            Some(FailureKind::Adapter) | None => "error",
        };
        format!("### {} (failed, {})\n", result.adapter(), kind)
    }
}

/// Cut `text` to at most `max` bytes on a char boundary, marking the cut.
fn clip(text: &str, max: usize) -> (String, bool) {
    if text.len() <= max {
        return (text.to_string(), false);
    }
    if max <= TRUNCATION_MARKER.len() {
        let end = floor_char_boundary(text, max);
        return (text[..end].to_string(), true);
    }
    let end = floor_char_boundary(text, max - TRUNCATION_MARKER.len());
    (format!("{}{}", &text[..end], TRUNCATION_MARKER), true)
}

fn floor_char_boundary(text: &str, max: usize) -> usize {
    if max >= text.len() {
        return text.len();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn builder(max_context: usize, max_block: usize) -> ContextBuilder {
        ContextBuilder::new(&OrchestratorConfig {
            max_context_chars: max_context,
            max_block_chars: max_block,
            max_log_entries: 3,
            ..OrchestratorConfig::default()
        })
    }

    fn ok(adapter: AdapterId, payload: Value) -> EvidenceResult {
        EvidenceResult::succeeded(adapter, payload, Duration::from_millis(7))
    }

    #[test]
    fn test_canonical_order_and_unavailable_blocks() {
        let evidence: EvidenceSet = vec![
            EvidenceResult::failed(
                AdapterId::Logs,
                FailureKind::Timeout,
                "timed out after 10000ms",
                Duration::from_secs(10),
            ),
            ok(AdapterId::ClusterPods, json!({"count": 1})),
        ]
        .into_iter()
        .collect();

        let question = Question::new("Why is my app pod restarting?").with_namespace("shop");
        let context = builder(24_000, 6_000).build(&question, &evidence);
        let text = context.as_str();

        assert!(text.starts_with("## User Question\nWhy is my app pod restarting?\n"));
        assert!(text.contains("- Namespace: shop\n- Time Range: Last 15 minutes"));
        let pods = text.find("### cluster_pods (ok, 7ms)").unwrap();
        let logs = text.find("### logs (failed, timeout)").unwrap();
        assert!(pods < logs);
        assert!(text.contains("unavailable: timed out after 10000ms"));
        assert!(context.truncated().is_empty());
    }

    #[test]
    fn test_output_independent_of_completion_order() {
        let a = ok(AdapterId::Alerts, json!({"count": 0}));
        let b = ok(AdapterId::MetricsRange, json!({"result": []}));
        let forward: EvidenceSet = vec![a.clone(), b.clone()].into_iter().collect();
        let reverse: EvidenceSet = vec![b, a].into_iter().collect();

        let builder = builder(24_000, 6_000);
        let question = Question::new("cpu");
        assert_eq!(builder.build(&question, &forward), builder.build(&question, &reverse));
    }

    #[test]
    fn test_oversized_payloads_stay_under_ceiling() {
        let huge = json!({"blob": "x".repeat(50_000)});
        let evidence: EvidenceSet = vec![
            ok(AdapterId::ClusterPods, huge.clone()),
            ok(AdapterId::MetricsRange, json!({"result": "small"})),
            ok(AdapterId::KnowledgeBase, huge),
        ]
        .into_iter()
        .collect();

        let context = builder(4_000, 3_000).build(&Question::new("status?"), &evidence);

        assert!(context.len() <= 4_000);
        assert_eq!(
            context.truncated(),
            &[AdapterId::ClusterPods, AdapterId::KnowledgeBase]
        );
        // the small block survives intact
        assert!(context.as_str().contains("\"result\": \"small\""));
    }

    #[test]
    fn test_log_entries_keep_most_recent() {
        let entries: Vec<Value> = (0..10).map(|i| json!({"line": format!("line-{}", i)})).collect();
        let evidence: EvidenceSet = vec![ok(AdapterId::Logs, json!({"count": 10, "entries": entries}))]
            .into_iter()
            .collect();

        let context = builder(24_000, 6_000).build(&Question::new("logs"), &evidence);
        let text = context.as_str();

        assert!(!text.contains("line-6\""));
        assert!(text.contains("line-7"));
        assert!(text.contains("line-9"));
        assert!(text.contains("\"omitted_entries\": 7"));
        assert_eq!(context.truncated(), &[AdapterId::Logs]);
    }

    #[test]
    fn test_multibyte_text_is_cut_on_boundaries() {
        let question = Question::new("é".repeat(5_000));
        let evidence: EvidenceSet = vec![ok(AdapterId::ClusterPods, json!({"msg": "ü".repeat(5_000)}))]
            .into_iter()
            .collect();

        let context = builder(1_024, 700).build(&question, &evidence);
        assert!(context.len() <= 1_024);
        assert!(context.as_str().contains(TRUNCATION_MARKER));
    }

    #[test]
    fn test_tail_cut_reports_every_block_it_removes() {
        let evidence: EvidenceSet = vec![
            ok(AdapterId::ClusterPods, json!({"count": 1})),
            ok(AdapterId::Alerts, json!({"count": 0})),
            ok(AdapterId::Logs, json!({"count": 0, "entries": []})),
        ]
        .into_iter()
        .collect();
        // the question alone fills the block limit, leaving no room for evidence
        let question = Question::new("q".repeat(2_000)).with_namespace("shop");

        let context = builder(1_024, 1_024).build(&question, &evidence);

        assert!(context.len() <= 1_024);
        assert!(!context.as_str().contains("### logs"));
        assert_eq!(
            context.truncated(),
            &[AdapterId::ClusterPods, AdapterId::Alerts, AdapterId::Logs]
        );
    }

    #[test]
    fn test_empty_evidence() {
        let context = builder(24_000, 6_000).build(&Question::new("hi"), &EvidenceSet::new());
        assert!(context.as_str().ends_with(NO_EVIDENCE));
    }

    #[test]
    fn test_clip() {
        assert_eq!(clip("short", 10), ("short".to_string(), false));
        let (cut, was_cut) = clip(&"a".repeat(100), 40);
        assert!(was_cut);
        assert_eq!(cut.len(), 40);
        assert!(cut.ends_with(TRUNCATION_MARKER));
        assert_eq!(clip("abcdef", 3), ("abc".to_string(), true));
    }
}
