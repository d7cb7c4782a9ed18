// orchestrator-service-rs/src/response_parser.rs
// Response Parser: raw reasoning text -> AgentResponse
//
// The reply is read as a small grammar of optional labelled sections.
// Each extractor pulls one field on its own, so a malformed section only
// loses that field. Parsing is total: every input string, empty or noise,
// yields an AgentResponse.

use once_cell::sync::Lazy;
use regex::Regex;
use shared_types::{AdapterId, AgentResponse, Confidence, EvidenceSet, ToolUsage};
use std::collections::BTreeMap;

const EMPTY_REPLY_ANSWER: &str = "The reasoning engine returned no readable content.";

/// Section header: optional `#`s, list number and bold around a known
/// label, an optional parenthetical, an optional colon, then inline text.
static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?P<hash>#{1,6}\s*)?(?P<num>\d+[.)]\s*)?(?P<bold>\*\*|__)?\s*(?P<label>key findings|key metrics|recommended actions|next steps|action required|confidence level|summary|observations|findings|evidence|analysis|recommendations|actions|remediation|confidence)\b\s*(?:\([^)]*\)\s*)?(?:\*\*|__)?\s*(?P<colon>:)?\s*(?:\*\*|__)?\s*(?P<rest>.*?)\s*$",
    )
    .unwrap()
});

static BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-*•+]|\d+[.)])\s+(?P<item>.+?)\s*$").unwrap());

static CONFIDENCE_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(high|medium|moderate|low)\b").unwrap());

/// Names and backend aliases the reply may use for each adapter.
static EVIDENCE_ALIASES: Lazy<Vec<(AdapterId, Regex)>> = Lazy::new(|| {
    let aliases: [(AdapterId, &str); 7] = [
        (AdapterId::ClusterPods, r"cluster_pods|pods?\b"),
        (AdapterId::ClusterEvents, r"cluster_events|events?\b"),
        (AdapterId::MetricsInstant, r"metrics_instant|prometheus|metrics?\b"),
        (AdapterId::MetricsRange, r"metrics_range|prometheus|metrics?\b"),
        (AdapterId::Alerts, r"alertmanager|alerts?\b"),
        (AdapterId::Logs, r"loki|logs?\b"),
        (AdapterId::KnowledgeBase, r"knowledge_base|knowledge base|runbooks?\b"),
    ];
    aliases
        .into_iter()
        .map(|(id, pattern)| (id, Regex::new(&format!(r"(?i)\b(?:{})", pattern)).unwrap()))
        .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Section {
    Summary,
    Observations,
    Recommendations,
    Confidence,
}

impl Section {
    fn from_label(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "summary" => Section::Summary,
            "recommendations" | "recommended actions" | "next steps" | "action required"
            | "actions" | "remediation" => Section::Recommendations,
            "confidence" | "confidence level" => Section::Confidence,
            _ => Section::Observations,
        }
    }
}

/// A reply split into its preamble and labelled sections.
#[derive(Debug, Default)]
struct Outline {
    preamble: Vec<String>,
    sections: BTreeMap<Section, Vec<String>>,
}

impl Outline {
    fn parse(raw: &str) -> Self {
        let mut outline = Outline::default();
        let mut current: Option<Section> = None;

        for line in raw.lines() {
            if let Some((section, rest)) = header(line) {
                let lines = outline.sections.entry(section).or_default();
                if !rest.is_empty() {
                    lines.push(rest);
                }
                current = Some(section);
                continue;
            }
            match current {
                Some(section) => outline.sections.entry(section).or_default().push(line.to_string()),
                None => outline.preamble.push(line.to_string()),
            }
        }
        outline
    }

    fn is_structured(&self) -> bool {
        !self.sections.is_empty()
    }

    fn section(&self, section: Section) -> &[String] {
        self.sections.get(&section).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn header(line: &str) -> Option<(Section, String)> {
    let caps = HEADER.captures(line)?;
    let rest = caps.name("rest").map_or("", |m| m.as_str()).trim();
    // A list number alone does not make a header: "2. Analysis of ..." is an
    // item. It still qualifies with a colon or with nothing after the label.
    let marked = ["hash", "bold", "colon"]
        .iter()
        .any(|name| caps.name(name).is_some());
    if !marked && !rest.is_empty() {
        return None;
    }
    let label = caps.name("label")?.as_str();
    Some((Section::from_label(label), strip_emphasis(rest)))
}

fn strip_emphasis(text: &str) -> String {
    text.trim()
        .trim_matches(|c| c == '*' || c == '_')
        .trim()
        .to_string()
}

fn joined(lines: &[String]) -> Option<String> {
    let text = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn extract_summary(outline: &Outline) -> Option<String> {
    joined(outline.section(Section::Summary))
}

/// Bullet or numbered items; plain non-empty lines when no bullets exist.
fn extract_items(lines: &[String]) -> Vec<String> {
    let bullets: Vec<String> = lines
        .iter()
        .filter_map(|l| BULLET.captures(l))
        .filter_map(|c| c.name("item").map(|m| strip_emphasis(m.as_str())))
        .filter(|item| !item.is_empty())
        .collect();
    if !bullets.is_empty() {
        return bullets;
    }
    lines
        .iter()
        .map(|l| strip_emphasis(l))
        .filter(|l| !l.is_empty())
        .collect()
}

fn extract_observations(outline: &Outline) -> Vec<String> {
    extract_items(outline.section(Section::Observations))
}

fn extract_recommendations(outline: &Outline) -> Vec<String> {
    extract_items(outline.section(Section::Recommendations))
}

fn extract_confidence(outline: &Outline) -> Option<Confidence> {
    outline
        .section(Section::Confidence)
        .iter()
        .find_map(|line| CONFIDENCE_WORD.find(line))
        .and_then(|m| Confidence::from_marker(m.as_str()))
}

/// Adapters the reply refers to, limited to those that were queried,
/// in canonical order.
fn extract_evidence_refs(raw: &str, evidence: &EvidenceSet) -> Vec<AdapterId> {
    EVIDENCE_ALIASES
        .iter()
        .filter(|(id, _)| evidence.contains(*id))
        .filter(|(_, pattern)| pattern.is_match(raw))
        .map(|(id, _)| *id)
        .collect()
}

/// Spell out a total evidence outage in the answer itself.
fn with_unavailability_note(answer: String, evidence: &EvidenceSet) -> String {
    if !evidence.all_failed() {
        return answer;
    }
    let sources: Vec<&str> = evidence.canonical().iter().map(|r| r.adapter().as_str()).collect();
    format!(
        "{}\n\nNote: every evidence source was unavailable ({}); this answer is not backed by live data.",
        answer,
        sources.join(", ")
    )
}

/// How confidence is settled when the reply and the evidence disagree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidencePolicy {
    /// Failure ratio above which inferred confidence is "low".
    pub low_failure_ratio: f64,
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self {
            low_failure_ratio: 0.5,
        }
    }
}

impl ConfidencePolicy {
    pub fn new(low_failure_ratio: f64) -> Self {
        Self {
            low_failure_ratio: low_failure_ratio.clamp(0.0, 1.0),
        }
    }

    /// Only an explicit marker can produce `High`, and not when evidence is
    /// missing.
    pub fn resolve(
        &self,
        explicit: Option<Confidence>,
        structured: bool,
        evidence: &EvidenceSet,
    ) -> Confidence {
        if !structured {
            return Confidence::Unknown;
        }
        if evidence.all_failed() {
            return Confidence::Low;
        }
        match explicit {
            Some(Confidence::High) if evidence.failed_count() > 0 => Confidence::Medium,
            Some(confidence) => confidence,
            None if evidence.failure_ratio() > self.low_failure_ratio => Confidence::Low,
            None => Confidence::Medium,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResponseParser {
    policy: ConfidencePolicy,
}

impl ResponseParser {
    pub fn new(policy: ConfidencePolicy) -> Self {
        Self { policy }
    }

    pub fn parse(&self, raw: &str, evidence: &EvidenceSet) -> AgentResponse {
        let outline = Outline::parse(raw);
        let structured = outline.is_structured();
        let evidence_refs = extract_evidence_refs(raw, evidence);
        let tool_usage = ToolUsage::from_evidence(evidence);

        if !structured {
            log::warn!("Reasoning reply has no recognisable sections, using raw text");
            let trimmed = raw.trim();
            let answer = if trimmed.is_empty() {
                EMPTY_REPLY_ANSWER.to_string()
            } else {
                trimmed.to_string()
            };
            return AgentResponse {
                answer: with_unavailability_note(answer, evidence),
                confidence: self.policy.resolve(None, false, evidence),
                recommendations: Vec::new(),
                observations: Vec::new(),
                evidence_refs,
                tool_usage,
                metadata: BTreeMap::new(),
            };
        }

        let answer = extract_summary(&outline)
            .or_else(|| joined(&outline.preamble))
            .unwrap_or_else(|| raw.trim().to_string());
        let explicit = extract_confidence(&outline);

        AgentResponse {
            answer: with_unavailability_note(answer, evidence),
            confidence: self.policy.resolve(explicit, true, evidence),
            recommendations: extract_recommendations(&outline),
            observations: extract_observations(&outline),
            evidence_refs,
            tool_usage,
            metadata: BTreeMap::new(),
        }
    }
}
