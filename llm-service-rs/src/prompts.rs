// llm-service-rs/src/prompts.rs
// System prompts for the reasoning engine. Every style asks for the same
// labelled sections so the response parser can find them.

use std::fmt;
use std::str::FromStr;

const RESPONSE_FORMAT: &str = "**Response Format:**
Summary: 2-3 sentences with the key findings and current state
Observations:
- the most important values and signals, one per bullet, with units
Recommendations:
- concrete next steps, most urgent first
Confidence: high | medium | low

If an evidence source is marked unavailable, say so instead of assuming it is healthy.";

const DEFAULT_PROMPT: &str = "You are an expert Kubernetes and observability assistant for SREs.

You are given the output of Prometheus metrics, the Kubernetes API, Loki logs and Alertmanager alerts.

Guidelines:
- Be concise and direct
- Focus on actionable insights
- Highlight only critical anomalies
- Use bullet points, not paragraphs";

const CONCISE_PROMPT: &str = "You are a Kubernetes observability expert. Analyze the provided metrics, logs and events, then give brief, actionable recommendations focused on root causes.";

const DETAILED_PROMPT: &str = "You are an expert SRE specialised in Kubernetes observability and incident response.

When analysing issues:
1. Start with the most likely causes based on symptoms
2. Correlate data across metrics, logs, events and alerts
3. Consider application-level and infrastructure-level factors
4. Evaluate resource constraints (CPU, memory, network, storage)
5. Check for common failures such as image pull errors, probe failures and OOM kills

Give a clear problem statement, cite evidence from the data, and prioritise remediation steps.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptStyle {
    #[default]
    Default,
    Concise,
    Detailed,
}

impl PromptStyle {
    /// Full system prompt for this style, response format included.
    pub fn system_prompt(&self) -> String {
        let body = match self {
            PromptStyle::Default => DEFAULT_PROMPT,
            PromptStyle::Concise => CONCISE_PROMPT,
            PromptStyle::Detailed => DETAILED_PROMPT,
        };
        format!("{}\n\n{}", body, RESPONSE_FORMAT)
    }

    /// Lenient parse: unknown names fall back to `Default` with a warning.
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            log::warn!("Unknown prompt style '{}', using default", name);
            PromptStyle::Default
        })
    }
}

impl FromStr for PromptStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" | "" => Ok(PromptStyle::Default),
            "concise" => Ok(PromptStyle::Concise),
            "detailed" => Ok(PromptStyle::Detailed),
            other => Err(format!("unknown prompt style: {}", other)),
        }
    }
}

impl fmt::Display for PromptStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PromptStyle::Default => "default",
            PromptStyle::Concise => "concise",
            PromptStyle::Detailed => "detailed",
        };
        f.write_str(name)
    }
}
