// shared-types-rs/src/question.rs

use serde::{Deserialize, Serialize};

/// An operator's question plus optional structured hints.
///
/// Created once per request and never mutated by the orchestrator. No
/// defaults are filled in here: an absent time window stays `None` until
/// the selector resolves it against configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window_minutes: Option<u32>,
    #[serde(default)]
    pub include_logs: bool,
}

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            namespace: None,
            service: None,
            time_window_minutes: None,
            include_logs: false,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_time_window(mut self, minutes: u32) -> Self {
        self.time_window_minutes = Some(minutes);
        self
    }

    pub fn with_logs(mut self, include_logs: bool) -> Self {
        self.include_logs = include_logs;
        self
    }

    /// Namespace hint, ignoring blank strings sent by callers.
    pub fn namespace_hint(&self) -> Option<&str> {
        non_blank(self.namespace.as_deref())
    }

    /// Service / workload hint, ignoring blank strings.
    pub fn service_hint(&self) -> Option<&str> {
        non_blank(self.service.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_hints_are_treated_as_absent() {
        let q = Question::new("why?").with_namespace("  ").with_service("api");
        assert_eq!(q.namespace_hint(), None);
        assert_eq!(q.service_hint(), Some("api"));
    }

    #[test]
    fn deserializes_with_only_text() {
        let q: Question = serde_json::from_str(r#"{"text":"is it down?"}"#).unwrap();
        assert_eq!(q, Question::new("is it down?"));
    }
}
