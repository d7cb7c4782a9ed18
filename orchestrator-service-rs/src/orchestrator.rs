// orchestrator-service-rs/src/orchestrator.rs
// Entry point for one question: select, gather, build, reason, parse.

use std::sync::Arc;
use std::time::Instant;

use config_rs::OrchestratorConfig;
use llm_service::{PromptStyle, ReasoningClient, ReasoningError};
use serde_json::Value;
use shared_types::{AgentResponse, Question};
use tool_sdk::AdapterRegistry;
use uuid::Uuid;

use crate::context_builder::ContextBuilder;
use crate::coordinator::ExecutionCoordinator;
use crate::error::OrchestrationError;
use crate::response_parser::{ConfidencePolicy, ResponseParser};
use crate::selector::ToolSelector;

/// Holds no per-request state; one instance serves concurrent questions.
pub struct Orchestrator {
    config: OrchestratorConfig,
    selector: ToolSelector,
    coordinator: ExecutionCoordinator,
    context_builder: ContextBuilder,
    parser: ResponseParser,
    reasoner: Arc<dyn ReasoningClient>,
    system_prompt: String,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        registry: Arc<AdapterRegistry>,
        reasoner: Arc<dyn ReasoningClient>,
    ) -> Self {
        let system_prompt = PromptStyle::from_name(&config.prompt_style).system_prompt();
        Self {
            selector: ToolSelector::new(&config),
            coordinator: ExecutionCoordinator::new(registry, &config),
            context_builder: ContextBuilder::new(&config),
            parser: ResponseParser::new(ConfidencePolicy::new(config.low_confidence_failure_ratio)),
            reasoner,
            system_prompt,
            config,
        }
    }

    /// Replace the system prompt derived from `prompt_style`.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Answer one question.
    ///
    /// Evidence problems only degrade the answer. A reasoning failure of any
    /// kind, a blank reply included, is returned as an error; no answer is
    /// assembled from raw evidence in its place.
    pub async fn handle(&self, question: &Question) -> Result<AgentResponse, OrchestrationError> {
        if question.text.trim().is_empty() {
            return Err(OrchestrationError::InvalidQuestion(
                "question text is empty".to_string(),
            ));
        }

        let request_id = Uuid::new_v4();
        let started = Instant::now();
        log::info!("[{}] Question received: {}", request_id, question.text.trim());

        let plan = self.selector.select(question);
        let invoked: Vec<String> = plan.adapters().iter().map(|a| a.to_string()).collect();
        log::info!("[{}] Plan selected: {}", request_id, invoked.join(", "));

        let deadline = self.config.deadline_for(plan.adapters());
        let evidence = self.coordinator.execute(&plan, deadline).await;

        let context = self.context_builder.build(question, &evidence);

        log::info!(
            "[{}] Calling reasoning engine (model: {}, context: {} bytes)",
            request_id,
            self.reasoner.model(),
            context.len()
        );
        let reasoning_timeout = self.config.reasoning_timeout;
        let raw = match tokio::time::timeout(
            reasoning_timeout,
            self.reasoner.reason(&context, &self.system_prompt),
        )
        .await
        {
            Ok(Ok(text)) if text.trim().is_empty() => {
                log::error!("[{}] Reasoning reply was empty", request_id);
                return Err(ReasoningError::EmptyResponse.into());
            }
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                log::error!("[{}] Reasoning call failed: {}", request_id, e);
                return Err(e.into());
            }
            Err(_) => {
                log::error!(
                    "[{}] Reasoning call exceeded {}ms",
                    request_id,
                    reasoning_timeout.as_millis()
                );
                return Err(ReasoningError::Timeout(reasoning_timeout).into());
            }
        };
        log::info!("[{}] Reasoning reply received ({} bytes)", request_id, raw.len());

        let failed: Vec<String> = evidence
            .iter()
            .filter(|r| !r.is_success())
            .map(|r| r.adapter().to_string())
            .collect();
        let truncated: Vec<String> = context.truncated().iter().map(|a| a.to_string()).collect();

        let response = self
            .parser
            .parse(&raw, &evidence)
            .with_metadata("model", self.reasoner.model())
            .with_metadata("adapters_invoked", invoked)
            .with_metadata("adapters_failed", failed)
            .with_metadata("truncated_adapters", truncated)
            .with_metadata("request_id", request_id.to_string())
            .with_metadata("timestamp", chrono::Utc::now().to_rfc3339())
            .with_metadata("evidence_deadline_ms", deadline.as_millis() as u64)
            .with_metadata("elapsed_ms", Value::from(started.elapsed().as_millis() as u64));

        log::info!(
            "[{}] Answered in {}ms (confidence: {})",
            request_id,
            started.elapsed().as_millis(),
            response.confidence
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shared_types::ReasoningContext;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records what it was asked and replies with a fixed text.
    struct EchoReasoner {
        reply: String,
        seen: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ReasoningClient for EchoReasoner {
        async fn reason(
            &self,
            context: &ReasoningContext,
            system_prompt: &str,
        ) -> Result<String, ReasoningError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push((context.as_str().to_string(), system_prompt.to_string()));
            }
            Ok(self.reply.clone())
        }

        fn model(&self) -> String {
            "echo-1".to_string()
        }
    }

    fn echo(reply: &str) -> Arc<EchoReasoner> {
        Arc::new(EchoReasoner {
            reply: reply.to_string(),
            seen: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let orchestrator = Orchestrator::new(
            OrchestratorConfig::default(),
            Arc::new(AdapterRegistry::new()),
            echo("Summary: fine"),
        );
        let err = orchestrator.handle(&Question::new("   ")).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::InvalidQuestion(_)));
        assert_eq!(err.kind(), "invalid_question");
    }

    #[tokio::test]
    async fn test_blank_reply_is_a_reasoning_failure() {
        let orchestrator = Orchestrator::new(
            OrchestratorConfig::default(),
            Arc::new(AdapterRegistry::new()),
            echo(" \n\t "),
        );
        let err = orchestrator
            .handle(&Question::new("Why is my app pod restarting?"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrchestrationError::Reasoning(ReasoningError::EmptyResponse)
        ));
        assert_eq!(err.kind(), "reasoning_failure");
    }

    #[tokio::test]
    async fn test_metadata_and_prompt() {
        let reasoner = echo("Summary: pods look fine\nConfidence: high");
        let orchestrator = Orchestrator::new(
            OrchestratorConfig {
                default_adapter_timeout: Duration::from_millis(200),
                ..OrchestratorConfig::default()
            },
            Arc::new(AdapterRegistry::new()),
            reasoner.clone(),
        )
        .with_system_prompt("be terse");

        let response = orchestrator
            .handle(&Question::new("What is the current CPU usage?"))
            .await
            .unwrap();

        assert_eq!(response.metadata["model"], "echo-1");
        assert_eq!(
            response.metadata["adapters_invoked"],
            serde_json::json!(["cluster_pods", "metrics_instant"])
        );
        assert_eq!(
            response.metadata["adapters_failed"],
            serde_json::json!(["cluster_pods", "metrics_instant"])
        );
        assert_eq!(response.metadata["evidence_deadline_ms"], 200);
        assert!(response.metadata.contains_key("request_id"));
        assert!(response.metadata.contains_key("timestamp"));

        let seen = reasoner.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, "be terse");
        assert!(seen[0].0.contains("unavailable: no adapter registered for cluster_pods"));
    }
}
