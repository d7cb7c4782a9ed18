// llm-service-rs/src/llm_client.rs
//
// HTTP client for the reasoning engine.
//
// One call per question, one attempt per call: there is no retry loop here.
// Supports OpenAI-compatible chat completion endpoints and the Gemini
// generateContent API, picked from the configured URL.
//
// Configuration (.env file):
// - LLM_API_URL: endpoint base URL (falls back to GEMINI_API_ENDPOINT)
// - LLM_API_KEY: API key (falls back to GEMINI_API_KEY)
// - LLM_MODEL: model name (falls back to GEMINI_MODEL)
// - LLM_PROVIDER: force "openai" or "gemini" instead of detecting from the URL
// - LLM_TEMPERATURE: sampling temperature (default: 0.2)
// - LLM_MAX_TOKENS: output token cap (default: 2048)
// - LLM_TIMEOUT_SECS: request timeout (default: 60)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_types::ReasoningContext;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-3.0-pro";

/// Why a reasoning call produced no text. None of these are retried.
#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("reasoning call timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("reasoning engine returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("reasoning engine returned no content")]
    EmptyResponse,

    #[error("could not parse reasoning engine response: {0}")]
    Parse(String),

    #[error("reasoning client misconfigured: {0}")]
    Configuration(String),
}

/// The single seam between the orchestrator and the language model.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    /// Send the context with a system prompt and return the raw reply text.
    async fn reason(
        &self,
        context: &ReasoningContext,
        system_prompt: &str,
    ) -> Result<String, ReasoningError>;

    /// Model identifier, reported in response metadata.
    fn model(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Gemini,
}

impl Provider {
    /// Pick the wire format from the endpoint URL.
    pub fn detect(api_url: &str) -> Self {
        if api_url.contains("googleapis.com") || api_url.contains(":generateContent") {
            Provider::Gemini
        } else {
            Provider::OpenAi
        }
    }
}

impl FromStr for Provider {
    type Err = ReasoningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "openai-compatible" | "openrouter" | "ollama" => Ok(Provider::OpenAi),
            "gemini" | "google" => Ok(Provider::Gemini),
            other => Err(ReasoningError::Configuration(format!(
                "unknown LLM provider '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => f.write_str("openai"),
            Provider::Gemini => f.write_str("gemini"),
        }
    }
}

#[derive(Clone)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub provider: Provider,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("provider", &self.provider)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            provider: Provider::detect(DEFAULT_API_URL),
            temperature: 0.2,
            max_tokens: 2048,
            timeout: Duration::from_secs(60),
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| lookup(k))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        };

        let api_url = first(&["LLM_API_URL", "GEMINI_API_ENDPOINT"])
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);

        let provider = match first(&["LLM_PROVIDER"]).map(|p| p.parse::<Provider>()) {
            Some(Ok(p)) => p,
            Some(Err(e)) => {
                log::warn!("{}, detecting provider from URL", e);
                Provider::detect(&api_url)
            }
            None => Provider::detect(&api_url),
        };

        Self {
            api_key: first(&["LLM_API_KEY", "GEMINI_API_KEY"]),
            model: first(&["LLM_MODEL", "GEMINI_MODEL"]).unwrap_or(defaults.model),
            temperature: parse_or(first(&["LLM_TEMPERATURE"]), "LLM_TEMPERATURE", defaults.temperature),
            max_tokens: parse_or(first(&["LLM_MAX_TOKENS"]), "LLM_MAX_TOKENS", defaults.max_tokens),
            timeout: Duration::from_secs(parse_or(
                first(&["LLM_TIMEOUT_SECS"]),
                "LLM_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )),
            api_url,
            provider,
        }
    }

    /// Endpoint the request is posted to.
    fn endpoint(&self) -> String {
        match self.provider {
            Provider::Gemini if self.api_url.contains(":generateContent") => self.api_url.clone(),
            Provider::Gemini => format!("{}/models/{}:generateContent", self.api_url, self.model),
            Provider::OpenAi if self.api_url.ends_with("/chat/completions") => self.api_url.clone(),
            Provider::OpenAi => format!("{}/chat/completions", self.api_url),
        }
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, name: &str, default: T) -> T {
    match raw {
        Some(v) => v.parse().unwrap_or_else(|_| {
            log::warn!("Invalid value '{}' in {}, using default", v, name);
            default
        }),
        None => default,
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

#[derive(Debug)]
pub struct HttpReasoningClient {
    client: Client,
    config: LlmConfig,
}

impl HttpReasoningClient {
    pub fn new(config: LlmConfig) -> Result<Self, ReasoningError> {
        if config.api_key.is_none() {
            return Err(ReasoningError::Configuration(
                "LLM_API_KEY (or GEMINI_API_KEY) is not set".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ReasoningError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        log::info!(
            "Reasoning client initialised (provider: {}, model: {})",
            config.provider,
            config.model
        );
        Ok(Self { client, config })
    }

    pub fn provider(&self) -> Provider {
        self.config.provider
    }

    fn openai_body(&self, context: &ReasoningContext, system_prompt: &str) -> Value {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: context.as_str().to_string(),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };
        json!(request)
    }

    fn gemini_body(&self, context: &ReasoningContext, system_prompt: &str) -> Value {
        json!({
            "contents": [{
                "parts": [{"text": format!("{}\n\n{}", system_prompt, context.as_str())}]
            }],
            "generationConfig": {
                "temperature": self.config.temperature,
                "topK": 40,
                "topP": 0.95,
                "maxOutputTokens": self.config.max_tokens,
            }
        })
    }

    fn extract_openai(body: Value) -> Result<String, ReasoningError> {
        let data: ChatCompletionResponse =
            serde_json::from_value(body).map_err(|e| ReasoningError::Parse(e.to_string()))?;

        if let Some(usage) = &data.usage {
            log::info!("Reasoning call used {} tokens", usage.total_tokens);
        }

        data.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ReasoningError::EmptyResponse)
    }

    fn extract_gemini(body: Value) -> Result<String, ReasoningError> {
        let candidates = body
            .get("candidates")
            .and_then(Value::as_array)
            .ok_or_else(|| ReasoningError::Parse("response has no candidates".to_string()))?;

        let text: String = candidates
            .first()
            .and_then(|c| c.pointer("/content/parts"))
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default();

        Ok(text)
    }
}

#[async_trait]
impl ReasoningClient for HttpReasoningClient {
    async fn reason(
        &self,
        context: &ReasoningContext,
        system_prompt: &str,
    ) -> Result<String, ReasoningError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| ReasoningError::Configuration("API key is not set".to_string()))?;

        let url = self.config.endpoint();
        let request = match self.config.provider {
            Provider::OpenAi => self
                .client
                .post(&url)
                .bearer_auth(api_key)
                .json(&self.openai_body(context, system_prompt)),
            Provider::Gemini => self
                .client
                .post(&url)
                .query(&[("key", api_key)])
                .json(&self.gemini_body(context, system_prompt)),
        };

        log::info!(
            "Sending reasoning request to {} (model: {}, context: {} bytes)",
            self.config.provider,
            self.config.model,
            context.len()
        );

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                ReasoningError::Timeout(self.config.timeout)
            } else if err.is_connect() {
                ReasoningError::Transport(format!("connection failed: {}", err))
            } else {
                ReasoningError::Transport(err.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Reasoning engine error: {} - {}", status.as_u16(), body);
            return Err(ReasoningError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await.map_err(|err| {
            if err.is_timeout() {
                ReasoningError::Timeout(self.config.timeout)
            } else {
                ReasoningError::Parse(err.to_string())
            }
        })?;

        let text = match self.config.provider {
            Provider::OpenAi => Self::extract_openai(body)?,
            Provider::Gemini => Self::extract_gemini(body)?,
        };

        if text.trim().is_empty() {
            return Err(ReasoningError::EmptyResponse);
        }
        Ok(text)
    }

    fn model(&self) -> String {
        self.config.model.clone()
    }
}
