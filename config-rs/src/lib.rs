//! config-rs/lib.rs
//! Orchestration settings: time windows, adapter timeouts, the evidence
//! deadline ceiling, context size limits and the confidence policy knob.
//!
//! The value is built once at startup and passed explicitly into the
//! orchestrator; nothing here is read from ambient state afterwards.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use shared_types::AdapterId;
use thiserror::Error;

/// Prefix shared by every orchestrator environment variable.
pub const ENV_PREFIX: &str = "ORCH";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Look-back window used when a question carries none.
    pub default_window_minutes: u32,
    /// Resolution step for range metric queries.
    pub metrics_step_seconds: u32,
    /// Upper bound on adapters invoked for a single question.
    pub max_adapters: usize,
    pub default_adapter_timeout: Duration,
    /// Per-adapter overrides of `default_adapter_timeout`.
    pub adapter_timeouts: HashMap<AdapterId, Duration>,
    /// Hard ceiling on the evidence-gathering deadline.
    pub deadline_ceiling: Duration,
    /// Budget for the single reasoning call.
    pub reasoning_timeout: Duration,
    pub max_context_chars: usize,
    pub max_block_chars: usize,
    /// Log entries kept (most recent) when rendering a logs block.
    pub max_log_entries: usize,
    /// Lines requested from the log store.
    pub log_line_limit: u32,
    pub kb_top_k: u32,
    /// Failure ratio above which inferred confidence drops to "low".
    pub low_confidence_failure_ratio: f64,
    pub prompt_style: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            default_window_minutes: 15,
            metrics_step_seconds: 60,
            max_adapters: 5,
            default_adapter_timeout: Duration::from_secs(10),
            adapter_timeouts: HashMap::new(),
            deadline_ceiling: Duration::from_secs(30),
            reasoning_timeout: Duration::from_secs(60),
            max_context_chars: 24_000,
            max_block_chars: 6_000,
            max_log_entries: 50,
            log_line_limit: 100,
            kb_top_k: 3,
            low_confidence_failure_ratio: 0.5,
            prompt_style: "default".to_string(),
        }
    }
}

impl OrchestratorConfig {
    /// Load `.env` (if present) and read settings from the process environment.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Unparseable values are logged and replaced by their defaults, the
    /// same way a bad port falls back in service bootstrapping.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |name: &str| lookup(&env_name(name));

        let mut adapter_timeouts = HashMap::new();
        for adapter in AdapterId::ALL {
            let name = format!("ADAPTER_TIMEOUT_{}_SECS", adapter.as_str().to_uppercase());
            if let Some(secs) = parse_or_warn::<u64>(&env_name(&name), read(&name)) {
                adapter_timeouts.insert(adapter, Duration::from_secs(secs));
            }
        }

        Self {
            default_window_minutes: get_or(
                "DEFAULT_WINDOW_MINUTES",
                read("DEFAULT_WINDOW_MINUTES"),
                defaults.default_window_minutes,
            ),
            metrics_step_seconds: get_or(
                "METRICS_STEP_SECONDS",
                read("METRICS_STEP_SECONDS"),
                defaults.metrics_step_seconds,
            ),
            max_adapters: get_or("MAX_ADAPTERS", read("MAX_ADAPTERS"), defaults.max_adapters),
            default_adapter_timeout: get_secs_or(
                "ADAPTER_TIMEOUT_SECS",
                read("ADAPTER_TIMEOUT_SECS"),
                defaults.default_adapter_timeout,
            ),
            adapter_timeouts,
            deadline_ceiling: get_secs_or(
                "DEADLINE_CEILING_SECS",
                read("DEADLINE_CEILING_SECS"),
                defaults.deadline_ceiling,
            ),
            reasoning_timeout: get_secs_or(
                "REASONING_TIMEOUT_SECS",
                read("REASONING_TIMEOUT_SECS"),
                defaults.reasoning_timeout,
            ),
            max_context_chars: get_or(
                "MAX_CONTEXT_CHARS",
                read("MAX_CONTEXT_CHARS"),
                defaults.max_context_chars,
            ),
            max_block_chars: get_or(
                "MAX_BLOCK_CHARS",
                read("MAX_BLOCK_CHARS"),
                defaults.max_block_chars,
            ),
            max_log_entries: get_or(
                "MAX_LOG_ENTRIES",
                read("MAX_LOG_ENTRIES"),
                defaults.max_log_entries,
            ),
            log_line_limit: get_or(
                "LOG_LINE_LIMIT",
                read("LOG_LINE_LIMIT"),
                defaults.log_line_limit,
            ),
            kb_top_k: get_or("KB_TOP_K", read("KB_TOP_K"), defaults.kb_top_k),
            low_confidence_failure_ratio: get_or(
                "LOW_CONFIDENCE_FAILURE_RATIO",
                read("LOW_CONFIDENCE_FAILURE_RATIO"),
                defaults.low_confidence_failure_ratio,
            ),
            prompt_style: read("PROMPT_STYLE")
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.prompt_style),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_window_minutes == 0 || self.default_window_minutes > 1440 {
            return Err(ConfigError::invalid(
                "default_window_minutes",
                "must be between 1 and 1440",
            ));
        }
        if self.metrics_step_seconds == 0 {
            return Err(ConfigError::invalid("metrics_step_seconds", "must be positive"));
        }
        if self.max_adapters == 0 {
            return Err(ConfigError::invalid("max_adapters", "at least one adapter is required"));
        }
        if self.default_adapter_timeout.is_zero() || self.adapter_timeouts.values().any(Duration::is_zero) {
            return Err(ConfigError::invalid("adapter_timeout", "timeouts must be positive"));
        }
        if self.deadline_ceiling.is_zero() {
            return Err(ConfigError::invalid("deadline_ceiling", "must be positive"));
        }
        if self.reasoning_timeout.is_zero() {
            return Err(ConfigError::invalid("reasoning_timeout", "must be positive"));
        }
        if self.max_block_chars == 0 || self.max_block_chars > self.max_context_chars {
            return Err(ConfigError::invalid(
                "max_block_chars",
                format!("must be in 1..={}", self.max_context_chars),
            ));
        }
        if self.max_context_chars < 1024 {
            return Err(ConfigError::invalid("max_context_chars", "must be at least 1024"));
        }
        if !(0.0..=1.0).contains(&self.low_confidence_failure_ratio) {
            return Err(ConfigError::invalid(
                "low_confidence_failure_ratio",
                "must be within [0, 1]",
            ));
        }
        Ok(())
    }

    /// Timeout applied to a single invocation of `adapter`.
    pub fn timeout_for(&self, adapter: AdapterId) -> Duration {
        self.adapter_timeouts
            .get(&adapter)
            .copied()
            .unwrap_or(self.default_adapter_timeout)
    }

    /// Evidence deadline for a set of adapters: the slowest configured
    /// per-adapter timeout, capped by the global ceiling.
    pub fn deadline_for<I>(&self, adapters: I) -> Duration
    where
        I: IntoIterator<Item = AdapterId>,
    {
        let slowest = adapters
            .into_iter()
            .map(|a| self.timeout_for(a))
            .max()
            .unwrap_or(self.default_adapter_timeout);
        slowest.min(self.deadline_ceiling)
    }
}

fn env_name(name: &str) -> String {
    format!("{}_{}", ENV_PREFIX, name)
}

fn parse_or_warn<T: FromStr>(var_name: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Invalid value '{}' in {}, using default", raw, var_name);
            None
        }
    }
}

fn get_or<T: FromStr>(name: &str, raw: Option<String>, default: T) -> T {
    parse_or_warn(&env_name(name), raw).unwrap_or(default)
}

fn get_secs_or(name: &str, raw: Option<String>, default: Duration) -> Duration {
    parse_or_warn::<u64>(&env_name(name), raw)
        .map(Duration::from_secs)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = OrchestratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout_for(AdapterId::Logs), Duration::from_secs(10));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = OrchestratorConfig::from_lookup(lookup_from(&[
            ("ORCH_DEFAULT_WINDOW_MINUTES", "30"),
            ("ORCH_MAX_ADAPTERS", "3"),
            ("ORCH_ADAPTER_TIMEOUT_LOGS_SECS", "4"),
            ("ORCH_PROMPT_STYLE", " Concise "),
        ]));
        assert_eq!(config.default_window_minutes, 30);
        assert_eq!(config.max_adapters, 3);
        assert_eq!(config.timeout_for(AdapterId::Logs), Duration::from_secs(4));
        assert_eq!(config.timeout_for(AdapterId::Alerts), Duration::from_secs(10));
        assert_eq!(config.prompt_style, "concise");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = OrchestratorConfig::from_lookup(lookup_from(&[
            ("ORCH_MAX_ADAPTERS", "many"),
            ("ORCH_DEADLINE_CEILING_SECS", "-1"),
        ]));
        assert_eq!(config.max_adapters, 5);
        assert_eq!(config.deadline_ceiling, Duration::from_secs(30));
    }

    #[test]
    fn test_deadline_is_capped_by_ceiling() {
        let mut config = OrchestratorConfig::default();
        config.adapter_timeouts.insert(AdapterId::Logs, Duration::from_secs(120));
        assert_eq!(
            config.deadline_for([AdapterId::Logs, AdapterId::ClusterPods]),
            Duration::from_secs(30)
        );
        assert_eq!(
            config.deadline_for([AdapterId::ClusterPods]),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_validation_rejects_bad_ratio_and_blocks() {
        let mut config = OrchestratorConfig::default();
        config.low_confidence_failure_ratio = 1.5;
        assert!(config.validate().is_err());

        let mut config = OrchestratorConfig::default();
        config.max_block_chars = config.max_context_chars + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "max_block_chars", .. })
        ));

        let mut config = OrchestratorConfig::default();
        config.max_adapters = 0;
        assert!(config.validate().is_err());
    }
}
