//! Configuration management for backend clients
//!
//! Endpoints for the observability backends are read through a
//! `ConfigProvider`, either the process environment or an in-memory map.

use std::collections::HashMap;
use std::env;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

/// Base trait for configuration providers
pub trait ConfigProvider: Send + Sync {
    fn get_string(&self, key: &str) -> Result<String>;
}

/// Extension methods for configuration providers
pub trait ConfigProviderExt: ConfigProvider {
    fn get_bool(&self, key: &str) -> Result<bool> {
        let value = self.get_string(key)?;
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => Err(ServiceError::configuration(format!(
                "Invalid boolean value for key {}: {}",
                key, value
            ))),
        }
    }

    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|_| default.to_string())
    }

    /// A value that is absent or blank becomes `None`.
    fn get_optional(&self, key: &str) -> Option<String> {
        self.get_string(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_bool_or(&self, key: &str, default: bool) -> bool {
        match self.get_bool(key) {
            Ok(value) => value,
            Err(ServiceError::Configuration(msg)) if msg.starts_with("Invalid") => {
                log::warn!("{}, using default {}", msg, default);
                default
            }
            Err(_) => default,
        }
    }
}

impl<T: ConfigProvider> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfigProvider;

impl EnvConfigProvider {
    pub fn new() -> Self {
        Self
    }

    /// `prometheus_url` becomes `PROMETHEUS_URL`.
    fn format_key(&self, key: &str) -> String {
        key.to_uppercase()
            .replace(|c: char| !c.is_ascii_alphanumeric(), "_")
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let env_key = self.format_key(key);

        env::var(&env_key).map_err(|e| match e {
            env::VarError::NotPresent => {
                ServiceError::configuration(format!("Environment variable not set: {}", env_key))
            }
            env::VarError::NotUnicode(_) => ServiceError::configuration(format!(
                "Environment variable is not valid unicode: {}",
                env_key
            )),
        })
    }
}

/// In-memory config provider for tests or static configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| ServiceError::configuration(format!("Configuration key not found: {}", key)))
    }
}

/// Trait for backend-specific configuration
pub trait ServiceConfig: Debug + Send + Sync {
    fn validate(&self) -> Result<()>;

    fn service_name(&self) -> &str;
}

fn require_http_url(service: &str, url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(ServiceError::configuration(format!("{} URL is required", service)));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ServiceError::configuration(format!(
            "{} URL must start with http:// or https://, got {}",
            service, url
        )));
    }
    Ok(())
}

fn normalise_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrometheusConfig {
    pub base_url: String,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            base_url: "http://prometheus:9090".to_string(),
        }
    }
}

impl PrometheusConfig {
    pub fn from_provider<P: ConfigProvider>(provider: &P) -> Result<Self> {
        let config = Self {
            base_url: normalise_url(provider.get_string_or("prometheus_url", &Self::default().base_url)),
        };
        config.validate()?;
        Ok(config)
    }
}

impl ServiceConfig for PrometheusConfig {
    fn validate(&self) -> Result<()> {
        require_http_url("Prometheus", &self.base_url)
    }

    fn service_name(&self) -> &str {
        "prometheus"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LokiConfig {
    pub base_url: String,
}

impl Default for LokiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://loki:3100".to_string(),
        }
    }
}

impl LokiConfig {
    pub fn from_provider<P: ConfigProvider>(provider: &P) -> Result<Self> {
        let config = Self {
            base_url: normalise_url(provider.get_string_or("loki_url", &Self::default().base_url)),
        };
        config.validate()?;
        Ok(config)
    }
}

impl ServiceConfig for LokiConfig {
    fn validate(&self) -> Result<()> {
        require_http_url("Loki", &self.base_url)
    }

    fn service_name(&self) -> &str {
        "loki"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertmanagerConfig {
    pub base_url: String,
}

impl Default for AlertmanagerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://alertmanager:9093".to_string(),
        }
    }
}

impl AlertmanagerConfig {
    pub fn from_provider<P: ConfigProvider>(provider: &P) -> Result<Self> {
        let config = Self {
            base_url: normalise_url(
                provider.get_string_or("alertmanager_url", &Self::default().base_url),
            ),
        };
        config.validate()?;
        Ok(config)
    }
}

impl ServiceConfig for AlertmanagerConfig {
    fn validate(&self) -> Result<()> {
        require_http_url("Alertmanager", &self.base_url)
    }

    fn service_name(&self) -> &str {
        "alertmanager"
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct KubernetesConfig {
    pub api_url: String,
    /// Bearer token for the API server, if any
    pub token: Option<String>,
}

// Hand-written so the token never reaches a log line.
impl Debug for KubernetesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubernetesConfig")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        Self {
            api_url: "https://kubernetes.default.svc".to_string(),
            token: None,
        }
    }
}

impl KubernetesConfig {
    pub fn from_provider<P: ConfigProvider>(provider: &P) -> Result<Self> {
        let config = Self {
            api_url: normalise_url(
                provider.get_string_or("kubernetes_api_url", &Self::default().api_url),
            ),
            token: provider.get_optional("kubernetes_token"),
        };
        config.validate()?;
        Ok(config)
    }
}

impl ServiceConfig for KubernetesConfig {
    fn validate(&self) -> Result<()> {
        require_http_url("Kubernetes API", &self.api_url)
    }

    fn service_name(&self) -> &str {
        "kubernetes"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    pub enabled: bool,
}

impl KnowledgeBaseConfig {
    pub fn from_provider<P: ConfigProvider>(provider: &P) -> Self {
        Self {
            enabled: provider.get_bool_or("kb_enabled", false),
        }
    }
}

/// Endpoints for every backend the adapter catalogue talks to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendsConfig {
    pub prometheus: PrometheusConfig,
    pub loki: LokiConfig,
    pub alertmanager: AlertmanagerConfig,
    pub kubernetes: KubernetesConfig,
    pub knowledge_base: KnowledgeBaseConfig,
}

impl BackendsConfig {
    pub fn from_provider<P: ConfigProvider>(provider: &P) -> Result<Self> {
        Ok(Self {
            prometheus: PrometheusConfig::from_provider(provider)?,
            loki: LokiConfig::from_provider(provider)?,
            alertmanager: AlertmanagerConfig::from_provider(provider)?,
            kubernetes: KubernetesConfig::from_provider(provider)?,
            knowledge_base: KnowledgeBaseConfig::from_provider(provider),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_provider(&EnvConfigProvider::new())
    }
}
