//! Tests for backend configuration loading

#[cfg(test)]
mod tests {
    use crate::config::{
        BackendsConfig, ConfigProvider, ConfigProviderExt, MemoryConfigProvider, ServiceConfig,
    };

    #[test]
    fn test_memory_config_provider() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("loki_url", "http://logs:3100");
        provider.set("kb_enabled", "yes");
        provider.set("kubernetes_token", "   ");

        assert_eq!(provider.get_string("loki_url").unwrap(), "http://logs:3100");
        assert!(provider.get_bool("kb_enabled").unwrap());
        assert_eq!(provider.get_string_or("missing", "default"), "default");
        assert_eq!(provider.get_optional("kubernetes_token"), None);
        assert!(provider.get_string("missing").is_err());
    }

    #[test]
    fn test_backends_defaults() {
        let config = BackendsConfig::from_provider(&MemoryConfigProvider::new()).unwrap();

        assert_eq!(config.prometheus.base_url, "http://prometheus:9090");
        assert_eq!(config.loki.base_url, "http://loki:3100");
        assert_eq!(config.alertmanager.base_url, "http://alertmanager:9093");
        assert_eq!(config.kubernetes.api_url, "https://kubernetes.default.svc");
        assert!(config.kubernetes.token.is_none());
        assert!(!config.knowledge_base.enabled);
    }

    #[test]
    fn test_backends_overrides() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("prometheus_url", "http://metrics.internal:9090/");
        provider.set("kubernetes_token", "token-abc");
        provider.set("kb_enabled", "true");

        let config = BackendsConfig::from_provider(&provider).unwrap();

        // trailing slash trimmed so paths can be appended
        assert_eq!(config.prometheus.base_url, "http://metrics.internal:9090");
        assert_eq!(config.kubernetes.token.as_deref(), Some("token-abc"));
        assert!(config.knowledge_base.enabled);
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("alertmanager_url", "alertmanager:9093");

        let err = BackendsConfig::from_provider(&provider).unwrap_err();
        assert!(err.to_string().contains("Alertmanager URL must start with http"));
    }

    #[test]
    fn test_invalid_bool_falls_back() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("kb_enabled", "maybe");

        let config = BackendsConfig::from_provider(&provider).unwrap();
        assert!(!config.knowledge_base.enabled);
        assert_eq!(config.knowledge_base.enabled, provider.get_bool_or("kb_enabled", false));
        assert!(config.prometheus.validate().is_ok());
        assert_eq!(config.prometheus.service_name(), "prometheus");
    }
}
