//! Adapter registry: which implementation answers for which AdapterId.

use std::collections::HashMap;
use std::sync::Arc;

use log::info;
use shared_types::AdapterId;

use crate::config::BackendsConfig;
use crate::core::EvidenceAdapter;
use crate::error::Result;
use crate::services::alertmanager::AlertmanagerAdapter;
use crate::services::knowledge_base::KnowledgeBaseAdapter;
use crate::services::kubernetes::{KubernetesClient, KubernetesEventsAdapter, KubernetesPodsAdapter};
use crate::services::loki::LokiAdapter;
use crate::services::prometheus::{PrometheusClient, PrometheusInstantAdapter, PrometheusRangeAdapter};

#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<AdapterId, Arc<dyn EvidenceAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own id, replacing any previous entry.
    pub fn register(&mut self, adapter: Arc<dyn EvidenceAdapter>) {
        let id = adapter.id();
        if self.adapters.insert(id, adapter).is_some() {
            log::debug!("Replaced adapter registration for {}", id);
        }
    }

    pub fn with(mut self, adapter: Arc<dyn EvidenceAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, id: AdapterId) -> Option<Arc<dyn EvidenceAdapter>> {
        self.adapters.get(&id).cloned()
    }

    pub fn contains(&self, id: AdapterId) -> bool {
        self.adapters.contains_key(&id)
    }

    /// Registered ids in canonical order.
    pub fn ids(&self) -> Vec<AdapterId> {
        let mut ids: Vec<AdapterId> = self.adapters.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Wire the full HTTP-backed catalogue.
    pub fn from_backends(config: &BackendsConfig) -> Result<Self> {
        let prometheus = Arc::new(PrometheusClient::new(config.prometheus.clone())?);
        let kubernetes = Arc::new(KubernetesClient::new(config.kubernetes.clone())?);

        let registry = Self::new()
            .with(Arc::new(KubernetesPodsAdapter::new(kubernetes.clone())))
            .with(Arc::new(KubernetesEventsAdapter::new(kubernetes)))
            .with(Arc::new(PrometheusInstantAdapter::new(prometheus.clone())))
            .with(Arc::new(PrometheusRangeAdapter::new(prometheus)))
            .with(Arc::new(AlertmanagerAdapter::new(config.alertmanager.clone())?))
            .with(Arc::new(LokiAdapter::new(config.loki.clone())?))
            .with(Arc::new(KnowledgeBaseAdapter::new(config.knowledge_base.clone())));

        info!("Adapter registry initialised with {} adapters", registry.len());
        Ok(registry)
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("adapters", &self.ids())
            .finish()
    }
}
