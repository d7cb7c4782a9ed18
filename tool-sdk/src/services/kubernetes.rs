//! Kubernetes REST adapters for pod state and recent events.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::{json, Value};
use shared_types::{AdapterId, ToolParams};

use crate::config::KubernetesConfig;
use crate::core::{optional_str, params, u64_or, EvidenceAdapter};
use crate::error::Result;
use crate::services::common::{build_http_client, send_json, UserAgent};

const DEFAULT_WINDOW_MINUTES: u64 = 15;

pub struct KubernetesClient {
    http_client: Client,
    config: KubernetesConfig,
}

impl KubernetesClient {
    pub fn new(config: KubernetesConfig) -> Result<Self> {
        let http_client = build_http_client(Some(UserAgent::for_backend("kubernetes")), None)?;
        Ok(Self {
            http_client,
            config,
        })
    }

    /// `/api/v1/<resource>` or `/api/v1/namespaces/<ns>/<resource>`
    fn resource_url(&self, resource: &str, namespace: Option<&str>) -> String {
        match namespace {
            Some(ns) => format!("{}/api/v1/namespaces/{}/{}", self.config.api_url, ns, resource),
            None => format!("{}/api/v1/{}", self.config.api_url, resource),
        }
    }

    pub async fn list(&self, resource: &str, namespace: Option<&str>, timeout: Duration) -> Result<Vec<Value>> {
        let mut request = self.http_client.get(self.resource_url(resource, namespace));
        if let Some(ref token) = self.config.token {
            request = request.bearer_auth(token);
        }

        let body = send_json("kubernetes", request, timeout).await?;
        Ok(body
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

fn matches_service(name: &str, service: Option<&str>) -> bool {
    service.map_or(true, |prefix| name.starts_with(prefix))
}

fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

pub fn summarise_pod(pod: &Value) -> Value {
    let containers: Vec<Value> = pod
        .pointer("/status/containerStatuses")
        .and_then(Value::as_array)
        .map(|statuses| statuses.iter().map(summarise_container).collect())
        .unwrap_or_default();

    let restart_count: u64 = containers
        .iter()
        .filter_map(|c| c.get("restart_count").and_then(Value::as_u64))
        .sum();

    json!({
        "name": str_at(pod, "/metadata/name").unwrap_or_default(),
        "namespace": str_at(pod, "/metadata/namespace"),
        "phase": str_at(pod, "/status/phase").unwrap_or("Unknown"),
        "node": str_at(pod, "/spec/nodeName"),
        "restart_count": restart_count,
        "containers": containers,
    })
}

fn summarise_container(status: &Value) -> Value {
    let (state, reason, exit_code) = if status.pointer("/state/running").is_some() {
        ("running", None, None)
    } else if let Some(waiting) = status.pointer("/state/waiting") {
        ("waiting", waiting.get("reason").and_then(Value::as_str), None)
    } else if let Some(terminated) = status.pointer("/state/terminated") {
        (
            "terminated",
            terminated.get("reason").and_then(Value::as_str),
            terminated.get("exitCode").and_then(Value::as_i64),
        )
    } else {
        ("unknown", None, None)
    };

    // the last termination explains restarts even when the container is running again
    let last_reason = str_at(status, "/lastState/terminated/reason");

    json!({
        "name": str_at(status, "/name").unwrap_or_default(),
        "ready": status.get("ready").and_then(Value::as_bool).unwrap_or(false),
        "restart_count": status.get("restartCount").and_then(Value::as_u64).unwrap_or(0),
        "state": state,
        "reason": reason.or(last_reason),
        "exit_code": exit_code,
    })
}

fn event_time(event: &Value) -> Option<DateTime<Utc>> {
    ["/lastTimestamp", "/eventTime", "/metadata/creationTimestamp"]
        .iter()
        .filter_map(|p| str_at(event, p))
        .find_map(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|t| t.with_timezone(&Utc))
}

/// Keep events seen after `cutoff` whose object matches the service prefix,
/// ordered oldest first.
pub fn summarise_events(items: &[Value], cutoff: DateTime<Utc>, service: Option<&str>) -> Vec<Value> {
    let mut events: Vec<(DateTime<Utc>, Value)> = items
        .iter()
        .filter_map(|event| {
            let seen = event_time(event)?;
            let object = str_at(event, "/involvedObject/name").unwrap_or_default();
            if seen < cutoff || !matches_service(object, service) {
                return None;
            }
            Some((
                seen,
                json!({
                    "type": str_at(event, "/type"),
                    "reason": str_at(event, "/reason"),
                    "message": str_at(event, "/message"),
                    "object": format!(
                        "{}/{}",
                        str_at(event, "/involvedObject/kind").unwrap_or("Unknown"),
                        object
                    ),
                    "count": event.get("count").and_then(Value::as_u64).unwrap_or(1),
                    "last_seen": seen.to_rfc3339(),
                }),
            ))
        })
        .collect();

    events.sort_by_key(|(seen, _)| *seen);
    events.into_iter().map(|(_, e)| e).collect()
}

pub struct KubernetesPodsAdapter {
    client: Arc<KubernetesClient>,
}

impl KubernetesPodsAdapter {
    pub fn new(client: Arc<KubernetesClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EvidenceAdapter for KubernetesPodsAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::ClusterPods
    }

    async fn query(&self, params: &ToolParams, timeout: Duration) -> Result<Value> {
        let namespace = optional_str(params, params::NAMESPACE);
        let service = optional_str(params, params::SERVICE);

        let items = self.client.list("pods", namespace, timeout).await?;
        let pods: Vec<Value> = items
            .iter()
            .filter(|pod| matches_service(str_at(pod, "/metadata/name").unwrap_or_default(), service))
            .map(summarise_pod)
            .collect();

        Ok(json!({
            "namespace": namespace,
            "count": pods.len(),
            "pods": pods,
        }))
    }
}

pub struct KubernetesEventsAdapter {
    client: Arc<KubernetesClient>,
}

impl KubernetesEventsAdapter {
    pub fn new(client: Arc<KubernetesClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EvidenceAdapter for KubernetesEventsAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::ClusterEvents
    }

    async fn query(&self, params: &ToolParams, timeout: Duration) -> Result<Value> {
        let namespace = optional_str(params, params::NAMESPACE);
        let service = optional_str(params, params::SERVICE);
        let window = u64_or(params, params::WINDOW_MINUTES, DEFAULT_WINDOW_MINUTES);

        let items = self.client.list("events", namespace, timeout).await?;
        let cutoff = Utc::now() - chrono::Duration::minutes(window as i64);
        let events = summarise_events(&items, cutoff, service);

        Ok(json!({
            "namespace": namespace,
            "count": events.len(),
            "events": events,
        }))
    }
}
