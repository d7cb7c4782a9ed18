//! Alertmanager adapter: currently active, unsilenced alerts.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use shared_types::{AdapterId, ToolParams};
use std::collections::HashMap;

use crate::config::AlertmanagerConfig;
use crate::core::{optional_str, params, EvidenceAdapter};
use crate::error::{Result, ServiceError};
use crate::services::common::{build_http_client, send_json, UserAgent};

/// Subset of the `/api/v2/alerts` item the adapter keeps.
#[derive(Debug, Deserialize)]
struct GettableAlert {
    #[serde(default)]
    labels: HashMap<String, String>,
    #[serde(default)]
    annotations: HashMap<String, String>,
    #[serde(default)]
    status: AlertStatus,
    #[serde(rename = "startsAt", default)]
    starts_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AlertStatus {
    #[serde(default)]
    state: Option<String>,
}

pub struct AlertmanagerAdapter {
    http_client: Client,
    config: AlertmanagerConfig,
}

impl AlertmanagerAdapter {
    pub fn new(config: AlertmanagerConfig) -> Result<Self> {
        let http_client = build_http_client(Some(UserAgent::for_backend("alertmanager")), None)?;
        Ok(Self {
            http_client,
            config,
        })
    }
}

#[async_trait]
impl EvidenceAdapter for AlertmanagerAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::Alerts
    }

    async fn query(&self, params: &ToolParams, timeout: Duration) -> Result<Value> {
        let url = format!("{}/api/v2/alerts", self.config.base_url);
        let mut query = vec![
            ("active", "true".to_string()),
            ("silenced", "false".to_string()),
            ("inhibited", "false".to_string()),
        ];
        if let Some(ns) = optional_str(params, params::NAMESPACE) {
            query.push(("filter", format!("namespace=\"{}\"", ns)));
        }

        let body = send_json("alertmanager", self.http_client.get(&url).query(&query), timeout).await?;
        let raw: Vec<GettableAlert> = serde_json::from_value(body)
            .map_err(|e| ServiceError::parsing(format!("Unexpected Alertmanager payload: {}", e)))?;

        let alerts: Vec<Value> = raw.into_iter().map(summarise).collect();
        Ok(json!({
            "count": alerts.len(),
            "alerts": alerts,
        }))
    }
}

fn summarise(alert: GettableAlert) -> Value {
    let label = |key: &str| alert.labels.get(key).cloned();
    let summary = alert
        .annotations
        .get("summary")
        .or_else(|| alert.annotations.get("description"))
        .cloned();

    json!({
        "name": label("alertname").unwrap_or_else(|| "Unknown".to_string()),
        "state": alert.status.state.clone().unwrap_or_else(|| "unknown".to_string()),
        "severity": label("severity").unwrap_or_else(|| "unknown".to_string()),
        "namespace": label("namespace"),
        "summary": summary,
        "starts_at": alert.starts_at,
    })
}
