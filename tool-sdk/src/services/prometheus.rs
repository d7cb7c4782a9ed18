//! Prometheus metrics adapters (instant and range queries).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::warn;
use reqwest::Client;
use serde_json::{json, Value};
use shared_types::{AdapterId, ToolParams};

use crate::config::PrometheusConfig;
use crate::core::{params, required_str, u64_or, EvidenceAdapter};
use crate::error::{Result, ServiceError};
use crate::services::common::{build_http_client, send_json, UserAgent};

const DEFAULT_WINDOW_MINUTES: u64 = 15;
const DEFAULT_STEP_SECONDS: u64 = 60;

pub struct PrometheusClient {
    http_client: Client,
    config: PrometheusConfig,
}

impl PrometheusClient {
    pub fn new(config: PrometheusConfig) -> Result<Self> {
        let http_client = build_http_client(Some(UserAgent::for_backend("prometheus")), None)?;
        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// `GET /api/v1/query`
    pub async fn instant_query(&self, query: &str, timeout: Duration) -> Result<Value> {
        let url = format!("{}/api/v1/query", self.config.base_url);
        let request = self.http_client.get(&url).query(&[("query", query)]);
        let body = send_json("prometheus", request, timeout).await?;
        let data = unwrap_envelope(body, query)?;

        Ok(json!({
            "query": query,
            "result_type": data.get("resultType").cloned().unwrap_or(Value::Null),
            "result": data.get("result").cloned().unwrap_or_else(|| json!([])),
        }))
    }

    /// `GET /api/v1/query_range` over `[start, end]`
    pub async fn range_query(
        &self,
        query: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step_seconds: u64,
        timeout: Duration,
    ) -> Result<Value> {
        let url = format!("{}/api/v1/query_range", self.config.base_url);
        let step = format!("{}s", step_seconds);
        let request = self.http_client.get(&url).query(&[
            ("query", query.to_string()),
            ("start", start.timestamp().to_string()),
            ("end", end.timestamp().to_string()),
            ("step", step.clone()),
        ]);
        let body = send_json("prometheus", request, timeout).await?;
        let data = unwrap_envelope(body, query)?;

        Ok(json!({
            "query": query,
            "result_type": data.get("resultType").cloned().unwrap_or(Value::Null),
            "result": data.get("result").cloned().unwrap_or_else(|| json!([])),
            "time_range": {
                "start": start.to_rfc3339(),
                "end": end.to_rfc3339(),
                "step": step,
            },
        }))
    }
}

/// Prometheus wraps every answer in `{status, data}`; a 200 can still carry
/// `status: "error"`.
fn unwrap_envelope(body: Value, query: &str) -> Result<Value> {
    match body.get("status").and_then(Value::as_str) {
        Some("success") => Ok(body.get("data").cloned().unwrap_or_else(|| json!({}))),
        _ => {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Unknown Prometheus error");
            warn!("Prometheus query failed: {} ({})", message, query);
            Err(ServiceError::service(format!("Prometheus query failed: {}", message)))
        }
    }
}

pub struct PrometheusInstantAdapter {
    client: Arc<PrometheusClient>,
}

impl PrometheusInstantAdapter {
    pub fn new(client: Arc<PrometheusClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EvidenceAdapter for PrometheusInstantAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::MetricsInstant
    }

    async fn query(&self, params: &ToolParams, timeout: Duration) -> Result<Value> {
        let query = required_str(params, params::QUERY)?;
        self.client.instant_query(query, timeout).await
    }
}

pub struct PrometheusRangeAdapter {
    client: Arc<PrometheusClient>,
}

impl PrometheusRangeAdapter {
    pub fn new(client: Arc<PrometheusClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EvidenceAdapter for PrometheusRangeAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::MetricsRange
    }

    async fn query(&self, params: &ToolParams, timeout: Duration) -> Result<Value> {
        let query = required_str(params, params::QUERY)?;
        let window = u64_or(params, params::WINDOW_MINUTES, DEFAULT_WINDOW_MINUTES);
        let step = u64_or(params, params::STEP_SECONDS, DEFAULT_STEP_SECONDS).max(1);

        let end = Utc::now();
        let start = end - chrono::Duration::minutes(window as i64);
        self.client.range_query(query, start, end, step, timeout).await
    }
}
