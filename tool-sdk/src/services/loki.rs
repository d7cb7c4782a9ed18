//! Loki log adapter.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde_json::{json, Value};
use shared_types::{AdapterId, ToolParams};

use crate::config::LokiConfig;
use crate::core::{params, required_str, u64_or, EvidenceAdapter};
use crate::error::{Result, ServiceError};
use crate::services::common::{build_http_client, send_json, UserAgent};

const DEFAULT_WINDOW_MINUTES: u64 = 15;
const DEFAULT_LIMIT: u64 = 100;

pub struct LokiAdapter {
    http_client: Client,
    config: LokiConfig,
}

impl LokiAdapter {
    pub fn new(config: LokiConfig) -> Result<Self> {
        let http_client = build_http_client(Some(UserAgent::for_backend("loki")), None)?;
        Ok(Self {
            http_client,
            config,
        })
    }
}

#[async_trait]
impl EvidenceAdapter for LokiAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::Logs
    }

    async fn query(&self, params: &ToolParams, timeout: Duration) -> Result<Value> {
        let query = required_str(params, params::QUERY)?;
        let window = u64_or(params, params::WINDOW_MINUTES, DEFAULT_WINDOW_MINUTES);
        let limit = u64_or(params, params::LIMIT, DEFAULT_LIMIT);

        let end = Utc::now();
        let start = end - chrono::Duration::minutes(window as i64);
        let start_ns = start.timestamp_nanos_opt().unwrap_or_default();
        let end_ns = end.timestamp_nanos_opt().unwrap_or_default();

        let url = format!("{}/loki/api/v1/query_range", self.config.base_url);
        let request = self.http_client.get(&url).query(&[
            ("query", query.to_string()),
            ("start", start_ns.to_string()),
            ("end", end_ns.to_string()),
            ("limit", limit.to_string()),
            ("direction", "backward".to_string()),
        ]);

        let body = send_json("loki", request, timeout).await?;
        if body.get("status").and_then(Value::as_str) != Some("success") {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Unknown Loki error");
            return Err(ServiceError::service(format!("Loki query failed: {}", message)));
        }

        let entries = flatten_streams(&body);
        Ok(json!({
            "query": query,
            "count": entries.len(),
            "entries": entries,
            "time_range": {
                "start": start.to_rfc3339(),
                "end": end.to_rfc3339(),
            },
        }))
    }
}

/// Flatten Loki streams into one list of entries, oldest first, so the most
/// recent lines are always at the tail.
pub fn flatten_streams(body: &Value) -> Vec<Value> {
    let mut entries: Vec<(i64, Value)> = Vec::new();

    let streams = body
        .pointer("/data/result")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    for stream in streams {
        let labels = stream.get("stream").cloned().unwrap_or_else(|| json!({}));
        let values = stream
            .get("values")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        for value in values {
            let (Some(ts), Some(line)) = (
                value.get(0).and_then(Value::as_str),
                value.get(1).and_then(Value::as_str),
            ) else {
                continue;
            };
            let Ok(ns) = ts.parse::<i64>() else {
                continue;
            };
            entries.push((
                ns,
                json!({
                    "timestamp": Utc.timestamp_nanos(ns).to_rfc3339(),
                    "line": line,
                    "labels": labels.clone(),
                }),
            ));
        }
    }

    entries.sort_by_key(|(ns, _)| *ns);
    entries.into_iter().map(|(_, entry)| entry).collect()
}
