//! Core abstractions for evidence adapters
//!
//! An adapter wraps exactly one backend call. It receives the parameters
//! the tool selector derived from a question, plus the time it is allowed to
//! take, and answers with an opaque JSON payload.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use shared_types::{AdapterId, ToolParams};

use crate::error::{Result, ServiceError};

/// Parameter keys shared between the tool selector and the adapters.
pub mod params {
    pub const QUERY: &str = "query";
    pub const NAMESPACE: &str = "namespace";
    pub const SERVICE: &str = "service";
    pub const WINDOW_MINUTES: &str = "window_minutes";
    pub const STEP_SECONDS: &str = "step_seconds";
    pub const LIMIT: &str = "limit";
    pub const TOP_K: &str = "top_k";
}

#[async_trait]
pub trait EvidenceAdapter: Send + Sync {
    /// Identifier this adapter answers for.
    fn id(&self) -> AdapterId;

    /// Run one query. Implementations bound their own I/O by `timeout`; the
    /// caller enforces it again from outside.
    async fn query(&self, params: &ToolParams, timeout: Duration) -> Result<Value>;
}

/// Required string parameter; blank values count as missing.
pub fn required_str<'a>(params: &'a ToolParams, key: &str) -> Result<&'a str> {
    optional_str(params, key)
        .ok_or_else(|| ServiceError::validation(format!("missing required parameter '{}'", key)))
}

pub fn optional_str<'a>(params: &'a ToolParams, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub fn u64_or(params: &ToolParams, key: &str, default: u64) -> u64 {
    params.get(key).and_then(Value::as_u64).unwrap_or(default)
}
