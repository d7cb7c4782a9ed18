//! Common utilities for backend clients

use std::fmt;
use std::time::{Duration, Instant};

use log::debug;
use reqwest::{header, Client, RequestBuilder};
use serde_json::Value;

use crate::error::{ErrorContext, Result, ServiceError};

/// Identifies the client to upstream services
#[derive(Debug, Clone)]
pub struct UserAgent {
    pub app_name: String,
    pub version: String,
    pub extra: Option<String>,
}

impl Default for UserAgent {
    fn default() -> Self {
        Self {
            app_name: "cluster-agent".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            extra: Some("tool-sdk".to_string()),
        }
    }
}

impl UserAgent {
    pub fn for_backend(backend: &str) -> Self {
        Self {
            extra: Some(format!("{}-adapter", backend)),
            ..Self::default()
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_name, self.version)?;

        if let Some(ref extra) = self.extra {
            write!(f, " ({})", extra)?;
        }

        Ok(())
    }
}

/// Build a standard HTTP client. Per-request timeouts override `timeout`.
pub fn build_http_client(user_agent: Option<UserAgent>, timeout: Option<Duration>) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    let ua = user_agent.unwrap_or_default().to_string();

    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(&ua)
            .map_err(|e| ServiceError::configuration(format!("Invalid user agent: {}", e)))?,
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout.unwrap_or_else(|| Duration::from_secs(30)))
        .gzip(true)
        .build()
        .map_err(|e| ServiceError::configuration(format!("Failed to build HTTP client: {}", e)))
}

pub fn create_error_context(service_name: &str, status: Option<reqwest::StatusCode>) -> ErrorContext {
    let mut context = ErrorContext::for_service(service_name);

    if let Some(status_code) = status {
        context = context.status_code(status_code.as_u16());
    }

    context
}

/// Turn a non-2xx response into a typed error carrying the backend message.
pub async fn parse_error_response(service_name: &str, response: reqwest::Response) -> ServiceError {
    let status = response.status();
    let endpoint = response.url().path().to_string();
    let mut context = create_error_context(service_name, Some(status)).endpoint(endpoint);

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => format!("Failed to read error response: {}", e),
    };

    crate::error::mapping::map_http_error(status, &body, &mut context).with_context(context)
}

/// Send a prepared GET request bounded by `timeout` and decode the JSON body.
pub async fn send_json(service_name: &str, request: RequestBuilder, timeout: Duration) -> Result<Value> {
    let started = Instant::now();

    let response = request.timeout(timeout).send().await.map_err(|e| {
        if e.is_timeout() {
            ServiceError::timeout(format!(
                "{} request timed out after {}ms",
                service_name,
                timeout.as_millis()
            ))
        } else {
            ServiceError::from(e)
        }
    })?;

    if !response.status().is_success() {
        return Err(parse_error_response(service_name, response).await);
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| ServiceError::parsing(format!("{} returned invalid JSON: {}", service_name, e)))?;

    debug!(
        "{} responded in {:.2}ms",
        service_name,
        started.elapsed().as_secs_f64() * 1000.0
    );
    Ok(body)
}
