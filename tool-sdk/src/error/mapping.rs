//! Error mapping for backend-specific APIs
//!
//! Converts non-2xx responses from the observability backends into the
//! normalised ServiceError categories.

use reqwest::StatusCode;
use serde_json::Value;

use super::{ErrorContext, ServiceError};

fn by_status(status: StatusCode, message: impl Into<String>) -> ServiceError {
    let message = message.into();
    match status {
        StatusCode::UNAUTHORIZED => ServiceError::authentication(message),
        StatusCode::FORBIDDEN => ServiceError::authorization(message),
        StatusCode::TOO_MANY_REQUESTS => ServiceError::rate_limit(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ServiceError::validation(message)
        }
        StatusCode::NOT_FOUND => ServiceError::not_found(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ServiceError::timeout(message),
        _ => ServiceError::service(message),
    }
}

/// Prometheus error envelope: `{"status":"error","errorType":..,"error":..}`
pub fn map_prometheus_error(
    status: StatusCode,
    json: &Value,
    context: &mut ErrorContext,
) -> ServiceError {
    context.service = "prometheus".to_string();

    if let Some(error_type) = json.get("errorType").and_then(Value::as_str) {
        context.add("error_type", error_type);
    }

    let message = json
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("Unknown Prometheus error");

    // Prometheus reports query timeouts as 503 with errorType "timeout"
    if json.get("errorType").and_then(Value::as_str) == Some("timeout") {
        return ServiceError::timeout(message);
    }

    by_status(status, message)
}

/// Kubernetes `Status` object: `{"kind":"Status","reason":..,"message":..}`
pub fn map_kubernetes_error(
    status: StatusCode,
    json: &Value,
    context: &mut ErrorContext,
) -> ServiceError {
    context.service = "kubernetes".to_string();

    if let Some(reason) = json.get("reason").and_then(Value::as_str) {
        context.add("reason", reason);
    }

    let message = json
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Unknown Kubernetes API error");

    by_status(status, format!("Kubernetes API error: {} - {}", status.as_u16(), message))
}

/// Map a generic HTTP error to a ServiceError
pub fn map_http_error(status: StatusCode, body: &str, context: &mut ErrorContext) -> ServiceError {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        match context.service.as_str() {
            "prometheus" => return map_prometheus_error(status, &json, context),
            "kubernetes" => return map_kubernetes_error(status, &json, context),
            _ => {
                let message = json
                    .get("message")
                    .or_else(|| json.get("error"))
                    .and_then(Value::as_str)
                    .unwrap_or(body);
                return by_status(status, message);
            }
        }
    }

    // Loki and Alertmanager usually answer errors in plain text
    let message = if body.trim().is_empty() {
        status.to_string()
    } else if body.len() > 100 {
        format!("HTTP {}: {:.100}...", status.as_u16(), body.trim())
    } else {
        format!("HTTP {}: {}", status.as_u16(), body.trim())
    };

    by_status(status, message)
}
