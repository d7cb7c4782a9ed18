//! Tests for error handling functionality

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use crate::error::{mapping, ErrorContext, ServiceError};

    #[test]
    fn test_service_error_creation() {
        let network_err = ServiceError::network("Connection failed");
        let auth_err = ServiceError::authentication("Invalid credentials");
        let disabled_err = ServiceError::disabled("Knowledge base is not enabled");

        assert_eq!(network_err.to_string(), "Network error: Connection failed");
        assert_eq!(auth_err.to_string(), "Authentication error: Invalid credentials");
        assert_eq!(
            disabled_err.to_string(),
            "Backend disabled: Knowledge base is not enabled"
        );

        assert!(network_err.is_transient());
        assert!(!auth_err.is_transient());
        assert!(!disabled_err.is_transient());
    }

    #[test]
    fn test_error_context() {
        let context = ErrorContext::for_service("loki")
            .status_code(502)
            .endpoint("/loki/api/v1/query_range");

        let err = ServiceError::service("bad gateway").with_context(context);

        assert_eq!(err.service_name(), Some("loki"));
        assert_eq!(err.status_code(), Some(502));
        assert_eq!(err.to_string(), "Service error: bad gateway");

        // context wrappers do not hide the category
        let timeout = ServiceError::timeout("slow").with_context(ErrorContext::for_service("loki"));
        assert!(timeout.is_timeout());
        assert!(timeout.is_transient());
    }

    #[test]
    fn test_prometheus_error_mapping() {
        let mut context = ErrorContext::for_service("prometheus");
        let body = json!({
            "status": "error",
            "errorType": "bad_data",
            "error": "parse error at char 5"
        });

        let err = mapping::map_http_error(StatusCode::BAD_REQUEST, &body.to_string(), &mut context);
        match err {
            ServiceError::Validation(msg) => assert_eq!(msg, "parse error at char 5"),
            other => panic!("Expected validation error, got {:?}", other),
        }
        assert_eq!(context.data.get("error_type").map(String::as_str), Some("bad_data"));

        let body = json!({"status": "error", "errorType": "timeout", "error": "query timed out"});
        let err = mapping::map_prometheus_error(StatusCode::SERVICE_UNAVAILABLE, &body, &mut context);
        assert!(err.is_timeout());
    }

    #[test]
    fn test_kubernetes_error_mapping() {
        let mut context = ErrorContext::for_service("kubernetes");
        let body = json!({
            "kind": "Status",
            "status": "Failure",
            "message": "pods is forbidden: User \"system:anonymous\" cannot list resource \"pods\"",
            "reason": "Forbidden",
            "code": 403
        });

        let err = mapping::map_http_error(StatusCode::FORBIDDEN, &body.to_string(), &mut context);
        match err {
            ServiceError::Authorization(msg) => {
                assert!(msg.starts_with("Kubernetes API error: 403"));
                assert!(msg.contains("forbidden"));
            }
            other => panic!("Expected authorization error, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_text_error_mapping() {
        let mut context = ErrorContext::for_service("loki");

        let err = mapping::map_http_error(
            StatusCode::BAD_REQUEST,
            "parse error : syntax error: unexpected IDENTIFIER",
            &mut context,
        );
        assert!(matches!(err, ServiceError::Validation(ref m) if m.starts_with("HTTP 400:")));

        let err = mapping::map_http_error(StatusCode::NOT_FOUND, "", &mut context);
        assert!(matches!(err, ServiceError::NotFound(_)));

        let long_body = "x".repeat(500);
        let err = mapping::map_http_error(StatusCode::BAD_GATEWAY, &long_body, &mut context);
        match err {
            ServiceError::Service(msg) => assert!(msg.len() < 200 && msg.ends_with("...")),
            other => panic!("Expected service error, got {:?}", other),
        }
    }
}
