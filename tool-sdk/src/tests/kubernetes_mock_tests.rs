//! Mock tests for the Kubernetes adapters

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use serde_json::{json, Value};
    use shared_types::ToolParams;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::KubernetesConfig;
    use crate::core::{params, EvidenceAdapter};
    use crate::error::ServiceError;
    use crate::services::kubernetes::{
        summarise_events, KubernetesClient, KubernetesEventsAdapter, KubernetesPodsAdapter,
    };

    fn create_test_client(mock_server: &MockServer, token: Option<&str>) -> Arc<KubernetesClient> {
        Arc::new(
            KubernetesClient::new(KubernetesConfig {
                api_url: mock_server.uri(),
                token: token.map(str::to_string),
            })
            .expect("Failed to build Kubernetes client"),
        )
    }

    fn pod(name: &str, restarts: u64, waiting_reason: Option<&str>) -> Value {
        let state = match waiting_reason {
            Some(reason) => json!({"waiting": {"reason": reason}}),
            None => json!({"running": {"startedAt": "2024-05-01T10:00:00Z"}}),
        };
        json!({
            "metadata": {"name": name, "namespace": "shop"},
            "spec": {"nodeName": "node-a"},
            "status": {
                "phase": "Running",
                "containerStatuses": [{
                    "name": "app",
                    "ready": waiting_reason.is_none(),
                    "restartCount": restarts,
                    "state": state,
                    "lastState": {"terminated": {"reason": "OOMKilled", "exitCode": 137}}
                }]
            }
        })
    }

    #[tokio::test]
    async fn test_pods_filtered_by_service_prefix() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/namespaces/shop/pods"))
            .and(header("authorization", "Bearer sa-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "PodList",
                "items": [
                    pod("checkout-7d9f-abc", 4, Some("CrashLoopBackOff")),
                    pod("cart-55c-xyz", 0, None)
                ]
            })))
            .mount(&mock_server)
            .await;

        let adapter = KubernetesPodsAdapter::new(create_test_client(&mock_server, Some("sa-token")));
        let mut p = ToolParams::new();
        p.insert(params::NAMESPACE.to_string(), json!("shop"));
        p.insert(params::SERVICE.to_string(), json!("checkout"));

        let payload = adapter.query(&p, Duration::from_secs(5)).await.unwrap();

        assert_eq!(payload["count"], 1);
        let pod = &payload["pods"][0];
        assert_eq!(pod["name"], "checkout-7d9f-abc");
        assert_eq!(pod["restart_count"], 4);
        assert_eq!(pod["node"], "node-a");
        assert_eq!(pod["containers"][0]["state"], "waiting");
        assert_eq!(pod["containers"][0]["reason"], "CrashLoopBackOff");
    }

    #[tokio::test]
    async fn test_pods_across_all_namespaces() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/pods"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [pod("api-0", 2, None)]
            })))
            .mount(&mock_server)
            .await;

        let adapter = KubernetesPodsAdapter::new(create_test_client(&mock_server, None));
        let payload = adapter.query(&ToolParams::new(), Duration::from_secs(5)).await.unwrap();

        let container = &payload["pods"][0]["containers"][0];
        assert_eq!(container["state"], "running");
        // a running container still reports why it last restarted
        assert_eq!(container["reason"], "OOMKilled");
    }

    #[tokio::test]
    async fn test_forbidden_is_reported() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/namespaces/shop/events"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "kind": "Status",
                "message": "events is forbidden",
                "reason": "Forbidden",
                "code": 403
            })))
            .mount(&mock_server)
            .await;

        let adapter = KubernetesEventsAdapter::new(create_test_client(&mock_server, None));
        let mut p = ToolParams::new();
        p.insert(params::NAMESPACE.to_string(), json!("shop"));

        let err = adapter.query(&p, Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err.root(), ServiceError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_recent_events_only() {
        let mock_server = MockServer::start().await;
        let now = Utc::now();
        let recent = (now - chrono::Duration::minutes(2)).to_rfc3339();
        let stale = (now - chrono::Duration::hours(3)).to_rfc3339();

        Mock::given(method("GET"))
            .and(path("/api/v1/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {
                        "type": "Warning",
                        "reason": "BackOff",
                        "message": "Back-off restarting failed container",
                        "count": 12,
                        "lastTimestamp": recent,
                        "involvedObject": {"kind": "Pod", "name": "checkout-7d9f-abc"}
                    },
                    {
                        "type": "Normal",
                        "reason": "Scheduled",
                        "message": "Successfully assigned",
                        "lastTimestamp": stale,
                        "involvedObject": {"kind": "Pod", "name": "checkout-7d9f-abc"}
                    }
                ]
            })))
            .mount(&mock_server)
            .await;

        let adapter = KubernetesEventsAdapter::new(create_test_client(&mock_server, None));
        let mut p = ToolParams::new();
        p.insert(params::WINDOW_MINUTES.to_string(), json!(15));

        let payload = adapter.query(&p, Duration::from_secs(5)).await.unwrap();
        assert_eq!(payload["count"], 1);
        assert_eq!(payload["events"][0]["reason"], "BackOff");
        assert_eq!(payload["events"][0]["object"], "Pod/checkout-7d9f-abc");
        assert_eq!(payload["events"][0]["count"], 12);
    }

    #[test]
    fn test_events_sorted_oldest_first_and_filtered_by_service() {
        let now = Utc::now();
        let at = |mins: i64| (now - chrono::Duration::minutes(mins)).to_rfc3339();
        let items = vec![
            json!({"reason": "Killing", "lastTimestamp": at(1), "involvedObject": {"kind": "Pod", "name": "api-1"}}),
            json!({"reason": "Pulled", "eventTime": at(5), "involvedObject": {"kind": "Pod", "name": "api-1"}}),
            json!({"reason": "Other", "lastTimestamp": at(3), "involvedObject": {"kind": "Pod", "name": "db-0"}}),
            json!({"reason": "Undated", "involvedObject": {"kind": "Pod", "name": "api-2"}}),
        ];

        let events = summarise_events(&items, now - chrono::Duration::minutes(10), Some("api"));
        let reasons: Vec<&str> = events.iter().map(|e| e["reason"].as_str().unwrap()).collect();
        assert_eq!(reasons, vec!["Pulled", "Killing"]);
    }
}
