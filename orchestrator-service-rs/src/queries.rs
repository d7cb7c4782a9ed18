// orchestrator-service-rs/src/queries.rs
// PromQL and LogQL construction from a question
//
// Both builders are pure functions of the question text and its hints.
// Metric families are tried in table order; the first family whose
// keywords appear in the question picks the query.

use shared_types::Question;

use crate::terms::Terms;

/// Fallback metric when no family matches.
const RESTARTS_METRIC: &str = "kube_pod_container_status_restarts_total";

const LOG_ERROR_TERMS: &[&str] = &["error", "exception", "fail"];
const LOG_ERROR_FILTER: &str = r#" |~ "(?i)(error|exception|fail)""#;
const LOG_FALLBACK_SELECTOR: &str = r#"{job="kubernetes-pods"}"#;

struct MetricFamily {
    keywords: &'static [&'static str],
    build: fn(&Terms, &Scope) -> String,
}

const METRIC_FAMILIES: &[MetricFamily] = &[
    MetricFamily {
        keywords: &["cpu", "load"],
        build: cpu_query,
    },
    MetricFamily {
        keywords: &["memory", "mem", "ram"],
        build: memory_query,
    },
    MetricFamily {
        keywords: &["disk", "storage", "filesystem"],
        build: disk_query,
    },
    MetricFamily {
        keywords: &["network", "traffic", "bandwidth"],
        build: network_query,
    },
    MetricFamily {
        keywords: &["process", "proc"],
        build: process_query,
    },
    MetricFamily {
        keywords: &["context switch", "context switches"],
        build: |_, _| "rate(node_context_switches_total[5m])".to_string(),
    },
    MetricFamily {
        keywords: &["interrupt"],
        build: |_, _| "rate(node_intr_total[5m])".to_string(),
    },
    MetricFamily {
        keywords: &["systemd"],
        build: |_, _| "node_systemd_unit_state".to_string(),
    },
    MetricFamily {
        keywords: &["temperature", "temp"],
        build: |_, _| "node_hwmon_temp_celsius".to_string(),
    },
    MetricFamily {
        keywords: &["fan"],
        build: |_, _| "node_hwmon_fan_rpm".to_string(),
    },
];

/// Namespace / service hints rendered as label matchers.
struct Scope {
    namespace: Option<String>,
    service: Option<String>,
}

impl Scope {
    fn from_question(question: &Question) -> Self {
        Self {
            namespace: question.namespace_hint().map(escape_label),
            service: question.service_hint().map(escape_label),
        }
    }

    /// `{namespace="..",pod=~"svc.*"}`, or an empty string with no hints.
    fn pod_selector(&self) -> String {
        let mut matchers = Vec::new();
        if let Some(ns) = &self.namespace {
            matchers.push(format!(r#"namespace="{}""#, ns));
        }
        if let Some(svc) = &self.service {
            matchers.push(format!(r#"pod=~"{}.*""#, svc));
        }
        if matchers.is_empty() {
            String::new()
        } else {
            format!("{{{}}}", matchers.join(","))
        }
    }
}

fn escape_label(value: &str) -> String {
    value.replace('\\', r"\\").replace('"', r#"\""#)
}

/// PromQL for the metrics adapters.
pub fn metrics_query(question: &Question) -> String {
    let terms = Terms::new(&question.text);
    let scope = Scope::from_question(question);

    METRIC_FAMILIES
        .iter()
        .find(|family| terms.any(family.keywords))
        .map(|family| (family.build)(&terms, &scope))
        .unwrap_or_else(|| format!("{}{}", RESTARTS_METRIC, scope.pod_selector()))
}

/// LogQL for the logs adapter.
pub fn logs_query(question: &Question) -> String {
    let terms = Terms::new(&question.text);
    let scope = Scope::from_question(question);

    let selector = match scope.pod_selector() {
        s if s.is_empty() => LOG_FALLBACK_SELECTOR.to_string(),
        s => s,
    };

    if terms.any(LOG_ERROR_TERMS) {
        format!("{}{}", selector, LOG_ERROR_FILTER)
    } else {
        selector
    }
}

fn is_node_level(terms: &Terms) -> bool {
    terms.any(&["node", "system", "host"])
}

fn cpu_query(terms: &Terms, scope: &Scope) -> String {
    if terms.matches("idle") {
        return r#"rate(node_cpu_seconds_total{mode="idle"}[1m])"#.to_string();
    }
    if terms.matches("load") && (!terms.matches("cpu") || is_node_level(terms)) {
        let metric = if terms.exact("15") || terms.exact("15m") {
            "node_load15"
        } else if terms.exact("5") || terms.exact("5m") {
            "node_load5"
        } else {
            "node_load1"
        };
        return metric.to_string();
    }
    if is_node_level(terms) {
        return "rate(node_cpu_seconds_total[5m])".to_string();
    }
    format!(
        "rate(container_cpu_usage_seconds_total{}[5m])",
        scope.pod_selector()
    )
}

fn memory_query(terms: &Terms, scope: &Scope) -> String {
    let node_level = is_node_level(terms) || terms.matches("available");
    if !node_level {
        return format!("container_memory_usage_bytes{}", scope.pod_selector());
    }

    let query = if terms.matches("available") {
        "node_memory_MemAvailable_bytes"
    } else if terms.matches("total") {
        "node_memory_MemTotal_bytes"
    } else if terms.any(&["percentage", "percent"]) {
        "100 * (1 - (node_memory_MemAvailable_bytes / node_memory_MemTotal_bytes))"
    } else if terms.any(&["usage", "used"]) {
        "(node_memory_MemTotal_bytes - node_memory_MemAvailable_bytes)"
    } else if terms.matches("cache") {
        "node_memory_Cached_bytes"
    } else if terms.matches("buffer") {
        "node_memory_Buffers_bytes"
    } else {
        "node_memory_MemAvailable_bytes"
    };
    query.to_string()
}

fn disk_query(terms: &Terms, _scope: &Scope) -> String {
    let query = if terms.matches("read") {
        "rate(node_disk_read_bytes_total[5m])"
    } else if terms.any(&["write", "written"]) {
        "rate(node_disk_written_bytes_total[5m])"
    } else if terms.matches("iops") {
        "rate(node_disk_reads_completed_total[5m]) + rate(node_disk_writes_completed_total[5m])"
    } else if terms.any(&["percentage", "percent"]) {
        r#"100 - ((node_filesystem_avail_bytes{mountpoint="/"} / node_filesystem_size_bytes{mountpoint="/"}) * 100)"#
    } else if terms.any(&["usage", "used", "space"]) {
        r#"node_filesystem_avail_bytes{mountpoint="/"}"#
    } else {
        "rate(node_disk_read_bytes_total[5m])"
    };
    query.to_string()
}

fn network_query(terms: &Terms, _scope: &Scope) -> String {
    let receive = terms.any(&["receive", "received", "rx", "download", "incoming", "inbound"]);
    let transmit = terms.any(&["transmit", "tx", "upload", "outgoing", "outbound"]);
    let errors = terms.matches("error");
    let packets = terms.matches("packet");

    let series = |direction: &str| {
        if errors {
            format!("rate(node_network_{}_errs_total[5m])", direction)
        } else if packets {
            format!("rate(node_network_{}_packets_total[5m])", direction)
        } else {
            format!("rate(node_network_{}_bytes_total[5m])", direction)
        }
    };

    match (receive, transmit) {
        (true, false) => series("receive"),
        (false, true) => series("transmit"),
        _ if errors => format!("{} + {}", series("receive"), series("transmit")),
        _ => series("receive"),
    }
}

fn process_query(terms: &Terms, _scope: &Scope) -> String {
    if terms.matches("blocked") {
        "node_procs_blocked".to_string()
    } else {
        "node_procs_running".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(text: &str) -> Question {
        Question::new(text)
    }

    #[test]
    fn test_container_cpu_scoped_by_hints() {
        let question = q("What is the current CPU usage?")
            .with_namespace("shop")
            .with_service("checkout");
        assert_eq!(
            metrics_query(&question),
            r#"rate(container_cpu_usage_seconds_total{namespace="shop",pod=~"checkout.*"}[5m])"#
        );
        assert_eq!(
            metrics_query(&q("cpu usage")),
            "rate(container_cpu_usage_seconds_total[5m])"
        );
    }

    #[test]
    fn test_node_level_metrics() {
        assert_eq!(metrics_query(&q("node cpu idle")), r#"rate(node_cpu_seconds_total{mode="idle"}[1m])"#);
        assert_eq!(metrics_query(&q("system load over 15m")), "node_load15");
        assert_eq!(metrics_query(&q("what is the load")), "node_load1");
        assert_eq!(metrics_query(&q("available memory")), "node_memory_MemAvailable_bytes");
        assert_eq!(
            metrics_query(&q("node memory used percent")),
            "100 * (1 - (node_memory_MemAvailable_bytes / node_memory_MemTotal_bytes))"
        );
    }

    #[test]
    fn test_network_direction_and_errors() {
        assert_eq!(
            metrics_query(&q("network transmit packets")),
            "rate(node_network_transmit_packets_total[5m])"
        );
        assert_eq!(
            metrics_query(&q("any network errors?")),
            "rate(node_network_receive_errs_total[5m]) + rate(node_network_transmit_errs_total[5m])"
        );
    }

    #[test]
    fn test_default_is_restart_counter() {
        assert_eq!(
            metrics_query(&q("Why is my app pod restarting?").with_service("api")),
            r#"kube_pod_container_status_restarts_total{pod=~"api.*"}"#
        );
        assert_eq!(metrics_query(&q("hello")), RESTARTS_METRIC);
    }

    #[test]
    fn test_label_values_are_escaped() {
        let question = q("memory").with_service(r#"a"b"#);
        assert_eq!(
            metrics_query(&question),
            r#"container_memory_usage_bytes{pod=~"a\"b.*"}"#
        );
    }

    #[test]
    fn test_logs_query() {
        assert_eq!(logs_query(&q("show me the logs")), r#"{job="kubernetes-pods"}"#);
        assert_eq!(
            logs_query(&q("any errors lately?").with_namespace("shop")),
            r#"{namespace="shop"} |~ "(?i)(error|exception|fail)""#
        );
    }
}
