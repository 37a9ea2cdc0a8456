use std::{collections::HashMap, sync::Mutex};

/// 进程内计数器，由 `AppState` 持有并在各请求间共享
#[derive(Default)]
pub struct Metrics {
    state: Mutex<MetricsState>,
}

#[derive(Default)]
struct MetricsState {
    total: u64,
    errors: u64,
    per_endpoint: HashMap<&'static str, u64>,
    per_endpoint_err: HashMap<&'static str, u64>,
    // RFQ 注册表访问次数，按原始 Authorization 头分组
    registry_access: HashMap<String, u64>,
    // 报价引擎成功/失败与时延统计（毫秒）
    upstream_ok: u64,
    upstream_err: u64,
    upstream_latency_sum_ms: u128,
    // 分桶（毫秒）：<50, <100, <250, <500, <1000, >=1000
    upstream_hist_buckets: [u64; 6],
}

/// 未携带 Authorization 头时的标签值
pub const REGISTRY_AUTH_ABSENT_LABEL: &str = "N/A";

/// 注册表访问计数的不同标签数上限，超出后新标签计入溢出标签
pub const MAX_REGISTRY_AUTH_LABELS: usize = 1000;

/// 溢出标签值
pub const REGISTRY_AUTH_OVERFLOW_LABEL: &str = "other";

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MetricsState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(), // 避免因锁污染导致 panic
        }
    }

    pub fn count_ok(&self, endpoint: &'static str) {
        let mut s = self.lock();
        s.total += 1;
        *s.per_endpoint.entry(endpoint).or_insert(0) += 1;
    }

    pub fn count_err(&self, endpoint: &'static str) {
        let mut s = self.lock();
        s.total += 1;
        s.errors += 1;
        *s.per_endpoint.entry(endpoint).or_insert(0) += 1;
        *s.per_endpoint_err.entry(endpoint).or_insert(0) += 1;
    }

    pub fn inc_registry_access(&self, auth_label: &str) {
        let mut s = self.lock();
        if let Some(count) = s.registry_access.get_mut(auth_label) {
            *count += 1;
            return;
        }
        let label = if s.registry_access.len() < MAX_REGISTRY_AUTH_LABELS {
            auth_label
        } else {
            REGISTRY_AUTH_OVERFLOW_LABEL
        };
        *s.registry_access.entry(label.to_string()).or_insert(0) += 1;
    }

    pub fn registry_access_count(&self, auth_label: &str) -> u64 {
        self.lock()
            .registry_access
            .get(auth_label)
            .copied()
            .unwrap_or(0)
    }

    pub fn endpoint_count(&self, endpoint: &str) -> u64 {
        self.lock().per_endpoint.get(endpoint).copied().unwrap_or(0)
    }

    pub fn observe_upstream_latency_ms(&self, latency_ms: u128, ok: bool) {
        let mut s = self.lock();
        if ok {
            s.upstream_ok += 1;
        } else {
            s.upstream_err += 1;
        }
        s.upstream_latency_sum_ms += latency_ms;
        let b = if latency_ms < 50 {
            0
        } else if latency_ms < 100 {
            1
        } else if latency_ms < 250 {
            2
        } else if latency_ms < 500 {
            3
        } else if latency_ms < 1000 {
            4
        } else {
            5
        };
        s.upstream_hist_buckets[b] += 1;
    }

    pub fn render_prometheus(&self) -> String {
        let s = self.lock();
        let mut out = String::new();
        out.push_str("# HELP swapgate_requests_total Total requests\n");
        out.push_str("# TYPE swapgate_requests_total counter\n");
        out.push_str(&format!("swapgate_requests_total {}\n", s.total));

        out.push_str("# HELP swapgate_errors_total Total error responses\n");
        out.push_str("# TYPE swapgate_errors_total counter\n");
        out.push_str(&format!("swapgate_errors_total {}\n", s.errors));

        out.push_str("# HELP swapgate_endpoint_requests_total Requests per endpoint\n");
        out.push_str("# TYPE swapgate_endpoint_requests_total counter\n");
        for (k, v) in sorted(&s.per_endpoint) {
            out.push_str(&format!(
                "swapgate_endpoint_requests_total{{endpoint=\"{}\"}} {}\n",
                k, v
            ));
        }

        out.push_str("# HELP swapgate_endpoint_errors_total Errors per endpoint\n");
        out.push_str("# TYPE swapgate_endpoint_errors_total counter\n");
        for (k, v) in sorted(&s.per_endpoint_err) {
            out.push_str(&format!(
                "swapgate_endpoint_errors_total{{endpoint=\"{}\"}} {}\n",
                k, v
            ));
        }

        out.push_str("# HELP swapgate_rfq_registry_access_total RFQ registry access attempts\n");
        out.push_str("# TYPE swapgate_rfq_registry_access_total counter\n");
        for (k, v) in sorted(&s.registry_access) {
            out.push_str(&format!(
                "swapgate_rfq_registry_access_total{{auth=\"{}\"}} {}\n",
                escape_label(k),
                v
            ));
        }

        out.push_str("# HELP swapgate_upstream_requests_total Quote engine requests\n");
        out.push_str("# TYPE swapgate_upstream_requests_total counter\n");
        out.push_str(&format!(
            "swapgate_upstream_requests_total{{result=\"ok\"}} {}\n",
            s.upstream_ok
        ));
        out.push_str(&format!(
            "swapgate_upstream_requests_total{{result=\"err\"}} {}\n",
            s.upstream_err
        ));

        out.push_str("# HELP swapgate_upstream_latency_ms_sum Sum of quote engine latency in ms\n");
        out.push_str("# TYPE swapgate_upstream_latency_ms_sum counter\n");
        out.push_str(&format!(
            "swapgate_upstream_latency_ms_sum {}\n",
            s.upstream_latency_sum_ms
        ));

        out.push_str("# HELP swapgate_upstream_latency_ms_bucket Quote engine latency histogram\n");
        out.push_str("# TYPE swapgate_upstream_latency_ms_bucket histogram\n");
        let bounds = [50, 100, 250, 500, 1000];
        let mut cumulative = 0;
        for (i, bound) in bounds.iter().enumerate() {
            cumulative += s.upstream_hist_buckets[i];
            out.push_str(&format!(
                "swapgate_upstream_latency_ms_bucket{{le=\"{}\"}} {}\n",
                bound, cumulative
            ));
        }
        // +Inf 桶
        out.push_str(&format!(
            "swapgate_upstream_latency_ms_bucket{{le=\"+Inf\"}} {}\n",
            s.upstream_hist_buckets.iter().sum::<u64>()
        ));

        out
    }
}

fn sorted<K: Ord, V: Copy>(map: &HashMap<K, V>) -> Vec<(&K, V)> {
    let mut entries: Vec<(&K, V)> = map.iter().map(|(k, v)| (k, *v)).collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

fn escape_label(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_counters() {
        let m = Metrics::new();
        m.count_ok("quote");
        m.count_err("quote");
        m.count_ok("price");
        assert_eq!(m.endpoint_count("quote"), 2);

        let text = m.render_prometheus();
        assert!(text.contains("swapgate_requests_total 3"));
        assert!(text.contains("swapgate_errors_total 1"));
        assert!(text.contains("swapgate_endpoint_errors_total{endpoint=\"quote\"} 1"));
    }

    #[test]
    fn test_registry_access_label_escaped() {
        let m = Metrics::new();
        m.inc_registry_access(REGISTRY_AUTH_ABSENT_LABEL);
        m.inc_registry_access("Bearer \"x\"");
        m.inc_registry_access(REGISTRY_AUTH_ABSENT_LABEL);
        assert_eq!(m.registry_access_count(REGISTRY_AUTH_ABSENT_LABEL), 2);

        let text = m.render_prometheus();
        assert!(text.contains("swapgate_rfq_registry_access_total{auth=\"N/A\"} 2"));
        assert!(text.contains("auth=\"Bearer \\\"x\\\"\""));
    }

    #[test]
    fn test_registry_access_labels_capped() {
        let m = Metrics::new();
        for i in 0..MAX_REGISTRY_AUTH_LABELS + 50 {
            m.inc_registry_access(&format!("Bearer {}", i));
        }
        // 已有标签继续累加
        m.inc_registry_access("Bearer 0");
        assert_eq!(m.registry_access_count("Bearer 0"), 2);
        assert_eq!(m.registry_access_count(REGISTRY_AUTH_OVERFLOW_LABEL), 50);
        assert_eq!(m.registry_access_count(&format!("Bearer {}", MAX_REGISTRY_AUTH_LABELS)), 0);

        let text = m.render_prometheus();
        let series = text
            .lines()
            .filter(|l| l.starts_with("swapgate_rfq_registry_access_total{"))
            .count();
        assert_eq!(series, MAX_REGISTRY_AUTH_LABELS + 1);
    }

    #[test]
    fn test_upstream_histogram_is_cumulative() {
        let m = Metrics::new();
        m.observe_upstream_latency_ms(10, true);
        m.observe_upstream_latency_ms(300, false);
        m.observe_upstream_latency_ms(5_000, true);

        let text = m.render_prometheus();
        assert!(text.contains("swapgate_upstream_latency_ms_bucket{le=\"50\"} 1"));
        assert!(text.contains("swapgate_upstream_latency_ms_bucket{le=\"500\"} 2"));
        assert!(text.contains("swapgate_upstream_latency_ms_bucket{le=\"+Inf\"} 3"));
        assert!(text.contains("swapgate_upstream_requests_total{result=\"err\"} 1"));
    }
}
