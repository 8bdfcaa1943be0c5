use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default, Clone)]
struct RouteMetric {
    ok: u64,
    err: u64,
    total_latency_ms: f64,
    max_latency_ms: f64,
}

/// Per-category rank counts with a cap on distinct labels; requests for new
/// categories past the cap are only counted as overflow.
#[derive(Debug, Clone)]
struct CategoryCounter {
    cap: usize,
    by_label: BTreeMap<String, u64>,
    overflow: u64,
}

impl CategoryCounter {
    fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            by_label: BTreeMap::new(),
            overflow: 0,
        }
    }

    fn bump(&mut self, category: &str) {
        let label = category_label(category);
        let at_cap = self.by_label.len() >= self.cap;
        match self.by_label.get_mut(&label) {
            Some(count) => *count = count.saturating_add(1),
            None if at_cap => self.overflow = self.overflow.saturating_add(1),
            None => {
                self.by_label.insert(label, 1);
            }
        }
    }
}

/// Request and ranking counters rendered on `/metrics`.
#[derive(Debug, Clone)]
pub(crate) struct MetricsRegistry {
    routes: HashMap<&'static str, RouteMetric>,
    rank_category: CategoryCounter,
    rank_runs: u64,
    rank_rejected: u64,
    ranked_items: u64,
}

impl MetricsRegistry {
    pub(crate) fn new(max_category_labels: usize) -> Self {
        Self {
            routes: HashMap::new(),
            rank_category: CategoryCounter::new(max_category_labels),
            rank_runs: 0,
            rank_rejected: 0,
            ranked_items: 0,
        }
    }

    pub(crate) fn record_route(&mut self, route: &'static str, latency_ms: f64, is_error: bool) {
        let metric = self.routes.entry(route).or_default();
        if is_error {
            metric.err = metric.err.saturating_add(1);
        } else {
            metric.ok = metric.ok.saturating_add(1);
        }
        metric.total_latency_ms += latency_ms;
        metric.max_latency_ms = metric.max_latency_ms.max(latency_ms);
    }

    pub(crate) fn record_rank(&mut self, category: Option<&str>, ranked: usize) {
        self.rank_runs = self.rank_runs.saturating_add(1);
        self.ranked_items = self.ranked_items.saturating_add(ranked as u64);
        self.rank_category.bump(category.unwrap_or("all"));
    }

    pub(crate) fn record_rank_rejected(&mut self) {
        self.rank_rejected = self.rank_rejected.saturating_add(1);
    }

    pub(crate) fn render(&self, dataset_loads: u64, dataset_packages: usize) -> String {
        let mut lines = vec![
            "# TYPE saw_ranker_http_requests_total counter".to_string(),
            "# TYPE saw_ranker_http_latency_ms_sum counter".to_string(),
            "# TYPE saw_ranker_http_latency_ms_max gauge".to_string(),
            "# TYPE saw_ranker_rank_runs_total counter".to_string(),
            "# TYPE saw_ranker_rank_rejected_total counter".to_string(),
            "# TYPE saw_ranker_ranked_items_total counter".to_string(),
            "# TYPE saw_ranker_rank_category_requests_total counter".to_string(),
            "# TYPE saw_ranker_metrics_label_overflow_total counter".to_string(),
            "# TYPE saw_ranker_dataset_loads_total counter".to_string(),
            "# TYPE saw_ranker_dataset_packages gauge".to_string(),
        ];

        let mut routes = self.routes.iter().collect::<Vec<_>>();
        routes.sort_by(|a, b| a.0.cmp(b.0));
        for (route, m) in routes {
            lines.push(format!(
                "saw_ranker_http_requests_total{{route=\"{route}\",status=\"ok\"}} {}",
                m.ok
            ));
            lines.push(format!(
                "saw_ranker_http_requests_total{{route=\"{route}\",status=\"error\"}} {}",
                m.err
            ));
            lines.push(format!(
                "saw_ranker_http_latency_ms_sum{{route=\"{route}\"}} {:.3}",
                m.total_latency_ms
            ));
            lines.push(format!(
                "saw_ranker_http_latency_ms_max{{route=\"{route}\"}} {:.3}",
                m.max_latency_ms
            ));
        }

        lines.push(format!("saw_ranker_rank_runs_total {}", self.rank_runs));
        lines.push(format!("saw_ranker_rank_rejected_total {}", self.rank_rejected));
        lines.push(format!("saw_ranker_ranked_items_total {}", self.ranked_items));
        for (category, count) in &self.rank_category.by_label {
            lines.push(format!(
                "saw_ranker_rank_category_requests_total{{category=\"{category}\"}} {count}"
            ));
        }
        lines.push(format!(
            "saw_ranker_metrics_label_overflow_total{{dimension=\"category\"}} {}",
            self.rank_category.overflow
        ));
        lines.push(format!("saw_ranker_dataset_loads_total {dataset_loads}"));
        lines.push(format!("saw_ranker_dataset_packages {dataset_packages}"));

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

/// Prometheus-safe label: lowercase `[a-z0-9:_.-]`, at most 64 chars, so
/// it never needs escaping.
fn category_label(raw: &str) -> String {
    let label = raw
        .trim()
        .chars()
        .take(64)
        .map(|ch| match ch {
            'a'..='z' | '0'..='9' | ':' | '_' | '-' | '.' => ch,
            'A'..='Z' => ch.to_ascii_lowercase(),
            _ => '_',
        })
        .collect::<String>();
    if label.is_empty() {
        "unknown".to_string()
    } else {
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_counter_merges_spellings_and_caps_labels() {
        let mut counter = CategoryCounter::new(2);
        for category in ["http", " HTTP ", "cli", "web-framework", "testing"] {
            counter.bump(category);
        }
        assert_eq!(
            counter.by_label.iter().collect::<Vec<_>>(),
            vec![(&"cli".to_string(), &1), (&"http".to_string(), &2)]
        );
        assert_eq!(counter.overflow, 2);
    }

    #[test]
    fn category_label_is_prometheus_safe() {
        assert_eq!(category_label("Web Framework"), "web_framework");
        assert_eq!(category_label("say \"hi\"\n"), "say__hi_");
        assert_eq!(category_label("   "), "unknown");
        assert_eq!(category_label(&"é".repeat(80)).chars().count(), 64);
    }

    #[test]
    fn render_lists_routes_and_rank_counters() {
        let mut registry = MetricsRegistry::new(8);
        registry.record_route("calculate", 2.5, false);
        registry.record_route("calculate", 1.0, true);
        registry.record_rank(Some("http"), 3);
        registry.record_rank_rejected();

        let text = registry.render(1, 42);
        assert!(text.contains("saw_ranker_http_requests_total{route=\"calculate\",status=\"ok\"} 1"));
        assert!(text.contains("saw_ranker_http_requests_total{route=\"calculate\",status=\"error\"} 1"));
        assert!(text.contains("saw_ranker_http_latency_ms_max{route=\"calculate\"} 2.500"));
        assert!(text.contains("saw_ranker_rank_runs_total 1"));
        assert!(text.contains("saw_ranker_rank_rejected_total 1"));
        assert!(text.contains("saw_ranker_rank_category_requests_total{category=\"http\"} 1"));
        assert!(text.contains("saw_ranker_dataset_packages 42"));
    }
}
