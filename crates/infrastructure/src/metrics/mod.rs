mod prometheus_metrics;

pub use prometheus_metrics::{PrometheusMetrics, METRIC_LABELS};
