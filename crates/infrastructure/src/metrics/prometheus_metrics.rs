//! Prometheus-backed metrics store.
//!
//! Owns a private `Registry` rather than the process-global default one so
//! several exporters (and tests) can coexist in one process.

use dnspulse_application::ports::{MetricsExporter, MetricsSink, ProbeOutcome};
use dnspulse_domain::DomainError;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

pub const METRIC_LABELS: [&str; 3] = ["domain", "server", "protocol"];

pub struct PrometheusMetrics {
    registry: Registry,
    query_duration: HistogramVec,
    query_success: IntCounterVec,
    query_failures: IntCounterVec,
}

impl PrometheusMetrics {
    pub fn new() -> Result<Self, DomainError> {
        let registry = Registry::new();

        let query_duration = HistogramVec::new(
            HistogramOpts::new("dns_query_duration_seconds", "Duration of DNS queries"),
            &METRIC_LABELS,
        )
        .map_err(metrics_error)?;
        let query_success = IntCounterVec::new(
            Opts::new("dns_query_success_total", "Total successful DNS queries"),
            &METRIC_LABELS,
        )
        .map_err(metrics_error)?;
        let query_failures = IntCounterVec::new(
            Opts::new("dns_query_failures_total", "Total failed DNS queries"),
            &METRIC_LABELS,
        )
        .map_err(metrics_error)?;

        registry
            .register(Box::new(query_duration.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(query_success.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(query_failures.clone()))
            .map_err(metrics_error)?;

        Ok(Self {
            registry,
            query_duration,
            query_success,
            query_failures,
        })
    }
}

fn metrics_error(error: prometheus::Error) -> DomainError {
    DomainError::ConfigError(format!("Metrics registry error: {}", error))
}

impl MetricsSink for PrometheusMetrics {
    fn record_query(&self, outcome: &ProbeOutcome) {
        let labels = [
            outcome.domain.as_str(),
            outcome.server.as_str(),
            outcome.protocol.as_str(),
        ];

        self.query_duration
            .with_label_values(&labels)
            .observe(outcome.duration_secs);

        if outcome.success {
            self.query_success.with_label_values(&labels).inc();
        } else {
            self.query_failures.with_label_values(&labels).inc();
        }
    }
}

impl MetricsExporter for PrometheusMetrics {
    fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }

    fn export(&self) -> Result<String, DomainError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| DomainError::IoError(format!("Failed to encode metrics: {}", e)))?;

        String::from_utf8(buffer)
            .map_err(|e| DomainError::IoError(format!("Metrics output is not UTF-8: {}", e)))
    }
}
