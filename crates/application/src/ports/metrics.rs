use dnspulse_domain::{DomainError, Protocol};

/// What the prober reports for every completed probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub domain: String,
    /// `address:port` of the upstream
    pub server: String,
    pub protocol: Protocol,
    pub duration_secs: f64,
    pub success: bool,
}

/// Append-only recording side of the metrics store.
pub trait MetricsSink: Send + Sync {
    fn record_query(&self, outcome: &ProbeOutcome);
}

/// Scrape side of the metrics store.
pub trait MetricsExporter: Send + Sync {
    fn content_type(&self) -> &'static str;

    fn export(&self) -> Result<String, DomainError>;
}
