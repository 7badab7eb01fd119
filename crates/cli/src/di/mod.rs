use dnspulse_application::ports::{MetricsExporter, MetricsSink};
use dnspulse_application::use_cases::Prober;
use dnspulse_domain::Config;
use dnspulse_infrastructure::dns::TransportResolverFactory;
use dnspulse_infrastructure::metrics::PrometheusMetrics;
use std::sync::Arc;
use tracing::{error, info};

/// Everything the probe loop and the scrape endpoint share.
pub struct ProbeServices {
    pub prober: Arc<Prober>,
    pub metrics: Arc<dyn MetricsExporter>,
}

impl ProbeServices {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let metrics = Arc::new(PrometheusMetrics::new()?);
        let sink: Arc<dyn MetricsSink> = metrics.clone();

        let factory = TransportResolverFactory::new();
        let prober = Prober::new(config, &factory, sink).map_err(|e| {
            error!(error = %e, "Failed to build resolvers");
            anyhow::anyhow!(e)
        })?;

        info!(
            domains = config.domains.len(),
            servers = config.dns_servers.len(),
            resolvers = prober.resolver_count(),
            timeout_ms = config.query_timeout().as_millis() as u64,
            "Probe services initialized"
        );

        Ok(Self {
            prober: Arc::new(prober),
            metrics,
        })
    }
}
