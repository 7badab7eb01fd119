use crate::ports::{DnsResolver, MetricsSink, ProbeOutcome, QueryResult, ResolverFactory};
use crate::services::ProbeLabelGenerator;
use dnspulse_domain::{Config, DomainError, DomainTarget, ServerBinding, ServerKey, TlsParams};
use hickory_proto::rr::RecordType;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Pause after every individual probe.
pub const DEFAULT_PROBE_DELAY: Duration = Duration::from_millis(500);

struct BoundServer {
    endpoint: String,
    resolver: Arc<dyn DnsResolver>,
}

/// Counters for one pass over the domain x server x probe matrix.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub reported: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub cancelled: bool,
}

/// Walks every configured domain against every configured server and
/// reports each probe to the metrics sink.
///
/// Resolvers are built once, keyed by address, port and protocol, and kept
/// for the prober's lifetime. At most one cycle should run at a time.
pub struct Prober {
    domains: Vec<DomainTarget>,
    servers: Vec<BoundServer>,
    resolvers: HashMap<ServerKey, Arc<dyn DnsResolver>>,
    sink: Arc<dyn MetricsSink>,
    labels: ProbeLabelGenerator,
    verbose: bool,
    probe_delay: Duration,
}

impl Prober {
    pub fn new(
        config: &Config,
        factory: &dyn ResolverFactory,
        sink: Arc<dyn MetricsSink>,
    ) -> Result<Self, DomainError> {
        let timeout = config.query_timeout();
        let mut resolvers: HashMap<ServerKey, Arc<dyn DnsResolver>> = HashMap::new();
        let mut tls_by_key: HashMap<ServerKey, TlsParams> = HashMap::new();
        let mut servers = Vec::with_capacity(config.dns_servers.len());

        for server in &config.dns_servers {
            let binding = ServerBinding::from_config(server).inspect_err(|e| {
                warn!(server = %server.address, error = %e, "Failed to create resolver");
            })?;

            let resolver = match resolvers.entry(binding.key()) {
                Entry::Occupied(existing) => {
                    if tls_by_key.get(existing.key()) != Some(&binding.tls) {
                        warn!(
                            server = %existing.key(),
                            "Duplicate server with different TLS settings; the first entry's settings apply"
                        );
                    }
                    Arc::clone(existing.get())
                }
                Entry::Vacant(slot) => {
                    tls_by_key.insert(slot.key().clone(), binding.tls.clone());
                    let built = factory.build(server, timeout).inspect_err(|e| {
                        warn!(server = %server.address, error = %e, "Failed to create resolver");
                    })?;
                    debug!(server = %slot.key(), "Resolver created");
                    Arc::clone(slot.insert(built))
                }
            };

            servers.push(BoundServer {
                endpoint: binding.endpoint(),
                resolver,
            });
        }

        Ok(Self {
            domains: config.domains.clone(),
            servers,
            resolvers,
            sink,
            labels: ProbeLabelGenerator::new(),
            verbose: config.verbose_logging,
            probe_delay: DEFAULT_PROBE_DELAY,
        })
    }

    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = delay;
        self
    }

    pub fn resolver_count(&self) -> usize {
        self.resolvers.len()
    }

    /// Runs one probe cycle in domain -> server -> repetition order.
    ///
    /// Cancellation is checked before every probe and during the
    /// inter-probe delay. A probe whose query returns after cancellation
    /// is not reported.
    #[instrument(skip_all, name = "probe_cycle")]
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> CycleReport {
        let mut report = CycleReport::default();

        for domain in &self.domains {
            for server in &self.servers {
                for _ in 0..domain.probes {
                    if cancel.is_cancelled() {
                        report.cancelled = true;
                        return report;
                    }

                    let hostname = self.labels.probe_name(&domain.name);
                    let result = server
                        .resolver
                        .query(cancel, &hostname, RecordType::A)
                        .await;

                    if cancel.is_cancelled() {
                        debug!(query = %hostname, server = %server.endpoint, "Discarding probe interrupted by shutdown");
                        report.cancelled = true;
                        return report;
                    }

                    let outcome = ProbeOutcome {
                        domain: domain.name.clone(),
                        server: server.endpoint.clone(),
                        protocol: server.resolver.protocol(),
                        duration_secs: result.duration().as_secs_f64(),
                        success: result.is_success(),
                    };
                    self.log_probe(&hostname, &outcome, &result);
                    self.sink.record_query(&outcome);

                    report.reported += 1;
                    if outcome.success {
                        report.succeeded += 1;
                    } else {
                        report.failed += 1;
                    }

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            report.cancelled = true;
                            return report;
                        }
                        _ = tokio::time::sleep(self.probe_delay) => {}
                    }
                }
            }
        }

        report
    }

    fn log_probe(&self, hostname: &str, outcome: &ProbeOutcome, result: &QueryResult) {
        let elapsed_ms = outcome.duration_secs * 1000.0;
        match (result.error(), self.verbose) {
            (None, true) => info!(
                protocol = %outcome.protocol,
                query = %hostname,
                server = %outcome.server,
                elapsed_ms,
                "Probe succeeded"
            ),
            (Some(e), true) => warn!(
                protocol = %outcome.protocol,
                query = %hostname,
                server = %outcome.server,
                elapsed_ms,
                error = %e,
                "Probe failed"
            ),
            (error, false) => debug!(
                protocol = %outcome.protocol,
                query = %hostname,
                server = %outcome.server,
                elapsed_ms,
                success = outcome.success,
                error = ?error,
                "Probe completed"
            ),
        }
    }

    /// Closes every resolver; failures are logged and teardown continues.
    pub async fn close(&self) {
        for (key, resolver) in &self.resolvers {
            if let Err(e) = resolver.close().await {
                warn!(server = %key, error = %e, "Failed to close resolver");
            }
        }
    }
}
