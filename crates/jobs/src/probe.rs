use dnspulse_application::use_cases::Prober;
use dnspulse_domain::config::DEFAULT_PROBE_INTERVAL_SECS;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Runs a probe cycle immediately, then once per interval, until shut down.
/// The prober's resolvers are closed when the job exits.
pub struct ProbeJob {
    prober: Arc<Prober>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl ProbeJob {
    pub fn new(prober: Arc<Prober>) -> Self {
        Self {
            prober,
            interval: Duration::from_secs(DEFAULT_PROBE_INTERVAL_SECS),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    pub async fn run(&self) {
        info!(
            interval_secs = self.interval.as_secs(),
            resolvers = self.prober.resolver_count(),
            "Starting probe job"
        );

        loop {
            let report = self.prober.run_cycle(&self.shutdown).await;
            if report.cancelled {
                break;
            }
            debug!(
                reported = report.reported,
                succeeded = report.succeeded,
                failed = report.failed,
                "Probe cycle completed"
            );

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("ProbeJob: shutting down");
        self.prober.close().await;
    }

    /// Cancels the job and waits up to `grace` for it to finish.
    ///
    /// A job that overruns is aborted and its resolvers are closed here
    /// instead, with the same bound on the close.
    pub async fn stop(&self, mut handle: JoinHandle<()>, grace: Duration) {
        self.shutdown.cancel();

        if tokio::time::timeout(grace, &mut handle).await.is_ok() {
            return;
        }

        warn!(
            grace_secs = grace.as_secs(),
            "Probe job did not stop within grace period, aborting"
        );
        handle.abort();

        if tokio::time::timeout(grace, self.prober.close()).await.is_err() {
            warn!("Closing resolvers timed out");
        }
    }
}
