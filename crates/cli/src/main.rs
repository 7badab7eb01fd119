use clap::Parser;
use dnspulse_api::AppState;
use dnspulse_domain::CliOverrides;
use dnspulse_jobs::ProbeJob;
use mimalloc::MiMalloc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod bootstrap;
mod di;
mod server;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// How long the probe task may take to wind down after shutdown is requested.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "dnspulse-exporter")]
#[command(version)]
#[command(about = "Prometheus exporter probing DNS servers over UDP, TCP, DoT, DoH, DoH3 and DoQ")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Address the metrics endpoint listens on
    #[arg(long)]
    listen_address: Option<String>,

    /// Port the metrics endpoint listens on
    #[arg(long)]
    listen_port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log every probe outcome
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        listen_address: cli.listen_address,
        listen_port: cli.listen_port,
        log_level: cli.log_level,
        verbose: cli.verbose,
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config.logging);

    info!("Starting dnspulse exporter v{}", env!("CARGO_PKG_VERSION"));

    let services = di::ProbeServices::new(&config)?;
    let shutdown = CancellationToken::new();

    let probe_job = Arc::new(
        ProbeJob::new(services.prober.clone())
            .with_interval(config.probe_interval())
            .with_cancellation(shutdown.clone()),
    );
    let probe_handle = probe_job.clone().start();

    let web_shutdown = shutdown.clone();
    let web_state = AppState::new(services.metrics.clone());
    let bind_addr = config.server.bind_address();
    let mut web_handle = tokio::spawn(async move {
        server::start_web_server(bind_addr, web_state, web_shutdown).await
    });

    let web_result = tokio::select! {
        _ = server::wait_for_shutdown() => {
            info!("Shutdown requested");
            None
        }
        joined = &mut web_handle => Some(joined),
    };

    shutdown.cancel();

    let web_result = match web_result {
        Some(joined) => joined,
        None => web_handle.await,
    };

    probe_job.stop(probe_handle, SHUTDOWN_GRACE).await;

    match web_result {
        Ok(Ok(())) => {
            info!("Exporter shutdown complete");
            Ok(())
        }
        Ok(Err(e)) => {
            error!(error = %e, "Web server error");
            Err(e)
        }
        Err(e) => {
            error!(error = %e, "Web server task failed");
            Err(e.into())
        }
    }
}
