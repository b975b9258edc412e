//! OLIVIA Server
//!
//! Analyses a victim's free-text situation description, queries the French
//! legal-data services for matching legislation, case law and nearby
//! judicial locations, and serves the aggregated report over HTTP.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tracing::{info, warn};

use olivia_server::{create_router, AppConfig, AppState, LogFormat, Overrides};

#[derive(Parser, Debug)]
#[command(name = "olivia-server")]
#[command(about = "OLIVIA victim-rights analysis and legal research service", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "OLIVIA_CONFIG", default_value = "olivia.yaml")]
    config: PathBuf,

    /// Listen address
    #[arg(short = 'l', long)]
    listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long)]
    port: Option<u16>,

    /// Lexicon file replacing the built-in one
    #[arg(long)]
    lexicon: Option<PathBuf>,

    /// Serve every source from offline fixtures
    #[arg(long, conflicts_with = "live")]
    demo: bool,

    /// Query the real legal-data services (credentials required)
    #[arg(long)]
    live: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        let demo_mode = match (self.demo, self.live) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        Overrides {
            listen: self.listen.clone(),
            port: self.port,
            lexicon_path: self.lexicon.clone(),
            demo_mode,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config, &cli.overrides())?;

    init_tracing(cli.verbose, config.log_format);

    info!("Starting OLIVIA server");
    info!("Configuration loaded from {}", cli.config.display());
    if config.demo_mode {
        warn!("Demo mode: sources are served from offline fixtures");
    }

    let metrics_handle = init_metrics()?;

    info!("Initializing application state...");
    let state = AppState::from_config(&config, Some(metrics_handle))?;
    info!("Application state initialized successfully");

    let addr: SocketAddr = config.bind_address().parse()?;
    let app = create_router(state, &config.server);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("OLIVIA listening on http://{}", addr);

    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool, format: LogFormat) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("olivia=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("olivia=info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!("olivia_requests_total", "Total number of requests by endpoint");
    metrics::describe_counter!(
        "olivia_aggregations_total",
        "Completed aggregations by outcome (complete or degraded)"
    );
    metrics::describe_counter!(
        "olivia_source_calls_total",
        "Source retrievals by source and outcome"
    );
    metrics::describe_histogram!(
        "olivia_source_latency_ms",
        metrics::Unit::Milliseconds,
        "Latency of a single source retrieval in milliseconds"
    );
    metrics::describe_histogram!(
        "olivia_aggregation_latency_ms",
        metrics::Unit::Milliseconds,
        "End-to-end aggregation latency in milliseconds"
    );
    metrics::describe_counter!(
        "olivia_malformed_records_total",
        "Provider records skipped because they could not be normalized"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
