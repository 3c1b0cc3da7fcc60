//! Prometheus exporter for ocserv.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use occtl::{Client, OcctlCommander};
use tokio::sync::watch;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use ocserv_exporter::config::LogFormat;
use ocserv_exporter::{ExporterConfig, HttpServer, Refresher, SnapshotStore};

/// Prometheus exporter for ocserv.
#[derive(Parser, Debug)]
#[command(name = "ocserv-exporter")]
#[command(about = "Export ocserv status and sessions as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<String>,

    /// HTTP listen address (overrides config).
    #[arg(long)]
    listen: Option<String>,

    /// Path to the occtl control socket (overrides config).
    #[arg(long)]
    socket: Option<String>,

    /// Delay between occtl scrapes in seconds (overrides config).
    #[arg(long)]
    interval: Option<u64>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        ExporterConfig::load_from_file(config_path)?
    } else {
        ExporterConfig::default()
    };

    // Override from CLI
    if let Some(listen) = args.listen {
        config.prometheus.listen = listen;
    }
    if let Some(socket) = args.socket {
        config.occtl.socket = socket;
    }
    if let Some(interval) = args.interval {
        config.refresh.interval_secs = interval;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    config.validate()?;

    // Initialize logging
    let log_level: Level = config.logging.level.parse()?;
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("ocserv_exporter={}", log_level).parse()?)
        .add_directive(format!("occtl={}", log_level).parse()?);

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    info!(
        socket = %config.occtl.socket,
        interval_secs = config.refresh.interval_secs,
        "Starting ocserv exporter"
    );

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let store = Arc::new(SnapshotStore::default());

    // Parse listen address
    let listen_addr = config
        .prometheus
        .listen
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;

    let commander = OcctlCommander::new(
        &config.occtl.binary,
        &config.occtl.socket,
        config.occtl.timeout(),
    );
    let mut refresher = Refresher::new(
        Client::new(commander),
        store.clone(),
        config.refresh.interval(),
    );

    // Bind before anything else; failure here is fatal
    let http_server = HttpServer::new(
        store.clone(),
        listen_addr,
        config.prometheus.path.clone(),
    );
    let listener = http_server.bind().await?;

    // Refresh once so the first scrape has data
    let outcome = refresher.refresh().await;
    info!(
        status_ok = outcome.status,
        sessions = ?outcome.sessions,
        "Initial refresh complete"
    );

    // Start refresh loop
    let refresh_task = tokio::spawn(refresher.run(shutdown_rx.clone()));

    // Start HTTP server
    let http_shutdown = shutdown_rx.clone();
    let mut http_task = tokio::spawn(http_server.serve(listener, http_shutdown));

    // Wait for shutdown signal, or for the HTTP server to die
    let mut server_result = None;
    tokio::select! {
        result = &mut http_task => {
            error!("HTTP server stopped unexpectedly, shutting down...");
            server_result = Some(result);
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = async {
            #[cfg(unix)]
            {
                match tokio::signal::unix::signal(
                    tokio::signal::unix::SignalKind::terminate()
                ) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    }
                    Err(e) => {
                        error!("Failed to install SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("Received SIGTERM, shutting down...");
        }
    }

    // Signal shutdown
    shutdown_tx.send(true)?;

    // Wait for tasks to complete
    let _ = tokio::time::timeout(Duration::from_secs(5), async {
        let _ = refresh_task.await;
        if server_result.is_none() {
            server_result = Some(http_task.await);
        }
    })
    .await;

    // Print final stats
    let stats = store.stats();
    info!(
        status_fetched = stats.status_fetched,
        status_failed = stats.status_failed,
        sessions_fetched = stats.sessions_fetched,
        sessions_failed = stats.sessions_failed,
        "Final statistics"
    );

    if let Some(result) = server_result {
        result??;
    }

    info!("Exporter stopped");
    Ok(())
}
