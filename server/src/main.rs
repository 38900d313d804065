mod config;
mod service;
mod session;

use std::future::IntoFuture;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use config::{Overrides, ServerConfig};
use engine::{EngineConfig, UciEngine};
use service::AppState;
use session::{spawn_session, SessionSettings};
use tokio::sync::oneshot;
use tracing_appender::non_blocking::WorkerGuard;

/// Time allowed for in-flight requests, and then the session, to finish.
const SHUTDOWN_DRAIN: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "playfish-server", about = "Play chess against a UCI engine over HTTP")]
struct Cli {
    /// TOML configuration file (default: ./config.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the UCI engine executable
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:8080 or :8080
    #[arg(long)]
    listen: Option<String>,

    /// Engine thinking time per move in milliseconds
    #[arg(long)]
    move_time: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ServerConfig::resolve(
        cli.config.as_deref(),
        Overrides {
            engine_path: cli.engine,
            listen_addr: cli.listen,
            move_time_ms: cli.move_time,
        },
    )
    .context("Invalid configuration")?;

    let _log_guard = init_tracing(config.log_file.as_deref())?;

    tracing::info!("Starting playfish server");
    match &config.source {
        Some(path) => tracing::info!("Loaded configuration from {}", path.display()),
        None => tracing::info!("No configuration file found, using defaults"),
    }

    let engine_path = config.engine_path()?.to_path_buf();
    let engine = UciEngine::spawn(EngineConfig {
        path: engine_path.clone(),
        options: config.uci_options(),
        handshake_timeout: config.handshake_timeout(),
    })
    .await
    .with_context(|| format!("Failed to start engine {}", engine_path.display()))?;

    let session = spawn_session(
        Box::new(engine),
        SessionSettings {
            move_time: config.move_time(),
            search_grace: config.search_grace(),
        },
    );
    let app = service::router(AppState::new(session.clone(), config.assets_dir.clone()));

    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(move_time_ms = config.move_time_ms, "Server listening on {}", addr);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .into_future(),
    );

    let served = tokio::select! {
        result = &mut server => result,
        () = shutdown_signal() => {
            tracing::info!("Shutdown signal received, draining requests");
            let _ = stop_tx.send(());
            match tokio::time::timeout(SHUTDOWN_DRAIN, &mut server).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!("Requests still in flight after {:?}, closing", SHUTDOWN_DRAIN);
                    server.abort();
                    Ok(Ok(()))
                }
            }
        }
    };
    served
        .context("HTTP server task failed")?
        .context("HTTP server failed")?;

    if tokio::time::timeout(SHUTDOWN_DRAIN, session.shutdown())
        .await
        .is_err()
    {
        tracing::warn!("Session did not stop within {:?}", SHUTDOWN_DRAIN);
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// Stderr logging with span durations, plus an optional log file.
fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Invalid log file path {}", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_span_events(FmtSpan::CLOSE))
        .with(file_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    Ok(guard)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
