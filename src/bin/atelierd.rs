//! Atelier daemon - hosts the workflow engine behind a Unix socket.
//!
//! The atelierd binary is a long-running background process that:
//! - Opens (and migrates) the SQLite store
//! - Accepts IPC connections over a Unix domain socket
//! - Routes commands into the workflow and assignment engine
//! - Handles graceful shutdown on SIGTERM/SIGINT
//!
//! ## Files
//!
//! - `~/.atelier/atelier.db` - SQLite database
//! - `~/.atelier/atelierd.sock` - Unix socket for IPC
//! - `~/.atelier/logs/` - daily-rotated daemon logs

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use tokio::select;
use tokio::signal::unix::{SignalKind, signal};
use tracing_appender::non_blocking::WorkerGuard;

use atelier::config;
use atelier::daemon::{self, IpcListener};
use atelier::db::connection;

#[derive(Debug, Parser)]
#[command(name = "atelierd", version, about = "Atelier workflow daemon")]
struct Args {
    /// Data directory (overrides ATELIER_HOME and ~/.atelier)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Socket path (overrides the configured one)
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Log to stderr instead of the log directory
    #[arg(long)]
    stderr: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(dir) = &args.data_dir {
        // SAFETY: single-threaded at this point, before any reads of the var
        unsafe { std::env::set_var("ATELIER_HOME", dir) };
    }

    let cfg = config::load()?;
    std::fs::create_dir_all(&cfg.data_dir)?;

    let _guard = init_logging(&cfg.log_dir, args.stderr)?;
    tracing::info!("atelierd starting, version {}", env!("CARGO_PKG_VERSION"));

    let pool = connection::create_pool(&cfg.db_path).await?;
    connection::run_migrations(&pool).await?;

    let socket_path = args.socket.unwrap_or(cfg.socket_path);
    let listener = IpcListener::bind(&socket_path).await?;
    tracing::info!("atelierd listening on {:?}", listener.socket_path());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    // Set by a connection handler when a Shutdown operation arrives
    let shutdown_flag = Arc::new(AtomicBool::new(false));

    loop {
        if shutdown_flag.load(Ordering::SeqCst) {
            tracing::info!("Shutdown requested via IPC");
            break;
        }

        select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, shutting down...");
                break;
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT, shutting down...");
                break;
            }
            result = listener.accept() => {
                match result {
                    Ok(mut conn) => {
                        let pool = pool.clone();
                        let shutdown_flag = Arc::clone(&shutdown_flag);
                        tokio::spawn(async move {
                            match daemon::handle_connection(&pool, &mut conn).await {
                                Ok(true) => shutdown_flag.store(true, Ordering::SeqCst),
                                Ok(false) => {}
                                Err(e) => tracing::error!("Connection error: {}", e),
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!("Accept error: {}", e);
                    }
                }
            }
        }
    }

    pool.close().await;
    tracing::info!("atelierd shutdown complete");
    Ok(())
}

/// Initialize logging: daily-rotated files in the log directory, or
/// stderr when asked for. The returned guard must stay alive so buffered
/// log lines are flushed on exit.
fn init_logging(log_dir: &std::path::Path, to_stderr: bool) -> anyhow::Result<Option<WorkerGuard>> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if to_stderr {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    }

    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "atelierd.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    Ok(Some(guard))
}
