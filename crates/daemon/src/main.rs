// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Edge Worker Daemon (ew-workerd)
//!
//! Background process that owns the Event Dispatcher and drains a
//! pluggable ingest source into it, flushing persisted state on a dirty
//! tick and on graceful shutdown (spec.md §4.3, §9).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use ew_daemon::config::{self, WorkerConfig};
use ew_daemon::{FsWorkspaceProvisioner, IngestSource, LoggingPlatformClient, ProcessRunnerRegistry, StdinIngestSource};
use ew_engine::{Worker, WorkerDeps, DIRTY_TICK_INTERVAL};
use std::collections::HashMap;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

type DaemonWorker =
    Worker<FsWorkspaceProvisioner, LoggingPlatformClient, ProcessRunnerRegistry, ew_core::UuidIdGen, ew_core::SystemClock>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("ew-workerd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("ew-workerd {}", env!("CARGO_PKG_VERSION"));
                println!("Edge Worker daemon - drains inbound events into running agent sessions");
                println!();
                println!("USAGE:");
                println!("    ew-workerd");
                println!();
                println!("Reads newline-delimited JSON inbound events from stdin.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: ew-workerd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config_path = config::config_path()?;
    let config = WorkerConfig::load(&config_path)?;

    let log_guard = setup_logging(&config)?;
    info!(config = %config_path.display(), "starting edge worker daemon");

    let worker = build_worker(&config);
    let worker = std::sync::Arc::new(worker);

    let tick_worker = worker.clone();
    tokio::spawn(async move {
        tick_worker.run_persistence_tick(DIRTY_TICK_INTERVAL).await;
    });

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut ingest = StdinIngestSource::new();

    println!("READY");
    info!("daemon ready, draining ingest source");

    loop {
        tokio::select! {
            event = ingest.next_event() => {
                match event {
                    Some(event) => {
                        info!(event = event.log_summary(), "dispatching inbound event");
                        worker.dispatch(event).await;
                    }
                    None => {
                        info!("ingest source exhausted, shutting down");
                        break;
                    }
                }
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
        }
    }

    if let Err(e) = worker.flush().await {
        error!(error = %e, "failed to flush state on shutdown");
    }
    info!("daemon stopped");
    drop(log_guard);
    Ok(())
}

fn build_worker(config: &WorkerConfig) -> DaemonWorker {
    let mut binaries = HashMap::new();
    for entry in &config.runner_binaries {
        binaries.insert(entry.flavor, entry.binary.clone());
    }

    Worker::new(
        config.state_dir.clone(),
        config.repositories.clone(),
        config.templates.clone(),
        std::sync::Arc::new(ew_core::SystemClock),
        WorkerDeps {
            workspace: std::sync::Arc::new(FsWorkspaceProvisioner),
            platform: std::sync::Arc::new(LoggingPlatformClient),
            registry: std::sync::Arc::new(ProcessRunnerRegistry::new(binaries)),
            id_gen: ew_core::UuidIdGen,
        },
    )
}

fn setup_logging(
    config: &WorkerConfig,
) -> Result<tracing_appender::non_blocking::WorkerGuard, ew_daemon::DaemonError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    std::fs::create_dir_all(&config.state_dir)?;
    let file_appender = tracing_appender::rolling::never(&config.state_dir, "daemon.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
