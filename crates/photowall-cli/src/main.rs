//! Photowall: relays local photos to a community wall.
//!
//! Credentials and limits come from the environment (see `.env.example`).

use anyhow::Context;
use clap::{Parser, Subcommand};
use photowall_cli::{build_components, parse_task_line, AckLine, Components};
use photowall_core::{Config, LogFormat, UploadTask};
use photowall_infra::{init_telemetry, shutdown_telemetry};
use photowall_services::DailyRolloverScheduler;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

#[derive(Parser)]
#[command(name = "photowall", about = "Publish photos to a community wall")]
struct Cli {
    /// Emit logs as JSON (overrides LOG_FORMAT)
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish one or more photos concurrently
    Publish {
        /// Photo files to publish
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Caption attached to every post
        #[arg(long, default_value = "")]
        caption: String,
    },
    /// Run the local checks only and print the file digest
    Check {
        file: PathBuf,
    },
    /// Remove stale files from the temp directory once
    Sweep,
    /// Read JSON task lines from stdin and answer with JSON acknowledgments
    Relay,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let log_format = if cli.json_logs {
        LogFormat::Json
    } else {
        config.log_format
    };
    init_telemetry(log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    let components = build_components(&config)?;

    let outcome = match cli.command {
        Commands::Publish { files, caption } => publish(&components, files, caption).await,
        Commands::Check { file } => check(&components, file).await,
        Commands::Sweep => {
            let removed = components.sweeper.sweep_once().await?;
            println!("Removed {} stale file(s)", removed);
            Ok(())
        }
        Commands::Relay => relay(&components).await,
    };

    shutdown_telemetry().await;
    outcome
}

async fn publish(components: &Components, files: Vec<PathBuf>, caption: String) -> anyhow::Result<()> {
    let tasks = files.into_iter().map(|path| {
        let relay = components.relay.clone();
        let task = UploadTask::new(path.clone(), caption.clone());
        async move { (path, relay.handle(task).await) }
    });

    for (path, ack) in futures::future::join_all(tasks).await {
        println!("{}: {}", path.display(), ack.message());
    }

    println!("{}", components.stats.report());
    Ok(())
}

async fn check(components: &Components, file: PathBuf) -> anyhow::Result<()> {
    let prepared = components
        .preparer
        .prepare(&file)
        .await
        .with_context(|| format!("{} did not pass the local checks", file.display()))?;

    let out = serde_json::to_string_pretty(&serde_json::json!({
        "path": prepared.path,
        "size_bytes": prepared.size,
        "sha256": prepared.digest,
    }))
    .context("Serialize check result")?;
    println!("{}", out);
    Ok(())
}

async fn relay(components: &Components) -> anyhow::Result<()> {
    let sweeper = components.sweeper.clone().start();
    let rollover = Arc::new(DailyRolloverScheduler::new(components.stats.clone())).start();

    let (ack_tx, mut ack_rx) = mpsc::unbounded_channel::<AckLine>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = ack_rx.recv().await {
            let mut out = match serde_json::to_string(&line) {
                Ok(out) => out,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize acknowledgment");
                    continue;
                }
            };
            out.push('\n');
            if let Err(e) = stdout.write_all(out.as_bytes()).await {
                tracing::error!(error = %e, "Failed to write acknowledgment");
                continue;
            }
            let _ = stdout.flush().await;
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight = JoinSet::new();
    let signal = shutdown_signal();
    tokio::pin!(signal);

    tracing::info!("Relay started, reading tasks from stdin");

    loop {
        tokio::select! {
            _ = &mut signal => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => match parse_task_line(&line) {
                    Ok(Some(task)) => {
                        let relay = components.relay.clone();
                        let ack_tx = ack_tx.clone();
                        in_flight.spawn(async move {
                            let path = task.path.clone();
                            let ack = relay.handle(task).await;
                            let _ = ack_tx.send(AckLine::new(path, ack));
                        });
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!(error = %e, "Skipping malformed task line"),
                },
                Ok(None) => {
                    tracing::info!("Input closed");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read task line");
                    break;
                }
            },
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "Relay task aborted");
                }
            }
        }
    }

    components.shutdown.trigger();
    tracing::info!(in_flight = in_flight.len(), "Waiting for in-flight tasks");
    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "Relay task aborted");
        }
    }

    drop(ack_tx);
    if let Err(e) = writer.await {
        tracing::error!(error = %e, "Acknowledgment writer stopped unexpectedly");
    }

    sweeper.abort();
    rollover.abort();

    tracing::info!(report = %components.stats.report(), "Relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }
}
