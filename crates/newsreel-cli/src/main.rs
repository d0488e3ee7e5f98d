use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use newsreel_core::Notices;
use newsreel_ingest::{CycleOutcome, Orchestrator};

#[derive(Debug, Parser)]
#[command(name = "newsreel")]
#[command(about = "Keeps a local archive of a recurring broadcast edition up to date")]
struct Cli {
    /// Also print each polling retry, not just outcomes
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Reconcile the archive, then fetch each new edition as it is published
    Run,
    /// Reconcile the archive, fetch the next edition, then exit
    Once,
    /// Fetch only if the origin holds a newer edition than the archive
    Reconcile,
    /// Print when the next edition is expected, without fetching
    Next {
        #[arg(long)]
        json: bool,
    },
    /// Print the archived edition's publish time, without fetching
    Status {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = newsreel_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let notices = Notices::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let orchestrator = Orchestrator::from_config(&config, notices.clone(), shutdown_rx)?;

    let exit = match cli.command {
        Commands::Run => {
            let printers = spawn_notice_printers(&notices, cli.verbose);
            spawn_shutdown_listener(shutdown_tx);
            run_loop(&orchestrator).await?;
            drain(orchestrator, notices, printers).await;
            ExitCode::SUCCESS
        }
        Commands::Once => {
            let printers = spawn_notice_printers(&notices, cli.verbose);
            spawn_shutdown_listener(shutdown_tx);
            let code = run_once(&orchestrator).await?;
            drain(orchestrator, notices, printers).await;
            code
        }
        Commands::Reconcile => {
            let printers = spawn_notice_printers(&notices, cli.verbose);
            orchestrator.reconcile_on_startup().await?;
            drain(orchestrator, notices, printers).await;
            ExitCode::SUCCESS
        }
        Commands::Next { json } => {
            print_next(&orchestrator, json)?;
            ExitCode::SUCCESS
        }
        Commands::Status { json } => {
            print_status(&orchestrator, json)?;
            ExitCode::SUCCESS
        }
    };
    Ok(exit)
}

/// Fetch every edition as it is published, until shutdown.
///
/// A failed startup reconcile is not fatal; the scheduled loop can still
/// make progress once the origin recovers.
async fn run_loop(orchestrator: &Orchestrator) -> anyhow::Result<()> {
    if let Err(e) = orchestrator.reconcile_on_startup().await {
        tracing::warn!(error = %e, "startup reconcile failed; moving on to scheduled fetching");
    }
    while !orchestrator.shutting_down() {
        let report = orchestrator.run_one_cycle(Utc::now()).await?;
        if orchestrator.shutting_down() {
            break;
        }
        orchestrator.wait_until_past(report.epoch).await;
    }
    tracing::info!("run loop stopped");
    Ok(())
}

/// One reconcile plus one cycle; the exit code says whether the cycle
/// archived an edition, so a host scheduler can alert on misses.
async fn run_once(orchestrator: &Orchestrator) -> anyhow::Result<ExitCode> {
    orchestrator.reconcile_on_startup().await?;
    let report = orchestrator.run_one_cycle(Utc::now()).await?;
    Ok(match report.outcome {
        CycleOutcome::Fetched { .. } => ExitCode::SUCCESS,
        CycleOutcome::TimedOut | CycleOutcome::Failed { .. } => ExitCode::FAILURE,
    })
}

fn print_next(orchestrator: &Orchestrator, json: bool) -> anyhow::Result<()> {
    let next = orchestrator.next_epoch(Utc::now())?;
    if json {
        println!("{}", serde_json::json!({ "next_epoch": next.to_rfc3339() }));
    } else {
        println!("next edition expected at {next}");
    }
    Ok(())
}

fn print_status(orchestrator: &Orchestrator, json: bool) -> anyhow::Result<()> {
    let published = orchestrator.show_latest()?;
    if json {
        let value = serde_json::json!({ "published": published.map(|t| t.to_rfc3339()) });
        println!("{value}");
    } else {
        match published {
            Some(t) => println!("latest archived edition published at {t}"),
            None => println!("no file yet"),
        }
    }
    Ok(())
}

/// Relay notices to stdout (and the fetch log to tracing) until the
/// emitting side is dropped.
fn spawn_notice_printers(notices: &Notices, verbose: bool) -> Vec<JoinHandle<()>> {
    let mut printers = vec![
        spawn_printer(notices.subscribe_terse()),
        spawn_printer(notices.subscribe_edition()),
        spawn_log_relay(notices.subscribe_log()),
    ];
    if verbose {
        printers.push(spawn_printer(notices.subscribe_chatty()));
    }
    printers
}

fn spawn_printer(mut notices: broadcast::Receiver<String>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(line) => println!("{line}"),
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn spawn_log_relay(mut records: broadcast::Receiver<String>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match records.recv().await {
                Ok(line) => tracing::info!(target: "newsreel::fetch_log", "{line}"),
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Drop the notice emitters, then let the printers drain their backlog so
/// nothing said during the final cycle is lost on exit.
async fn drain(orchestrator: Orchestrator, notices: Notices, printers: Vec<JoinHandle<()>>) {
    drop(orchestrator);
    drop(notices);
    for printer in printers {
        let _ = printer.await;
    }
}

fn spawn_shutdown_listener(shutdown: watch::Sender<bool>) {
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown.send(true);
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, finishing the current step");
}
