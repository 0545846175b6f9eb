use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tagload::config::Config;
use tagload::control;
use tagload::run::{self, Mode, Outcome};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Load test an endpoint with sampled tag hierarchies.
///
/// Without INTERVAL_MS, prints a `blitz curl` command for the sampled
/// fixtures. With INTERVAL_MS, calls the endpoint every INTERVAL_MS
/// milliseconds until 's' is pressed, then waits for outstanding responses.
/// Ctrl-C quits immediately.
#[derive(Debug, Parser)]
#[command(name = "tagload", version, about)]
struct Cli {
    /// Path to the JSON run configuration
    config: PathBuf,

    /// Milliseconds between calls; selects load-generation mode
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    interval_ms: Option<u64>,

    /// Seed for fixture sampling and draws
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run_cli(cli).await {
        eprintln!("{}", failure_message(&err));
        std::process::exit(1);
    }
}

/// One-line diagnostic with the full cause chain
fn failure_message(err: &anyhow::Error) -> String {
    format!("There was an error: {:#}", err)
}

async fn run_cli(cli: Cli) -> anyhow::Result<()> {
    // Logs go to stderr so command output can be piped to a file. The
    // writer re-adds carriage returns while the key listener holds raw mode.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tagload=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(control::TerminalWriter::stderr))
        .init();

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {:?}", cli.config))?;
    info!(
        "Loaded configuration: {} fixtures of type '{}' against {}",
        config.tags.iterations, config.tags.category, config.endpoint.hostname
    );

    let mode = match cli.interval_ms {
        Some(ms) => Mode::http(Duration::from_millis(ms), &config.endpoint)?,
        None => Mode::Command,
    };

    let cancel = CancellationToken::new();
    let control = mode
        .is_load()
        .then(|| control::spawn_listener(cancel.clone()));

    let outcome = run::run(&config, mode, cli.seed, cancel).await;

    if let Some(control) = control {
        control.shutdown().await;
    }

    match outcome? {
        Outcome::Command(command) => println!("{}", command),
        Outcome::Load(report) => println!("{}", report),
    }

    Ok(())
}
