//! thread-send - one-shot publisher for queued thread posts
//!
//! Runs the posting pipeline once: picks the most recent pending post from
//! the content store, drops it if any part was already published, uploads
//! its optional image, publishes the parts as a reply chain and marks the
//! record handled. Meant to be invoked by cron inside a posting window, or
//! by hand with --now.

use clap::Parser;
use libthreadcast::logging::{self, LogFormat};
use libthreadcast::pipeline;
use libthreadcast::platform::XApiClient;
use libthreadcast::store;
use libthreadcast::window::PostingWindow;
use libthreadcast::{Config, Credentials, Result, RunOutcome, Session};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "thread-send")]
#[command(version)]
#[command(about = "Publish the next queued thread post")]
#[command(long_about = "\
thread-send - publish the next queued thread post

DESCRIPTION:
    thread-send runs the posting pipeline once: it picks the most recent
    pending post from the content store, drops it if any part was already
    published, uploads its optional image, publishes the parts as a reply
    chain with human-like pacing, and marks the record handled.

    The job only runs when the current UTC hour is in the configured
    posting window; outside it the run is a no-op that exits successfully.
    Pass --now to ignore the window.

USAGE:
    # Respect the posting window (cron-friendly)
    thread-send

    # Post immediately
    thread-send --now

CONFIGURATION:
    Configuration file: ~/.config/threadcast/config.toml
    (override with THREADCAST_CONFIG or --config)

    Platform credentials come from the environment:
    THREADCAST_API_KEY, THREADCAST_API_SECRET, THREADCAST_ACCESS_TOKEN,
    THREADCAST_ACCESS_SECRET, THREADCAST_BEARER_TOKEN

SIGNALS:
    SIGTERM, SIGINT - immediate exit; already-published parts stay live

EXIT CODES:
    0 - Published, skipped, or graceful no-op
    1 - Store or publishing failure
    2 - Authentication failure
    3 - Invalid input
")]
struct Cli {
    /// Run immediately, ignoring the posting window
    #[arg(long)]
    now: bool,

    /// Path to the config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    #[cfg(unix)]
    if let Err(e) = setup_signal_handlers() {
        error!("Signal setup failed: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(Some(outcome)) => {
            report(&outcome);
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn init_logging(verbose: bool) {
    let format = std::env::var("THREADCAST_LOG_FORMAT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(LogFormat::Text);
    let level = if verbose {
        "debug".to_string()
    } else {
        std::env::var("THREADCAST_LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
    };
    logging::init(format, &level);
}

/// A termination signal ends the process on the spot. Already-published
/// parts stay live and the pending record keeps whatever state it had.
#[cfg(unix)]
fn setup_signal_handlers() -> std::io::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    std::thread::spawn(move || {
        if signals.forever().next().is_some() {
            info!("termination signal received; exiting");
            std::process::exit(0);
        }
    });
    Ok(())
}

async fn run(cli: Cli) -> Result<Option<RunOutcome>> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    let window = PostingWindow::new(config.schedule.utc_hours.clone());
    if !cli.now && !window.is_open_now() {
        info!(hours = ?window.hours(), "outside the posting window; nothing to do");
        return Ok(None);
    }

    // Credential exchange comes first; a bad credential set aborts before
    // any store access.
    let credentials = Credentials::from_env()?;
    let session = Session::open(Box::new(XApiClient::new(credentials))).await?;

    let outcome = run_pipeline(&config, &session).await;
    session.close().await;

    outcome.map(Some)
}

async fn run_pipeline(config: &Config, session: &Session) -> Result<RunOutcome> {
    let (content, blobs) = store::mongo::connect(&config.store).await?;
    pipeline::run_once(&content, &blobs, session, &config.publish).await
}

fn report(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Published { post_id, part_ids } => {
            info!(post_id = %post_id, parts = part_ids.len(), "job finished: thread published");
        }
        RunOutcome::Skipped { post_id, reason } => {
            info!(post_id = %post_id, %reason, "job finished: post skipped");
        }
        RunOutcome::NoCandidate => {
            info!("job finished: queue empty");
        }
    }
}
