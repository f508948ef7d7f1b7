//! Adaptive translation session server.
//!
//! Reads the line protocol on stdin and writes exactly one hypothesis line
//! to stdout per decode request, flushed immediately. Commands produce no
//! stdout at all. Diagnostics go to stderr through `tracing`, so a client
//! piping stdout sees nothing but translations.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};
use trellis_engine::TableEngine;
use trellis_runtime::{SessionManager, SessionOptions};

mod debug;

/// Adaptive translation session server speaking a line protocol on stdio.
#[derive(Debug, Parser)]
#[command(name = "trellis", version, about)]
struct Cli {
    /// Engine configuration directory (static model).
    #[arg(short = 'c', long = "config")]
    config: PathBuf,

    /// State file to load at startup and use for path-less save/load.
    #[arg(short = 's', long = "state")]
    state: Option<PathBuf>,

    /// Tokenize input and detokenize hypotheses.
    #[arg(short = 'n', long = "normalize")]
    normalize: bool,

    /// Scratch directory handed to the engine.
    #[arg(short = 'T', long = "temp", default_value = "/tmp")]
    temp: PathBuf,

    /// Grammar cache capacity in slots.
    #[arg(short = 'a', long = "cache-size", default_value_t = 5)]
    cache_size: usize,

    /// Log at debug level instead of info.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Run the self-test harness against an input file, then exit.
    #[arg(short = 'D', long = "debug-test", value_name = "FILE")]
    debug_test: Option<PathBuf>,

    /// Bound on each engine call, in seconds.
    #[arg(long = "decode-timeout", default_value_t = 60)]
    decode_timeout: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    trellis_core::logging::init_subscriber(if cli.verbose { "debug" } else { "info" });

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "fatal");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Engine initialization is the one fatal failure
    let engine = TableEngine::load(&cli.config, &cli.temp)
        .with_context(|| format!("initializing engine from {}", cli.config.display()))?;

    let options = SessionOptions {
        normalize: cli.normalize,
        decode_timeout: Duration::from_secs(cli.decode_timeout),
        cache_size: cli.cache_size,
        state_file: cli.state.clone(),
    };
    let manager = Arc::new(SessionManager::new(Arc::new(engine), options));
    manager
        .load_initial_state()
        .await
        .context("loading initial state")?;

    let result = match cli.debug_test {
        Some(input) => debug::run(&manager, &input).await,
        None => serve(&manager).await,
    };
    manager.close();
    result
}

/// Serve the line protocol on stdin/stdout until EOF.
async fn serve(manager: &SessionManager) -> anyhow::Result<()> {
    info!("serving on stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        match manager.handle_line(&line, None).await {
            Ok(Some(hypothesis)) => {
                stdout.write_all(hypothesis.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
            Ok(None) => {}
            // Per-line errors never end the session
            Err(err) => warn!(category = err.category(), error = %err, "line failed"),
        }
    }
    info!("stdin closed, shutting down");
    Ok(())
}
