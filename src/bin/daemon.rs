//! pagewatch daemon
//!
//! Polls the configured pages and serves the control port until interrupted.

use std::path::PathBuf;

use clap::Parser;
use pagewatch::{error::Result, pipeline, storage::Paths};

/// pagewatchd - watch web pages for changes
#[derive(Parser, Debug)]
#[command(name = "pagewatchd", version, about = "Web page change watcher daemon")]
struct Cli {
    /// Directory holding config.toml, pages.toml and the cache
    /// (default: per-user config directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Remove cache files of pages no longer configured, then exit
    #[arg(long)]
    clean: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let paths = match cli.root {
        Some(root) => Paths::new(root),
        None => Paths::user()?,
    };

    if cli.clean {
        pipeline::run_clean(paths).await?;
        return Ok(());
    }

    pipeline::run_daemon(paths).await
}
