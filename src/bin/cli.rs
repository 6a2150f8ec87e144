//! pagewatch client
//!
//! Lists, opens, clears and rechecks updates of a running `pagewatchd`.

use std::path::PathBuf;
use std::process::{Command, ExitCode};

use clap::Parser;
use pagewatch::{
    client::ControlClient,
    config::load_settings,
    error::{AppError, Result},
    storage::Paths,
};

/// Exit status when there are no updates.
const EXIT_NO_DATA: u8 = 61;

/// pagewatch - check and handle page updates
#[derive(Parser, Debug)]
#[command(name = "pagewatch", version, about = "Client for the pagewatch daemon")]
struct Cli {
    /// Force a recheck of every page
    #[arg(short = 'f', long)]
    recheck: bool,

    /// Clear the list of updated pages
    #[arg(short, long)]
    clear: bool,

    /// Open every updated page in the configured browser
    #[arg(short, long)]
    read: bool,

    /// Open every updated page, then clear the list
    #[arg(long)]
    read_clear: bool,

    /// Directory holding config.toml (default: per-user config directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Control port (default: the one in config.toml)
    #[arg(short, long)]
    port: Option<u16>,

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
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let paths = match cli.root {
        Some(root) => Paths::new(root),
        None => Paths::user()?,
    };
    let settings = load_settings(&paths.config)?;
    let port = cli.port.unwrap_or(settings.port);

    let mut client = ControlClient::connect(port).await.map_err(|e| {
        log::debug!("Connect to port {} failed: {}", port, e);
        AppError::config(format!(
            "unable to connect to pagewatchd on port {port}; make sure the daemon is running"
        ))
    })?;

    if cli.recheck {
        client.recheck().await?;
        return Ok(ExitCode::SUCCESS);
    }
    if cli.clear {
        client.clear_all().await?;
        return Ok(ExitCode::SUCCESS);
    }
    if cli.read || cli.read_clear {
        let updates = client.updates().await?;
        if settings.browser.is_empty() {
            println!("No browser path set in: {}", paths.config.display());
            return Ok(ExitCode::SUCCESS);
        }
        if updates.is_empty() {
            println!("Sorry, no updates :(");
            return Ok(ExitCode::SUCCESS);
        }
        Command::new(&settings.browser)
            .args(updates.keys())
            .spawn()?;
        if cli.read_clear {
            client.clear_all().await?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    let updates = client.updates().await?;
    if updates.is_empty() {
        println!("Sorry, no updates :(");
        return Ok(ExitCode::from(EXIT_NO_DATA));
    }
    for url in updates.keys() {
        println!("{url}");
    }

    Ok(ExitCode::SUCCESS)
}
