// src/pipeline/daemon.rs

//! Daemon bootstrap: wire storage, checker, scheduler, control server and
//! config watcher together.

use std::sync::Arc;

use crate::config::load_watchlist;
use crate::error::Result;
use crate::pipeline::control::ControlServer;
use crate::pipeline::scheduler::Scheduler;
use crate::pipeline::watch::ConfigWatcher;
use crate::services::{HttpFetcher, PageChecker, SmtpMailer};
use crate::storage::{CacheStore, Paths, UpdateRegistry};

/// Run until interrupted.
///
/// Only bootstrap failures are returned; once running, failing checks and
/// connections are logged.
pub async fn run_daemon(paths: Paths) -> Result<()> {
    paths.ensure_dirs().await?;

    let watchlist = load_watchlist(&paths)?;
    let settings = Arc::clone(&watchlist.settings);

    let registry = Arc::new(UpdateRegistry::open(&paths.updates, settings.file_perms).await?);
    let pending = registry.snapshot().await.len();
    if pending > 0 {
        log::info!("Restored {} unread updates", pending);
    }

    let checker = Arc::new(PageChecker::new(
        Arc::new(HttpFetcher::new()?),
        Arc::new(SmtpMailer),
        Arc::new(CacheStore::new(&paths.cache)),
        Arc::clone(&registry),
    ));
    let scheduler = Scheduler::new(checker, watchlist);

    let server = ControlServer::bind(settings.port, scheduler.clone(), registry).await?;
    let _watcher = ConfigWatcher::start(paths.clone(), scheduler.clone())?;

    log::info!("pagewatch daemon started in {}", paths.root.display());

    tokio::select! {
        result = server.serve() => result?,
        () = scheduler.run() => {}
        signal = tokio::signal::ctrl_c() => {
            signal?;
            log::info!("Interrupted, shutting down");
        }
    }

    Ok(())
}

/// Remove cache files of pages no longer configured.
pub async fn run_clean(paths: Paths) -> Result<usize> {
    paths.ensure_dirs().await?;
    let watchlist = load_watchlist(&paths)?;
    let cache = CacheStore::new(&paths.cache);
    let removed = cache.clean(&watchlist.pages).await?;
    log::info!("Removed {} stale cache files", removed);
    Ok(removed)
}
