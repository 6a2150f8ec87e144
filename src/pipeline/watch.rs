// src/pipeline/watch.rs

//! Reload of the configuration when `config.toml` or `pages.toml` changes.

use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::load_watchlist;
use crate::error::Result;
use crate::pipeline::scheduler::Scheduler;
use crate::storage::Paths;

/// Capacity of the channel bridging `notify` callbacks to tokio.
const CHANNEL_CAPACITY: usize = 64;

/// Quiet period collapsing the burst of events one save produces.
pub const DEBOUNCE: Duration = Duration::from_millis(200);

/// Keeps the filesystem watch alive; dropping it stops reloading.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
}

impl ConfigWatcher {
    /// Watch the root directory and reload on every relevant change.
    pub fn start(paths: Paths, scheduler: Scheduler) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<notify::Event>(CHANNEL_CAPACITY);
        let watched = paths.clone();

        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    forward_config_event(&tx, &watched, event);
                }
                Err(e) => log::warn!("Filesystem watcher error: {}", e),
            },
        )?;
        watcher.watch(&paths.root, RecursiveMode::NonRecursive)?;
        log::info!("Watching {} for configuration changes", paths.root.display());

        tokio::spawn(reload_loop(rx, paths, scheduler));

        Ok(Self { _watcher: watcher })
    }
}

/// Whether an event touches one of the configuration files.
pub fn is_config_event(event: &notify::Event, paths: &Paths) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event.paths.iter().any(|path| {
            let name = path.file_name();
            name == paths.config.file_name() || name == paths.pages.file_name()
        })
}

/// Queue an event when it touches a configuration file.
///
/// Only configuration events are queued, so a full channel already holds a
/// pending reload and the event can be dropped.
fn forward_config_event(
    tx: &mpsc::Sender<notify::Event>,
    paths: &Paths,
    event: notify::Event,
) -> bool {
    if !is_config_event(&event, paths) {
        return false;
    }
    if tx.try_send(event).is_err() {
        log::debug!("Reload already pending");
    }
    true
}

async fn reload_loop(mut rx: mpsc::Receiver<notify::Event>, paths: Paths, scheduler: Scheduler) {
    while rx.recv().await.is_some() {
        // Drain the rest of the burst.
        loop {
            match tokio::time::timeout(DEBOUNCE, rx.recv()).await {
                Ok(Some(_)) => continue,
                Ok(None) => return,
                Err(_) => break,
            }
        }

        reload(&paths, &scheduler).await;
    }
}

/// Reload both files; a broken configuration keeps the current snapshot.
pub async fn reload(paths: &Paths, scheduler: &Scheduler) -> bool {
    match load_watchlist(paths) {
        Ok(watchlist) => {
            let port = scheduler.snapshot().await.settings.port;
            if watchlist.settings.port != port {
                log::warn!(
                    "Control port change to {} applies after a restart",
                    watchlist.settings.port
                );
            }
            scheduler.replace(watchlist).await;
            log::info!("Configuration reloaded");
            drop(scheduler.recheck_all().await);
            true
        }
        Err(e) => {
            log::error!("Reload failed, keeping previous configuration: {}", e);
            false
        }
    }
}
