// src/pipeline/scheduler.rs

//! Tick-based dispatch of page checks.
//!
//! Once per tick every due page gets its own task. A collector task per tick
//! waits for exactly the checks dispatched in that tick and logs their
//! errors, so a slow or failing page never delays the next tick.

use std::sync::Arc;
use std::time::Duration;

use futures::future;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::models::{Page, Watchlist};
use crate::services::{CheckOutcome, PageChecker};

/// Scheduling resolution.
pub const TICK: Duration = Duration::from_secs(1);

/// Whether a page is due at the given tick.
pub fn is_due(page: &Page, elapsed_ticks: u64) -> bool {
    elapsed_ticks % page.interval_ticks() == 0
}

/// Pages of a snapshot due at the given tick.
pub fn due_pages(watchlist: &Watchlist, elapsed_ticks: u64) -> Vec<Arc<Page>> {
    watchlist
        .pages
        .iter()
        .filter(|page| is_due(page, elapsed_ticks))
        .cloned()
        .collect()
}

/// Summary of the checks dispatched together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub dispatched: usize,
    pub baseline: usize,
    pub unchanged: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Owner of the current configuration snapshot and the checker.
#[derive(Clone)]
pub struct Scheduler {
    checker: Arc<PageChecker>,
    watchlist: Arc<RwLock<Arc<Watchlist>>>,
}

impl Scheduler {
    pub fn new(checker: Arc<PageChecker>, watchlist: Watchlist) -> Self {
        Self {
            checker,
            watchlist: Arc::new(RwLock::new(Arc::new(watchlist))),
        }
    }

    pub fn checker(&self) -> &Arc<PageChecker> {
        &self.checker
    }

    /// Current configuration snapshot.
    pub async fn snapshot(&self) -> Arc<Watchlist> {
        Arc::clone(&*self.watchlist.read().await)
    }

    /// Swap in a new snapshot. Checks in flight keep the old one.
    pub async fn replace(&self, watchlist: Watchlist) {
        *self.watchlist.write().await = Arc::new(watchlist);
    }

    /// Spawn one check per page and a collector for their results.
    pub fn dispatch(&self, watchlist: &Arc<Watchlist>, pages: Vec<Arc<Page>>) -> JoinHandle<DispatchReport> {
        let checks: Vec<_> = pages
            .into_iter()
            .map(|page| {
                let checker = Arc::clone(&self.checker);
                let settings = Arc::clone(&watchlist.settings);
                let url = page.url.to_string();
                let handle = tokio::spawn(async move { checker.check(&page, &settings).await });
                (url, handle)
            })
            .collect();

        tokio::spawn(collect(checks))
    }

    /// Dispatch the checks due at the given tick.
    pub async fn tick(&self, elapsed_ticks: u64) -> JoinHandle<DispatchReport> {
        let watchlist = self.snapshot().await;
        let due = due_pages(&watchlist, elapsed_ticks);
        if !due.is_empty() {
            log::debug!("Tick {}: {} pages due", elapsed_ticks, due.len());
        }
        self.dispatch(&watchlist, due)
    }

    /// Dispatch a check of every page right away.
    pub async fn recheck_all(&self) -> JoinHandle<DispatchReport> {
        let watchlist = self.snapshot().await;
        log::info!("Rechecking all {} pages", watchlist.pages.len());
        let pages = watchlist.pages.clone();
        self.dispatch(&watchlist, pages)
    }

    /// Tick forever.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut elapsed_ticks: u64 = 0;
        loop {
            ticker.tick().await;
            drop(self.tick(elapsed_ticks).await);
            elapsed_ticks = elapsed_ticks.wrapping_add(1);
        }
    }
}

/// Wait for every check and log the failures.
async fn collect(
    checks: Vec<(String, JoinHandle<crate::error::Result<CheckOutcome>>)>,
) -> DispatchReport {
    let mut report = DispatchReport {
        dispatched: checks.len(),
        ..DispatchReport::default()
    };

    let (urls, handles): (Vec<_>, Vec<_>) = checks.into_iter().unzip();
    let results = future::join_all(handles).await;

    for (url, result) in urls.into_iter().zip(results) {
        match result {
            Ok(Ok(CheckOutcome::Baseline)) => report.baseline += 1,
            Ok(Ok(CheckOutcome::Unchanged)) => report.unchanged += 1,
            Ok(Ok(CheckOutcome::Updated { .. })) => report.updated += 1,
            Ok(Err(error)) => {
                report.failed += 1;
                log::error!("Check of {} failed: {}", url, error);
            }
            Err(join_error) => {
                report.failed += 1;
                log::error!("Check of {} aborted: {}", url, join_error);
            }
        }
    }

    report
}
