// src/services/checker.rs

//! Single page check.
//!
//! A check downloads the page, extracts its selection and compares it with
//! the cached one:
//!
//! ```text
//! Downloading ──timeout──▶ TimedOut
//!      │
//!      ▼
//! Extracting ─▶ Comparing ─┬─ no cache ──────▶ store baseline
//!                          ├─ distance ≤ t ──▶ idle
//!                          └─ distance > t ──▶ registry, mail, cache
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::{Page, ProgramSettings, Update};
use crate::services::extractor::extract_markup;
use crate::services::{Fetcher, Mailer};
use crate::storage::{CacheStore, UpdateRegistry};
use crate::utils::{distance, is_changed};

/// Longest time a page download may take.
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// How a successful check ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// First observation, selection stored as baseline
    Baseline,
    /// Distance within the threshold
    Unchanged,
    /// Page flagged as updated
    Updated { notified: bool },
}

/// Runs checks against shared storage.
pub struct PageChecker {
    fetcher: Arc<dyn Fetcher>,
    mailer: Arc<dyn Mailer>,
    cache: Arc<CacheStore>,
    registry: Arc<UpdateRegistry>,
    timeout: Duration,
}

impl PageChecker {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        mailer: Arc<dyn Mailer>,
        cache: Arc<CacheStore>,
        registry: Arc<UpdateRegistry>,
    ) -> Self {
        Self {
            fetcher,
            mailer,
            cache,
            registry,
            timeout: CHECK_TIMEOUT,
        }
    }

    /// Override the download timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn registry(&self) -> &Arc<UpdateRegistry> {
        &self.registry
    }

    /// Check one page with the settings it was dispatched with.
    pub async fn check(&self, page: &Page, settings: &ProgramSettings) -> Result<CheckOutcome> {
        let markup = self.download(page).await?;
        let selection = extract_markup(&markup, &page.extraction);

        let _guard = self.cache.lock(&page.url).await?;

        let Some(cached) = self.cache.read(&page.url).await? else {
            self.cache
                .write(&page.url, &selection, settings.file_perms)
                .await?;
            log::info!("First check of {}, baseline stored", page.url);
            return Ok(CheckOutcome::Baseline);
        };

        if !is_changed(&cached, &selection, page.threshold) {
            log::debug!("{} unchanged", page.url);
            return Ok(CheckOutcome::Unchanged);
        }

        log::info!(
            "{} updated (distance {:.4} > {})",
            page.url,
            distance(&cached, &selection),
            page.threshold
        );
        self.registry.add(Update::from(&page.url)).await?;

        let notified = match page.notify.as_deref() {
            Some(recipient) if settings.mail.is_configured() => {
                let body = extract_markup(&markup, &page.extraction.readable());
                self.mailer
                    .send(&settings.mail, &page.url, recipient, &body)
                    .await?;
                true
            }
            _ => false,
        };

        self.cache
            .write(&page.url, &selection, settings.file_perms)
            .await?;

        Ok(CheckOutcome::Updated { notified })
    }

    /// Download the page, giving up after the timeout.
    ///
    /// On timeout the download future is dropped, cancelling the request.
    async fn download(&self, page: &Page) -> Result<String> {
        match tokio::time::timeout(self.timeout, self.fetcher.fetch(page)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::timeout(page.url.as_str())),
        }
    }
}
