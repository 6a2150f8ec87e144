// src/models/mod.rs

//! Domain models for the page watcher.
//!
//! Pages and program settings are loaded once, validated, and then shared
//! read-only as a [`Watchlist`] snapshot.

mod page;
mod settings;
mod update;

use std::sync::Arc;

// Re-export all public types
pub use page::{Extraction, Filter, Page, PageConfig, PagesFile};
pub use settings::{ConfigFile, MailSettings, ProgramSettings};
pub use update::Update;

/// Immutable snapshot of the loaded configuration.
///
/// A reload builds a new snapshot; checks already running keep the one they
/// were dispatched with.
#[derive(Debug, Clone, Default)]
pub struct Watchlist {
    pub settings: Arc<ProgramSettings>,
    pub pages: Vec<Arc<Page>>,
}

impl Watchlist {
    pub fn new(settings: ProgramSettings, pages: Vec<Page>) -> Self {
        Self {
            settings: Arc::new(settings),
            pages: pages.into_iter().map(Arc::new).collect(),
        }
    }
}
