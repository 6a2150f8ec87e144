// src/config.rs

//! Configuration loading utilities.
//!
//! Settings come from `config.toml` and pages from `pages.toml`; both are
//! validated before a [`Watchlist`] is built, so a broken file never yields a
//! partial configuration.

use std::path::Path;

use crate::error::Result;
use crate::models::{ConfigFile, Page, PagesFile, ProgramSettings, Watchlist};
use crate::storage::Paths;

/// Load program settings, using defaults when the file is missing.
pub fn load_settings(path: &Path) -> Result<ProgramSettings> {
    ConfigFile::load(path)
}

/// Load and validate every page.
pub fn load_pages(path: &Path, settings: &ProgramSettings) -> Result<Vec<Page>> {
    PagesFile::load(path, settings)
}

/// Load settings and pages into a fresh snapshot.
pub fn load_watchlist(paths: &Paths) -> Result<Watchlist> {
    let settings = load_settings(&paths.config)?;
    let pages = load_pages(&paths.pages, &settings)?;
    log::info!(
        "Loaded {} pages from {}",
        pages.len(),
        paths.pages.display()
    );
    Ok(Watchlist::new(settings, pages))
}
