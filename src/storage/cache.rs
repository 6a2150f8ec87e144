// src/storage/cache.rs

//! Cache of the last accepted selection of every page.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Page;
use crate::storage::{PathLocks, write_atomic};
use crate::utils::filename::{self, CACHE_EXTENSION};

/// One file per page under the cache root.
///
/// A missing file means the page has never been checked.
#[derive(Debug)]
pub struct CacheStore {
    root: PathBuf,
    locks: PathLocks,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: PathLocks::new(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Cache file of a page URL.
    pub fn path_for(&self, url: &Url) -> Result<PathBuf> {
        Ok(self.root.join(filename::cache_file_name(url.as_str())?))
    }

    /// Acquire exclusive access to the cache entry of a URL.
    ///
    /// Checks of the same page hold this guard from reading the entry until
    /// writing it back.
    pub async fn lock(&self, url: &Url) -> Result<OwnedMutexGuard<()>> {
        let path = self.path_for(url)?;
        Ok(self.locks.get(&path).lock_owned().await)
    }

    /// Read the cached selection, `None` when the page was never checked.
    pub async fn read(&self, url: &Url) -> Result<Option<String>> {
        let path = self.path_for(url)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Replace the cached selection of a URL.
    pub async fn write(&self, url: &Url, selection: &str, mode: u32) -> Result<()> {
        let path = self.path_for(url)?;
        write_atomic(&path, selection.as_bytes(), mode).await
    }

    /// Remove cache files that belong to none of the given pages.
    ///
    /// Returns the number of removed files.
    pub async fn clean(&self, pages: &[Arc<Page>]) -> Result<usize> {
        let keep: HashSet<String> = pages
            .iter()
            .map(|page| filename::cache_file_name(page.url.as_str()))
            .collect::<Result<_>>()?;

        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(CACHE_EXTENSION) || keep.contains(&name) {
                continue;
            }
            tokio::fs::remove_file(entry.path()).await?;
            log::info!("Removed stale cache file {}", name);
            removed += 1;
        }
        Ok(removed)
    }
}
