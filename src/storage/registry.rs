// src/storage/registry.rs

//! Persistent set of pages that changed since the last clear.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::Update;
use crate::storage::write_atomic;

/// Registry of updates, stored as a JSON object `{"<url>": true}`.
///
/// Every mutation is written to disk while the registry lock is held, so the
/// file always matches the set at some point in time.
#[derive(Debug)]
pub struct UpdateRegistry {
    path: PathBuf,
    mode: u32,
    updates: Mutex<BTreeSet<Update>>,
}

impl UpdateRegistry {
    /// Create an empty registry persisted at `path`.
    pub fn new(path: impl Into<PathBuf>, mode: u32) -> Self {
        Self {
            path: path.into(),
            mode,
            updates: Mutex::new(BTreeSet::new()),
        }
    }

    /// Open a registry and load the updates left from the last run.
    pub async fn open(path: impl Into<PathBuf>, mode: u32) -> Result<Self> {
        let registry = Self::new(path, mode);
        registry.restore().await?;
        Ok(registry)
    }

    /// Flag a page as updated and persist the registry.
    ///
    /// The update stays in memory even when persisting fails.
    pub async fn add(&self, update: Update) -> Result<()> {
        let mut updates = self.updates.lock().await;
        updates.insert(update);
        self.write(&updates).await
    }

    /// Remove every update and persist the empty registry.
    pub async fn clear(&self) -> Result<()> {
        let mut updates = self.updates.lock().await;
        updates.clear();
        self.write(&updates).await
    }

    /// Copy of the current updates.
    pub async fn snapshot(&self) -> BTreeSet<Update> {
        self.updates.lock().await.clone()
    }

    /// Write the current updates to disk.
    pub async fn persist(&self) -> Result<()> {
        let updates = self.updates.lock().await;
        self.write(&updates).await
    }

    /// Replace the in-memory updates with the persisted ones.
    ///
    /// A missing file restores an empty registry.
    pub async fn restore(&self) -> Result<()> {
        let loaded = match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let map: BTreeMap<Update, bool> = serde_json::from_slice(&bytes)?;
                map.into_iter()
                    .filter_map(|(update, flagged)| flagged.then_some(update))
                    .collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => return Err(AppError::Io(e)),
        };
        log::debug!("Restored {} updates from {:?}", loaded.len(), self.path);
        *self.updates.lock().await = loaded;
        Ok(())
    }

    async fn write(&self, updates: &BTreeSet<Update>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&to_map(updates))?;
        write_atomic(&self.path, &bytes, self.mode).await
    }
}

/// Wire and disk form of a set of updates.
pub fn to_map(updates: &BTreeSet<Update>) -> BTreeMap<&Update, bool> {
    updates.iter().map(|update| (update, true)).collect()
}
