//! Persistent state of the daemon.
//!
//! ## Directory Structure
//!
//! ```text
//! {root}/
//! ├── config.toml           # Program settings
//! ├── pages.toml            # Watched pages
//! ├── updates.json          # Update registry
//! └── cache/                # Last accepted selection per page
//!     └── https:%2F%2Fexample.com%2F.htm
//! ```

pub mod cache;
pub mod registry;

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};

pub use cache::CacheStore;
pub use registry::UpdateRegistry;

/// Permissions used for directories created by the daemon.
pub const DIR_PERMS: u32 = 0o755;

/// Locations of every file the daemon reads or writes.
#[derive(Debug, Clone)]
pub struct Paths {
    pub root: PathBuf,
    pub config: PathBuf,
    pub pages: PathBuf,
    pub updates: PathBuf,
    pub cache: PathBuf,
}

impl Paths {
    /// Lay out all files under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config: root.join("config.toml"),
            pages: root.join("pages.toml"),
            updates: root.join("updates.json"),
            cache: root.join("cache"),
            root,
        }
    }

    /// Per-user configuration directory of the current platform.
    pub fn user() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "pagewatch")
            .ok_or_else(|| AppError::config("no home directory for the current user"))?;
        Ok(Self::new(dirs.config_dir()))
    }

    /// Create the root and cache directories when missing.
    pub async fn ensure_dirs(&self) -> Result<()> {
        create_dir(&self.root).await?;
        create_dir(&self.cache).await
    }
}

async fn create_dir(path: &Path) -> Result<()> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_PERMS);
    builder.create(path).await?;
    Ok(())
}

/// Write bytes atomically (write to temp, then rename).
///
/// Readers see either the old or the new content, never a partial file.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8], mode: u32) -> Result<()> {
    let tmp = temp_path(path)?;

    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(mode)).await?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Short sibling name for the temporary copy of `path`.
///
/// The name has a fixed length so it fits the file name limit whenever
/// `path` does.
fn temp_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| AppError::validation(format!("{path:?} has no file name")))?;
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    Ok(path.with_file_name(format!(".{:016x}.tmp", hasher.finish())))
}

/// One async mutex per file path.
///
/// Holding the guard for a path serializes every read-modify-write of that
/// file across tasks.
#[derive(Debug, Default)]
pub struct PathLocks {
    locks: StdMutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock handle for a path, created on first use.
    pub fn get(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(path.to_path_buf()).or_default())
    }
}
