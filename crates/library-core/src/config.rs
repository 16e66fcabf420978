//! Centralized configuration for the personal library.
//!
//! Constants for defaults applied to loosely-populated uploads, plus the
//! runtime configuration used to open the book store.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::index::FTS5Config;

/// Catalog-level constants.
pub struct CatalogConfig;

impl CatalogConfig {
    pub const APP_NAME: &'static str = "Personal Library";
    pub const DATABASE_FILE_NAME: &'static str = "library.db";
    pub const DEFAULT_DESCRIPTION: &'static str = "No description available";
    pub const DEFAULT_FILE_TYPE: &'static str = "epub";
    pub const DEFAULT_PAGE_COUNT: u32 = 0;
    pub const MAX_UPLOAD_BYTES: usize = 10 << 20; // 10MB
}

/// Where the book store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// A SQLite database file, created on first open.
    File(PathBuf),
    /// A private in-memory database. Data lives as long as the store handle.
    InMemory,
}

impl StoreLocation {
    /// Database file path, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            StoreLocation::File(path) => Some(path),
            StoreLocation::InMemory => None,
        }
    }
}

impl std::fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreLocation::File(path) => write!(f, "{}", path.display()),
            StoreLocation::InMemory => write!(f, ":memory:"),
        }
    }
}

/// Runtime configuration for [`crate::BookStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub location: StoreLocation,
    /// How long a connection waits on a locked database file.
    pub busy_timeout: Duration,
    /// Full-text index settings.
    pub fts5: FTS5Config,
}

impl StoreConfig {
    pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(30);

    /// Store backed by a database file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
            ..Self::in_memory()
        }
    }

    /// Store backed by an in-memory database.
    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::InMemory,
            busy_timeout: Self::DEFAULT_BUSY_TIMEOUT,
            fts5: FTS5Config::default(),
        }
    }

    /// Store in `data_dir`, using the standard database file name.
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::file(data_dir.as_ref().join(CatalogConfig::DATABASE_FILE_NAME))
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}
