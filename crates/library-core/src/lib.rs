//! Personal Library - book storage and full-text search.
//!
//! This crate stores book metadata and file blobs in SQLite and keeps an FTS5
//! index over titles and descriptions in lockstep with the book table. It
//! can be used programmatically without any HTTP layer.
//!
//! # Example
//!
//! ```rust,ignore
//! use personal_library::{BookRecordInput, Catalog};
//!
//! #[tokio::main]
//! async fn main() -> personal_library::Result<()> {
//!     let catalog = Catalog::builder("./library-data")
//!         .auto_create_dirs(true)
//!         .build()
//!         .await?;
//!
//!     catalog
//!         .insert(BookRecordInput::new("Dune").description("Spice and sand"))
//!         .await?;
//!
//!     for hit in catalog.search("spice").await? {
//!         println!("{}: {}", hit.title, hit.description);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod index;
pub mod models;

mod api;

// Re-export commonly used types
pub use api::CatalogBuilder;
pub use catalog::{sample_books, BookStore, StoreStats};
pub use config::{CatalogConfig, StoreConfig, StoreLocation};
pub use error::{CatalogError, Result};
pub use index::{FTS5Config, IndexConsistency, TOKENIZER};
pub use models::{BookFields, BookRecord, BookRecordInput, BookSummary, RecordId};

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use api::CatalogState;

/// Main entry point for catalog operations.
///
/// Owns the only handle to the book store. Outer layers construct one
/// `Catalog` at startup and share it (typically behind an `Arc`) with every
/// request handler.
///
/// A new catalog is uninitialized: every operation except [`Catalog::init`]
/// fails with [`CatalogError::StoreUnavailable`] until `init` succeeds.
/// SQLite work runs on tokio's blocking pool, so a caller that abandons a
/// future does not interrupt a write already in progress.
pub struct Catalog {
    config: StoreConfig,
    state: RwLock<CatalogState>,
}

impl Catalog {
    /// Create an uninitialized catalog for the given store configuration.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            state: RwLock::new(CatalogState::Uninitialized),
        }
    }

    /// Create a builder storing the database in `data_dir`.
    pub fn builder(data_dir: impl Into<PathBuf>) -> CatalogBuilder {
        CatalogBuilder::new(data_dir)
    }

    /// Open the store and make the catalog ready.
    ///
    /// Calling this on a ready catalog does nothing.
    pub async fn init(&self) -> Result<()> {
        let mut state = self.state.write().await;
        if state.is_ready() {
            return Ok(());
        }

        let config = self.config.clone();
        let store = tokio::task::spawn_blocking(move || BookStore::open(config)).await??;
        *state = CatalogState::Ready(Arc::new(store));

        info!("Catalog ready at {}", self.config.location);
        Ok(())
    }

    /// Returns true once [`Catalog::init`] has succeeded.
    pub async fn is_ready(&self) -> bool {
        self.state.read().await.is_ready()
    }

    /// The store configuration this catalog was created with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Run a blocking store operation off the async executor.
    async fn with_store<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&BookStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.state.read().await.store()?;
        tokio::task::spawn_blocking(move || op(&store)).await?
    }

    /// Add a book. Missing fields are expected to be defaulted already
    /// (see [`BookFields`]); nothing is rejected for being empty.
    pub async fn insert(&self, input: BookRecordInput) -> Result<RecordId> {
        self.with_store(move |store| store.insert(&input)).await
    }

    /// Look up a book by exact title. The earliest inserted book wins when
    /// several share a title.
    pub async fn get(&self, title: &str) -> Result<BookRecord> {
        let title = title.to_string();
        self.with_store(move |store| store.get_by_title(&title)).await
    }

    /// Look up a book by id.
    pub async fn get_by_id(&self, id: RecordId) -> Result<BookRecord> {
        self.with_store(move |store| store.get(id)).await
    }

    /// Ranked search over titles and descriptions.
    pub async fn search(&self, query: &str) -> Result<Vec<BookSummary>> {
        let query = query.to_string();
        self.with_store(move |store| store.search(&query)).await
    }

    /// Ranked search returning full records.
    pub async fn search_records(&self, query: &str) -> Result<Vec<BookRecord>> {
        let query = query.to_string();
        self.with_store(move |store| store.search_records(&query)).await
    }

    /// Number of books in the catalog.
    pub async fn count(&self) -> Result<usize> {
        self.with_store(|store| store.count()).await
    }

    /// Store and index statistics.
    pub async fn stats(&self) -> Result<StoreStats> {
        self.with_store(|store| store.stats()).await
    }

    /// Compare the search index against the book table.
    pub async fn verify_index(&self) -> Result<IndexConsistency> {
        self.with_store(|store| store.verify_index()).await
    }

    /// Rebuild the search index from the book table.
    pub async fn rebuild_index(&self) -> Result<()> {
        self.with_store(|store| store.rebuild_index()).await
    }

    /// Merge index segments and fold the WAL back into the database file.
    /// Meant for shutdown or idle periods.
    pub async fn optimize(&self) -> Result<()> {
        self.with_store(|store| {
            store.optimize_index()?;
            store.checkpoint_wal()
        })
        .await
    }

    /// Insert [`sample_books`] if the catalog is empty. Returns the ids of
    /// the inserted books.
    pub async fn seed_samples(&self) -> Result<Vec<RecordId>> {
        self.with_store(|store| store.seed_if_empty(&sample_books()))
            .await
    }
}
