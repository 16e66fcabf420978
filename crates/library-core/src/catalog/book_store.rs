//! SQLite book store, the source of truth for the catalog.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use crate::config::{StoreConfig, StoreLocation};
use crate::error::{CatalogError, Result};
use crate::index::{build_fts5_query, FTS5Config, FTS5Manager, FTS5Stats, IndexConsistency};
use crate::models::{BookRecord, BookRecordInput, BookSummary, RecordId};

const BOOK_COLUMNS: &str = "book_id, title, author, publisher, file_type, upload_date, \
                            publication_date, pages, description, cover_image, file_data";

/// Statistics about the store and its index.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub location: String,
    pub book_count: usize,
    pub index: FTS5Stats,
}

/// SQLite book table plus its FTS5 search index.
///
/// Thread-safe via an internal mutex on the single connection. Every write
/// goes through that mutex, which is what serializes id assignment.
pub struct BookStore {
    location: StoreLocation,
    conn: Arc<Mutex<Connection>>,
    fts5_config: FTS5Config,
}

impl BookStore {
    /// Open or create the store described by `config`.
    ///
    /// Safe to call repeatedly against the same database: the schema is only
    /// created when missing and existing rows are never touched, apart from
    /// repopulating a search index that disagrees with `books`.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let conn = match &config.location {
            StoreLocation::File(db_path) => {
                // Ensure parent directory exists
                if let Some(parent) = db_path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        std::fs::create_dir_all(parent).map_err(|e| {
                            CatalogError::StoreUnavailable {
                                message: format!(
                                    "Failed to create directory {}: {}",
                                    parent.display(),
                                    e
                                ),
                                source: None,
                            }
                        })?;
                    }
                }
                Connection::open(db_path).map_err(|e| {
                    CatalogError::unavailable(
                        format!("Failed to open database {}", db_path.display()),
                        e,
                    )
                })?
            }
            StoreLocation::InMemory => Connection::open_in_memory()
                .map_err(|e| CatalogError::unavailable("Failed to open in-memory database", e))?,
        };

        Self::configure_connection(&conn, &config)
            .map_err(|e| CatalogError::unavailable("Failed to configure connection", e))?;
        Self::ensure_schema(&conn)
            .map_err(|e| CatalogError::unavailable("Failed to create book schema", e))?;

        let rebuilt = FTS5Manager::new(&config.fts5)
            .ensure_setup(&conn)
            .map_err(|e| CatalogError::unavailable("Failed to set up search index", e))?;

        info!(
            "Opened book store at {}{}",
            config.location,
            if rebuilt { " (search index built)" } else { "" }
        );

        Ok(Self {
            location: config.location,
            conn: Arc::new(Mutex::new(conn)),
            fts5_config: config.fts5,
        })
    }

    /// Configure connection with optimal settings.
    fn configure_connection(conn: &Connection, config: &StoreConfig) -> rusqlite::Result<()> {
        conn.busy_timeout(config.busy_timeout)?;
        if matches!(config.location, StoreLocation::File(_)) {
            conn.execute_batch(
                "
                PRAGMA journal_mode=WAL;
                PRAGMA synchronous=NORMAL;
                ",
            )?;
        }
        conn.execute_batch("PRAGMA temp_store=MEMORY;")?;
        Ok(())
    }

    /// Ensure the base schema exists.
    fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS books (
                book_id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                file_type TEXT NOT NULL,
                upload_date TEXT NOT NULL,
                publication_date TEXT NOT NULL,
                publisher TEXT NOT NULL,
                pages INTEGER NOT NULL DEFAULT 0,
                description TEXT NOT NULL,
                author TEXT NOT NULL,
                cover_image BLOB NOT NULL,
                file_data BLOB NOT NULL
            )",
            [],
        )?;

        // Title lookups resolve duplicates by lowest id
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_books_title ON books(title, book_id)",
            [],
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CatalogError::lock_poisoned())
    }

    /// Where this store keeps its data.
    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Insert a book and its search index entry as one transaction.
    ///
    /// Assigns the id and upload timestamp. On failure neither the row nor
    /// the index entry is left behind.
    pub fn insert(&self, input: &BookRecordInput) -> Result<RecordId> {
        let mut conn = self.lock()?;

        let tx = conn
            .transaction()
            .map_err(|e| CatalogError::write_failed("Unable to begin insert", e))?;
        let id = self.insert_row(&tx, input)?;
        tx.commit()
            .map_err(|e| CatalogError::write_failed("Unable to commit book", e))?;

        debug!("Inserted book {}: {}", id, input.title);
        Ok(id)
    }

    /// Insert `books` only if the store holds no books yet.
    ///
    /// The emptiness check and the inserts share one lock and one
    /// transaction, so concurrent callers seed at most once.
    pub fn seed_if_empty(&self, books: &[BookRecordInput]) -> Result<Vec<RecordId>> {
        let mut conn = self.lock()?;

        let tx = conn
            .transaction()
            .map_err(|e| CatalogError::write_failed("Unable to begin seeding", e))?;
        let existing: usize = tx
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .map_err(|e| CatalogError::unavailable("Unable to count books", e))?;
        if existing > 0 {
            return Ok(Vec::new());
        }

        let ids = books
            .iter()
            .map(|book| self.insert_row(&tx, book))
            .collect::<Result<Vec<_>>>()?;
        tx.commit()
            .map_err(|e| CatalogError::write_failed("Unable to commit seeded books", e))?;

        debug!("Seeded {} books", ids.len());
        Ok(ids)
    }

    /// Write the book row and its index entry. The caller owns the
    /// transaction.
    fn insert_row(&self, conn: &Connection, input: &BookRecordInput) -> Result<RecordId> {
        conn.execute(
            "INSERT INTO books (title, file_type, upload_date, publication_date,
                                publisher, pages, description, author,
                                cover_image, file_data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                input.title,
                input.file_type,
                Utc::now().to_rfc3339(),
                input.publication_date,
                input.publisher,
                input.page_count,
                input.description,
                input.author,
                input.cover_image,
                input.file_data,
            ],
        )
        .map_err(|e| CatalogError::write_failed("Unable to insert book", e))?;

        let id = RecordId(conn.last_insert_rowid());

        FTS5Manager::new(&self.fts5_config)
            .propagate(conn, id, &input.title, &input.description)
            .map_err(|e| CatalogError::write_failed("Unable to index book", e))?;

        Ok(id)
    }

    /// Get a book by id.
    pub fn get(&self, id: RecordId) -> Result<BookRecord> {
        let conn = self.lock()?;

        conn.query_row(
            &format!("SELECT {} FROM books WHERE book_id = ?1", BOOK_COLUMNS),
            params![id.get()],
            Self::row_to_record,
        )
        .optional()
        .map_err(|e| CatalogError::read_failed(id.to_string(), e))?
        .ok_or_else(|| CatalogError::NotFound {
            key: id.to_string(),
        })
    }

    /// Get the book whose title equals `title` exactly.
    ///
    /// Titles are not unique; the earliest inserted book (lowest id) wins.
    pub fn get_by_title(&self, title: &str) -> Result<BookRecord> {
        let conn = self.lock()?;

        conn.query_row(
            &format!(
                "SELECT {} FROM books WHERE title = ?1 ORDER BY book_id ASC LIMIT 1",
                BOOK_COLUMNS
            ),
            params![title],
            Self::row_to_record,
        )
        .optional()
        .map_err(|e| CatalogError::read_failed(title, e))?
        .ok_or_else(|| CatalogError::NotFound {
            key: title.to_string(),
        })
    }

    /// Ranked full-text search over titles and descriptions.
    ///
    /// A query with no searchable terms returns no results.
    pub fn search(&self, query: &str) -> Result<Vec<BookSummary>> {
        let fts5_query = build_fts5_query(query);
        if fts5_query.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;
        FTS5Manager::new(&self.fts5_config)
            .search(&conn, &fts5_query)
            .map_err(|e| CatalogError::search_failed("Search query failed", e))
    }

    /// Same matching and ordering as [`BookStore::search`], returning full
    /// records.
    pub fn search_records(&self, query: &str) -> Result<Vec<BookRecord>> {
        let fts5_query = build_fts5_query(query);
        if fts5_query.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;
        let table = &self.fts5_config.table_name;
        let sql = format!(
            "SELECT b.book_id, b.title, b.author, b.publisher, b.file_type, b.upload_date,
                    b.publication_date, b.pages, b.description, b.cover_image, b.file_data
             FROM {table} s JOIN books b ON b.book_id = s.rowid
             WHERE {table} MATCH ?1
             ORDER BY s.rank, s.rowid"
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| CatalogError::search_failed("Search query failed", e))?;
        let rows = stmt
            .query_map([&fts5_query], Self::row_to_record)
            .map_err(|e| CatalogError::search_failed("Search query failed", e))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| CatalogError::search_failed("Search query failed", e))
    }

    /// Convert a row to a BookRecord.
    fn row_to_record(row: &Row) -> rusqlite::Result<BookRecord> {
        let upload_date: String = row.get(5)?;
        let upload_timestamp = DateTime::parse_from_rfc3339(&upload_date)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    5,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        Ok(BookRecord {
            id: RecordId(row.get(0)?),
            title: row.get(1)?,
            author: row.get(2)?,
            publisher: row.get(3)?,
            file_type: row.get(4)?,
            upload_timestamp,
            publication_date: row.get(6)?,
            page_count: row.get(7)?,
            description: row.get(8)?,
            cover_image: row.get(9)?,
            file_data: row.get(10)?,
        })
    }

    /// Get the count of books.
    pub fn count(&self) -> Result<usize> {
        let conn = self.lock()?;

        conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .map_err(|e| CatalogError::unavailable("Unable to count books", e))
    }

    /// Book count plus index statistics.
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.lock()?;

        let book_count: usize = conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .map_err(|e| CatalogError::unavailable("Unable to count books", e))?;
        let index = FTS5Manager::new(&self.fts5_config)
            .get_stats(&conn)
            .map_err(|e| CatalogError::unavailable("Unable to read index statistics", e))?;

        Ok(StoreStats {
            location: self.location.to_string(),
            book_count,
            index,
        })
    }

    /// Compare the search index against the books table.
    pub fn verify_index(&self) -> Result<IndexConsistency> {
        let conn = self.lock()?;

        FTS5Manager::new(&self.fts5_config)
            .verify(&conn)
            .map_err(|e| CatalogError::unavailable("Unable to verify search index", e))
    }

    /// Rebuild the search index from the books table.
    pub fn rebuild_index(&self) -> Result<()> {
        let conn = self.lock()?;

        FTS5Manager::new(&self.fts5_config)
            .rebuild(&conn)
            .map_err(|e| CatalogError::write_failed("Unable to rebuild search index", e))
    }

    /// Optimize the search index.
    pub fn optimize_index(&self) -> Result<()> {
        let conn = self.lock()?;

        FTS5Manager::new(&self.fts5_config)
            .optimize(&conn)
            .map_err(|e| CatalogError::write_failed("Unable to optimize search index", e))
    }

    /// Checkpoint the WAL file.
    pub fn checkpoint_wal(&self) -> Result<()> {
        if !matches!(self.location, StoreLocation::File(_)) {
            return Ok(());
        }

        let conn = self.lock()?;
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            .map_err(|e| CatalogError::write_failed("Unable to checkpoint WAL", e))?;
        debug!("Checkpointed WAL");
        Ok(())
    }
}
