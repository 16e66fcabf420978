//! FTS5 virtual table setup, propagation and matching.
//!
//! The index holds `(title, description)` for every book. Its `rowid` is the
//! owning `books.book_id`, which is the only linkage back to the catalog.
//! Nothing here is maintained by triggers: the book store calls
//! [`FTS5Manager::propagate`] inside its insert transaction.

use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::models::{BookSummary, RecordId};

/// Tokenizer for the index. Query building assumes unicode61 word splitting,
/// so this is fixed rather than configurable.
pub const TOKENIZER: &str = "unicode61 remove_diacritics 1";

/// What FTS5 uses when the table declares no tokenizer.
const FTS5_DEFAULT_TOKENIZER: &str = "unicode61";

static TOKENIZE_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)tokenize\s*=\s*'([^']*)'").unwrap());

/// Configuration for the FTS5 table.
#[derive(Debug, Clone)]
pub struct FTS5Config {
    /// Name of the FTS5 virtual table.
    pub table_name: String,
}

impl Default for FTS5Config {
    fn default() -> Self {
        Self {
            table_name: "book_search".to_string(),
        }
    }
}

/// Manager for FTS5 setup and maintenance.
pub struct FTS5Manager<'a> {
    config: &'a FTS5Config,
}

impl<'a> FTS5Manager<'a> {
    /// Create a new FTS5 manager.
    pub fn new(config: &'a FTS5Config) -> Self {
        Self { config }
    }

    /// Check if the FTS5 table exists.
    pub fn table_exists(&self, conn: &Connection) -> rusqlite::Result<bool> {
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [&self.config.table_name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Tokenizer declared by the existing table, or `None` if there is no
    /// table.
    pub fn table_tokenizer(&self, conn: &Connection) -> rusqlite::Result<Option<String>> {
        let sql: Option<String> = conn
            .query_row(
                "SELECT sql FROM sqlite_master WHERE type='table' AND name=?1",
                [&self.config.table_name],
                |row| row.get(0),
            )
            .optional()?;

        Ok(sql.map(|sql| {
            TOKENIZE_CLAUSE
                .captures(&sql)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_else(|| FTS5_DEFAULT_TOKENIZER.to_string())
        }))
    }

    /// Ensure the index exists and agrees with the books table.
    ///
    /// A missing table is created and filled from `books`. A table built with
    /// another tokenizer is rebuilt. An existing table whose rowids differ
    /// from `books` is repopulated. Returns true when the index was
    /// (re)built.
    pub fn ensure_setup(&self, conn: &Connection) -> rusqlite::Result<bool> {
        match self.table_tokenizer(conn)? {
            None => {
                let tx = conn.unchecked_transaction()?;
                self.create_table(&tx)?;
                self.fill_from_books(&tx)?;
                tx.commit()?;
                return Ok(true);
            }
            Some(tokenizer) if tokenizer != TOKENIZER => {
                warn!(
                    "Search index uses tokenizer '{}' instead of '{}', rebuilding",
                    tokenizer, TOKENIZER
                );
                self.rebuild(conn)?;
                return Ok(true);
            }
            Some(_) => {}
        }

        let consistency = self.verify(conn)?;
        if !consistency.is_consistent() {
            warn!(
                "Search index out of sync ({} books unindexed, {} orphaned entries), rebuilding",
                consistency.unindexed_books.len(),
                consistency.orphaned_entries.len()
            );
            self.populate_from_books(conn)?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Create the FTS5 virtual table.
    pub fn create_table(&self, conn: &Connection) -> rusqlite::Result<()> {
        let sql = format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS {} USING fts5(
                title,
                description,
                tokenize='{}'
            )",
            self.config.table_name, TOKENIZER
        );

        conn.execute(&sql, [])?;
        info!("Created FTS5 table: {}", self.config.table_name);
        Ok(())
    }

    /// Add the index entry for a freshly inserted book.
    ///
    /// Must run in the same transaction as the `books` insert.
    pub fn propagate(
        &self,
        conn: &Connection,
        id: RecordId,
        title: &str,
        description: &str,
    ) -> rusqlite::Result<()> {
        let sql = format!(
            "INSERT INTO {} (rowid, title, description) VALUES (?1, ?2, ?3)",
            self.config.table_name
        );
        conn.execute(&sql, params![id.get(), title, description])?;
        debug!("Indexed book {}", id);
        Ok(())
    }

    /// Replace the index contents with a fresh scan of `books`.
    pub fn populate_from_books(&self, conn: &Connection) -> rusqlite::Result<()> {
        let tx = conn.unchecked_transaction()?;
        self.fill_from_books(&tx)?;
        tx.commit()
    }

    /// Delete and refill the index. The caller owns the transaction.
    fn fill_from_books(&self, conn: &Connection) -> rusqlite::Result<()> {
        let table = &self.config.table_name;

        conn.execute_batch(&format!("DELETE FROM {};", table))?;
        let populated = conn.execute(
            &format!(
                "INSERT INTO {} (rowid, title, description)
                 SELECT book_id, title, description FROM books",
                table
            ),
            [],
        )?;

        info!("Populated FTS5 table with {} books", populated);
        Ok(())
    }

    /// Rebuild the FTS5 index completely.
    ///
    /// Drop, create and populate commit together; on failure the previous
    /// index is left in place.
    pub fn rebuild(&self, conn: &Connection) -> rusqlite::Result<()> {
        let tx = conn.unchecked_transaction()?;
        tx.execute(&format!("DROP TABLE IF EXISTS {}", self.config.table_name), [])?;
        self.create_table(&tx)?;
        self.fill_from_books(&tx)?;
        tx.commit()?;

        info!("Rebuilt FTS5 index");
        Ok(())
    }

    /// Optimize the FTS5 index.
    pub fn optimize(&self, conn: &Connection) -> rusqlite::Result<()> {
        let sql = format!(
            "INSERT INTO {}({}) VALUES('optimize')",
            self.config.table_name, self.config.table_name
        );
        conn.execute(&sql, [])?;
        debug!("Optimized FTS5 index");
        Ok(())
    }

    /// Run a MATCH expression, most relevant first.
    ///
    /// Rank is FTS5's BM25; equal ranks fall back to insertion order.
    pub fn search(&self, conn: &Connection, fts5_query: &str) -> rusqlite::Result<Vec<BookSummary>> {
        let table = &self.config.table_name;
        let sql = format!(
            "SELECT rowid, title, description FROM {} WHERE {} MATCH ?1 ORDER BY rank, rowid",
            table, table
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([fts5_query], |row| {
            Ok(BookSummary {
                id: RecordId(row.get(0)?),
                title: row.get(1)?,
                description: row.get(2)?,
            })
        })?;

        rows.collect()
    }

    /// Compare index rowids against `books`.
    pub fn verify(&self, conn: &Connection) -> rusqlite::Result<IndexConsistency> {
        let table = &self.config.table_name;

        let unindexed_books = collect_ids(
            conn,
            &format!(
                "SELECT book_id FROM books WHERE book_id NOT IN (SELECT rowid FROM {}) ORDER BY book_id",
                table
            ),
        )?;
        let orphaned_entries = collect_ids(
            conn,
            &format!(
                "SELECT rowid FROM {} WHERE rowid NOT IN (SELECT book_id FROM books) ORDER BY rowid",
                table
            ),
        )?;

        Ok(IndexConsistency {
            unindexed_books,
            orphaned_entries,
        })
    }

    /// Get statistics about the FTS5 index, as declared in the database.
    pub fn get_stats(&self, conn: &Connection) -> rusqlite::Result<FTS5Stats> {
        let tokenizer = self
            .table_tokenizer(conn)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        let row_count: usize = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.config.table_name),
            [],
            |row| row.get(0),
        )?;

        Ok(FTS5Stats {
            table_name: self.config.table_name.clone(),
            row_count,
            tokenizer,
        })
    }
}

fn collect_ids(conn: &Connection, sql: &str) -> rusqlite::Result<Vec<RecordId>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| row.get(0).map(RecordId))?;
    rows.collect()
}

/// Statistics about an FTS5 index.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FTS5Stats {
    pub table_name: String,
    pub row_count: usize,
    pub tokenizer: String,
}

/// Differences between the books table and its search index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexConsistency {
    /// Books with no index entry.
    pub unindexed_books: Vec<RecordId>,
    /// Index entries with no backing book.
    pub orphaned_entries: Vec<RecordId>,
}

impl IndexConsistency {
    pub fn is_consistent(&self) -> bool {
        self.unindexed_books.is_empty() && self.orphaned_entries.is_empty()
    }
}
