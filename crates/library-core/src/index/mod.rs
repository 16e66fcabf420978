//! Full-text search index over book titles and descriptions.
//!
//! This module provides:
//! - FTS5 virtual table setup and explicit propagation
//! - Query building shared by every search path
//! - Consistency checks against the books table

mod fts5;
mod query;

pub use fts5::{FTS5Config, FTS5Manager, FTS5Stats, IndexConsistency, TOKENIZER};
pub use query::{build_fts5_query, escape_fts5_term};
