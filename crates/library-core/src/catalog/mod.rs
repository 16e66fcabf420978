//! Catalog storage.
//!
//! The book table is the source of truth; the search index is derived from it
//! and written in the same transaction.

mod book_store;
mod samples;

pub use book_store::{BookStore, StoreStats};
pub use samples::sample_books;
