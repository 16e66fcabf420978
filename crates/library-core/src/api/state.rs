//! Lifecycle state of a catalog handle.

use std::sync::Arc;

use crate::catalog::BookStore;
use crate::error::{CatalogError, Result};

/// `Uninitialized` until [`crate::Catalog::init`] opens the store; `Ready`
/// for the rest of the handle's life.
pub(crate) enum CatalogState {
    Uninitialized,
    Ready(Arc<BookStore>),
}

impl CatalogState {
    /// The open store, or `StoreUnavailable` before init.
    pub(crate) fn store(&self) -> Result<Arc<BookStore>> {
        match self {
            CatalogState::Ready(store) => Ok(Arc::clone(store)),
            CatalogState::Uninitialized => Err(CatalogError::not_initialized()),
        }
    }

    pub(crate) fn is_ready(&self) -> bool {
        matches!(self, CatalogState::Ready(_))
    }
}
