//! Catalog construction and lifecycle.

mod builder;
mod state;

pub use builder::CatalogBuilder;
pub(crate) use state::CatalogState;
