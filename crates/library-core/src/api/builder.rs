//! Builder for configuring Catalog initialization.

use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::config::StoreConfig;
use crate::error::{CatalogError, Result};
use crate::Catalog;

/// Builder for configuring Catalog initialization.
///
/// The built catalog is already initialized.
///
/// # Example
///
/// ```rust,ignore
/// use personal_library::Catalog;
///
/// let catalog = Catalog::builder("./library-data")
///     .auto_create_dirs(true)
///     .seed_samples(true)
///     .build()
///     .await?;
/// ```
pub struct CatalogBuilder {
    data_dir: Option<PathBuf>,
    auto_create_dirs: bool,
    seed_samples: bool,
    busy_timeout: Duration,
}

impl CatalogBuilder {
    /// Create a new builder storing the database in `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Self::in_memory()
        }
    }

    /// Create a builder for a catalog that lives only in memory.
    pub fn in_memory() -> Self {
        Self {
            data_dir: None,
            auto_create_dirs: false,
            seed_samples: false,
            busy_timeout: StoreConfig::DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Create the data directory if it doesn't exist.
    ///
    /// Default: `false` (the directory must exist)
    pub fn auto_create_dirs(mut self, enable: bool) -> Self {
        self.auto_create_dirs = enable;
        self
    }

    /// Insert the sample books when the catalog is empty.
    ///
    /// Default: `false`
    pub fn seed_samples(mut self, enable: bool) -> Self {
        self.seed_samples = enable;
        self
    }

    /// How long to wait on a locked database file.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    fn store_config(&self) -> Result<StoreConfig> {
        let mut config = match &self.data_dir {
            None => StoreConfig::in_memory(),
            Some(data_dir) => {
                if !data_dir.exists() {
                    if self.auto_create_dirs {
                        std::fs::create_dir_all(data_dir)
                            .map_err(|e| CatalogError::io_with_path(e, data_dir))?;
                    } else {
                        return Err(CatalogError::Config {
                            message: format!(
                                "Data directory does not exist: {}",
                                data_dir.display()
                            ),
                        });
                    }
                }
                StoreConfig::in_dir(data_dir)
            }
        };

        config.busy_timeout = self.busy_timeout;
        Ok(config)
    }

    /// Build and initialize the Catalog.
    pub async fn build(self) -> Result<Catalog> {
        let catalog = Catalog::new(self.store_config()?);
        catalog.init().await?;

        if self.seed_samples {
            let seeded = catalog.seed_samples().await?;
            if !seeded.is_empty() {
                info!("Seeded {} sample books", seeded.len());
            }
        }

        Ok(catalog)
    }
}
