//! Personal Library Server - HTTP frontend for the book catalog.
//!
//! Serves the static frontend and a small JSON API for searching, viewing
//! and uploading books. All storage goes through `personal_library::Catalog`.

mod handler;
mod params;
mod server;

use anyhow::Result;
use clap::Parser;
use personal_library::{Catalog, CatalogBuilder, CatalogConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "library-server")]
#[command(about = "HTTP server for a personal book library")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Directory holding the library database
    #[arg(long, default_value = "library-data")]
    data_dir: PathBuf,

    /// Keep the library in memory only (nothing is written to disk)
    #[arg(long, conflicts_with = "data_dir")]
    in_memory: bool,

    /// Directory the static frontend is served from
    #[arg(long, default_value = "frontend")]
    frontend: PathBuf,

    /// Add the sample books when the library is empty
    #[arg(long)]
    seed_samples: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting {} server", CatalogConfig::APP_NAME);

    let builder = if args.in_memory {
        CatalogBuilder::in_memory()
    } else {
        info!("Data directory: {}", args.data_dir.display());
        Catalog::builder(&args.data_dir).auto_create_dirs(true)
    };
    let catalog = Arc::new(builder.seed_samples(args.seed_samples).build().await?);

    let addr =
        server::start_server(Arc::clone(&catalog), &args.frontend, &args.host, args.port).await?;

    info!("Server is running on http://{}", addr);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    if let Err(e) = catalog.optimize().await {
        warn!("Failed to optimize catalog on shutdown: {}", e);
    }

    Ok(())
}
