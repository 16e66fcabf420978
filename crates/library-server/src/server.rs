//! HTTP server implementation using Axum.

use crate::handler::{
    handle_health, handle_info, handle_page_not_found, handle_search, handle_stats,
    handle_upload, handle_upload_query,
};
use axum::{
    extract::DefaultBodyLimit,
    handler::HandlerWithoutStateExt,
    routing::get,
    Router,
};
use personal_library::{Catalog, CatalogConfig};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers.
pub struct AppState {
    /// The only handle to the book store
    pub catalog: Arc<Catalog>,
    /// Directory the static frontend is served from
    pub frontend_dir: PathBuf,
}

/// Build the router: API routes first, then the static frontend.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let frontend =
        ServeDir::new(&state.frontend_dir).fallback(handle_page_not_found.into_service());

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/v1/search", get(handle_search))
        .route("/api/v1/info", get(handle_info))
        .route("/api/v1/stats", get(handle_stats))
        .route(
            "/api/v1/upload",
            get(handle_upload_query).post(handle_upload),
        )
        .fallback_service(frontend)
        .layer(DefaultBodyLimit::max(CatalogConfig::MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(
    catalog: Arc<Catalog>,
    frontend_dir: &Path,
    host: &str,
    port: u16,
) -> anyhow::Result<SocketAddr> {
    let state = Arc::new(AppState {
        catalog,
        frontend_dir: frontend_dir.to_path_buf(),
    });

    let app = build_router(state);

    // Parse the address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    // Bind to the address
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    // Spawn the server in the background
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    Ok(actual_addr)
}
