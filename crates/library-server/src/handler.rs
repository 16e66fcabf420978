//! HTTP request handlers.
//!
//! Response bodies keep the shape the frontend expects: PascalCase keys,
//! byte fields as base64 strings, and `[{"Status": ...}]` envelopes for
//! upload results and failures.

use crate::params::{fields_from_base64_query, fields_from_multipart};
use crate::server::AppState;
use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use base64::Engine as _;
use personal_library::{BookFields, BookRecord, BookSummary, CatalogError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

const INVALID_REQUEST: &str = "Invalid Request";
const UNKNOWN_FAILURE: &str = "Unknown Failure";

/// `?q=` query string shared by search and info.
#[derive(Debug, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub q: String,
}

/// A search hit as returned to the frontend.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchHit {
    pub title: String,
    pub description: String,
}

impl From<BookSummary> for SearchHit {
    fn from(summary: BookSummary) -> Self {
        Self {
            title: summary.title,
            description: summary.description,
        }
    }
}

/// Book details for the info page. File contents are not included.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BookInfo {
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub file_type: String,
    pub upload_date: String,
    pub publication_date: String,
    pub pages: u32,
    pub description: String,
    pub cover_image: String,
}

impl From<BookRecord> for BookInfo {
    fn from(book: BookRecord) -> Self {
        Self {
            title: book.title,
            author: book.author,
            publisher: book.publisher,
            file_type: book.file_type,
            upload_date: book.upload_timestamp.to_rfc3339(),
            publication_date: book.publication_date,
            pages: book.page_count,
            description: book.description,
            cover_image: base64::engine::general_purpose::STANDARD.encode(&book.cover_image),
        }
    }
}

fn status_envelope(status: StatusCode, message: &str) -> Response {
    (status, Json(json!([{ "Status": message }]))).into_response()
}

fn error_status(err: &CatalogError) -> StatusCode {
    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Health check endpoint.
pub async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Ranked search over titles and descriptions.
pub async fn handle_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Response {
    match state.catalog.search(&params.q).await {
        Ok(results) => {
            debug!("Search {:?} matched {} books", params.q, results.len());
            let hits: Vec<SearchHit> = results.into_iter().map(SearchHit::from).collect();
            Json(hits).into_response()
        }
        Err(e) => {
            error!("Searching books failed: {}", e);
            status_envelope(error_status(&e), UNKNOWN_FAILURE)
        }
    }
}

/// Book details by exact title.
pub async fn handle_info(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Response {
    match state.catalog.get(&params.q).await {
        Ok(book) => Json(BookInfo::from(book)).into_response(),
        Err(e) if e.is_not_found() => {
            debug!("No book titled {:?}", params.q);
            status_envelope(StatusCode::NOT_FOUND, INVALID_REQUEST)
        }
        Err(e) => {
            error!("Reading book info failed: {}", e);
            status_envelope(error_status(&e), INVALID_REQUEST)
        }
    }
}

/// Upload from a multipart form. The `book-file` part is required.
pub async fn handle_upload(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let fields = match fields_from_multipart(multipart).await {
        Ok(fields) => fields,
        Err(e) => {
            warn!("Malformed upload form: {}", e);
            return status_envelope(StatusCode::BAD_REQUEST, INVALID_REQUEST);
        }
    };

    if fields.file_data.is_none() {
        warn!("Upload is missing its book-file part");
        return status_envelope(StatusCode::BAD_REQUEST, INVALID_REQUEST);
    }

    insert_book(&state, fields).await
}

/// Upload from base64-encoded query parameters.
pub async fn handle_upload_query(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    insert_book(&state, fields_from_base64_query(&params)).await
}

async fn insert_book(state: &AppState, fields: BookFields) -> Response {
    let input = fields.into_input();
    let title = input.title.clone();

    match state.catalog.insert(input).await {
        Ok(id) => {
            debug!("Uploaded book {} as {}", title, id);
            status_envelope(StatusCode::OK, &format!("{} successfully uploaded", title))
        }
        Err(e) => {
            error!("Unable to insert book: {}", e);
            status_envelope(error_status(&e), UNKNOWN_FAILURE)
        }
    }
}

/// Fallback for paths the frontend directory doesn't have.
pub async fn handle_page_not_found() -> Redirect {
    Redirect::to("/404.html")
}

/// Catalog statistics.
pub async fn handle_stats(State(state): State<Arc<AppState>>) -> Response {
    match state.catalog.stats().await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => {
            error!("Reading catalog stats failed: {}", e);
            status_envelope(error_status(&e), UNKNOWN_FAILURE)
        }
    }
}
