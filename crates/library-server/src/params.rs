//! Request decoding into catalog field bags.
//!
//! Two upload encodings are accepted: base64-encoded query parameters and
//! multipart forms. Both produce a [`BookFields`]; values that fail to decode
//! are treated as absent so the catalog's defaults apply.

use axum::extract::multipart::{Multipart, MultipartError};
use base64::Engine as _;
use personal_library::BookFields;
use std::collections::HashMap;
use tracing::debug;

/// Decode a base64 query parameter to bytes.
pub fn base64_param_bytes(params: &HashMap<String, String>, name: &str) -> Option<Vec<u8>> {
    let value = params.get(name)?;
    base64::engine::general_purpose::STANDARD.decode(value).ok()
}

/// Decode a base64 query parameter to UTF-8 text.
pub fn base64_param(params: &HashMap<String, String>, name: &str) -> Option<String> {
    base64_param_bytes(params, name).and_then(|bytes| String::from_utf8(bytes).ok())
}

/// Book fields from base64-encoded query parameters.
pub fn fields_from_base64_query(params: &HashMap<String, String>) -> BookFields {
    BookFields {
        title: base64_param(params, "title"),
        author: base64_param(params, "author"),
        publisher: base64_param(params, "publisher"),
        file_type: None,
        publication_date: base64_param(params, "publication_date"),
        pages: base64_param(params, "pages"),
        description: base64_param(params, "description"),
        cover_image: base64_param_bytes(params, "cover"),
        file_data: base64_param_bytes(params, "file"),
    }
}

/// Book fields from an upload form.
pub async fn fields_from_multipart(mut multipart: Multipart) -> Result<BookFields, MultipartError> {
    let mut fields = BookFields::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "book-title" => fields.title = Some(field.text().await?),
            "book-author" => fields.author = Some(field.text().await?),
            "book-publisher" => fields.publisher = Some(field.text().await?),
            "book-publication-date" => fields.publication_date = Some(field.text().await?),
            "book-pages" => fields.pages = Some(field.text().await?),
            "book-description" => fields.description = Some(field.text().await?),
            "book-cover" => fields.cover_image = Some(field.bytes().await?.to_vec()),
            "book-file" => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?;
                debug!(
                    "Uploaded file {:?} ({} bytes)",
                    file_name.as_deref().unwrap_or("<unnamed>"),
                    bytes.len()
                );
                fields.file_data = Some(bytes.to_vec());
            }
            _ => debug!("Ignoring upload field {}", name),
        }
    }

    Ok(fields)
}
