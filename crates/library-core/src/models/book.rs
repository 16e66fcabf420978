//! Book records and the loosely-typed field bag uploads arrive as.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CatalogConfig;

/// Surrogate key assigned by the store at insert time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl RecordId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub id: RecordId,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub file_type: String,
    pub upload_timestamp: DateTime<Utc>,
    pub publication_date: String,
    pub page_count: u32,
    pub description: String,
    pub cover_image: Vec<u8>,
    pub file_data: Vec<u8>,
}

/// Everything a caller supplies for a new book. `id` and the upload
/// timestamp are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecordInput {
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub file_type: String,
    pub publication_date: String,
    pub page_count: u32,
    pub description: String,
    #[serde(default)]
    pub cover_image: Vec<u8>,
    #[serde(default)]
    pub file_data: Vec<u8>,
}

impl BookRecordInput {
    /// Input with the given title and every other field at its default.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: String::new(),
            publisher: String::new(),
            file_type: CatalogConfig::DEFAULT_FILE_TYPE.to_string(),
            publication_date: String::new(),
            page_count: CatalogConfig::DEFAULT_PAGE_COUNT,
            description: CatalogConfig::DEFAULT_DESCRIPTION.to_string(),
            cover_image: Vec::new(),
            file_data: Vec::new(),
        }
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = publisher.into();
        self
    }

    pub fn file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = file_type.into();
        self
    }

    pub fn publication_date(mut self, date: impl Into<String>) -> Self {
        self.publication_date = date.into();
        self
    }

    pub fn page_count(mut self, pages: u32) -> Self {
        self.page_count = pages;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn cover_image(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.cover_image = bytes.into();
        self
    }

    pub fn file_data(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.file_data = bytes.into();
        self
    }
}

/// A ranked search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: RecordId,
    pub title: String,
    pub description: String,
}

/// Field bag as decoded by a transport layer (form fields, query
/// parameters, multipart parts).
///
/// Every field is optional and nothing is rejected: conversion to
/// [`BookRecordInput`] fills gaps with the named defaults in
/// [`CatalogConfig`]. An unparseable page count becomes
/// [`CatalogConfig::DEFAULT_PAGE_COUNT`].
#[derive(Debug, Clone, Default)]
pub struct BookFields {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub file_type: Option<String>,
    pub publication_date: Option<String>,
    pub pages: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<Vec<u8>>,
    pub file_data: Option<Vec<u8>>,
}

impl BookFields {
    pub fn into_input(self) -> BookRecordInput {
        BookRecordInput {
            title: self.title.unwrap_or_default(),
            author: self.author.unwrap_or_default(),
            publisher: self.publisher.unwrap_or_default(),
            file_type: non_empty(self.file_type)
                .unwrap_or_else(|| CatalogConfig::DEFAULT_FILE_TYPE.to_string()),
            publication_date: self.publication_date.unwrap_or_default(),
            page_count: self
                .pages
                .as_deref()
                .map(parse_page_count)
                .unwrap_or(CatalogConfig::DEFAULT_PAGE_COUNT),
            description: non_empty(self.description)
                .unwrap_or_else(|| CatalogConfig::DEFAULT_DESCRIPTION.to_string()),
            cover_image: self.cover_image.unwrap_or_default(),
            file_data: self.file_data.unwrap_or_default(),
        }
    }
}

impl From<BookFields> for BookRecordInput {
    fn from(fields: BookFields) -> Self {
        fields.into_input()
    }
}

/// Parse a page count, falling back to the default for anything that is not
/// a non-negative integer.
pub fn parse_page_count(raw: &str) -> u32 {
    raw.trim()
        .parse()
        .unwrap_or(CatalogConfig::DEFAULT_PAGE_COUNT)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
