//! Integration tests for the Catalog public interface.
//!
//! These exercise the store and its search index together through the same
//! entry point the HTTP server uses.

use personal_library::{BookRecordInput, Catalog, CatalogError, StoreConfig, TOKENIZER};
use rusqlite::Connection;
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

/// Create an initialized catalog backed by a file in a fresh temp dir.
async fn create_test_catalog() -> (Catalog, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let catalog = Catalog::builder(temp_dir.path()).build().await.unwrap();
    (catalog, temp_dir)
}

fn sample_input(title: &str, description: &str) -> BookRecordInput {
    BookRecordInput::new(title)
        .author("Ursula K. Le Guin")
        .publisher("Ace")
        .file_type("epub")
        .publication_date("1969-03-01")
        .page_count(286)
        .description(description)
        .cover_image((0u8..=255).collect::<Vec<_>>())
        .file_data(vec![0x00, 0xff, 0x00, 0x50, 0x4b, 0x03, 0x04])
}

#[tokio::test]
async fn test_insert_then_get_round_trips_fields() {
    let (catalog, _temp) = create_test_catalog().await;
    let input = sample_input("The Left Hand of Darkness", "Winter on Gethen");

    let id = catalog.insert(input.clone()).await.unwrap();
    let book = catalog.get(&input.title).await.unwrap();

    assert_eq!(book.id, id);
    assert_eq!(book.title, input.title);
    assert_eq!(book.author, input.author);
    assert_eq!(book.publisher, input.publisher);
    assert_eq!(book.file_type, input.file_type);
    assert_eq!(book.publication_date, input.publication_date);
    assert_eq!(book.page_count, input.page_count);
    assert_eq!(book.description, input.description);
    assert_eq!(book.cover_image, input.cover_image);
    assert_eq!(book.file_data, input.file_data);
}

#[tokio::test]
async fn test_inserted_title_is_immediately_searchable() {
    let (catalog, _temp) = create_test_catalog().await;

    for title in [
        "The Left Hand of Darkness",
        "A Wizard of Earthsea",
        "K&R: The C Book",
        "Dup",
    ] {
        catalog.insert(sample_input(title, "Some text")).await.unwrap();

        let hits = catalog.search(title).await.unwrap();
        assert!(
            hits.iter().any(|hit| hit.title == title),
            "{title} missing from its own search"
        );
    }
}

#[tokio::test]
async fn test_init_twice_keeps_schema_and_data() {
    let temp_dir = TempDir::new().unwrap();
    let config = StoreConfig::in_dir(temp_dir.path());

    let first = Catalog::new(config.clone());
    first.init().await.unwrap();
    first.insert(sample_input("Dune", "Spice")).await.unwrap();
    drop(first);

    let count_schema_objects = || {
        let conn = Connection::open(temp_dir.path().join("library.db")).unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE name IN ('books', 'book_search', 'idx_books_title')",
            [],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
    };
    assert_eq!(count_schema_objects(), 3);

    let second = Catalog::new(config);
    second.init().await.unwrap();

    assert_eq!(count_schema_objects(), 3);
    assert_eq!(second.count().await.unwrap(), 1);
    assert_eq!(second.get("Dune").await.unwrap().description, "Spice");
    assert_eq!(second.search("spice").await.unwrap().len(), 1);
    assert!(second.verify_index().await.unwrap().is_consistent());
}

#[tokio::test]
async fn test_search_matches_terms_not_substrings() {
    let (catalog, _temp) = create_test_catalog().await;
    catalog.insert(sample_input("Go", "Go is great")).await.unwrap();
    catalog.insert(sample_input("Rust", "Rust is great")).await.unwrap();
    catalog.insert(sample_input("C", "C is fine")).await.unwrap();

    let hits = catalog.search("great").await.unwrap();
    let titles: Vec<_> = hits.iter().map(|h| h.title.as_str()).collect();
    assert_eq!(titles, vec!["Go", "Rust"]);

    // Stable across repeated queries
    let again: Vec<_> = catalog
        .search("great")
        .await
        .unwrap()
        .into_iter()
        .map(|h| h.title)
        .collect();
    assert_eq!(again, vec!["Go".to_string(), "Rust".to_string()]);

    // "grea" is not a token
    assert!(catalog.search("grea").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_ranks_stronger_matches_first() {
    let (catalog, _temp) = create_test_catalog().await;
    catalog
        .insert(sample_input(
            "Cooking",
            "A long book about many kitchen topics, one of which is rust removal",
        ))
        .await
        .unwrap();
    catalog
        .insert(sample_input("Rust", "Rust rust rust"))
        .await
        .unwrap();

    let hits = catalog.search("rust").await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].title, "Rust");
}

#[tokio::test]
async fn test_search_requires_every_term() {
    let (catalog, _temp) = create_test_catalog().await;
    catalog.insert(sample_input("Go", "Go is great")).await.unwrap();
    catalog.insert(sample_input("Rust", "Rust is great")).await.unwrap();

    let hits = catalog.search("rust great").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Rust");
}

#[tokio::test]
async fn test_empty_query_returns_nothing() {
    let (catalog, _temp) = create_test_catalog().await;
    catalog.insert(sample_input("Go", "Go is great")).await.unwrap();

    assert!(catalog.search("").await.unwrap().is_empty());
    assert!(catalog.search("  \t ").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_title_returns_first_inserted() {
    let (catalog, _temp) = create_test_catalog().await;
    let first = catalog.insert(sample_input("Dup", "A")).await.unwrap();
    let second = catalog.insert(sample_input("Dup", "B")).await.unwrap();
    assert!(second > first);

    for _ in 0..3 {
        let book = catalog.get("Dup").await.unwrap();
        assert_eq!(book.id, first);
        assert_eq!(book.description, "A");
    }
}

#[tokio::test]
async fn test_get_missing_title_is_not_found() {
    let (catalog, _temp) = create_test_catalog().await;
    catalog.insert(sample_input("Dune", "Spice")).await.unwrap();

    let err = catalog.get("Dune Messiah").await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
    assert!(err.is_not_found());

    // Exact match only
    assert!(catalog.get("dune").await.unwrap_err().is_not_found());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_inserts_get_unique_ids() {
    let (catalog, _temp) = create_test_catalog().await;
    let catalog = Arc::new(catalog);
    let n = 64;

    let handles: Vec<_> = (0..n)
        .map(|i| {
            let catalog = Arc::clone(&catalog);
            tokio::spawn(async move {
                catalog
                    .insert(sample_input(&format!("Volume{i}"), "Part of a set"))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        assert!(ids.insert(handle.await.unwrap()));
    }
    assert_eq!(ids.len(), n);

    for i in 0..n {
        let title = format!("Volume{i}");
        let hits = catalog.search(&title).await.unwrap();
        assert_eq!(hits.len(), 1, "expected exactly one hit for {title}");
        assert_eq!(hits[0].title, title);
    }

    assert_eq!(catalog.count().await.unwrap(), n);
    assert!(catalog.verify_index().await.unwrap().is_consistent());
}

#[tokio::test]
async fn test_lost_index_is_rebuilt_on_open() {
    let temp_dir = TempDir::new().unwrap();
    {
        let catalog = Catalog::builder(temp_dir.path()).build().await.unwrap();
        catalog.insert(sample_input("Dune", "Spice")).await.unwrap();
    }

    // Simulate index loss
    {
        let conn = Connection::open(temp_dir.path().join("library.db")).unwrap();
        conn.execute("DROP TABLE book_search", []).unwrap();
    }

    let catalog = Catalog::builder(temp_dir.path()).build().await.unwrap();
    let hits = catalog.search("spice").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Dune");
}

#[tokio::test]
async fn test_search_records_preserve_rank_order() {
    let (catalog, _temp) = create_test_catalog().await;
    catalog.insert(sample_input("Go", "Go is great")).await.unwrap();
    catalog.insert(sample_input("Rust", "Rust is great")).await.unwrap();

    let summaries = catalog.search("great").await.unwrap();
    let records = catalog.search_records("great").await.unwrap();

    let summary_ids: Vec<_> = summaries.iter().map(|s| s.id).collect();
    let record_ids: Vec<_> = records.iter().map(|r| r.id).collect();
    assert_eq!(summary_ids, record_ids);
    assert_eq!(records[0].author, "Ursula K. Le Guin");
}

#[tokio::test]
async fn test_stats_reflect_inserts() {
    let (catalog, _temp) = create_test_catalog().await;
    catalog.insert(sample_input("Go", "Go is great")).await.unwrap();

    let stats = catalog.stats().await.unwrap();
    assert_eq!(stats.book_count, 1);
    assert_eq!(stats.index.row_count, 1);
    assert!(stats.location.ends_with("library.db"));
}

#[tokio::test]
async fn test_failed_rebuild_leaves_index_searchable() {
    let (catalog, temp_dir) = create_test_catalog().await;
    catalog.insert(sample_input("Dune", "Spice")).await.unwrap();

    // Break the books table so repopulating the index fails
    {
        let conn = Connection::open(temp_dir.path().join("library.db")).unwrap();
        conn.execute("ALTER TABLE books RENAME COLUMN description TO blurb", [])
            .unwrap();
    }

    let err = catalog.rebuild_index().await.unwrap_err();
    assert!(matches!(err, CatalogError::WriteFailed { .. }));

    let hits = catalog.search("spice").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Dune");
    assert_eq!(catalog.count().await.unwrap(), 1);
    assert!(catalog.verify_index().await.unwrap().is_consistent());
}

#[tokio::test]
async fn test_index_with_foreign_tokenizer_is_rebuilt_on_open() {
    let temp_dir = TempDir::new().unwrap();
    {
        let catalog = Catalog::builder(temp_dir.path()).build().await.unwrap();
        catalog
            .insert(sample_input("Running Wild", "A story"))
            .await
            .unwrap();
    }

    // Replace the index with a stemming one
    {
        let conn = Connection::open(temp_dir.path().join("library.db")).unwrap();
        conn.execute_batch(
            "DROP TABLE book_search;
             CREATE VIRTUAL TABLE book_search USING fts5(title, description, tokenize='porter unicode61');
             INSERT INTO book_search (rowid, title, description)
                 SELECT book_id, title, description FROM books;",
        )
        .unwrap();
    }

    let catalog = Catalog::builder(temp_dir.path()).build().await.unwrap();
    assert_eq!(catalog.stats().await.unwrap().index.tokenizer, TOKENIZER);
    assert!(catalog.search("run").await.unwrap().is_empty());
    assert_eq!(catalog.search("running").await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_seeding_seeds_once() {
    let (catalog, _temp) = create_test_catalog().await;
    let catalog = Arc::new(catalog);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            tokio::spawn(async move { catalog.seed_samples().await.unwrap() })
        })
        .collect();

    let mut seeded = 0;
    for handle in handles {
        seeded += handle.await.unwrap().len();
    }
    assert_eq!(seeded, 3);
    assert_eq!(catalog.count().await.unwrap(), 3);
}
