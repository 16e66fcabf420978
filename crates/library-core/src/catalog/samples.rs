//! Starter books for a fresh library.

use crate::models::BookRecordInput;

/// The three programming-language books a new library is seeded with.
pub fn sample_books() -> Vec<BookRecordInput> {
    vec![
        BookRecordInput::new("The Go Programming Language").description(
            "Go is an open source programming language that makes it easy to build simple, \
             reliable, and efficient software.",
        ),
        BookRecordInput::new("The C Programming Language").description(
            "The original K&R C book by Brian W. Kernighan and Dennis M. Ritchie.",
        ),
        BookRecordInput::new("The Rust Programming Language")
            .description("A crabby introduction to Rust."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_books_have_titles() {
        let books = sample_books();
        assert_eq!(books.len(), 3);
        assert!(books.iter().all(|b| b.title.ends_with("Programming Language")));
    }
}
