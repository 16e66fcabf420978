//! FTS5 query building.
//!
//! A user query is split on whitespace and every term becomes a quoted FTS5
//! string. Quoted strings are run through the same tokenizer as the indexed
//! text, so `k&r` matches a title containing "K&R". Adjacent strings are an
//! implicit AND: a book matches only when every term occurs in its title or
//! description. There is no prefix or substring matching.

use regex::Regex;
use std::sync::LazyLock;

/// A term is searchable only if the tokenizer will produce at least one token
/// from it.
static WORD_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]").unwrap());

/// Quote a term as an FTS5 string, doubling any embedded quotes.
pub fn escape_fts5_term(term: &str) -> String {
    format!("\"{}\"", term.replace('"', "\"\""))
}

/// Build an FTS5 MATCH expression from a search term.
///
/// - "great" → `"great"`
/// - "Rust book" → `"rust" "book"`
/// - "c++ k&r" → `"c++" "k&r"`
///
/// Returns an empty string when nothing in the input is searchable; callers
/// treat that as "no results" rather than running a wildcard scan.
pub fn build_fts5_query(search_term: &str) -> String {
    let search_term = search_term.to_lowercase();

    search_term
        .split_whitespace()
        .filter(|term| WORD_CHARS.is_match(term))
        .map(escape_fts5_term)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_simple_term() {
        assert_eq!(escape_fts5_term("rust"), "\"rust\"");
    }

    #[test]
    fn test_escape_quotes() {
        assert_eq!(escape_fts5_term("test\"quote"), "\"test\"\"quote\"");
    }

    #[test]
    fn test_build_query_single_term() {
        assert_eq!(build_fts5_query("great"), "\"great\"");
    }

    #[test]
    fn test_build_query_multiple_terms() {
        assert_eq!(
            build_fts5_query("The Go  Programming"),
            "\"the\" \"go\" \"programming\""
        );
    }

    #[test]
    fn test_build_query_keeps_punctuated_terms() {
        assert_eq!(build_fts5_query("K&R c++"), "\"k&r\" \"c++\"");
        assert_eq!(build_fts5_query("NOT"), "\"not\"");
    }

    #[test]
    fn test_build_query_empty() {
        assert_eq!(build_fts5_query(""), "");
        assert_eq!(build_fts5_query("   "), "");
        assert_eq!(build_fts5_query("-- ** \"\""), "");
    }

    #[test]
    fn test_build_query_unicode() {
        assert_eq!(build_fts5_query("Éclair"), "\"éclair\"");
    }
}
