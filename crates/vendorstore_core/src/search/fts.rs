//! Title relevance matching.
//!
//! # Invariants
//! - Blank queries are wildcards, never "match nothing".
//! - Every query word must match (words are ANDed).
//! - Words without a letter or digit carry nothing to match and are dropped.

use super::SqlPredicate;
use rusqlite::types::Value;

/// Builds the title axis of a vendor listing.
pub trait TextSearchable {
    /// Returns a predicate over `vendors`, or `None` when `query` matches all.
    fn title_predicate(&self, query: &str) -> Option<SqlPredicate>;
}

/// Token match through the `vendors_fts` FTS5 index.
///
/// Each whitespace-separated token is quoted as an FTS5 string, so caller
/// text can never be interpreted as FTS5 query syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fts5TitleSearch;

impl TextSearchable for Fts5TitleSearch {
    fn title_predicate(&self, query: &str) -> Option<SqlPredicate> {
        let match_expr = build_match_expression(query)?;
        Some(SqlPredicate::new(
            "vendors.id IN (SELECT rowid FROM vendors_fts WHERE vendors_fts MATCH ?)",
            vec![Value::Text(match_expr)],
        ))
    }
}

/// Case-insensitive per-token substring match on `vendors.title`.
///
/// For backing stores without a full-text index. Every token must appear.
#[derive(Debug, Clone, Copy, Default)]
pub struct LikeTitleSearch;

impl TextSearchable for LikeTitleSearch {
    fn title_predicate(&self, query: &str) -> Option<SqlPredicate> {
        let tokens = search_words(query).collect::<Vec<_>>();
        if tokens.is_empty() {
            return None;
        }

        let sql = vec!["vendors.title LIKE ? ESCAPE '\\'"; tokens.len()].join(" AND ");
        let binds = tokens
            .into_iter()
            .map(|token| Value::Text(format!("%{}%", escape_like(token))))
            .collect();
        Some(SqlPredicate::new(format!("({sql})"), binds))
    }
}

/// Converts free text into an FTS5 expression: quoted tokens joined by `AND`.
///
/// Returns `None` when `text` has no searchable word.
pub fn build_match_expression(text: &str) -> Option<String> {
    let terms = search_words(text)
        .map(escape_fts_term)
        .collect::<Vec<_>>();

    if terms.is_empty() {
        return None;
    }

    Some(terms.join(" AND "))
}

fn search_words(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .filter(|word| word.chars().any(char::is_alphanumeric))
}

fn escape_fts_term(raw: &str) -> String {
    let escaped = raw.replace('"', "\"\"");
    format!("\"{escaped}\"")
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
