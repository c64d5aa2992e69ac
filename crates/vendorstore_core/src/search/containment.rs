//! Genre set-containment matching.

use super::{placeholders, SqlPredicate};
use rusqlite::types::Value;
use std::collections::BTreeSet;

/// Builds the genre axis of a vendor listing.
pub trait SetContainment {
    /// Returns a predicate that holds when a row's genres are a superset of
    /// `genres`, or `None` when `genres` is empty.
    fn genres_predicate(&self, genres: &[String]) -> Option<SqlPredicate>;
}

/// Containment over the JSON array stored in `vendors.genres`.
///
/// A row matches when the number of distinct requested genres present in its
/// array equals the number of distinct requested genres. Comparison is exact
/// and case-sensitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonGenreContainment;

impl SetContainment for JsonGenreContainment {
    fn genres_predicate(&self, genres: &[String]) -> Option<SqlPredicate> {
        let wanted: BTreeSet<&str> = genres.iter().map(String::as_str).collect();
        if wanted.is_empty() {
            return None;
        }

        let sql = format!(
            "(SELECT COUNT(DISTINCT genre.value)
                FROM json_each(vendors.genres) AS genre
               WHERE genre.value IN ({})) = ?",
            placeholders(wanted.len())
        );
        let mut binds: Vec<Value> = wanted
            .iter()
            .map(|genre| Value::Text((*genre).to_string()))
            .collect();
        binds.push(Value::Integer(wanted.len() as i64));

        Some(SqlPredicate::new(sql, binds))
    }
}
