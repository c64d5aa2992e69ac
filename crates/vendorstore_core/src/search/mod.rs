//! Search capabilities used by vendor listing.
//!
//! # Responsibility
//! - Express the title relevance match and the genre containment match as
//!   pluggable predicate builders.
//! - Keep caller text out of SQL text: predicates carry it only as bound
//!   parameters.
//!
//! # Invariants
//! - Returning `None` means "match everything" on that axis.
//! - Predicate fragments reference the `vendors` table by its real name.

pub mod containment;
pub mod fts;

use rusqlite::types::Value;

pub use containment::{JsonGenreContainment, SetContainment};
pub use fts::{Fts5TitleSearch, LikeTitleSearch, TextSearchable};

/// SQL boolean fragment with `?` placeholders and the values bound to them,
/// in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlPredicate {
    pub sql: String,
    pub binds: Vec<Value>,
}

impl SqlPredicate {
    pub fn new(sql: impl Into<String>, binds: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            binds,
        }
    }
}

/// `?, ?, ?` with `count` placeholders.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
