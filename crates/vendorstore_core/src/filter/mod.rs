//! Paging/sorting parameters and their safelist validation.
//!
//! # Responsibility
//! - Validate caller paging/sorting input before any query runs.
//! - Resolve the caller's sort token to a typed [`SortKey`] taken from the
//!   server-declared safelist.
//!
//! # Invariants
//! - [`ValidatedFilters`] can only be produced by [`validate_filters`].
//! - `ORDER BY` text comes from [`SortColumn::as_sql`] / [`SortDirection::as_sql`],
//!   never from caller strings.

pub mod metadata;

use crate::model::validation::ValidationErrors;
use std::fmt::{Display, Formatter};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const DEFAULT_SORT: &str = "id";
pub const MAX_PAGE: i64 = 10_000_000;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Prefix marking a descending sort token.
const DESC_MARKER: char = '-';

/// Sortable vendor columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortColumn {
    Id,
    Title,
    Year,
    Runtime,
}

impl SortColumn {
    pub const ALL: [SortColumn; 4] = [Self::Id, Self::Title, Self::Year, Self::Runtime];

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Year => "year",
            Self::Runtime => "runtime",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One allowed ordering: a column plus a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortKey {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl SortKey {
    pub const fn asc(column: SortColumn) -> Self {
        Self {
            column,
            direction: SortDirection::Asc,
        }
    }

    pub const fn desc(column: SortColumn) -> Self {
        Self {
            column,
            direction: SortDirection::Desc,
        }
    }

    /// Caller-facing token: `title` for ascending, `-title` for descending.
    pub fn token(self) -> String {
        self.to_string()
    }

    fn matches_token(self, token: &str) -> bool {
        match self.direction {
            SortDirection::Asc => token == self.column.as_sql(),
            SortDirection::Desc => token
                .strip_prefix(DESC_MARKER)
                .is_some_and(|name| name == self.column.as_sql()),
        }
    }
}

impl Display for SortKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.direction == SortDirection::Desc {
            write!(f, "{DESC_MARKER}")?;
        }
        write!(f, "{}", self.column.as_sql())
    }
}

/// Ordered, server-declared set of allowed sort keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSafelist {
    keys: Vec<SortKey>,
}

impl SortSafelist {
    pub fn new(keys: impl IntoIterator<Item = SortKey>) -> Self {
        let mut unique = Vec::new();
        for key in keys {
            if !unique.contains(&key) {
                unique.push(key);
            }
        }
        Self { keys: unique }
    }

    /// Every column ascending, then every column descending.
    pub fn all() -> Self {
        Self::new(
            SortColumn::ALL
                .into_iter()
                .map(SortKey::asc)
                .chain(SortColumn::ALL.into_iter().map(SortKey::desc)),
        )
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn tokens(&self) -> Vec<String> {
        self.keys.iter().map(|key| key.token()).collect()
    }

    /// Returns the safelisted key whose token equals `token` exactly.
    pub fn resolve(&self, token: &str) -> Option<SortKey> {
        self.keys.iter().copied().find(|key| key.matches_token(token))
    }
}

impl Default for SortSafelist {
    fn default() -> Self {
        Self::all()
    }
}

/// Raw paging/sorting request as received from a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub page: i64,
    pub page_size: i64,
    pub sort: String,
    pub sort_safelist: SortSafelist,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            sort: DEFAULT_SORT.to_string(),
            sort_safelist: SortSafelist::all(),
        }
    }
}

impl FilterSpec {
    /// Reads `page`, `page_size` and `sort` from query-string pairs.
    ///
    /// Missing keys fall back to defaults. Non-integer paging values are
    /// reported per field; range checks are left to [`validate_filters`].
    pub fn from_query_pairs<'a, I>(pairs: I, sort_safelist: SortSafelist) -> Result<Self, ValidationErrors>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut spec = Self {
            sort_safelist,
            ..Self::default()
        };
        let mut errors = ValidationErrors::new();

        for (key, value) in pairs {
            match key {
                "page" => match value.trim().parse::<i64>() {
                    Ok(page) => spec.page = page,
                    Err(_) => errors.add_error("page", "must be an integer value"),
                },
                "page_size" => match value.trim().parse::<i64>() {
                    Ok(page_size) => spec.page_size = page_size,
                    Err(_) => errors.add_error("page_size", "must be an integer value"),
                },
                "sort" if !value.is_empty() => spec.sort = value.to_string(),
                _ => {}
            }
        }

        errors.into_result().map(|()| spec)
    }
}

/// Paging/sorting parameters that passed [`validate_filters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedFilters {
    page: i64,
    page_size: i64,
    sort: SortKey,
}

impl ValidatedFilters {
    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

/// Validates paging bounds and resolves the sort token through the safelist.
pub fn validate_filters(spec: &FilterSpec) -> Result<ValidatedFilters, ValidationErrors> {
    let mut v = ValidationErrors::new();

    v.check(spec.page > 0, "page", "must be greater than zero");
    v.check(spec.page <= MAX_PAGE, "page", "must be a maximum of 10 million");
    v.check(spec.page_size > 0, "page_size", "must be greater than zero");
    v.check(
        spec.page_size <= MAX_PAGE_SIZE,
        "page_size",
        "must be a maximum of 100",
    );

    let sort = spec.sort_safelist.resolve(&spec.sort);
    v.check(sort.is_some(), "sort", "invalid sort value");

    match sort {
        Some(sort) if v.is_empty() => Ok(ValidatedFilters {
            page: spec.page,
            page_size: spec.page_size,
            sort,
        }),
        _ => Err(v),
    }
}

/// Splits a comma-separated genre list, trimming entries and dropping blanks.
pub fn parse_csv_genres(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|genre| !genre.is_empty())
        .map(str::to_string)
        .collect()
}
