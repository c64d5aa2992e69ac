//! Vendor record, runtime codec and partial-update patch.
//!
//! # Invariants
//! - `Vendor::version` is a compare-and-swap token; callers never set it.
//! - `VendorPatch::apply_to` never touches `id`, `created_at` or `version`.

use crate::model::validation::ValidationErrors;
use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Server-assigned vendor identifier. Valid ids are `>= 1`.
pub type VendorId = i64;

pub const MIN_YEAR: i32 = 1888;
pub const MIN_GENRES: usize = 1;
pub const MAX_GENRES: usize = 5;

static RUNTIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+) mins$").expect("valid runtime regex"));

/// Duration in whole minutes.
///
/// Wire form is the string `"<n> mins"`, e.g. `"102 mins"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Runtime(pub i32);

impl Runtime {
    pub fn minutes(self) -> i32 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeParseError {
    InvalidFormat(String),
}

impl Display for RuntimeParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat(value) => {
                write!(f, "invalid runtime format `{value}`; expected `<n> mins`")
            }
        }
    }
}

impl Error for RuntimeParseError {}

impl Display for Runtime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} mins", self.0)
    }
}

impl FromStr for Runtime {
    type Err = RuntimeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || RuntimeParseError::InvalidFormat(value.to_string());
        let captures = RUNTIME_RE.captures(value).ok_or_else(invalid)?;
        let minutes = captures[1].parse::<i32>().map_err(|_| invalid())?;
        Ok(Self(minutes))
    }
}

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Canonical persisted vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    /// Unix epoch milliseconds, assigned by storage at insert.
    #[serde(skip)]
    pub created_at: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "is_zero_year")]
    pub year: i32,
    #[serde(default, skip_serializing_if = "Runtime::is_zero")]
    pub runtime: Runtime,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    pub version: i32,
}

fn is_zero_year(year: &i32) -> bool {
    *year == 0
}

impl Vendor {
    /// Validates user-settable fields against the current calendar year.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.validate_at(current_year())
    }

    pub fn validate_at(&self, current_year: i32) -> Result<(), ValidationErrors> {
        validate_fields(
            &self.title,
            self.year,
            self.runtime,
            &self.genres,
            current_year,
        )
    }
}

/// User-settable fields for a vendor that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVendor {
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Vec<String>,
}

impl NewVendor {
    pub fn new(
        title: impl Into<String>,
        year: i32,
        runtime: Runtime,
        genres: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            title: title.into(),
            year,
            runtime,
            genres: genres.into_iter().map(Into::into).collect(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.validate_at(current_year())
    }

    pub fn validate_at(&self, current_year: i32) -> Result<(), ValidationErrors> {
        validate_fields(
            &self.title,
            self.year,
            self.runtime,
            &self.genres,
            current_year,
        )
    }
}

/// Partial update input: `None` leaves the stored value as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub runtime: Option<Runtime>,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
}

impl VendorPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.year.is_none() && self.runtime.is_none() && self.genres.is_none()
    }

    /// Returns `vendor` with every provided field replaced.
    ///
    /// Pure merge: identity and concurrency fields are carried over, so the
    /// result can be handed straight to a version-guarded update.
    pub fn apply_to(&self, vendor: &Vendor) -> Vendor {
        Vendor {
            id: vendor.id,
            created_at: vendor.created_at,
            title: self.title.clone().unwrap_or_else(|| vendor.title.clone()),
            year: self.year.unwrap_or(vendor.year),
            runtime: self.runtime.unwrap_or(vendor.runtime),
            genres: self.genres.clone().unwrap_or_else(|| vendor.genres.clone()),
            version: vendor.version,
        }
    }
}

pub fn current_year() -> i32 {
    Utc::now().year()
}

fn validate_fields(
    title: &str,
    year: i32,
    runtime: Runtime,
    genres: &[String],
    current_year: i32,
) -> Result<(), ValidationErrors> {
    let mut v = ValidationErrors::new();

    v.check(!title.trim().is_empty(), "title", "must be provided");

    v.check(year != 0, "year", "must be provided");
    v.check(
        year >= MIN_YEAR,
        "year",
        "must be greater than or equal to 1888",
    );
    v.check(year <= current_year, "year", "must not be in the future");

    v.check(!runtime.is_zero(), "runtime", "must be provided");
    v.check(runtime.0 > 0, "runtime", "must be a positive integer");

    v.check(
        genres.len() >= MIN_GENRES,
        "genres",
        "must contain at least 1 genre",
    );
    v.check(
        genres.len() <= MAX_GENRES,
        "genres",
        "must not contain more than 5 genres",
    );
    v.check(
        genres.iter().all(|genre| !genre.trim().is_empty()),
        "genres",
        "must not contain empty values",
    );
    let distinct: HashSet<&str> = genres.iter().map(String::as_str).collect();
    v.check(
        distinct.len() == genres.len(),
        "genres",
        "must not contain duplicate values",
    );

    v.into_result()
}
