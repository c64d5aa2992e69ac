//! Versioned vendor store.
//! Owns the business invariants: optimistic concurrency on updates,
//! safelisted sorting, and deterministic paged search.

pub mod config;
pub mod db;
pub mod filter;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use config::{ConfigError, StoreConfig, DEFAULT_OP_TIMEOUT};
pub use filter::metadata::{calculate_metadata, Metadata};
pub use filter::{
    parse_csv_genres, validate_filters, FilterSpec, SortColumn, SortDirection, SortKey,
    SortSafelist, ValidatedFilters,
};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::validation::ValidationErrors;
pub use model::vendor::{NewVendor, Runtime, RuntimeParseError, Vendor, VendorId, VendorPatch};
pub use repo::vendor_repo::{
    RepoError, RepoResult, SqliteVendorRepository, VendorPage, VendorRepository,
};
pub use search::{
    Fts5TitleSearch, JsonGenreContainment, LikeTitleSearch, SetContainment, SqlPredicate,
    TextSearchable,
};
pub use service::vendor_service::VendorService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
