//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the vendor store.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Store code must not read/write vendor rows before migrations succeed.
//! - Busy and interrupt failures are classified as [`DeadlineExceeded`].
//! - Every returned connection carries a busy timeout equal to the
//!   configured operation deadline.

use rusqlite::ffi::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, open_db_with_config};

pub type DbResult<T> = Result<T, DbError>;

/// Storage failure below the repository layer.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was migrated by a newer build; it is left untouched.
    SchemaTooNew { found: u32, supported: u32 },
}

/// Ways a SQLite call can run out of operation deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineExceeded {
    /// Busy timeout elapsed while another connection held the lock.
    LockWait,
    /// The progress handler interrupted a running statement.
    Interrupted,
}

impl DbError {
    pub fn deadline_exceeded(&self) -> Option<DeadlineExceeded> {
        match self {
            Self::Sqlite(err) => deadline_exceeded(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

/// Classifies `err` against the deadline mechanisms armed on a connection.
pub fn deadline_exceeded(err: &rusqlite::Error) -> Option<DeadlineExceeded> {
    match err.sqlite_error_code()? {
        ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => Some(DeadlineExceeded::LockWait),
        ErrorCode::OperationInterrupted => Some(DeadlineExceeded::Interrupted),
        _ => None,
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "vendor store schema v{found} was written by a newer build (this build knows up to v{supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        if let Self::Sqlite(err) = self {
            return Some(err);
        }
        None
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
