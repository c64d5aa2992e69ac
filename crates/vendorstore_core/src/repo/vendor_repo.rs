//! Vendor repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert/get/update/delete/search over canonical `vendors` storage.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `update` is one conditional statement: it applies only when both `id`
//!   and `version` match, and bumps `version` by exactly 1 when it does.
//! - Zero rows affected by `update` is always `EditConflict`, whether the row
//!   was changed or deleted concurrently.
//! - Every operation runs under the repository deadline.
//! - `ORDER BY` text is built only from [`SortKey`] values.

use crate::config::DEFAULT_OP_TIMEOUT;
use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{deadline_exceeded, DbError, DeadlineExceeded};
use crate::filter::metadata::{calculate_metadata, Metadata};
use crate::filter::{SortKey, ValidatedFilters};
use crate::model::validation::ValidationErrors;
use crate::model::vendor::{NewVendor, Runtime, Vendor, VendorId};
use crate::search::{Fts5TitleSearch, JsonGenreContainment, SetContainment, TextSearchable};
use log::{debug, error, warn};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

const VENDOR_SELECT_SQL: &str = "SELECT
    vendors.id,
    vendors.created_at,
    vendors.title,
    vendors.year,
    vendors.runtime,
    vendors.genres,
    vendors.version
FROM vendors";

/// SQLite VM steps between deadline checks.
const DEADLINE_CHECK_STEPS: i32 = 1_000;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for vendor persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Field-tagged input problems; raised before any SQL runs.
    Validation(ValidationErrors),
    /// No vendor has this id, or the id is below 1.
    NotFound(VendorId),
    /// The version-guarded update matched no row.
    EditConflict { id: VendorId, version: i32 },
    /// The store did not answer within the operation deadline.
    Timeout(String),
    Db(DbError),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl RepoError {
    /// Whether retrying the same call (with fresh data for conflicts) may
    /// succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::EditConflict { .. })
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::EditConflict { .. } => "edit_conflict",
            Self::Timeout(_) => "timeout",
            Self::Db(_) => "db",
            Self::InvalidData(_) => "invalid_data",
            Self::UninitializedConnection { .. } => "uninitialized_connection",
            Self::MissingRequiredTable(_) => "missing_table",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "vendor not found: {id}"),
            Self::EditConflict { id, version } => write!(
                f,
                "edit conflict on vendor {id}: version {version} is no longer current"
            ),
            Self::Timeout(message) => write!(f, "store operation timed out: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted vendor data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table missing: {table}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for RepoError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => err.into(),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match deadline_exceeded(&value) {
            Some(DeadlineExceeded::LockWait) => {
                Self::Timeout(format!("backing store busy: {value}"))
            }
            Some(DeadlineExceeded::Interrupted) => {
                Self::Timeout("operation deadline exceeded".to_string())
            }
            None => Self::Db(DbError::Sqlite(value)),
        }
    }
}

/// One page of a vendor listing plus metadata for the full match set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorPage {
    pub vendors: Vec<Vendor>,
    pub metadata: Metadata,
}

/// Repository interface for vendor persistence.
pub trait VendorRepository {
    /// Persists a new vendor and returns it with `id`, `created_at` and
    /// `version = 1` assigned.
    fn insert(&self, vendor: &NewVendor) -> RepoResult<Vendor>;
    fn get(&self, id: VendorId) -> RepoResult<Vendor>;
    /// Replaces all user-settable fields if `vendor.version` is still current.
    fn update(&self, vendor: &Vendor) -> RepoResult<Vendor>;
    fn delete(&self, id: VendorId) -> RepoResult<()>;
    /// Lists vendors matching `title` and containing all of `genres`.
    fn get_all(
        &self,
        title: &str,
        genres: &[String],
        filters: &ValidatedFilters,
    ) -> RepoResult<VendorPage>;
}

/// SQLite-backed vendor repository.
///
/// Borrows its connection; each thread needs its own connection and
/// repository. Cross-connection write safety comes from SQLite.
pub struct SqliteVendorRepository<'conn, T = Fts5TitleSearch, S = JsonGenreContainment> {
    conn: &'conn Connection,
    text_search: T,
    containment: S,
    op_timeout: Duration,
}

impl<'conn> SqliteVendorRepository<'conn> {
    /// Constructs a repository with the FTS5 title index and JSON genre
    /// containment.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Self::with_capabilities(conn, Fts5TitleSearch, JsonGenreContainment)
    }
}

impl<'conn, T, S> SqliteVendorRepository<'conn, T, S>
where
    T: TextSearchable,
    S: SetContainment,
{
    /// Constructs a repository from a migrated connection and explicit search
    /// capabilities.
    pub fn with_capabilities(
        conn: &'conn Connection,
        text_search: T,
        containment: S,
    ) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self {
            conn,
            text_search,
            containment,
            op_timeout: DEFAULT_OP_TIMEOUT,
        })
    }

    /// Overrides the per-operation deadline.
    pub fn with_op_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    pub fn op_timeout(&self) -> Duration {
        self.op_timeout
    }

    /// Runs `body` under the repository deadline and logs the outcome.
    ///
    /// The deadline bounds lock waits (busy timeout) and statement execution
    /// (progress handler interrupt).
    fn run<R>(&self, event: &'static str, body: impl FnOnce(&Connection) -> RepoResult<R>) -> RepoResult<R> {
        let started_at = Instant::now();
        let deadline = started_at + self.op_timeout;
        self.conn
            .progress_handler(DEADLINE_CHECK_STEPS, Some(move || Instant::now() >= deadline));
        let result = self
            .conn
            .busy_timeout(self.op_timeout)
            .map_err(RepoError::from)
            .and_then(|()| body(self.conn));
        self.conn
            .progress_handler(DEADLINE_CHECK_STEPS, None::<fn() -> bool>);

        let duration_ms = started_at.elapsed().as_millis();
        match &result {
            Ok(_) => debug!("event={event} module=repo status=ok duration_ms={duration_ms}"),
            Err(err @ (RepoError::NotFound(_) | RepoError::Validation(_))) => debug!(
                "event={event} module=repo status=rejected duration_ms={duration_ms} error_code={}",
                err.code()
            ),
            Err(err @ RepoError::EditConflict { .. }) => warn!(
                "event={event} module=repo status=conflict duration_ms={duration_ms} error_code={}",
                err.code()
            ),
            Err(err) => error!(
                "event={event} module=repo status=error duration_ms={duration_ms} error_code={} error={err}",
                err.code()
            ),
        }
        result
    }
}

impl<T, S> VendorRepository for SqliteVendorRepository<'_, T, S>
where
    T: TextSearchable,
    S: SetContainment,
{
    fn insert(&self, vendor: &NewVendor) -> RepoResult<Vendor> {
        vendor.validate()?;
        let genres = encode_genres(&vendor.genres)?;

        self.run("vendor_insert", |conn| {
            let tx = begin_write(conn)?;
            let (id, created_at, version): (VendorId, i64, i32) = tx.query_row(
                "INSERT INTO vendors (title, year, runtime, genres)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING id, created_at, version;",
                params![
                    vendor.title.as_str(),
                    vendor.year,
                    vendor.runtime.minutes(),
                    genres.as_str(),
                ],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;
            tx.commit()?;

            Ok(Vendor {
                id,
                created_at,
                title: vendor.title.clone(),
                year: vendor.year,
                runtime: vendor.runtime,
                genres: vendor.genres.clone(),
                version,
            })
        })
    }

    fn get(&self, id: VendorId) -> RepoResult<Vendor> {
        if id < 1 {
            return Err(RepoError::NotFound(id));
        }

        self.run("vendor_get", |conn| {
            let mut stmt = conn.prepare(&format!("{VENDOR_SELECT_SQL} WHERE vendors.id = ?1;"))?;
            let mut rows = stmt.query([id])?;
            if let Some(row) = rows.next()? {
                return parse_vendor_row(row);
            }
            Err(RepoError::NotFound(id))
        })
    }

    fn update(&self, vendor: &Vendor) -> RepoResult<Vendor> {
        vendor.validate()?;
        let genres = encode_genres(&vendor.genres)?;

        self.run("vendor_update", |conn| {
            let tx = begin_write(conn)?;
            let new_version: Option<i32> = tx
                .query_row(
                    "UPDATE vendors
                     SET
                        title = ?1,
                        year = ?2,
                        runtime = ?3,
                        genres = ?4,
                        version = version + 1
                     WHERE id = ?5
                       AND version = ?6
                     RETURNING version;",
                    params![
                        vendor.title.as_str(),
                        vendor.year,
                        vendor.runtime.minutes(),
                        genres.as_str(),
                        vendor.id,
                        vendor.version,
                    ],
                    |row| row.get(0),
                )
                .optional()?;
            tx.commit()?;

            match new_version {
                Some(version) => Ok(Vendor {
                    version,
                    ..vendor.clone()
                }),
                None => Err(RepoError::EditConflict {
                    id: vendor.id,
                    version: vendor.version,
                }),
            }
        })
    }

    fn delete(&self, id: VendorId) -> RepoResult<()> {
        if id < 1 {
            return Err(RepoError::NotFound(id));
        }

        self.run("vendor_delete", |conn| {
            let tx = begin_write(conn)?;
            let changed = tx.execute("DELETE FROM vendors WHERE id = ?1;", [id])?;
            tx.commit()?;
            if changed == 0 {
                return Err(RepoError::NotFound(id));
            }
            Ok(())
        })
    }

    fn get_all(
        &self,
        title: &str,
        genres: &[String],
        filters: &ValidatedFilters,
    ) -> RepoResult<VendorPage> {
        let mut where_sql = String::from(" WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        let predicates = [
            self.text_search.title_predicate(title),
            self.containment.genres_predicate(genres),
        ];
        for predicate in predicates.into_iter().flatten() {
            where_sql.push_str(" AND ");
            where_sql.push_str(&predicate.sql);
            bind_values.extend(predicate.binds);
        }

        let count_sql = format!("SELECT COUNT(*) FROM vendors{where_sql};");
        let page_sql = format!(
            "{VENDOR_SELECT_SQL}{where_sql} {} LIMIT ? OFFSET ?;",
            order_by_clause(filters.sort())
        );

        self.run("vendor_get_all", |conn| {
            // Count and page must see the same snapshot.
            let tx = conn.unchecked_transaction()?;

            let total_records: i64 =
                tx.query_row(&count_sql, params_from_iter(bind_values.iter()), |row| {
                    row.get(0)
                })?;

            let mut page_binds = bind_values.clone();
            page_binds.push(Value::Integer(filters.limit()));
            page_binds.push(Value::Integer(filters.offset()));

            let mut vendors = Vec::new();
            {
                let mut stmt = tx.prepare(&page_sql)?;
                let mut rows = stmt.query(params_from_iter(page_binds))?;
                while let Some(row) = rows.next()? {
                    vendors.push(parse_vendor_row(row)?);
                }
            }
            tx.commit()?;

            Ok(VendorPage {
                vendors,
                metadata: calculate_metadata(total_records, filters.page(), filters.page_size()),
            })
        })
    }
}

/// Begins an `IMMEDIATE` transaction. Waiting for the write lock is bounded
/// by the connection busy timeout.
fn begin_write(conn: &Connection) -> RepoResult<Transaction<'_>> {
    Ok(Transaction::new_unchecked(
        conn,
        TransactionBehavior::Immediate,
    )?)
}

/// `ORDER BY <column> <direction>, id ASC`; the `id` tie-break keeps pages
/// disjoint when sort values repeat.
fn order_by_clause(sort: SortKey) -> String {
    format!(
        "ORDER BY vendors.{} {}, vendors.id ASC",
        sort.column.as_sql(),
        sort.direction.as_sql()
    )
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table_exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'vendors');",
        [],
        |row| row.get(0),
    )?;
    if !table_exists {
        return Err(RepoError::MissingRequiredTable("vendors"));
    }

    Ok(())
}

fn parse_vendor_row(row: &Row<'_>) -> RepoResult<Vendor> {
    let id: VendorId = row.get("id")?;
    let genres_text: String = row.get("genres")?;
    let genres = serde_json::from_str::<Vec<String>>(&genres_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid genres array for vendor {id}: {err}"))
    })?;

    Ok(Vendor {
        id,
        created_at: row.get("created_at")?,
        title: row.get("title")?,
        year: row.get("year")?,
        runtime: Runtime(row.get("runtime")?),
        genres,
        version: row.get("version")?,
    })
}

fn encode_genres(genres: &[String]) -> RepoResult<String> {
    serde_json::to_string(genres)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode genres: {err}")))
}

#[cfg(test)]
mod tests {
    use super::{order_by_clause, RepoError};
    use crate::filter::{SortColumn, SortKey};
    use crate::model::validation::ValidationErrors;

    #[test]
    fn order_by_always_ends_with_id_tie_break() {
        assert_eq!(
            order_by_clause(SortKey::desc(SortColumn::Title)),
            "ORDER BY vendors.title DESC, vendors.id ASC"
        );
        assert_eq!(
            order_by_clause(SortKey::asc(SortColumn::Runtime)),
            "ORDER BY vendors.runtime ASC, vendors.id ASC"
        );
    }

    #[test]
    fn retryable_errors_are_timeout_and_conflict() {
        assert!(RepoError::Timeout("busy".to_string()).is_retryable());
        assert!(RepoError::EditConflict { id: 1, version: 1 }.is_retryable());
        assert!(!RepoError::NotFound(1).is_retryable());
        assert!(!RepoError::Validation(ValidationErrors::new()).is_retryable());
    }
}
