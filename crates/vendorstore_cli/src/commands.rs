//! Command dispatch and JSON envelopes.

use crate::args::{Cli, Command};
use serde_json::{json, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use vendorstore_core::db::{open_db_with_config, DbError};
use vendorstore_core::{
    init_logging_from_config, parse_csv_genres, ConfigError, FilterSpec, NewVendor, RepoError,
    SqliteVendorRepository, StoreConfig, VendorPatch, VendorService,
};

#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    Logging(String),
    Db(DbError),
    Repo(RepoError),
}

impl CliError {
    /// Body of the `{"error": ...}` envelope.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Repo(RepoError::Validation(errors)) => json!(errors),
            other => json!(other.to_string()),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(err) => write!(f, "logging init failed: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Runs one command and returns the success envelope.
pub fn run(cli: Cli) -> Result<Value, CliError> {
    let mut config = StoreConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    init_logging_from_config(&config).map_err(CliError::Logging)?;

    let conn = open_db_with_config(&config)?;
    let repo = SqliteVendorRepository::try_new(&conn)?.with_op_timeout(config.op_timeout);
    let service = VendorService::new(repo);

    let envelope = match cli.command {
        Command::Create {
            title,
            year,
            runtime,
            genres,
        } => {
            let input = NewVendor::new(title, year, runtime, parse_csv_genres(&genres));
            json!({ "vendor": service.create_vendor(&input)? })
        }
        Command::Show { id } => json!({ "vendor": service.show_vendor(id)? }),
        Command::Update {
            id,
            title,
            year,
            runtime,
            genres,
            expect_version,
        } => {
            let patch = VendorPatch {
                title,
                year,
                runtime,
                genres: genres.as_deref().map(parse_csv_genres),
            };
            let vendor = match expect_version {
                Some(version) => service.update_vendor_expecting(id, version, &patch)?,
                None => service.update_vendor(id, &patch)?,
            };
            json!({ "vendor": vendor })
        }
        Command::Delete { id } => {
            service.delete_vendor(id)?;
            json!({ "message": "vendor successfully deleted" })
        }
        Command::List {
            title,
            genres,
            page,
            page_size,
            sort,
        } => {
            let genres = genres.as_deref().map(parse_csv_genres).unwrap_or_default();
            let filters = FilterSpec {
                page,
                page_size,
                sort,
                ..FilterSpec::default()
            };
            json!(service.list_vendors(&title, &genres, &filters)?)
        }
    };

    Ok(envelope)
}
