//! CLI argument definitions.
//!
//! Commands:
//! - vendorstore create --title <t> --year <y> --runtime "<n> mins" --genres <a,b>
//! - vendorstore show <id>
//! - vendorstore update <id> [--title ..] [--year ..] [--runtime ..] [--genres ..] [--expect-version ..]
//! - vendorstore delete <id>
//! - vendorstore list [--title ..] [--genres ..] [--page ..] [--page-size ..] [--sort ..]

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vendorstore_core::{Runtime, VendorId};

/// Versioned vendor store.
#[derive(Parser, Debug)]
#[command(name = "vendorstore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Database file; overrides VENDORSTORE_DB_PATH
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a vendor
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        year: i32,
        /// Runtime such as "102 mins"
        #[arg(long)]
        runtime: Runtime,
        /// Comma-separated genre list
        #[arg(long)]
        genres: String,
    },

    /// Show one vendor
    Show { id: VendorId },

    /// Change some fields of a vendor
    Update {
        id: VendorId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        runtime: Option<Runtime>,
        #[arg(long)]
        genres: Option<String>,
        /// Fail with a conflict unless the stored version matches
        #[arg(long)]
        expect_version: Option<i32>,
    },

    /// Delete a vendor
    Delete { id: VendorId },

    /// List vendors with optional title search and genre filter
    List {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long)]
        genres: Option<String>,
        #[arg(long, default_value_t = vendorstore_core::filter::DEFAULT_PAGE)]
        page: i64,
        #[arg(long, default_value_t = vendorstore_core::filter::DEFAULT_PAGE_SIZE)]
        page_size: i64,
        /// One of id, title, year, runtime; prefix with - for descending
        #[arg(long, default_value = vendorstore_core::filter::DEFAULT_SORT)]
        sort: String,
    },
}
