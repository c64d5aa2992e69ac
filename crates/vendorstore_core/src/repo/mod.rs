//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the vendor data-access contract.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Write paths validate input before any SQL mutation.
//! - Semantic outcomes (`NotFound`, `EditConflict`, `Timeout`) are distinct
//!   error variants, separate from transport failures.

pub mod vendor_repo;
