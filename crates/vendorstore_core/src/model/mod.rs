//! Vendor domain model.
//!
//! # Responsibility
//! - Define the canonical vendor record and its user-settable shapes.
//! - Own field-level validation rules shared by every write path.
//!
//! # Invariants
//! - `id`, `created_at` are assigned by storage once and never change.
//! - `version` starts at 1 and only storage increments it.
//! - Persisted `genres` are non-empty and duplicate-free.

pub mod validation;
pub mod vendor;
