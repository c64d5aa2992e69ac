//! Vendor use-case service.
//!
//! # Responsibility
//! - Validate caller input before the repository is touched.
//! - Turn a partial patch into a full, version-guarded update.
//!
//! # Invariants
//! - Validation failures never reach the repository.
//! - No retries happen here; conflict and timeout handling is the caller's.

use crate::filter::{validate_filters, FilterSpec};
use crate::model::vendor::{NewVendor, Vendor, VendorId, VendorPatch};
use crate::repo::vendor_repo::{RepoError, RepoResult, VendorPage, VendorRepository};

/// Use-case service over a vendor repository.
pub struct VendorService<R: VendorRepository> {
    repo: R,
}

impl<R: VendorRepository> VendorService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Validates and persists a new vendor.
    pub fn create_vendor(&self, input: &NewVendor) -> RepoResult<Vendor> {
        input.validate()?;
        self.repo.insert(input)
    }

    pub fn show_vendor(&self, id: VendorId) -> RepoResult<Vendor> {
        self.repo.get(id)
    }

    /// Applies `patch` on the current record and writes it back guarded by
    /// the version that was read.
    ///
    /// A concurrent writer between the read and the write surfaces as
    /// `RepoError::EditConflict`.
    pub fn update_vendor(&self, id: VendorId, patch: &VendorPatch) -> RepoResult<Vendor> {
        let current = self.repo.get(id)?;
        self.write_patch(&current, patch)
    }

    /// Like [`VendorService::update_vendor`], but fails with `EditConflict`
    /// unless the stored version equals `expected_version`.
    ///
    /// Lets a caller pin the update to the version it displayed to a user.
    pub fn update_vendor_expecting(
        &self,
        id: VendorId,
        expected_version: i32,
        patch: &VendorPatch,
    ) -> RepoResult<Vendor> {
        let current = self.repo.get(id)?;
        if current.version != expected_version {
            return Err(RepoError::EditConflict {
                id,
                version: expected_version,
            });
        }
        self.write_patch(&current, patch)
    }

    pub fn delete_vendor(&self, id: VendorId) -> RepoResult<()> {
        self.repo.delete(id)
    }

    /// Validates `filters` and lists matching vendors.
    pub fn list_vendors(
        &self,
        title: &str,
        genres: &[String],
        filters: &FilterSpec,
    ) -> RepoResult<VendorPage> {
        let validated = validate_filters(filters)?;
        self.repo.get_all(title, genres, &validated)
    }

    fn write_patch(&self, current: &Vendor, patch: &VendorPatch) -> RepoResult<Vendor> {
        let merged = patch.apply_to(current);
        merged.validate()?;
        self.repo.update(&merged)
    }
}
