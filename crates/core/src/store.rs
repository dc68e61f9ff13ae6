//! Property persistence contract.
//!
//! The reconciliation service only talks to storage through
//! [`PropertyStore`]; the PostgreSQL implementation lives in `campos-db`.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::property::{NewProperty, OperationType, Property};
use crate::site::SitemapEntry;
use crate::types::DbId;

/// Default page size for listings.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size for listings.
pub const MAX_PAGE_SIZE: i64 = 50;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Identifier columns backed by a unique constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Ref,
    Slug,
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ref => f.write_str("ref"),
            Self::Slug => f.write_str("slug"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A write collided with an existing `ref` or `slug`.
    #[error("Duplicate value violates unique {0}")]
    UniqueViolation(UniqueField),

    /// The record was removed between read and write.
    #[error("Property {0} no longer exists")]
    Missing(DbId),

    /// The store could not be reached or failed unexpectedly.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(field) => {
                CoreError::Conflict(format!("A property with this {field} already exists"))
            }
            StoreError::Missing(id) => CoreError::property_not_found(id),
            StoreError::Unavailable(msg) => CoreError::StoreUnavailable(msg),
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Listing filter. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFilter {
    /// Case-insensitive substring matched against ref, title, location and
    /// description.
    pub search: Option<String>,
    pub operation_type: Option<OperationType>,
}

/// A bounded, 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// Clamp raw values: `page >= 1`, `1 <= page_size <= MAX_PAGE_SIZE`.
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Persistence operations the reconciliation service depends on.
///
/// Implementations must enforce uniqueness of `ref` and `slug` (NULL slugs
/// never collide) and report collisions as [`StoreError::UniqueViolation`].
#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// One page of properties matching `filter`, newest first.
    async fn find(
        &self,
        filter: &PropertyFilter,
        page: PageRequest,
    ) -> Result<Vec<Property>, StoreError>;

    async fn count(&self, filter: &PropertyFilter) -> Result<i64, StoreError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<Property>, StoreError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Property>, StoreError>;

    async fn ref_exists(&self, ref_code: &str) -> Result<bool, StoreError>;

    /// Whether `slug` is held by any record other than `exclude_id`.
    async fn slug_exists(&self, slug: &str, exclude_id: Option<DbId>) -> Result<bool, StoreError>;

    async fn create(&self, input: &NewProperty) -> Result<Property, StoreError>;

    /// Overwrite every mutable column of an existing record.
    async fn save(&self, property: &Property) -> Result<Property, StoreError>;

    /// Remove a record. Returns `false` if it did not exist.
    async fn delete(&self, id: DbId) -> Result<bool, StoreError>;

    /// Id, slug and last modification of every record, most recently
    /// updated first.
    async fn sitemap_entries(&self) -> Result<Vec<SitemapEntry>, StoreError>;

    /// Every record, oldest first. Used by maintenance jobs.
    async fn list_all(&self) -> Result<Vec<Property>, StoreError>;
}
