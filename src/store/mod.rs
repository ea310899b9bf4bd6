//! Metadata store for provisioned resources.
//!
//! Records are keyed by resource ID and never physically removed: deletion
//! sets `deleted_at`. Lookups only see active records, so an ID whose record
//! was soft deleted is provisioned afresh on the next create and the upsert
//! overwrites the old row. Secrets are never part of a record.

pub mod postgres;

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::messages::JsonMap;
use crate::resource::ResourceKind;

pub use postgres::PostgresStore;

/// Future returned by store operations.
pub type StoreFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Persisted metadata for one provisioned resource.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceRecord {
    /// Caller supplied resource identifier.
    pub id: String,
    /// Wire type name of the resource.
    pub resource_type: String,
    /// When the resource was provisioned.
    pub created_at: DateTime<Utc>,
    /// Last write to the record.
    pub updated_at: DateTime<Utc>,
    /// Soft delete marker; `None` while the resource is active.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Driver params supplied at creation.
    pub params: JsonMap,
    /// Non-secret provider outputs.
    pub data: JsonMap,
}

impl ResourceRecord {
    /// Creates an active record provisioned at `now`.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        kind: ResourceKind,
        params: JsonMap,
        data: JsonMap,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            resource_type: kind.wire_name().to_owned(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
            params,
            data,
        }
    }

    /// Kind of the stored resource, or `None` for types this driver no
    /// longer supports.
    #[must_use]
    pub fn kind(&self) -> Option<ResourceKind> {
        ResourceKind::from_wire(&self.resource_type)
    }

    /// Returns `true` until the record is soft deleted.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Errors raised by metadata stores.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum StoreError {
    /// No active record exists for the identifier.
    #[error("resource metadata with id {id} not found")]
    NotFound {
        /// Identifier looked up.
        id: String,
    },
    /// The database could not be reached during startup.
    #[error("unable to connect to database after {attempts} attempts: {message}")]
    Unavailable {
        /// Connection attempts made.
        attempts: u32,
        /// Last connection error.
        message: String,
    },
    /// A query failed.
    #[error("database error during {action}: {message}")]
    Database {
        /// Operation being performed.
        action: &'static str,
        /// Driver error message.
        message: String,
    },
}

/// Persistence operations required by the orchestrator.
pub trait MetadataStore: Send + Sync {
    /// Returns the active record for `id`, if any.
    fn find_active<'a>(&'a self, id: &'a str) -> StoreFuture<'a, Option<ResourceRecord>>;

    /// Inserts `record`, or replaces the row with the same ID atomically.
    /// A replaced row becomes active again.
    fn upsert<'a>(&'a self, record: &'a ResourceRecord) -> StoreFuture<'a, ()>;

    /// Marks the active record for `id` deleted at `deleted_at`.
    ///
    /// Fails with [`StoreError::NotFound`] when no active record was updated.
    fn soft_delete<'a>(&'a self, id: &'a str, deleted_at: DateTime<Utc>) -> StoreFuture<'a, ()>;
}
