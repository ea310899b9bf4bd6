//! Test support utilities shared across unit and integration tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::cloud::{
    CacheClusterRequest, ProvisionError, ProvisionFuture, Provisioner, ProvisionerFactory,
};
use crate::credentials::CloudCredentials;
use crate::store::{MetadataStore, ResourceRecord, StoreError, StoreFuture};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory metadata store with the same semantics as the database.
///
/// Clones share state so tests can inspect what the orchestrator wrote.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    records: Arc<Mutex<HashMap<String, ResourceRecord>>>,
    writes: Arc<Mutex<usize>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored record for `id`, including soft deleted ones.
    #[must_use]
    pub fn record(&self, id: &str) -> Option<ResourceRecord> {
        lock(&self.records).get(id).cloned()
    }

    /// Number of successful upserts and soft deletes performed.
    #[must_use]
    pub fn write_count(&self) -> usize {
        *lock(&self.writes)
    }

    /// Seeds a record directly, bypassing the write counter.
    pub fn insert(&self, record: ResourceRecord) {
        lock(&self.records).insert(record.id.clone(), record);
    }

    /// Makes every subsequent write fail with a database error.
    pub fn fail_writes(&self) {
        *lock(&self.fail_writes) = true;
    }

    fn check_writable(&self, action: &'static str) -> Result<(), StoreError> {
        if *lock(&self.fail_writes) {
            return Err(StoreError::Database {
                action,
                message: String::from("simulated write failure"),
            });
        }
        Ok(())
    }
}

impl MetadataStore for InMemoryStore {
    fn find_active<'a>(&'a self, id: &'a str) -> StoreFuture<'a, Option<ResourceRecord>> {
        Box::pin(async move {
            Ok(lock(&self.records)
                .get(id)
                .filter(|record| record.is_active())
                .cloned())
        })
    }

    fn upsert<'a>(&'a self, record: &'a ResourceRecord) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.check_writable("upsert resource_metadata")?;
            let mut stored = record.clone();
            stored.deleted_at = None;
            lock(&self.records).insert(stored.id.clone(), stored);
            *lock(&self.writes) += 1;
            Ok(())
        })
    }

    fn soft_delete<'a>(&'a self, id: &'a str, deleted_at: DateTime<Utc>) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.check_writable("soft delete resource_metadata")?;
            let mut records = lock(&self.records);
            let Some(record) = records.get_mut(id).filter(|record| record.is_active()) else {
                return Err(StoreError::NotFound { id: id.to_owned() });
            };
            record.deleted_at = Some(deleted_at);
            record.updated_at = deleted_at;
            drop(records);
            *lock(&self.writes) += 1;
            Ok(())
        })
    }
}

/// Provider call recorded by [`RecordingProvisioner`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProvisionCall {
    /// A client was built for the region.
    Connect {
        /// Access key identifier used.
        access_key_id: String,
        /// Region requested.
        region: String,
    },
    /// `create_bucket` with the generated name.
    CreateBucket(String),
    /// `delete_bucket` with the stored name.
    DeleteBucket(String),
    /// `create_cache_cluster` with the full request.
    CreateCacheCluster(CacheClusterRequest),
    /// `delete_cache_cluster` with the stored cluster ID.
    DeleteCacheCluster(String),
}

#[derive(Debug, Default)]
struct RecordingState {
    calls: Vec<ProvisionCall>,
    create_failure: Option<ProvisionError>,
    delete_failure: Option<ProvisionError>,
}

/// Provisioner factory that records every call and behaves like the fake
/// client unless a failure is scripted.
///
/// Clones share state.
#[derive(Clone, Debug, Default)]
pub struct RecordingProvisionerFactory {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingProvisionerFactory {
    /// Creates a factory with no scripted failures.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ProvisionCall> {
        lock(&self.state).calls.clone()
    }

    /// Number of create operations recorded.
    #[must_use]
    pub fn create_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| {
                matches!(
                    call,
                    ProvisionCall::CreateBucket(_) | ProvisionCall::CreateCacheCluster(_)
                )
            })
            .count()
    }

    /// Makes create operations fail with `error`.
    pub fn fail_creates_with(&self, error: ProvisionError) {
        lock(&self.state).create_failure = Some(error);
    }

    /// Makes delete operations fail with `error`.
    pub fn fail_deletes_with(&self, error: ProvisionError) {
        lock(&self.state).delete_failure = Some(error);
    }
}

impl ProvisionerFactory for RecordingProvisionerFactory {
    type Provisioner = RecordingProvisioner;

    fn connect<'a>(
        &'a self,
        credentials: &'a CloudCredentials,
        region: &'a str,
    ) -> ProvisionFuture<'a, RecordingProvisioner> {
        Box::pin(async move {
            lock(&self.state).calls.push(ProvisionCall::Connect {
                access_key_id: credentials.access_key_id().to_owned(),
                region: region.to_owned(),
            });
            Ok(RecordingProvisioner {
                state: Arc::clone(&self.state),
                region: region.to_owned(),
            })
        })
    }
}

/// Provisioner produced by [`RecordingProvisionerFactory`].
#[derive(Clone, Debug)]
pub struct RecordingProvisioner {
    state: Arc<Mutex<RecordingState>>,
    region: String,
}

impl RecordingProvisioner {
    fn record_create(&self, call: ProvisionCall) -> Result<(), ProvisionError> {
        let mut state = lock(&self.state);
        state.calls.push(call);
        state.create_failure.clone().map_or(Ok(()), Err)
    }

    fn record_delete(&self, call: ProvisionCall) -> Result<(), ProvisionError> {
        let mut state = lock(&self.state);
        state.calls.push(call);
        state.delete_failure.clone().map_or(Ok(()), Err)
    }
}

impl Provisioner for RecordingProvisioner {
    fn create_bucket<'a>(&'a self, name: &'a str) -> ProvisionFuture<'a, String> {
        Box::pin(async move {
            self.record_create(ProvisionCall::CreateBucket(name.to_owned()))?;
            Ok(self.region.clone())
        })
    }

    fn delete_bucket<'a>(&'a self, name: &'a str) -> ProvisionFuture<'a, ()> {
        Box::pin(async move { self.record_delete(ProvisionCall::DeleteBucket(name.to_owned())) })
    }

    fn create_cache_cluster<'a>(
        &'a self,
        request: &'a CacheClusterRequest,
    ) -> ProvisionFuture<'a, String> {
        Box::pin(async move {
            self.record_create(ProvisionCall::CreateCacheCluster(request.clone()))?;
            Ok(format!("{}.{}", request.cluster_id, self.region))
        })
    }

    fn delete_cache_cluster<'a>(&'a self, cluster_id: &'a str) -> ProvisionFuture<'a, ()> {
        Box::pin(async move {
            self.record_delete(ProvisionCall::DeleteCacheCluster(cluster_id.to_owned()))
        })
    }
}
