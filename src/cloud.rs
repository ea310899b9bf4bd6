//! Capability interface over a cloud account and region.
//!
//! The orchestrator only talks to these traits. [`crate::aws`] implements
//! them against the AWS SDK and [`crate::fake`] implements them without any
//! external calls.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::credentials::CloudCredentials;

/// Future returned by provisioning operations.
pub type ProvisionFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, ProvisionError>> + Send + 'a>>;

/// Parameters for a new cache cluster.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CacheClusterRequest {
    /// Identifier for the new cluster.
    pub cluster_id: String,
    /// Node type such as `cache.t3.micro`.
    pub node_type: String,
    /// Preferred availability zone for the single node.
    pub availability_zone: String,
}

/// Errors raised by provisioning clients.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ProvisionError {
    /// The provider reports the resource name as taken.
    #[error("{resource} \"{name}\" already exists")]
    AlreadyExists {
        /// Human readable resource description.
        resource: &'static str,
        /// Name that collided.
        name: String,
    },
    /// Readiness was not observed within the configured budget.
    #[error("cache cluster \"{cluster_id}\" not available after {budget_secs}s")]
    Timeout {
        /// Cluster that never became ready.
        cluster_id: String,
        /// Configured budget in seconds.
        budget_secs: u64,
    },
    /// The client for the account and region could not be built.
    #[error("creating cloud session: {message}")]
    Session {
        /// Reason reported while building the session.
        message: String,
    },
    /// The provider rejected an operation.
    #[error("{action}: {message}")]
    Provider {
        /// Operation that failed, for example `delete bucket`.
        action: &'static str,
        /// Message returned by the provider SDK.
        message: String,
    },
}

/// Operations available on one cloud account in one region.
pub trait Provisioner: Send + Sync {
    /// Creates a bucket and returns the location reported by the provider.
    fn create_bucket<'a>(&'a self, name: &'a str) -> ProvisionFuture<'a, String>;

    /// Deletes a bucket. The bucket is not emptied first.
    fn delete_bucket<'a>(&'a self, name: &'a str) -> ProvisionFuture<'a, ()>;

    /// Creates a cache cluster and waits for it to publish an endpoint host.
    fn create_cache_cluster<'a>(
        &'a self,
        request: &'a CacheClusterRequest,
    ) -> ProvisionFuture<'a, String>;

    /// Deletes a cache cluster.
    fn delete_cache_cluster<'a>(&'a self, cluster_id: &'a str) -> ProvisionFuture<'a, ()>;
}

/// Builds a [`Provisioner`] for request scoped credentials and a region.
pub trait ProvisionerFactory: Send + Sync {
    /// Client type produced by this factory.
    type Provisioner: Provisioner;

    /// Connects to the account identified by `credentials` in `region`.
    fn connect<'a>(
        &'a self,
        credentials: &'a CloudCredentials,
        region: &'a str,
    ) -> ProvisionFuture<'a, Self::Provisioner>;
}
