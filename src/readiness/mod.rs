//! Bounded polling for asynchronously provisioned cache clusters.
//!
//! Cluster creation upstream only starts provisioning. The poller sleeps a
//! fixed interval, queries the cluster, and repeats until the cluster and
//! its first node are both `available` and the node publishes an endpoint
//! address. The attempt budget is the configured timeout divided by the
//! interval; once exhausted the wait fails with
//! [`ProvisionError::Timeout`].

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use crate::cloud::{ProvisionError, ProvisionFuture};

/// Fixed delay between status queries.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

const AVAILABLE: &str = "available";

/// Status snapshot of one cache node.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CacheNodeStatus {
    /// Node status reported by the provider.
    pub status: Option<String>,
    /// Endpoint address, once published.
    pub endpoint_address: Option<String>,
}

/// Status snapshot of a cache cluster.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ClusterStatus {
    /// Cluster status reported by the provider.
    pub status: Option<String>,
    /// Nodes reported for the cluster.
    pub nodes: Vec<CacheNodeStatus>,
}

impl ClusterStatus {
    /// Returns the endpoint address when the cluster is ready for use.
    #[must_use]
    pub fn ready_endpoint(&self) -> Option<&str> {
        if self.status.as_deref() != Some(AVAILABLE) {
            return None;
        }
        let node = self.nodes.first()?;
        if node.status.as_deref() != Some(AVAILABLE) {
            return None;
        }
        node.endpoint_address.as_deref()
    }
}

/// Source of cluster status snapshots.
pub trait ClusterStatusSource: Send + Sync {
    /// Describes `cluster_id`, returning `None` when the provider lists no
    /// such cluster yet.
    fn describe<'a>(&'a self, cluster_id: &'a str) -> ProvisionFuture<'a, Option<ClusterStatus>>;
}

/// Waits for a cache cluster to publish an endpoint within a time budget.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReadinessPoller {
    interval: Duration,
    budget: Duration,
}

impl ReadinessPoller {
    /// Creates a poller with the fixed [`POLL_INTERVAL`].
    #[must_use]
    pub const fn new(budget: Duration) -> Self {
        Self {
            interval: POLL_INTERVAL,
            budget,
        }
    }

    /// Number of status queries allowed by the budget.
    ///
    /// A budget shorter than one interval still allows a single query.
    #[must_use]
    pub fn max_attempts(&self) -> u64 {
        self.budget
            .as_secs()
            .checked_div(self.interval.as_secs())
            .unwrap_or(0)
            .max(1)
    }

    /// Polls `source` until `cluster_id` is ready and returns its endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Timeout`] once the attempt budget is spent
    /// and propagates any error raised by `source`.
    pub async fn wait_for_endpoint<S>(
        &self,
        source: &S,
        cluster_id: &str,
    ) -> Result<String, ProvisionError>
    where
        S: ClusterStatusSource + ?Sized,
    {
        let max_attempts = self.max_attempts();
        let mut remaining = max_attempts;
        loop {
            sleep(self.interval).await;
            remaining = remaining.saturating_sub(1);
            let attempt = max_attempts - remaining;

            let status = source.describe(cluster_id).await?;
            if let Some(endpoint) = status.as_ref().and_then(ClusterStatus::ready_endpoint) {
                info!(cluster_id, attempt, endpoint, "cache cluster available");
                return Ok(endpoint.to_owned());
            }

            debug!(cluster_id, attempt, remaining, ?status, "cache cluster not ready");
            if remaining == 0 {
                return Err(ProvisionError::Timeout {
                    cluster_id: cluster_id.to_owned(),
                    budget_secs: self.budget.as_secs(),
                });
            }
        }
    }
}
