//! ElastiCache redis cluster operations.

use aws_sdk_elasticache::operation::create_cache_cluster::CreateCacheClusterError;
use aws_sdk_elasticache::types::CacheCluster;
use tracing::info;

use super::AwsProvisioner;
use super::error::{already_exists, provider_error};
use crate::cloud::{CacheClusterRequest, ProvisionError, ProvisionFuture};
use crate::readiness::{CacheNodeStatus, ClusterStatus, ClusterStatusSource};
use crate::resource::CACHE_PORT;

const ENGINE: &str = "redis";
const ENGINE_VERSION: &str = "5.0.6";
const SUBNET_GROUP: &str = "default";
const NODE_COUNT: i32 = 1;
const SNAPSHOT_RETENTION_DAYS: i32 = 7;

impl AwsProvisioner {
    pub(super) async fn submit_cache_cluster(
        &self,
        request: &CacheClusterRequest,
    ) -> Result<(), ProvisionError> {
        let submitted = self
            .elasticache
            .create_cache_cluster()
            .cache_cluster_id(&request.cluster_id)
            .cache_node_type(&request.node_type)
            .preferred_availability_zone(&request.availability_zone)
            .cache_subnet_group_name(SUBNET_GROUP)
            .engine(ENGINE)
            .engine_version(ENGINE_VERSION)
            .num_cache_nodes(NODE_COUNT)
            .port(i32::from(CACHE_PORT))
            .snapshot_retention_limit(SNAPSHOT_RETENTION_DAYS)
            .auto_minor_version_upgrade(true)
            .send()
            .await;

        match submitted {
            Ok(_) => {
                info!(
                    cluster_id = %request.cluster_id,
                    node_type = %request.node_type,
                    availability_zone = %request.availability_zone,
                    "cache cluster submitted, waiting for endpoint"
                );
                Ok(())
            }
            Err(err) => Err(err
                .as_service_error()
                .and_then(|service| classify_create_cache_error(service, &request.cluster_id))
                .unwrap_or_else(|| provider_error("create cache cluster", err))),
        }
    }

    pub(super) async fn remove_cache_cluster(
        &self,
        cluster_id: &str,
    ) -> Result<(), ProvisionError> {
        self.elasticache
            .delete_cache_cluster()
            .cache_cluster_id(cluster_id)
            .send()
            .await
            .map_err(|err| provider_error("delete cache cluster", err))?;
        info!(cluster_id, "cache cluster deletion submitted");
        Ok(())
    }
}

impl ClusterStatusSource for AwsProvisioner {
    fn describe<'a>(&'a self, cluster_id: &'a str) -> ProvisionFuture<'a, Option<ClusterStatus>> {
        Box::pin(async move {
            let output = self
                .elasticache
                .describe_cache_clusters()
                .cache_cluster_id(cluster_id)
                .show_cache_node_info(true)
                .send()
                .await
                .map_err(|err| provider_error("describe cache cluster", err))?;

            Ok(output.cache_clusters().first().map(cluster_status))
        })
    }
}

/// Snapshot of a described cluster and its nodes.
pub(super) fn cluster_status(cluster: &CacheCluster) -> ClusterStatus {
    ClusterStatus {
        status: cluster.cache_cluster_status().map(str::to_owned),
        nodes: cluster
            .cache_nodes()
            .iter()
            .map(|node| CacheNodeStatus {
                status: node.cache_node_status().map(str::to_owned),
                endpoint_address: node
                    .endpoint()
                    .and_then(|endpoint| endpoint.address())
                    .map(str::to_owned),
            })
            .collect(),
    }
}

pub(super) fn classify_create_cache_error(
    err: &CreateCacheClusterError,
    cluster_id: &str,
) -> Option<ProvisionError> {
    match err {
        CreateCacheClusterError::CacheClusterAlreadyExistsFault(_) => {
            Some(already_exists("cache cluster", cluster_id))
        }
        _ => None,
    }
}
