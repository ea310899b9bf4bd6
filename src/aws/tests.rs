//! Unit tests for the mapping between AWS SDK types and provisioning types.

use aws_sdk_elasticache::error::ErrorMetadata as CacheErrorMetadata;
use aws_sdk_elasticache::operation::create_cache_cluster::CreateCacheClusterError;
use aws_sdk_elasticache::types::error::CacheClusterAlreadyExistsFault;
use aws_sdk_elasticache::types::{CacheCluster, CacheNode, Endpoint};
use aws_sdk_s3::error::ErrorMetadata as S3ErrorMetadata;
use aws_sdk_s3::operation::create_bucket::CreateBucketError;
use aws_sdk_s3::types::BucketLocationConstraint;
use aws_sdk_s3::types::error::{BucketAlreadyExists, BucketAlreadyOwnedByYou};
use rstest::rstest;

use super::bucket::{classify_create_bucket_error, location_constraint};
use super::cache::{classify_create_cache_error, cluster_status};
use crate::cloud::ProvisionError;
use crate::readiness::{CacheNodeStatus, ClusterStatus};

fn node(status: &str, address: Option<&str>) -> CacheNode {
    let builder = CacheNode::builder().cache_node_status(status);
    match address {
        Some(host) => builder
            .endpoint(Endpoint::builder().address(host).port(6379).build())
            .build(),
        None => builder.build(),
    }
}

#[test]
fn us_east_1_omits_the_location_constraint() {
    assert_eq!(location_constraint("us-east-1"), None);
}

#[rstest]
#[case("eu-west-1")]
#[case("ap-southeast-2")]
fn other_regions_pin_the_location_constraint(#[case] region: &str) {
    assert_eq!(
        location_constraint(region),
        Some(BucketLocationConstraint::from(region))
    );
}

#[rstest]
#[case::taken(CreateBucketError::BucketAlreadyExists(BucketAlreadyExists::builder().build()))]
#[case::owned(CreateBucketError::BucketAlreadyOwnedByYou(
    BucketAlreadyOwnedByYou::builder().build()
))]
fn bucket_name_collisions_are_reported_as_existing(#[case] err: CreateBucketError) {
    assert_eq!(
        classify_create_bucket_error(&err, "0b5c-bucket"),
        Some(ProvisionError::AlreadyExists {
            resource: "s3 bucket",
            name: String::from("0b5c-bucket"),
        })
    );
}

#[test]
fn other_bucket_failures_are_left_to_the_provider_mapping() {
    let err = CreateBucketError::generic(S3ErrorMetadata::builder().code("AccessDenied").build());

    assert_eq!(classify_create_bucket_error(&err, "0b5c-bucket"), None);
}

#[test]
fn cache_cluster_collisions_are_reported_as_existing() {
    let err = CreateCacheClusterError::CacheClusterAlreadyExistsFault(
        CacheClusterAlreadyExistsFault::builder().build(),
    );

    assert_eq!(
        classify_create_cache_error(&err, "redis-1"),
        Some(ProvisionError::AlreadyExists {
            resource: "cache cluster",
            name: String::from("redis-1"),
        })
    );
}

#[test]
fn other_cache_failures_are_left_to_the_provider_mapping() {
    let err = CreateCacheClusterError::generic(
        CacheErrorMetadata::builder()
            .code("InsufficientCacheClusterCapacity")
            .build(),
    );

    assert_eq!(classify_create_cache_error(&err, "redis-1"), None);
}

#[test]
fn cluster_status_copies_cluster_and_node_state() {
    let cluster = CacheCluster::builder()
        .cache_cluster_status("available")
        .cache_nodes(node("available", Some("redis-1.abc.cache.amazonaws.com")))
        .cache_nodes(node("creating", None))
        .build();

    let status = cluster_status(&cluster);

    assert_eq!(
        status,
        ClusterStatus {
            status: Some(String::from("available")),
            nodes: vec![
                CacheNodeStatus {
                    status: Some(String::from("available")),
                    endpoint_address: Some(String::from("redis-1.abc.cache.amazonaws.com")),
                },
                CacheNodeStatus {
                    status: Some(String::from("creating")),
                    endpoint_address: None,
                },
            ],
        }
    );
    assert_eq!(status.ready_endpoint(), Some("redis-1.abc.cache.amazonaws.com"));
}

#[test]
fn cluster_without_nodes_is_not_ready() {
    let cluster = CacheCluster::builder()
        .cache_cluster_status("creating")
        .build();

    let status = cluster_status(&cluster);

    assert_eq!(status.status.as_deref(), Some("creating"));
    assert!(status.nodes.is_empty());
    assert_eq!(status.ready_endpoint(), None);
}
