//! Provisioning client backed by the AWS SDK.
//!
//! One [`AwsProvisioner`] is built per request from the caller's static
//! credentials and region. Buckets live in S3; cache clusters are single
//! node ElastiCache redis clusters with a fixed topology.

mod bucket;
mod cache;
mod error;

use std::time::Duration;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;

use crate::cloud::{
    CacheClusterRequest, ProvisionError, ProvisionFuture, Provisioner, ProvisionerFactory,
};
use crate::credentials::CloudCredentials;
use crate::readiness::ReadinessPoller;

const CREDENTIALS_PROVIDER: &str = "driver-secrets";

/// Builds [`AwsProvisioner`] instances for request scoped credentials.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AwsProvisionerFactory {
    readiness_budget: Duration,
}

impl AwsProvisionerFactory {
    /// Creates a factory whose clients wait up to `readiness_budget` for
    /// cache clusters to become available.
    #[must_use]
    pub const fn new(readiness_budget: Duration) -> Self {
        Self { readiness_budget }
    }
}

impl ProvisionerFactory for AwsProvisionerFactory {
    type Provisioner = AwsProvisioner;

    fn connect<'a>(
        &'a self,
        credentials: &'a CloudCredentials,
        region: &'a str,
    ) -> ProvisionFuture<'a, AwsProvisioner> {
        Box::pin(async move {
            if region.trim().is_empty() {
                return Err(ProvisionError::Session {
                    message: String::from("region must not be empty"),
                });
            }

            let static_credentials = Credentials::new(
                credentials.access_key_id(),
                credentials.secret_access_key(),
                None,
                None,
                CREDENTIALS_PROVIDER,
            );
            let shared = aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(region.to_owned()))
                .credentials_provider(static_credentials)
                .load()
                .await;

            Ok(AwsProvisioner {
                s3: aws_sdk_s3::Client::new(&shared),
                elasticache: aws_sdk_elasticache::Client::new(&shared),
                region: region.to_owned(),
                poller: ReadinessPoller::new(self.readiness_budget),
            })
        })
    }
}

/// AWS client bound to one account and region.
#[derive(Clone, Debug)]
pub struct AwsProvisioner {
    s3: aws_sdk_s3::Client,
    elasticache: aws_sdk_elasticache::Client,
    region: String,
    poller: ReadinessPoller,
}

impl Provisioner for AwsProvisioner {
    fn create_bucket<'a>(&'a self, name: &'a str) -> ProvisionFuture<'a, String> {
        Box::pin(self.submit_bucket(name))
    }

    fn delete_bucket<'a>(&'a self, name: &'a str) -> ProvisionFuture<'a, ()> {
        Box::pin(self.remove_bucket(name))
    }

    fn create_cache_cluster<'a>(
        &'a self,
        request: &'a CacheClusterRequest,
    ) -> ProvisionFuture<'a, String> {
        Box::pin(async move {
            self.submit_cache_cluster(request).await?;
            self.poller
                .wait_for_endpoint(self, &request.cluster_id)
                .await
        })
    }

    fn delete_cache_cluster<'a>(&'a self, cluster_id: &'a str) -> ProvisionFuture<'a, ()> {
        Box::pin(self.remove_cache_cluster(cluster_id))
    }
}

#[cfg(test)]
mod tests;
