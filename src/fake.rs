//! Deterministic provisioning client that makes no external calls.
//!
//! Bucket creation echoes the region, cache creation echoes
//! `<cluster id>.<region>`, and deletions always succeed. Selected with
//! `DRIVER_USE_FAKE_AWS_CLIENT` to run the whole service without cloud
//! access.

use tracing::debug;

use crate::cloud::{CacheClusterRequest, ProvisionFuture, Provisioner, ProvisionerFactory};
use crate::credentials::CloudCredentials;

/// Factory producing [`FakeProvisioner`] instances.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FakeProvisionerFactory;

impl ProvisionerFactory for FakeProvisionerFactory {
    type Provisioner = FakeProvisioner;

    fn connect<'a>(
        &'a self,
        _credentials: &'a CloudCredentials,
        region: &'a str,
    ) -> ProvisionFuture<'a, FakeProvisioner> {
        Box::pin(async move {
            Ok(FakeProvisioner {
                region: region.to_owned(),
            })
        })
    }
}

/// Side-effect free provisioner bound to a region.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FakeProvisioner {
    region: String,
}

impl Provisioner for FakeProvisioner {
    fn create_bucket<'a>(&'a self, name: &'a str) -> ProvisionFuture<'a, String> {
        Box::pin(async move {
            debug!(bucket = name, region = %self.region, "fake bucket created");
            Ok(self.region.clone())
        })
    }

    fn delete_bucket<'a>(&'a self, name: &'a str) -> ProvisionFuture<'a, ()> {
        Box::pin(async move {
            debug!(bucket = name, "fake bucket deleted");
            Ok(())
        })
    }

    fn create_cache_cluster<'a>(
        &'a self,
        request: &'a CacheClusterRequest,
    ) -> ProvisionFuture<'a, String> {
        Box::pin(async move { Ok(format!("{}.{}", request.cluster_id, self.region)) })
    }

    fn delete_cache_cluster<'a>(&'a self, cluster_id: &'a str) -> ProvisionFuture<'a, ()> {
        Box::pin(async move {
            debug!(cluster_id, "fake cache cluster deleted");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn connect(region: &str) -> FakeProvisioner {
        FakeProvisionerFactory
            .connect(&CloudCredentials::new("AKIA", "secret"), region)
            .await
            .unwrap_or_else(|err| panic!("fake connect cannot fail: {err}"))
    }

    #[tokio::test]
    async fn bucket_creation_echoes_region() {
        let provisioner = connect("eu-central-1").await;

        let location = provisioner
            .create_bucket("any-name")
            .await
            .unwrap_or_else(|err| panic!("fake create cannot fail: {err}"));

        assert_eq!(location, "eu-central-1");
    }

    #[tokio::test]
    async fn cache_creation_derives_endpoint_from_cluster_and_region() {
        let provisioner = connect("eu-west-1").await;
        let request = CacheClusterRequest {
            cluster_id: String::from("redis-123"),
            node_type: String::from("cache.t3.micro"),
            availability_zone: String::from("eu-west-1a"),
        };

        let host = provisioner
            .create_cache_cluster(&request)
            .await
            .unwrap_or_else(|err| panic!("fake create cannot fail: {err}"));

        assert_eq!(host, "redis-123.eu-west-1");
    }

    #[tokio::test]
    async fn deletions_succeed() {
        let provisioner = connect("eu-west-1").await;

        assert!(provisioner.delete_bucket("b").await.is_ok());
        assert!(provisioner.delete_cache_cluster("c").await.is_ok());
    }
}
