//! S3 bucket operations.

use aws_sdk_s3::operation::create_bucket::CreateBucketError;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use tracing::info;

use super::AwsProvisioner;
use super::error::{already_exists, provider_error};
use crate::cloud::ProvisionError;

// us-east-1 rejects an explicit location constraint.
const DEFAULT_REGION: &str = "us-east-1";

impl AwsProvisioner {
    pub(super) async fn submit_bucket(&self, name: &str) -> Result<String, ProvisionError> {
        let mut request = self.s3.create_bucket().bucket(name);
        if let Some(constraint) = location_constraint(&self.region) {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(constraint)
                    .build(),
            );
        }

        match request.send().await {
            Ok(output) => {
                let location = output
                    .location()
                    .map_or_else(|| self.region.clone(), str::to_owned);
                info!(bucket = name, %location, "s3 bucket created");
                Ok(location)
            }
            Err(err) => Err(err
                .as_service_error()
                .and_then(|service| classify_create_bucket_error(service, name))
                .unwrap_or_else(|| provider_error("create s3 bucket", err))),
        }
    }

    pub(super) async fn remove_bucket(&self, name: &str) -> Result<(), ProvisionError> {
        self.s3
            .delete_bucket()
            .bucket(name)
            .send()
            .await
            .map_err(|err| provider_error("delete s3 bucket", err))?;
        info!(bucket = name, "s3 bucket deleted");
        Ok(())
    }
}

/// Location constraint for a bucket in `region`, or `None` where the API
/// expects the constraint to be omitted.
pub(super) fn location_constraint(region: &str) -> Option<BucketLocationConstraint> {
    (region != DEFAULT_REGION).then(|| BucketLocationConstraint::from(region))
}

/// Maps name collisions to [`ProvisionError::AlreadyExists`]. Other failures
/// return `None` and are reported with the SDK's error context.
pub(super) fn classify_create_bucket_error(
    err: &CreateBucketError,
    name: &str,
) -> Option<ProvisionError> {
    match err {
        CreateBucketError::BucketAlreadyExists(_)
        | CreateBucketError::BucketAlreadyOwnedByYou(_) => Some(already_exists("s3 bucket", name)),
        _ => None,
    }
}
