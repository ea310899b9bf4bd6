//! Conversion of SDK failures into provisioning errors.

use std::error::Error;

use aws_sdk_s3::error::DisplayErrorContext;
use tracing::warn;

use crate::cloud::ProvisionError;

/// Wraps an SDK failure for `action`, keeping the full error chain.
pub(super) fn provider_error<E>(action: &'static str, err: E) -> ProvisionError
where
    E: Error,
{
    let message = DisplayErrorContext(err).to_string();
    warn!(action, %message, "aws request failed");
    ProvisionError::Provider { action, message }
}

/// Reports a name collision for `resource`.
pub(super) fn already_exists(resource: &'static str, name: &str) -> ProvisionError {
    warn!(resource, name, "attempted to create a resource that already exists");
    ProvisionError::AlreadyExists {
        resource,
        name: name.to_owned(),
    }
}
