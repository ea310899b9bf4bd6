//! Request level coordination of provisioning and deprovisioning.
//!
//! Create-or-update consults the metadata store first. A hit returns the
//! stored values without any provider call; a miss provisions the resource,
//! persists the record, and only then reports success, so a failed
//! provisioning never leaves a record behind. Secrets in every response are
//! derived from the current request's credentials.
//!
//! Delete looks up the stored type, dispatches to the matching provider
//! operation, and soft deletes the record only after the provider succeeded,
//! so a failed delete can be retried.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cloud::{CacheClusterRequest, ProvisionError, Provisioner, ProvisionerFactory};
use crate::credentials::{CloudCredentials, CodecError, decode_header};
use crate::messages::{
    DriverResourceDefinition, JsonMap, PARAMS_HEADER, ResourceData, SECRETS_HEADER,
};
use crate::resource::{
    BucketValues, CACHE_CLUSTER_PREFIX, CACHE_PORT, CacheValues, ParamError, ResourceKind,
    ResourceSpec, ResourceValues, is_valid_resource_id, require_string,
};
use crate::store::{MetadataStore, ResourceRecord, StoreError};

/// How a [`DriverError`] should be reported to the caller.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    /// The request was malformed or the provider refused a deletion.
    Client,
    /// The resource is unknown or its identifier is malformed.
    NotFound,
    /// Provisioning or storage failed.
    Server,
}

/// Errors surfaced by the orchestrator.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Secrets in the request body could not be turned into credentials.
    #[error(transparent)]
    Credentials(#[from] CodecError),
    /// Driver params are missing a field or carry the wrong type.
    #[error(transparent)]
    Params(#[from] ParamError),
    /// A required header was not supplied.
    #[error("missing HTTP header \"{0}\"")]
    MissingHeader(&'static str),
    /// A header could not be decoded.
    #[error("malformed HTTP header \"{header}\": {source}")]
    MalformedHeader {
        /// Header name.
        header: &'static str,
        /// Decoding failure.
        source: CodecError,
    },
    /// The requested or stored type is not handled by this driver.
    #[error("type \"{0}\" not supported by this driver")]
    UnsupportedType(String),
    /// No active resource exists for the identifier.
    #[error("resource not found: {0}")]
    NotFound(String),
    /// The provider failed while creating a resource.
    #[error("failed to provision {resource_type} resource \"{id}\": {source}")]
    Provision {
        /// Resource identifier.
        id: String,
        /// Wire type being provisioned.
        resource_type: &'static str,
        /// Provider failure.
        source: ProvisionError,
    },
    /// The provider failed while deleting a resource.
    #[error("failed to delete {resource_type} resource \"{id}\": {source}")]
    Teardown {
        /// Resource identifier.
        id: String,
        /// Wire type being deleted.
        resource_type: &'static str,
        /// Provider failure.
        source: ProvisionError,
    },
    /// A stored record lacks the values needed to act on it.
    #[error("stored metadata for resource \"{id}\" is unusable: {message}")]
    CorruptRecord {
        /// Resource identifier.
        id: String,
        /// What was wrong with the record.
        message: String,
    },
    /// The metadata store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DriverError {
    /// Classifies the error for reporting.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Credentials(_)
            | Self::Params(_)
            | Self::MissingHeader(_)
            | Self::MalformedHeader { .. }
            | Self::UnsupportedType(_)
            | Self::Teardown { .. } => ErrorClass::Client,
            Self::NotFound(_) => ErrorClass::NotFound,
            Self::Provision { .. } | Self::CorruptRecord { .. } | Self::Store(_) => {
                ErrorClass::Server
            }
        }
    }
}

/// Inputs to a delete call, taken from the request path and headers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DeleteRequest<'a> {
    /// Identifier from the request path.
    pub resource_id: &'a str,
    /// Raw value of the secrets header, if supplied.
    pub secrets_header: Option<&'a str>,
    /// Raw value of the params header, if supplied.
    pub params_header: Option<&'a str>,
}

/// Coordinates the metadata store and a provisioning client.
#[derive(Debug)]
pub struct ProvisioningOrchestrator<S, F> {
    store: S,
    factory: F,
}

impl<S, F> ProvisioningOrchestrator<S, F>
where
    S: MetadataStore,
    F: ProvisionerFactory,
{
    /// Creates an orchestrator over `store` and `factory`.
    #[must_use]
    pub const fn new(store: S, factory: F) -> Self {
        Self { store, factory }
    }

    /// Returns the metadata store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Provisions the resource described by `definition`, or returns the
    /// stored values when it already exists.
    ///
    /// # Errors
    ///
    /// Returns a client class [`DriverError`] for bad credentials, params, or
    /// type, and a server class error when provisioning or storage fails.
    pub async fn create_or_update(
        &self,
        definition: &DriverResourceDefinition,
    ) -> Result<ResourceData, DriverError> {
        let credentials = CloudCredentials::from_secrets(&definition.driver_secrets)?;

        if let Some(record) = self.store.find_active(&definition.id).await? {
            debug!(
                resource_id = %record.id,
                resource_type = %record.resource_type,
                "resource already provisioned, returning stored values"
            );
            return Ok(ResourceData::new(
                record.resource_type,
                record.data,
                credentials.response_secrets(),
            ));
        }

        let kind = ResourceKind::from_wire(&definition.resource_type).ok_or_else(|| {
            warn!(resource_type = %definition.resource_type, "unsupported resource type");
            DriverError::UnsupportedType(definition.resource_type.clone())
        })?;
        let spec = ResourceSpec::from_params(kind, &definition.driver_params)?;
        let values = self
            .provision(&spec, &credentials)
            .await
            .map_err(|source| DriverError::Provision {
                id: definition.id.clone(),
                resource_type: kind.wire_name(),
                source,
            })?;

        let data = values.to_map();
        let record = ResourceRecord::new(
            definition.id.as_str(),
            kind,
            definition.driver_params.clone(),
            data.clone(),
            Utc::now(),
        );
        self.store.upsert(&record).await?;
        info!(resource_id = %record.id, resource_type = %kind, "resource provisioned");

        Ok(ResourceData::new(
            kind.wire_name(),
            data,
            credentials.response_secrets(),
        ))
    }

    /// Deprovisions a stored resource and soft deletes its record.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::NotFound`] for malformed or unknown IDs, a
    /// client class error for bad headers or a provider refusal, and a
    /// server class error when storage fails.
    pub async fn delete(&self, request: &DeleteRequest<'_>) -> Result<(), DriverError> {
        let id = request.resource_id;
        if !is_valid_resource_id(id) {
            return Err(DriverError::NotFound(id.to_owned()));
        }

        let secrets = decode_required(request.secrets_header, SECRETS_HEADER)?;
        let credentials = CloudCredentials::from_secrets(&secrets)?;
        let params = request
            .params_header
            .map(|value| decode(value, PARAMS_HEADER))
            .transpose()?;

        let record = self
            .store
            .find_active(id)
            .await?
            .ok_or_else(|| DriverError::NotFound(id.to_owned()))?;
        let kind = record
            .kind()
            .ok_or_else(|| DriverError::UnsupportedType(record.resource_type.clone()))?;
        let values = ResourceValues::from_map(kind, &record.data).map_err(|err| {
            DriverError::CorruptRecord {
                id: id.to_owned(),
                message: err.to_string(),
            }
        })?;
        let region = match kind {
            ResourceKind::Bucket => require_string(&record.params, "region", "stored params")
                .map_err(|err| DriverError::CorruptRecord {
                    id: id.to_owned(),
                    message: err.to_string(),
                })?,
            ResourceKind::Cache => {
                let params = params.ok_or(DriverError::MissingHeader(PARAMS_HEADER))?;
                require_string(&params, "region", PARAMS_HEADER)?
            }
        };

        self.deprovision(&values, &credentials, &region)
            .await
            .map_err(|source| {
                warn!(
                    resource_id = id,
                    resource_type = %kind,
                    error = %source,
                    "deletion failed, record kept"
                );
                DriverError::Teardown {
                    id: id.to_owned(),
                    resource_type: kind.wire_name(),
                    source,
                }
            })?;

        match self.store.soft_delete(id, Utc::now()).await {
            Ok(()) => {
                info!(resource_id = id, resource_type = %kind, "resource deleted");
                Ok(())
            }
            Err(StoreError::NotFound { .. }) => Err(DriverError::NotFound(id.to_owned())),
            Err(err) => Err(err.into()),
        }
    }

    async fn provision(
        &self,
        spec: &ResourceSpec,
        credentials: &CloudCredentials,
    ) -> Result<ResourceValues, ProvisionError> {
        let provisioner = self.factory.connect(credentials, spec.region()).await?;
        match spec {
            ResourceSpec::Bucket(_) => {
                let bucket = Uuid::new_v4().to_string();
                let region = provisioner.create_bucket(&bucket).await?;
                Ok(ResourceValues::Bucket(BucketValues { region, bucket }))
            }
            ResourceSpec::Cache(params) => {
                let request = CacheClusterRequest {
                    cluster_id: format!("{CACHE_CLUSTER_PREFIX}{}", Uuid::new_v4()),
                    node_type: params.cache_node_type.clone(),
                    availability_zone: params.cache_az.clone(),
                };
                let host = provisioner.create_cache_cluster(&request).await?;
                Ok(ResourceValues::Cache(CacheValues {
                    host,
                    port: CACHE_PORT,
                    cluster_id: request.cluster_id,
                }))
            }
        }
    }

    async fn deprovision(
        &self,
        values: &ResourceValues,
        credentials: &CloudCredentials,
        region: &str,
    ) -> Result<(), ProvisionError> {
        let provisioner = self.factory.connect(credentials, region).await?;
        match values {
            ResourceValues::Bucket(bucket) => provisioner.delete_bucket(&bucket.bucket).await,
            ResourceValues::Cache(cache) => {
                provisioner.delete_cache_cluster(&cache.cluster_id).await
            }
        }
    }
}

fn decode(value: &str, header: &'static str) -> Result<JsonMap, DriverError> {
    decode_header(value).map_err(|source| {
        warn!(header, error = %source, "unable to decode header");
        DriverError::MalformedHeader { header, source }
    })
}

fn decode_required(value: Option<&str>, header: &'static str) -> Result<JsonMap, DriverError> {
    let raw = value.ok_or(DriverError::MissingHeader(header))?;
    decode(raw, header)
}
