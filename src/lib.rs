//! External resource driver for AWS.
//!
//! The driver answers a small HTTP protocol: create-or-update provisions an
//! S3 bucket or an `ElastiCache` redis cluster, and delete tears it down
//! again. Every provisioned resource is recorded in a PostgreSQL metadata
//! store so repeated requests are idempotent. Cloud secrets arrive with each
//! request and are echoed back in responses, but never persisted.

pub mod aws;
pub mod cloud;
pub mod config;
pub mod credentials;
pub mod fake;
pub mod http;
pub mod messages;
pub mod orchestrator;
pub mod readiness;
pub mod resource;
pub mod store;
pub mod telemetry;
pub mod test_support;

pub use aws::AwsProvisionerFactory;
pub use cloud::{CacheClusterRequest, ProvisionError, Provisioner, ProvisionerFactory};
pub use config::{ConfigError, DatabaseConfig, DriverConfig};
pub use credentials::{CloudCredentials, CodecError};
pub use fake::FakeProvisionerFactory;
pub use messages::{DriverResourceDefinition, ResourceData};
pub use orchestrator::{DeleteRequest, DriverError, ErrorClass, ProvisioningOrchestrator};
pub use resource::ResourceKind;
pub use store::{MetadataStore, PostgresStore, ResourceRecord, StoreError};
