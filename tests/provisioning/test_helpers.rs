//! Shared fixtures and helpers for provisioning BDD scenarios.

use aws_resource_driver::ErrorClass;
use aws_resource_driver::messages::{DriverResourceDefinition, JsonMap, ResourceData};
use aws_resource_driver::test_support::{InMemoryStore, RecordingProvisionerFactory};
use rstest::fixture;
use serde_json::{Value, json};

#[derive(Clone, Debug)]
pub enum CreateOutcome {
    Created(ResourceData),
    Failed(ErrorClass),
}

#[derive(Clone, Debug)]
pub enum DeleteOutcome {
    Deleted,
    Failed(ErrorClass),
}

#[derive(Clone, Debug)]
pub struct ProvisioningContext {
    pub store: InMemoryStore,
    pub factory: RecordingProvisionerFactory,
    pub access_key: Option<String>,
    pub definition: Option<DriverResourceDefinition>,
    pub creates: Vec<CreateOutcome>,
    pub deletion: Option<DeleteOutcome>,
}

#[fixture]
pub fn provisioning_context() -> ProvisioningContext {
    ProvisioningContext {
        store: InMemoryStore::new(),
        factory: RecordingProvisionerFactory::new(),
        access_key: None,
        definition: None,
        creates: Vec::new(),
        deletion: None,
    }
}

pub fn object(value: Value) -> JsonMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

pub fn account_secrets(access_key: &str) -> JsonMap {
    object(json!({
        "account": {"aws_access_key_id": access_key, "aws_secret_access_key": "bdd-secret"}
    }))
}

pub fn build_definition(
    id: &str,
    resource_type: &str,
    region: &str,
    access_key: &str,
) -> DriverResourceDefinition {
    DriverResourceDefinition {
        id: id.to_owned(),
        resource_type: resource_type.to_owned(),
        resource_params: JsonMap::new(),
        driver_params: object(json!({
            "region": region,
            "cache_node_type": "cache.t3.micro",
            "cache_az": format!("{region}a"),
        })),
        driver_secrets: account_secrets(access_key),
    }
}
