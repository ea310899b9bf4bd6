//! BDD step definitions for provisioning behaviour.

use aws_resource_driver::credentials::encode_header;
use aws_resource_driver::test_support::ProvisionCall;
use aws_resource_driver::{DeleteRequest, ErrorClass, ProvisionError, ProvisioningOrchestrator};
use rstest_bdd_macros::{given, then, when};
use serde_json::json;
use tokio::runtime::Runtime;

use super::test_helpers::{
    CreateOutcome, DeleteOutcome, ProvisioningContext, account_secrets, build_definition, object,
};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn runtime() -> Runtime {
    Runtime::new().unwrap_or_else(|err| panic!("tokio runtime should start: {err}"))
}

#[given("an AWS account with access key \"{access_key}\"")]
fn aws_account(
    mut provisioning_context: ProvisioningContext,
    access_key: String,
) -> ProvisioningContext {
    provisioning_context.access_key = Some(access_key.trim().to_owned());
    provisioning_context
}

#[given("a \"{resource_type}\" resource \"{id}\" in region \"{region}\"")]
fn resource_definition(
    mut provisioning_context: ProvisioningContext,
    resource_type: String,
    id: String,
    region: String,
) -> ProvisioningContext {
    let access_key = provisioning_context
        .access_key
        .clone()
        .unwrap_or_else(|| panic!("test setup requires an account"));
    provisioning_context.definition = Some(build_definition(
        id.trim(),
        resource_type.trim(),
        region.trim(),
        &access_key,
    ));
    provisioning_context
}

#[given("the provider refuses deletions")]
fn provider_refuses_deletions(provisioning_context: ProvisioningContext) -> ProvisioningContext {
    provisioning_context
        .factory
        .fail_deletes_with(ProvisionError::Provider {
            action: "delete bucket",
            message: String::from("BucketNotEmpty"),
        });
    provisioning_context
}

fn create_times(
    mut provisioning_context: ProvisioningContext,
    times: usize,
) -> ProvisioningContext {
    let definition = provisioning_context
        .definition
        .clone()
        .unwrap_or_else(|| panic!("test setup requires a resource definition"));
    let orchestrator = ProvisioningOrchestrator::new(
        provisioning_context.store.clone(),
        provisioning_context.factory.clone(),
    );
    let runtime = runtime();
    for _ in 0..times {
        let outcome = match runtime.block_on(orchestrator.create_or_update(&definition)) {
            Ok(data) => CreateOutcome::Created(data),
            Err(err) => CreateOutcome::Failed(err.class()),
        };
        provisioning_context.creates.push(outcome);
    }
    provisioning_context
}

#[when("the resource is created")]
fn create_once(provisioning_context: ProvisioningContext) -> ProvisioningContext {
    create_times(provisioning_context, 1)
}

#[when("the resource is requested twice")]
fn create_twice(provisioning_context: ProvisioningContext) -> ProvisioningContext {
    create_times(provisioning_context, 2)
}

#[when("the resource is deleted")]
fn delete_resource(mut provisioning_context: ProvisioningContext) -> ProvisioningContext {
    let definition = provisioning_context
        .definition
        .clone()
        .unwrap_or_else(|| panic!("test setup requires a resource definition"));
    let access_key = provisioning_context
        .access_key
        .clone()
        .unwrap_or_else(|| panic!("test setup requires an account"));
    let secrets = encode_header(&account_secrets(&access_key));
    let region = definition
        .driver_params
        .get("region")
        .cloned()
        .unwrap_or_else(|| json!("eu-west-1"));
    let params = encode_header(&object(json!({"region": region})));
    let orchestrator = ProvisioningOrchestrator::new(
        provisioning_context.store.clone(),
        provisioning_context.factory.clone(),
    );

    let request = DeleteRequest {
        resource_id: &definition.id,
        secrets_header: Some(&secrets),
        params_header: Some(&params),
    };
    provisioning_context.deletion = Some(match runtime().block_on(orchestrator.delete(&request)) {
        Ok(()) => DeleteOutcome::Deleted,
        Err(err) => DeleteOutcome::Failed(err.class()),
    });
    provisioning_context
}

#[then("the provider created {count:usize} resource")]
fn provider_created(
    provisioning_context: &ProvisioningContext,
    count: usize,
) -> Result<(), StepError> {
    let created = provisioning_context.factory.create_count();
    if created == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} create calls, got {created}"
        )))
    }
}

#[then("the resource \"{id}\" is active with type \"{resource_type}\"")]
fn resource_is_active(
    provisioning_context: &ProvisioningContext,
    id: String,
    resource_type: String,
) -> Result<(), StepError> {
    let Some(record) = provisioning_context.store.record(id.trim()) else {
        return Err(StepError::Assertion(format!("no record for {id}")));
    };
    if record.is_active() && record.resource_type == resource_type.trim() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected active {resource_type} record, got {record:?}"
        )))
    }
}

#[then("the resource \"{id}\" is no longer active")]
fn resource_is_inactive(
    provisioning_context: &ProvisioningContext,
    id: String,
) -> Result<(), StepError> {
    match provisioning_context.store.record(id.trim()) {
        Some(record) if record.deleted_at.is_some() => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected soft deleted record, got {other:?}"
        ))),
    }
}

#[then("the delete succeeds")]
fn delete_succeeds(provisioning_context: &ProvisioningContext) -> Result<(), StepError> {
    match provisioning_context.deletion {
        Some(DeleteOutcome::Deleted) => Ok(()),
        ref other => Err(StepError::Assertion(format!(
            "expected successful delete, got {other:?}"
        ))),
    }
}

#[then("the delete fails with a client error")]
fn delete_fails(provisioning_context: &ProvisioningContext) -> Result<(), StepError> {
    match provisioning_context.deletion {
        Some(DeleteOutcome::Failed(ErrorClass::Client)) => Ok(()),
        ref other => Err(StepError::Assertion(format!(
            "expected client error, got {other:?}"
        ))),
    }
}

#[then("the create fails with a client error")]
fn create_fails(provisioning_context: &ProvisioningContext) -> Result<(), StepError> {
    match provisioning_context.creates.last() {
        Some(CreateOutcome::Failed(ErrorClass::Client)) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected client error, got {other:?}"
        ))),
    }
}

#[then("the provider deleted the stored cache cluster")]
fn provider_deleted_cache(provisioning_context: &ProvisioningContext) -> Result<(), StepError> {
    let Some(CreateOutcome::Created(data)) = provisioning_context.creates.first() else {
        return Err(StepError::Assertion(String::from("missing create outcome")));
    };
    let Some(cluster_id) = data.data.values.get("cluster_id").and_then(|v| v.as_str()) else {
        return Err(StepError::Assertion(format!(
            "create response lacks a cluster id: {data:?}"
        )));
    };
    let expected = ProvisionCall::DeleteCacheCluster(cluster_id.to_owned());
    if provisioning_context.factory.calls().contains(&expected) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {expected:?} in {:?}",
            provisioning_context.factory.calls()
        )))
    }
}

#[then("no provider calls were made")]
fn no_provider_calls(provisioning_context: &ProvisioningContext) -> Result<(), StepError> {
    let calls = provisioning_context.factory.calls();
    if calls.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("unexpected calls: {calls:?}")))
    }
}
