//! BDD scenarios for provisioning and deprovisioning.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ProvisioningContext, provisioning_context};

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Repeated create provisions a bucket once"
)]
fn scenario_repeated_create(provisioning_context: ProvisioningContext) {
    let _ = provisioning_context;
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Deleting a cache cluster soft deletes its record"
)]
fn scenario_cache_deletion(provisioning_context: ProvisioningContext) {
    let _ = provisioning_context;
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "A refused deletion keeps the record"
)]
fn scenario_refused_deletion(provisioning_context: ProvisioningContext) {
    let _ = provisioning_context;
}

#[scenario(
    path = "tests/features/provisioning.feature",
    name = "Unsupported resource types are rejected"
)]
fn scenario_unsupported_type(provisioning_context: ProvisioningContext) {
    let _ = provisioning_context;
}
