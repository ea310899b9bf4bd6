//! Behavioural smoke tests for the CLI entrypoint.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;

#[test]
fn cli_without_arguments_prints_usage() {
    let mut cmd = cargo_bin_cmd!("aws-resource-driver");
    cmd.assert().failure().stderr(contains("Usage"));
}

#[test]
fn help_lists_the_serve_subcommand() {
    let mut cmd = cargo_bin_cmd!("aws-resource-driver");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(contains("serve"));
}

#[test]
fn serve_help_documents_overrides() {
    let mut cmd = cargo_bin_cmd!("aws-resource-driver");
    cmd.args(["serve", "--help"])
        .assert()
        .success()
        .stdout(contains("--port"))
        .stdout(contains("--fake-aws"));
}
