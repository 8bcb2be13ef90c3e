#![allow(deprecated)] // TODO: move from cargo_bin to cargo_bin_cmd!

mod common;

use assert_cmd::Command;
use common::TestProject;
use predicates::prelude::*;

/// CLI help lists every command
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("vmflow").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Azure virtual machines"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("ops"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("down"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("vmflow").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vmflow"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_run_help() {
    let mut cmd = Command::cargo_bin("vmflow").unwrap();
    cmd.arg("run")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--yes"))
        .stdout(predicate::str::contains("--resource-group"));
}

#[test]
fn test_ops_help() {
    let mut cmd = Command::cargo_bin("vmflow").unwrap();
    cmd.arg("ops")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--vm"));
}

#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("vmflow").unwrap();
    cmd.arg("invalid-command").assert().failure();
}

/// Missing credentials are reported by name and fail the command
#[test]
fn test_missing_credentials() {
    let project = TestProject::new();
    project
        .command()
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Missing environment variable 'AZURE_TENANT_ID'",
        ));
}

#[test]
fn test_missing_subscription() {
    let project = TestProject::new();
    project
        .command()
        .env("AZURE_TENANT_ID", "tenant")
        .env("AZURE_CLIENT_ID", "client")
        .env("AZURE_CLIENT_SECRET", "secret")
        .arg("up")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Missing environment variable 'AZURE_SUBSCRIPTION_ID'",
        ));
}

#[test]
fn test_invalid_config_is_rejected() {
    let project = TestProject::new();
    project.write_config("storage_account: Not-Valid\n");

    project
        .command()
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("storage_account 'Not-Valid'"));
}

#[test]
fn test_status_without_state() {
    let project = TestProject::new();
    project
        .command()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No resources recorded"));
}

#[test]
fn test_status_lists_recorded_resources() {
    let project = TestProject::new();
    project.write_state(
        r#"{
  "version": 1,
  "updated_at": "2026-01-01T00:00:00Z",
  "resources": {
    "azure:virtual-machine:linuxVM": {
      "id": "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/linuxVM",
      "resource_type": "virtual-machine",
      "status": "running",
      "attributes": {"host": "vmflowsample-linux.eastus.cloudapp.azure.com"},
      "created_at": "2026-01-01T00:00:00Z",
      "updated_at": "2026-01-01T00:00:00Z"
    }
  }
}"#,
    );

    project
        .command()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("azure:virtual-machine:linuxVM"))
        .stdout(predicate::str::contains(
            "vmflowsample-linux.eastus.cloudapp.azure.com",
        ));
}
