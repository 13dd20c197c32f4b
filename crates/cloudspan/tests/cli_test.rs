#![allow(deprecated)] // TODO: migrate Command::cargo_bin to cargo_bin_cmd!

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn cloudspan(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cloudspan").unwrap();
    cmd.env("CLOUDSPAN_CONFIG", config).env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("config.yaml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_cli_help_lists_providers() {
    let mut cmd = Command::cargo_bin("cloudspan").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("drivers"))
        .stdout(predicate::str::contains("aws"))
        .stdout(predicate::str::contains("openstack"));
}

#[test]
fn test_vm_help_lists_lifecycle() {
    let mut cmd = Command::cargo_bin("cloudspan").unwrap();
    cmd.args(["aws", "vm", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("suspend"))
        .stdout(predicate::str::contains("terminate"));
}

#[cfg(all(feature = "aws", feature = "rest"))]
#[test]
fn test_drivers_json() {
    let mut cmd = Command::cargo_bin("cloudspan").unwrap();
    cmd.args(["drivers", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"provider\": \"aws\""))
        .stdout(predicate::str::contains("\"provider\": \"openstack\""))
        .stdout(predicate::str::contains("publicip"));
}

#[test]
fn test_missing_provider_section() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "openstack:\n  region: RegionOne\n");

    cloudspan(&config)
        .args(["azure", "vm", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No `azure` section"));
}

#[cfg(feature = "rest")]
#[test]
fn test_incomplete_credentials_rejected_before_any_call() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "openstack:\n  credential:\n    username: demo\n  region: RegionOne\n",
    );

    cloudspan(&config)
        .args(["openstack", "vnetwork", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid connection info"))
        .stderr(predicate::str::contains("identity_endpoint"));
}

#[cfg(feature = "rest")]
#[test]
fn test_gcp_keypair_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "gcp:\n  credential:\n    client_email: sa@demo.iam.gserviceaccount.com\n    private_key: not-a-real-key\n    project_id: demo\n  region: us-central1\n  zone: us-central1-a\n",
    );

    cloudspan(&config)
        .args(["gcp", "keypair", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not offer a keypair handler"));
}
