use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const AZURE_VARS: &[&str] = &[
    "AZURE_TENANT_ID",
    "AZURE_CLIENT_ID",
    "AZURE_SECRET",
    "AZURE_CLIENT_SECRET",
    "AZURE_SUBSCRIPTION_ID",
    "FLEXCTL_PROFILE",
    "FLEXCTL_CONFIG_FILE",
    "FLEXCTL_ADMIN_PASSWORD",
    "RUST_LOG",
];

/// Helper to create a test command with no ambient credentials
fn flexctl() -> Command {
    let mut cmd = Command::cargo_bin("flexctl").unwrap();
    for var in AZURE_VARS {
        cmd.env_remove(var);
    }
    cmd
}

/// Command bound to a config file inside `dir`
fn flexctl_with_config(dir: &TempDir) -> Command {
    let mut cmd = flexctl();
    cmd.arg("--config-file")
        .arg(dir.path().join("config.toml").to_str().unwrap());
    cmd
}

#[test]
fn test_help_flag() {
    flexctl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("flexible servers"))
        .stdout(predicate::str::contains("EXAMPLES:"));
}

#[test]
fn test_version_flag() {
    flexctl()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("flexctl"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_json() {
    flexctl()
        .args(["version", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"version\""));
}

#[test]
fn test_no_args_shows_help() {
    flexctl()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_invalid_subcommand() {
    flexctl()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_run_help_lists_plan_flags() {
    flexctl()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--updated-storage-mb"))
        .stdout(predicate::str::contains("EXAMPLES:"));
}

#[test]
fn test_completions_bash() {
    flexctl()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("flexctl"));
}

#[test]
fn test_profile_path_uses_config_file() {
    let dir = TempDir::new().unwrap();
    flexctl_with_config(&dir)
        .args(["profile", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_profile_list_empty() {
    let dir = TempDir::new().unwrap();
    flexctl_with_config(&dir)
        .args(["profile", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No profiles configured"));
}

#[test]
fn test_profile_set_show_remove() {
    let dir = TempDir::new().unwrap();

    flexctl_with_config(&dir)
        .args([
            "profile",
            "set",
            "dev",
            "--tenant-id",
            "tenant-1",
            "--client-id",
            "client-1",
            "--client-secret",
            "very-secret",
            "--subscription-id",
            "sub-1",
            "--region",
            "westeurope",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile 'dev' saved"));

    flexctl_with_config(&dir)
        .args(["profile", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dev"))
        .stdout(predicate::str::contains("westeurope"));

    flexctl_with_config(&dir)
        .args(["profile", "show", "dev", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"subscription_id\": \"sub-1\""))
        .stdout(predicate::str::contains("very-secret").not());

    flexctl_with_config(&dir)
        .args(["profile", "remove", "dev", "--yes"])
        .assert()
        .success();

    flexctl_with_config(&dir)
        .args(["profile", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No profiles configured"));
}

#[test]
fn test_profile_default_unknown_fails() {
    let dir = TempDir::new().unwrap();
    flexctl_with_config(&dir)
        .args(["profile", "default", "missing"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Profile 'missing' not found"));
}

#[test]
fn test_check_name_without_credentials_fails() {
    let dir = TempDir::new().unwrap();
    flexctl_with_config(&dir)
        .args(["check-name", "netserver12345"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No profile configured"));
}

#[test]
fn test_dry_run_prints_every_step() {
    let dir = TempDir::new().unwrap();
    flexctl_with_config(&dir)
        .args(["run", "--dry-run", "--resource-group", "rgMySqlcli"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Resource group with name rgMySqlcli is created.",
        ))
        .stdout(predicate::str::contains(
            "List firewall rules:\n10.0.0.255 10.0.0.255",
        ))
        .stdout(predicate::str::contains(
            "Updated configuration innodb_lru_scan_depth new value 512",
        ))
        .stdout(predicate::str::contains("Server is deleted"))
        .stdout(predicate::str::contains(
            "Resource group with name rgMySqlcli is deleted",
        ));
}

#[test]
fn test_dry_run_json_report() {
    let dir = TempDir::new().unwrap();
    let output = flexctl_with_config(&dir)
        .args(["run", "--dry-run", "-o", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["completed_steps"].as_array().unwrap().len(), 13);
    assert_eq!(report["final_storage_mb"], 1048576);
    assert_eq!(report["region"], "northeurope");
}

#[test]
fn test_dry_run_rejects_shrinking_storage() {
    let dir = TempDir::new().unwrap();
    flexctl_with_config(&dir)
        .args([
            "run",
            "--dry-run",
            "--storage-mb",
            "65536",
            "--updated-storage-mb",
            "32768",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("storage can only grow"))
        .stdout(predicate::str::contains("is created").not());
}

#[test]
fn test_dry_run_rejects_bad_firewall_range() {
    let dir = TempDir::new().unwrap();
    flexctl_with_config(&dir)
        .args(["run", "--dry-run", "--firewall-range", "not-an-address"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid input"));
}

#[test]
fn test_zero_wait_timeout_is_rejected() {
    let dir = TempDir::new().unwrap();
    flexctl_with_config(&dir)
        .args(["run", "--dry-run", "--wait-timeout", "0"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--wait-timeout"));
}
