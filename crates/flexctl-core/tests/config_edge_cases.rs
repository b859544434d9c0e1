use std::fs;
use std::path::PathBuf;

use flexctl_core::config::{Config, ConfigError, DEFAULT_MANAGEMENT_ENDPOINT};
use serial_test::serial;
use tempfile::TempDir;

/// Returns true if running as root (euid == 0). Used to skip permission tests.
#[cfg(unix)]
fn is_root() -> bool {
    std::process::Command::new("id")
        .arg("-u")
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim() == "0")
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Missing or empty files
// ---------------------------------------------------------------------------

#[test]
fn load_from_nonexistent_path_returns_default_config() {
    let path = PathBuf::from("/tmp/flexctl-test-nonexistent/does/not/exist/config.toml");
    assert!(!path.exists());

    let config = Config::load_from_path(&path).expect("missing file should yield defaults");

    assert!(config.profiles.is_empty());
    assert!(config.default_profile.is_none());
}

#[test]
fn load_empty_config_file_returns_default_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "").unwrap();

    let config = Config::load_from_path(&config_path).expect("empty file should parse as default");

    assert!(config.profiles.is_empty());
    assert!(config.default_profile.is_none());
}

// ---------------------------------------------------------------------------
// Malformed content
// ---------------------------------------------------------------------------

#[test]
fn load_corrupt_toml_returns_parse_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "[[[broken").unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("Parse"),
        "error should mention parsing: {msg}"
    );
}

#[test]
fn load_profile_missing_credentials_returns_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");

    let content = r#"
[profiles.broken]
tenant_id = "tenant-1"
region = "westeurope"
"#;
    fs::write(&config_path, content).unwrap();

    assert!(
        Config::load_from_path(&config_path).is_err(),
        "incomplete profile should produce an error"
    );
}

#[test]
fn load_config_with_unknown_fields_ignores_them() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");

    let content = r#"
unknown_top_level_key = "hello"

[profiles.dev]
tenant_id = "tenant-1"
client_id = "client-1"
client_secret = "secret-1"
subscription_id = "sub-1"
totally_unknown_field = true
"#;
    fs::write(&config_path, content).unwrap();

    let config =
        Config::load_from_path(&config_path).expect("unknown fields should be silently ignored");

    let profile = config.profile("dev").unwrap();
    assert_eq!(profile.management_endpoint, DEFAULT_MANAGEMENT_ENDPOINT);
    assert!(profile.polling.is_none());
}

#[test]
fn polling_section_fills_missing_fields_with_defaults() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");

    let content = r#"
[profiles.slow]
tenant_id = "tenant-1"
client_id = "client-1"
client_secret = "secret-1"
subscription_id = "sub-1"

[profiles.slow.polling]
timeout_secs = 3600
"#;
    fs::write(&config_path, content).unwrap();

    let config = Config::load_from_path(&config_path).unwrap();
    let polling = config.profile("slow").unwrap().polling();
    assert_eq!(polling.timeout_secs, 3600);
    assert_eq!(polling.interval_secs, 10);
}

// ---------------------------------------------------------------------------
// Environment expansion
// ---------------------------------------------------------------------------

#[test]
#[serial]
fn load_expands_environment_variables() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");

    let content = r#"
[profiles.ci]
tenant_id = "${FLEXCTL_TEST_TENANT}"
client_id = "client-1"
client_secret = "${FLEXCTL_TEST_SECRET_UNSET:-fallback-secret}"
subscription_id = "sub-1"
"#;
    fs::write(&config_path, content).unwrap();

    // SAFETY: serialised with other env-mutating tests
    unsafe {
        std::env::set_var("FLEXCTL_TEST_TENANT", "tenant-from-env");
        std::env::remove_var("FLEXCTL_TEST_SECRET_UNSET");
    }

    let config = Config::load_from_path(&config_path).unwrap();
    let profile = config.profile("ci").unwrap();
    assert_eq!(profile.tenant_id, "tenant-from-env");
    assert_eq!(profile.client_secret, "fallback-secret");

    unsafe {
        std::env::remove_var("FLEXCTL_TEST_TENANT");
    }
}

// ---------------------------------------------------------------------------
// Permission errors (unix only)
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[test]
fn load_unreadable_file_returns_clear_error() {
    use std::os::unix::fs::PermissionsExt;

    if is_root() {
        eprintln!("skipping test: running as root");
        return;
    }

    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "# valid toml").unwrap();

    fs::set_permissions(&config_path, fs::Permissions::from_mode(0o000)).unwrap();

    let result = Config::load_from_path(&config_path);
    assert!(result.is_err(), "unreadable file should produce an error");

    let msg = result.unwrap_err().to_string();
    assert!(
        msg.contains("load") || msg.contains("Load") || msg.contains("Permission"),
        "error should reference loading or permissions: {msg}"
    );

    fs::set_permissions(&config_path, fs::Permissions::from_mode(0o644)).unwrap();
}

#[cfg(unix)]
#[test]
fn save_to_readonly_directory_returns_clear_error() {
    use std::os::unix::fs::PermissionsExt;

    if is_root() {
        eprintln!("skipping test: running as root");
        return;
    }

    let dir = TempDir::new().unwrap();
    let readonly_dir = dir.path().join("readonly");
    fs::create_dir(&readonly_dir).unwrap();
    fs::set_permissions(&readonly_dir, fs::Permissions::from_mode(0o444)).unwrap();

    let config_path = readonly_dir.join("config.toml");
    let result = Config::default().save_to_path(&config_path);
    assert!(
        result.is_err(),
        "saving to read-only directory should produce an error"
    );

    let msg = result.unwrap_err().to_string();
    assert!(
        msg.contains("save") || msg.contains("Save") || msg.contains("Permission"),
        "error should reference saving or permissions: {msg}"
    );

    fs::set_permissions(&readonly_dir, fs::Permissions::from_mode(0o755)).unwrap();
}
