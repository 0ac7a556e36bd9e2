//! Integration tests for the iccheck-launcher binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn launcher() -> Command {
    let mut cmd = Command::cargo_bin("iccheck-launcher").unwrap();
    cmd.env_remove("ICCHECK_CONFIG")
        .env_remove("ICCHECK_CACHE_DIR")
        .env_remove("ICCHECK_BUNDLED_ONLY")
        .env_remove("RUST_LOG");
    cmd
}

#[cfg(unix)]
fn write_script(dir: &std::path::Path, name: &str, body: &str) {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

#[test]
fn test_url_for_explicit_platform() {
    launcher()
        .args(["url", "--os", "linux", "--arch", "aarch64"])
        .assert()
        .success()
        .stdout(
            "https://github.com/salab/iccheck/releases/download/v0.7.6/iccheck_0.7.6_linux_arm64\n",
        );
}

#[test]
fn test_url_windows_has_exe_suffix() {
    launcher()
        .args(["url", "--os", "Windows 11", "--arch", "x64"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("iccheck_0.7.6_windows_amd64.exe\n"));
}

#[test]
fn test_url_unsupported_platform_exit_code() {
    launcher()
        .args(["url", "--os", "plan9", "--arch", "x86_64"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Unsupported platform"));
}

#[test]
fn test_url_json_envelope() {
    launcher()
        .args(["--json", "url", "--os", "darwin", "--arch", "arm64"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"ok\""))
        .stdout(predicate::str::contains("\"platform\": \"darwin_arm64\""));
}

#[test]
fn test_platform_prints_tag() {
    launcher()
        .arg("platform")
        .assert()
        .success()
        .stdout(predicate::str::contains("_"));
}

#[test]
fn test_invalid_config_exit_code() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("iccheck.toml");
    std::fs::write(&config, "releaseBase = \"ftp://nowhere\"\n").unwrap();

    launcher()
        .arg("--config")
        .arg(&config)
        .arg("platform")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("releaseBase"));
}

#[test]
fn test_bundled_only_miss_fails_without_network() {
    let temp = TempDir::new().unwrap();

    launcher()
        .env("PATH", temp.path())
        .arg("--bundled-only")
        .arg("--cache-dir")
        .arg(temp.path().join("cache"))
        .arg("resolve")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("not found"));
    assert!(!temp.path().join("cache").exists());
}

#[cfg(unix)]
#[test]
fn test_resolve_prefers_path_binary() {
    let temp = TempDir::new().unwrap();
    write_script(temp.path(), "iccheck", "#!/bin/sh\nexit 0\n");

    launcher()
        .env("PATH", temp.path())
        .arg("--json")
        .arg("--cache-dir")
        .arg(temp.path().join("cache"))
        .args(["resolve", "--workspace"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"origin\": \"path\""))
        .stdout(predicate::str::contains("\"launchArgs\": [\n      \"lsp\"\n    ]"));
}

#[cfg(unix)]
#[test]
fn test_launch_runs_binary_and_propagates_exit_code() {
    let temp = TempDir::new().unwrap();
    write_script(
        temp.path(),
        "iccheck",
        "#!/bin/sh\necho \"started with $*\"\nexit 7\n",
    );

    launcher()
        .env("PATH", temp.path())
        .arg("--cache-dir")
        .arg(temp.path().join("cache"))
        .args(["launch", "--workspace"])
        .arg(temp.path())
        .args(["--", "--verbose"])
        .assert()
        .code(7)
        .stdout("started with lsp --verbose\n");
}
