//! CLI integration tests for kernel-matrix.
//!
//! Builds run against stand-in tools (`true`, `false`, `echo`) configured in
//! the work directory's `.kernel-matrix/config.toml`.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the kernel-matrix binary command, isolated from the user's global config.
fn kernel_matrix(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kernel-matrix").unwrap();
    cmd.env("HOME", home);
    cmd
}

/// Create a temporary work directory.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

/// Write a project config selecting `tool` as the build tool.
fn use_tool(workdir: &Path, tool: &str) {
    let dir = workdir.join(".kernel-matrix");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("config.toml"),
        format!("[build]\ntool = \"{}\"\n", tool),
    )
    .unwrap();
}

// ============================================================================
// kernel-matrix list
// ============================================================================

#[test]
fn test_list_shows_builtin_sets() {
    let tmp = temp_dir();

    kernel_matrix(tmp.path())
        .args(["list", "-w"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("default"))
        .stdout(predicate::str::contains("quick"))
        .stdout(predicate::str::contains("extended"))
        .stdout(predicate::str::contains("riscv"));
}

#[test]
fn test_list_set_as_json() {
    let tmp = temp_dir();

    let output = kernel_matrix(tmp.path())
        .args(["list", "quick", "--json", "-w"])
        .arg(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let units = plan.as_array().unwrap();
    assert_eq!(units.len(), 3);
    assert_eq!(units[0]["release"], "master");
    assert_eq!(units[0]["machine"], "qemux86-64");
    assert_eq!(units[0]["kernel"], "lts");
    assert_eq!(units[2]["kernel"], "mainline");
}

#[test]
fn test_list_includes_configured_set() {
    let tmp = temp_dir();
    let dir = tmp.path().join(".kernel-matrix");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("config.toml"),
        r#"
[buildsets.nightly]
releases = ["master"]
machines = ["qemuarm64", "qemux86-64"]
kernels = ["5.15"]
"#,
    )
    .unwrap();

    kernel_matrix(tmp.path())
        .args(["list", "nightly", "-w"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[001/002]"))
        .stdout(predicate::str::contains("qemuarm64"));
}

// ============================================================================
// kernel-matrix build
// ============================================================================

#[test]
fn test_build_unknown_set_fails_before_building() {
    let tmp = temp_dir();
    use_tool(tmp.path(), "true");

    kernel_matrix(tmp.path())
        .args(["build", "-b", "nope", "-w"])
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown build set `nope`"))
        .stderr(predicate::str::contains("kernel-matrix list"));

    assert!(!tmp.path().join("logs").exists());
    assert!(!tmp.path().join("build").exists());
}

#[cfg(unix)]
#[test]
fn test_build_quick_succeeds() {
    let tmp = temp_dir();
    use_tool(tmp.path(), "true");

    kernel_matrix(tmp.path())
        .args(["--color", "never", "build", "-b", "quick", "-w"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Build set `quick`: 3 builds"))
        .stdout(predicate::str::contains("[001/003]"))
        .stdout(predicate::str::contains("[003/003]"))
        .stdout(predicate::str::contains("All succeeded."));

    assert!(tmp.path().join("logs/build_master_qemux86-64_lts.log").exists());
    assert!(tmp.path().join("logs/build_master_qemux86-64_mainline.log").exists());
    assert!(tmp.path().join("downloads").is_dir());
    assert!(tmp.path().join("sstate-cache").is_dir());
}

#[cfg(unix)]
#[test]
fn test_build_failures_reported() {
    let tmp = temp_dir();
    use_tool(tmp.path(), "false");

    kernel_matrix(tmp.path())
        .args(["--color", "never", "build", "--buildset", "quick", "-w"])
        .arg(tmp.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("✗"))
        .stdout(predicate::str::contains("Failed!"))
        .stderr(predicate::str::contains("3 of 3 builds failed"));

    // Every unit still ran and left a log with the error record
    let log = fs::read_to_string(tmp.path().join("logs/build_master_qemux86-64_stable.log")).unwrap();
    assert!(log.contains("failed with exit code 1"));
}

#[cfg(unix)]
#[test]
fn test_build_passes_config_list_and_siteconf() {
    let tmp = temp_dir();
    use_tool(tmp.path(), "echo");
    let siteconf = tmp.path().join("site.yml");
    fs::write(&siteconf, "header:\n  version: 14\n").unwrap();

    kernel_matrix(tmp.path())
        .args(["build", "-b", "quick", "-s"])
        .arg(&siteconf)
        .arg("-w")
        .arg(tmp.path())
        .assert()
        .success();

    let log = fs::read_to_string(tmp.path().join("logs/build_master_qemux86-64_lts.log")).unwrap();
    let expected = format!(
        "build kas/base.yml:kas/release-master.yml:kas/machine-qemux86-64.yml:kas/kernel-lts.yml:{}",
        siteconf.canonicalize().unwrap().display()
    );
    assert_eq!(log.trim_end(), expected);
}

#[cfg(unix)]
#[test]
fn test_build_with_non_utf8_environment() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let tmp = temp_dir();
    let tool = tmp.path().join("fake-kas");
    fs::write(&tool, "#!/bin/sh\ntest -n \"$KERNEL_MATRIX_RAW_BYTES\"\n").unwrap();
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
    }
    use_tool(tmp.path(), tool.to_str().unwrap());

    kernel_matrix(tmp.path())
        .env("KERNEL_MATRIX_RAW_BYTES", OsStr::from_bytes(b"\xff\xfe"))
        .args(["build", "-b", "quick", "-w"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("All succeeded."));
}

#[cfg(unix)]
#[test]
fn test_build_wipes_previous_build_dir() {
    let tmp = temp_dir();
    use_tool(tmp.path(), "true");
    let stale = tmp.path().join("build/master_qemux86-64_lts/stale");
    fs::create_dir_all(stale.parent().unwrap()).unwrap();
    fs::write(&stale, "old").unwrap();

    kernel_matrix(tmp.path())
        .args(["build", "-b", "quick", "-w"])
        .arg(tmp.path())
        .assert()
        .success();

    assert!(!stale.exists());
}

#[test]
fn test_build_missing_workdir_fails() {
    let tmp = temp_dir();

    kernel_matrix(tmp.path())
        .args(["build", "-b", "quick", "-w"])
        .arg(tmp.path().join("does-not-exist"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid work directory"));
}

// ============================================================================
// kernel-matrix update-recipe
// ============================================================================

#[test]
fn test_update_recipe_rejects_malformed_series() {
    let tmp = temp_dir();

    kernel_matrix(tmp.path())
        .args(["update-recipe", "5.x"])
        .assert()
        .failure();
}

// ============================================================================
// kernel-matrix completions
// ============================================================================

#[test]
fn test_completions_bash() {
    let tmp = temp_dir();

    kernel_matrix(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kernel-matrix"));
}
