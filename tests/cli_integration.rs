//! CLI integration tests
//!
//! These run the compiled `buildorch` binary and check its output and exit
//! codes.

use serial_test::serial;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const BUILDORCH_VARS: &[&str] = &[
    "BUILDORCH_MAX_CONCURRENT_BUILDS",
    "BUILDORCH_CANCEL_GRACE_MS",
    "BUILDORCH_PROJECT_POLICY",
    "BUILDORCH_BUILD_DIR",
    "BUILDORCH_BUILD_TYPE",
    "BUILDORCH_JOBS",
    "BUILDORCH_TOOL",
    "BUILDORCH_LOG_DIR",
    "BUILDORCH_LOG_LEVEL",
    "BUILDORCH_LOG_JSON",
    "RUST_LOG",
];

fn buildorch_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_buildorch"))
}

fn run(args: &[&str]) -> Output {
    let mut command = Command::new(buildorch_bin());
    for var in BUILDORCH_VARS {
        command.env_remove(var);
    }
    command
        .args(args)
        .output()
        .expect("Failed to execute buildorch")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

fn create_make_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Makefile"), "all:\n\t@true\n").unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/main.c"), "int main(void) { return 0; }\n").unwrap();
    dir
}

#[test]
fn test_cli_help() {
    let output = run(&["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("buildorch"));
    assert!(stdout.contains("detect"));
    assert!(stdout.contains("flags"));
    assert!(stdout.contains("build"));
    assert!(stdout.contains("health"));
}

#[test]
fn test_cli_version() {
    let output = run(&["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_subcommand_fails() {
    let output = run(&["frobnicate"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_detect_json() {
    let dir = create_make_repo();
    let output = run(&["detect", path_arg(dir.path()), "--format", "json"]);

    assert!(output.status.success(), "{:?}", output);
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["build_system"], "make");
    assert_eq!(value["root"], path_arg(dir.path()));
    assert_eq!(value["priority"], 20);
}

#[test]
fn test_detect_descriptor_file() {
    let dir = create_make_repo();
    let output = run(&["detect", path_arg(&dir.path().join("Makefile"))]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Build system: Make"));
}

#[test]
fn test_detect_nothing_found() {
    let dir = TempDir::new().unwrap();
    let output = run(&["detect", path_arg(dir.path()), "--format", "json"]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "null");
}

#[test]
fn test_flags_for_make_project() {
    let dir = create_make_repo();
    let source = dir.path().join("src/main.c");
    let output = run(&[
        "flags",
        path_arg(dir.path()),
        path_arg(&source),
        "--jobs",
        "4",
        "--format",
        "json",
    ]);

    assert!(output.status.success(), "{:?}", output);
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["build_system"], "make");
    assert_eq!(
        value["flags"],
        serde_json::json!(["-C", path_arg(dir.path()), "-j4", "src/main.o"])
    );
}

#[test]
fn test_flags_source_outside_project() {
    let dir = create_make_repo();
    let other = TempDir::new().unwrap();
    let output = run(&[
        "flags",
        path_arg(dir.path()),
        path_arg(&other.path().join("main.c")),
    ]);

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_build_without_build_system() {
    let dir = TempDir::new().unwrap();
    let output = run(&[
        "build",
        path_arg(dir.path()),
        path_arg(&dir.path().join("main.c")),
    ]);

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let dir = create_make_repo();
    let output = run(&["flags", path_arg(dir.path()), "src/main.c", "--jobs", "0"]);
    assert_eq!(output.status.code(), Some(2));
}

#[cfg(unix)]
#[test]
fn test_build_succeeds_with_tool_override() {
    let dir = create_make_repo();
    let output = run(&[
        "build",
        path_arg(dir.path()),
        path_arg(&dir.path().join("src/main.c")),
        "--tool",
        "true",
        "--format",
        "json",
    ]);

    assert_eq!(output.status.code(), Some(0), "{:?}", output);
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["state"], "succeeded");
    assert_eq!(value["failed"], false);
    assert_eq!(value["log"].as_array().unwrap().last().unwrap(), "build succeeded");
}

#[cfg(unix)]
#[test]
fn test_build_failure_exit_code() {
    let dir = create_make_repo();
    let output = run(&[
        "build",
        path_arg(dir.path()),
        path_arg(&dir.path().join("src/main.c")),
        "--tool",
        "false",
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("failed"));
}

#[cfg(unix)]
#[test]
#[serial]
fn test_build_timeout_cancels() {
    use std::os::unix::fs::PermissionsExt;

    let dir = create_make_repo();
    let script = dir.path().join("slow-build.sh");
    fs::write(&script, "#!/bin/sh\nsleep 30\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let started = std::time::Instant::now();
    let output = run(&[
        "build",
        path_arg(dir.path()),
        path_arg(&dir.path().join("src/main.c")),
        "--tool",
        path_arg(&script),
        "--timeout",
        "1",
        "--format",
        "json",
    ]);

    assert_eq!(output.status.code(), Some(130), "{:?}", output);
    assert!(started.elapsed() < std::time::Duration::from_secs(20));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["state"], "cancelled");
}

#[test]
fn test_health_json_lists_default_tools() {
    let output = run(&["health", "--format", "json"]);

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let tools: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["tool"].as_str().unwrap())
        .collect();
    assert_eq!(tools, vec!["cmake", "meson", "make"]);
}
