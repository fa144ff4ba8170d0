use assert_cmd::{cargo::cargo_bin_cmd, Command};
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn offgrid() -> Command {
    cargo_bin_cmd!("offgrid")
}

/// Config pointing all state into `dir`
fn write_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    let content = format!(
        "[general]\naudit_log = false\n\n[origin]\nurl = \"http://127.0.0.1:9\"\n\n[cache]\ndir = \"{}\"\n",
        dir.join("partitions").display()
    );
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn help_displays() {
    offgrid()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("HTTP cache"));
}

#[test]
fn version_displays() {
    offgrid()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("offgrid"));
}

#[test]
fn config_path_honours_flag() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");
    offgrid()
        .args(["config", "path", "-c"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn config_init_then_show() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    offgrid()
        .args(["config", "init", "-c"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration initialized"));
    assert!(path.exists());

    offgrid()
        .args(["config", "show", "-c"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[origin]"))
        .stdout(predicate::str::contains("[precache]"));
}

#[test]
fn partitions_list_empty() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());
    offgrid()
        .args(["partitions", "list", "-c"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("No partitions found"));
}

#[test]
fn status_before_install() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());
    offgrid()
        .args(["status", "-c"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Not installed"));
}

#[test]
fn activate_without_install_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());
    offgrid()
        .args(["activate", "-c"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No installed version found"));
}

#[test]
fn invalid_partition_name_rejected() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());
    offgrid()
        .args(["partitions", "show", "../etc", "-c"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid partition name"));
}
