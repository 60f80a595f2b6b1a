// ABOUTME: Integration tests for the fleetvisor CLI commands.
// ABOUTME: Validates --help output, init, argument checks, and the suspension flag commands.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn fleetvisor_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fleetvisor"));
    cmd.current_dir(dir).env("SUPERVISOR_SOCKET_DIR", dir);
    cmd
}

#[test]
fn help_shows_commands() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut out = fleetvisor_cmd(temp_dir.path()).arg("--help").assert().success();
    for command in [
        "init",
        "status",
        "stop",
        "start",
        "restart",
        "graceful-restart",
        "suspend",
        "resume",
    ] {
        out = out.stdout(predicate::str::contains(command));
    }
}

#[test]
fn init_creates_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("fleetvisor.yml");

    fleetvisor_cmd(temp_dir.path())
        .args(["init", "--socket-dir", "/srv/sockets"])
        .assert()
        .success();

    assert!(config_path.exists(), "fleetvisor.yml should be created");
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("socket_dir: /srv/sockets"));
    assert!(content.contains("colors: [blue,green]"));
}

#[test]
fn init_refuses_to_overwrite_existing_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("fleetvisor.yml");

    fs::write(&config_path, "parallelism: 2\n").unwrap();

    fleetvisor_cmd(temp_dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    assert_eq!(fs::read_to_string(&config_path).unwrap(), "parallelism: 2\n");
}

#[test]
fn quiet_and_json_conflict() {
    let temp_dir = tempfile::tempdir().unwrap();
    fleetvisor_cmd(temp_dir.path())
        .args(["--quiet", "--json", "status"])
        .assert()
        .failure();
}

#[test]
fn status_without_sockets_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    fleetvisor_cmd(temp_dir.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no supervisor domains found"));
}

#[test]
fn start_rejects_unknown_state() {
    let temp_dir = tempfile::tempdir().unwrap();
    fleetvisor_cmd(temp_dir.path())
        .args(["start", "--state", "purple"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --state"));
}

#[test]
fn suspend_requires_a_store() {
    let temp_dir = tempfile::tempdir().unwrap();
    fleetvisor_cmd(temp_dir.path())
        .arg("suspend")
        .assert()
        .failure()
        .stderr(predicate::str::contains("drain.store_dir is not configured"));
}

#[test]
fn suspend_then_resume_round_trips_the_flag() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = temp_dir.path().join("drain");
    fs::write(
        temp_dir.path().join("fleetvisor.yml"),
        format!("drain:\n  store_dir: {}\n", store.display()),
    )
    .unwrap();

    fleetvisor_cmd(temp_dir.path())
        .arg("suspend")
        .assert()
        .success()
        .stdout(predicate::str::contains("suspended"));
    assert_eq!(fs::read_dir(store.join("flags")).unwrap().count(), 1);

    fleetvisor_cmd(temp_dir.path())
        .arg("resume")
        .assert()
        .success()
        .stdout(predicate::str::contains("Job admission resumed"));
    assert_eq!(fs::read_dir(store.join("flags")).unwrap().count(), 0);

    fleetvisor_cmd(temp_dir.path())
        .arg("resume")
        .assert()
        .success()
        .stdout(predicate::str::contains("was not suspended"));
}
