#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

struct Node {
    dir: TempDir,
}

impl Node {
    /// A node whose manifest consumes the `uaa_db` link.
    fn linked(release_level_backup: bool) -> Self {
        let node = Self::empty();
        node.write_manifest(&format!(
            r#"
links:
  uaa_db:
    instances: []
    properties:
      release_level_backup: {release_level_backup}
      uaadb:
        address: 127.0.0.1
        port: 5432
        db_scheme: postgresql
        databases: [{{name: uaa_db_name, tag: uaa}}]
        roles: [{{name: admin, password: example, tag: admin}}]
properties:
  release_level_backup: {release_level_backup}
{local}
"#,
            local = node.local_properties()
        ));
        node
    }

    /// A node with `links: ~`, so only local properties apply.
    fn local_only(release_level_backup: bool) -> Self {
        let node = Self::empty();
        node.write_manifest(&format!(
            "links: ~\nproperties:\n  release_level_backup: {release_level_backup}\n{}",
            node.local_properties()
        ));
        node
    }

    fn empty() -> Self {
        let node = Self {
            dir: TempDir::new().unwrap(),
        };
        std::fs::create_dir_all(node.restorer_bin()).unwrap();
        std::fs::create_dir_all(node.artifact_dir()).unwrap();
        node
    }

    fn local_properties(&self) -> String {
        format!(
            r#"  uaa:
    limitedFunctionality:
      statusFile: {marker}
  uaadb:
    address: 127.0.0.2
    port: 2222
    db_scheme: postgres
    databases: [{{name: uaa_db_2_name, tag: uaa}}]
    roles: [{{name: ad2min, password: exam2ple, tag: admin}}]
"#,
            marker = self.marker().display()
        )
    }

    fn write_manifest(&self, body: &str) {
        let root = self.dir.path();
        let paths = format!(
            "paths:\n  job_path: {}\n  restorer_bin_dir: {}\n  monit_bin: {}\n  post_start_hook: {}\n",
            root.join("jobs/bbr-uaadb").display(),
            self.restorer_bin().display(),
            root.join("bin/monit").display(),
            root.join("bin/post-start").display(),
        );
        std::fs::write(self.manifest(), format!("{body}\n{paths}")).unwrap();
    }

    fn manifest(&self) -> PathBuf {
        self.dir.path().join("manifest.yml")
    }

    fn marker(&self) -> PathBuf {
        self.dir.path().join("data/uaa/bbr_limited_mode.lock")
    }

    fn restorer_bin(&self) -> PathBuf {
        self.dir.path().join("restorer/bin")
    }

    fn artifact_dir(&self) -> PathBuf {
        self.dir.path().join("artifacts")
    }

    fn config_json(&self) -> PathBuf {
        self.dir.path().join("jobs/bbr-uaadb/config/config.json")
    }

    fn calls(&self) -> PathBuf {
        self.dir.path().join("calls")
    }

    /// Install a fake restorer tool that records its arguments.
    fn install_tool(&self, name: &str, exit_code: i32) {
        let path = self.restorer_bin().join(name);
        std::fs::write(
            &path,
            format!(
                "#!/bin/sh\necho \"{name} $@\" >> '{calls}'\necho \"{name} output\"\nexit {exit_code}\n",
                calls = self.calls().display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn recorded_calls(&self) -> String {
        std::fs::read_to_string(self.calls()).unwrap_or_default()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("bbr-uaadb").unwrap();
        cmd.current_dir(self.dir.path())
            .env("BBR_MANIFEST", self.manifest())
            .env("BBR_ARTIFACT_DIRECTORY", self.artifact_dir())
            .env_remove("RUST_LOG");
        cmd
    }
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

// ---------------------------------------------------------------------------
// config render / show / validate
// ---------------------------------------------------------------------------

#[test]
fn config_render_uses_linked_source() {
    let node = Node::linked(true);
    node.cmd().args(["config", "render"]).assert().success();

    assert_eq!(
        read_json(&node.config_json()),
        serde_json::json!({
            "adapter": "postgres",
            "host": "127.0.0.1",
            "port": 5432,
            "database": "uaa_db_name",
            "username": "admin",
            "password": "example",
        })
    );
}

#[test]
fn config_render_falls_back_to_properties_without_link() {
    let node = Node::local_only(true);
    node.cmd().args(["config", "render"]).assert().success();

    let config = read_json(&node.config_json());
    assert_eq!(config["username"], "ad2min");
    assert_eq!(config["password"], "exam2ple");
    assert_eq!(config["host"], "127.0.0.2");
    assert_eq!(config["port"], 2222);
    assert_eq!(config["database"], "uaa_db_2_name");
    assert_eq!(config["adapter"], "postgres");
}

#[test]
fn config_render_is_unconditional() {
    let node = Node::linked(false);
    node.cmd().args(["config", "render"]).assert().success();
    assert_eq!(read_json(&node.config_json())["username"], "admin");
}

#[test]
fn config_show_redacts_password() {
    let node = Node::linked(true);
    node.cmd()
        .args(["config", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"source\": \"linked\""))
        .stdout(predicate::str::contains("<redacted>"))
        .stdout(predicate::str::contains("example").not());
}

#[test]
fn config_show_text() {
    let node = Node::local_only(false);
    node.cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("local"))
        .stdout(predicate::str::contains("release_level_backup is false"))
        .stdout(predicate::str::contains("exam2ple").not());
}

#[test]
fn config_validate_flags_unsupported_scheme() {
    let node = Node::empty();
    node.write_manifest(
        "properties:\n  uaadb:\n    address: db\n    port: 1\n    db_scheme: hsqldb\n    databases: [{name: uaa, tag: uaa}]\n    roles: [{name: admin, password: pw, tag: admin}]\n",
    );
    node.cmd()
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("hsqldb"));
}

#[test]
fn config_validate_clean_manifest() {
    let node = Node::local_only(true);
    node.cmd()
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No warnings"));
}

#[test]
fn missing_manifest_fails() {
    let node = Node::empty();
    node.cmd()
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("manifest not found"));
}

// ---------------------------------------------------------------------------
// backup / restore
// ---------------------------------------------------------------------------

#[test]
fn backup_invokes_restorer_with_config_and_artifact() {
    let node = Node::linked(true);
    node.install_tool("backup", 0);

    node.cmd()
        .arg("backup")
        .assert()
        .success()
        .stdout(predicate::str::contains("backup output"));

    let expected = format!(
        "backup --config {} --artifact-file {}\n",
        node.config_json().display(),
        node.artifact_dir().join("uaadb-artifact-file").display()
    );
    assert_eq!(node.recorded_calls(), expected);
    assert_eq!(read_json(&node.config_json())["database"], "uaa_db_name");
}

#[test]
fn backup_not_participating_skips_restorer() {
    let node = Node::linked(false);
    node.install_tool("backup", 0);

    node.cmd().arg("backup").assert().success();

    assert!(node.recorded_calls().is_empty());
    assert!(node.config_json().exists());
}

#[test]
fn link_without_flag_ignores_local_flag() {
    let node = Node::empty();
    node.write_manifest(&format!(
        r#"
links:
  uaa_db:
    properties:
      uaadb:
        address: 127.0.0.1
        port: 5432
        db_scheme: postgresql
        databases: [{{name: uaa_db_name, tag: uaa}}]
        roles: [{{name: admin, password: example, tag: admin}}]
properties:
  release_level_backup: true
{local}
"#,
        local = node.local_properties()
    ));
    node.install_tool("backup", 0);

    node.cmd()
        .args(["backup", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"skipped\""));

    assert!(node.recorded_calls().is_empty());
    assert_eq!(read_json(&node.config_json())["host"], "127.0.0.1");
}

#[test]
fn restore_not_participating_skips_restorer() {
    let node = Node::local_only(false);
    node.install_tool("restore", 0);

    node.cmd()
        .args(["restore", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"skipped\""));

    assert!(node.recorded_calls().is_empty());
}

#[test]
fn restore_failure_propagates_exit_code() {
    let node = Node::linked(true);
    node.install_tool("restore", 3);

    node.cmd()
        .arg("restore")
        .assert()
        .code(3)
        .stdout(predicate::str::contains("restore output"))
        .stderr(predicate::str::contains("restore of uaadb failed"));
}

#[test]
fn missing_restorer_fails() {
    let node = Node::linked(true);
    node.cmd()
        .arg("backup")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found or not executable"));
}

#[test]
fn backup_requires_artifact_directory() {
    let node = Node::linked(true);
    node.cmd()
        .env_remove("BBR_ARTIFACT_DIRECTORY")
        .arg("backup")
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// lock scripts
// ---------------------------------------------------------------------------

#[test]
fn lock_scripts_do_nothing_when_not_participating() {
    let node = Node::linked(false);

    node.cmd().arg("pre-backup-lock").assert().success();
    assert!(!node.marker().exists());

    // Restore scripts would call monit, which does not exist here.
    node.cmd().arg("pre-restore-lock").assert().success();
    node.cmd().arg("post-restore-unlock").assert().success();
    node.cmd().arg("post-backup-unlock").assert().success();
}

#[test]
fn backup_lock_then_unlock_leaves_no_marker() {
    let node = Node::linked(true);

    node.cmd().arg("pre-backup-lock").assert().success();
    assert!(node.marker().exists());
    node.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("limited"));

    node.cmd().arg("post-backup-unlock").assert().success();
    assert!(!node.marker().exists());
    node.cmd()
        .args(["status", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"state\": \"normal\""));
}

#[test]
fn pre_backup_lock_refuses_broken_config() {
    let node = Node::empty();
    node.write_manifest("properties:\n  release_level_backup: true\n");

    node.cmd()
        .arg("pre-backup-lock")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing from local configuration"));
    assert!(!node.marker().exists());
}

#[test]
fn window_not_participating_reports_skip() {
    let node = Node::linked(false);
    node.install_tool("backup", 0);

    node.cmd()
        .args(["window", "backup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to do"));
    assert!(node.recorded_calls().is_empty());
    assert!(!node.marker().exists());
}
