//! Integration tests for the scopewire CLI
//!
//! These tests run the actual binary against manifests written to a temp dir.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Binary under test, isolated from any local or user config
fn scopewire_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("scopewire").unwrap();
    cmd.current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .env("HOME", dir.path())
        .env("NO_COLOR", "1")
        .env_remove("SCOPEWIRE_ISOLATION")
        .env_remove("SCOPEWIRE_REPORT_UNUSED");
    cmd
}

fn write_manifest(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("scene.yaml");
    fs::write(&path, format!("schema: scopewire/manifest@0.1\n{body}")).unwrap();
    path
}

const WIRED: &str = r#"
types:
  interfaces: [IWeapon]
  components:
    Rifle: [IWeapon]
    Soldier: []
containers:
  - name: Main
    nodes:
      - name: Level
        scope:
          bindings:
            - bind: Rifle
              as: IWeapon
              locate:
                search: { direction: descendants }
        children:
          - name: Soldier
            units:
              - type: Rifle
              - type: Soldier
                sites:
                  - { member: weapon, requests: IWeapon, by_interface: true }
"#;

const UNBOUND: &str = r#"
types:
  interfaces: [IWeapon]
  components:
    Soldier: []
containers:
  - name: Main
    nodes:
      - name: Level
        scope: {}
        units:
          - type: Soldier
            sites:
              - { member: weapon, requests: IWeapon, by_interface: true }
"#;

const PROXIED: &str = r#"
types:
  interfaces: [ITarget]
  components:
    Turret: [ITarget]
    Radar: []
containers:
  - name: Main
    nodes:
      - name: Level
        scope:
          bindings:
            - bind: Turret
              as: ITarget
              proxy: true
              locate:
                search: { direction: anywhere }
        units:
          - type: Radar
            sites:
              - { member: tracked, requests: ITarget, by_interface: true }
"#;

// ═══════════════════════════════════════════════════════════════
// HELP
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_help_flag() {
    let dir = TempDir::new().unwrap();
    scopewire_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scope-hierarchy binding resolver"));
}

#[test]
fn test_run_help_lists_flags() {
    let dir = TempDir::new().unwrap();
    scopewire_cmd(&dir)
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--no-isolation"))
        .stdout(predicate::str::contains("--template"));
}

// ═══════════════════════════════════════════════════════════════
// RUN
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_run_clean_manifest() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, WIRED);

    scopewire_cmd(&dir)
        .arg("run")
        .arg(&manifest)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Pass over Main"))
        .stdout(predicate::str::contains("Soldier.weapon"))
        .stdout(predicate::str::contains("Injected: 1"));
}

#[test]
fn test_run_reports_missing_binding() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, UNBOUND);

    scopewire_cmd(&dir)
        .arg("run")
        .arg(&manifest)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[SW-110]"));
}

#[test]
fn test_run_pending_generation_exits_2() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, PROXIED);

    scopewire_cmd(&dir)
        .arg("run")
        .arg(&manifest)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Turret"));
}

#[test]
fn test_run_json_output() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, WIRED);

    let output = scopewire_cmd(&dir)
        .arg("run")
        .arg(&manifest)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let report = &reports[0];
    assert_eq!(report["target"], "Main");
    assert_eq!(report["outcome"], "completed");
    assert_eq!(report["assignments"][0]["site"], "Soldier.weapon");
    assert_eq!(report["stats"]["injected"], 1);
}

#[test]
fn test_run_unknown_container() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, WIRED);

    scopewire_cmd(&dir)
        .arg("run")
        .arg(&manifest)
        .args(["--container", "Nowhere"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("[SW-030]"));
}

#[test]
fn test_run_missing_file() {
    let dir = TempDir::new().unwrap();

    scopewire_cmd(&dir)
        .args(["run", "does-not-exist.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("[SW-001]"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_run_reads_local_config() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(
        &dir,
        r#"
types:
  components:
    Rifle: []
containers:
  - name: Main
    nodes:
      - name: Level
        scope:
          bindings:
            - bind: Rifle
              locate:
                search: { direction: descendants }
"#,
    );
    fs::write(dir.path().join("scopewire.toml"), "report_unused = false\n").unwrap();

    scopewire_cmd(&dir)
        .arg("run")
        .arg(&manifest)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("[SW-150]").not());
}

const INSTANCED: &str = r#"
types:
  interfaces: [ITarget]
  components:
    Turret: [ITarget]
    Radar: []
implementations: [Turret]
containers:
  - name: Main
    nodes:
      - name: Level
        scope:
          bindings:
            - bind: Turret
              as: ITarget
              proxy: true
              locate:
                search: { direction: anywhere }
        children:
          - name: Enemy
            instance: true
            children:
              - name: Eye
                scope: {}
                units:
                  - type: Radar
                    sites:
                      - { member: tracked, requests: ITarget, by_interface: true }
          - name: Crate
            instance: true
            units:
              - type: Radar
                sites:
                  - { member: tracked, requests: ITarget, by_interface: true }
"#;

#[test]
fn test_run_passes_over_every_instance() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, INSTANCED);

    scopewire_cmd(&dir)
        .arg("run")
        .arg(&manifest)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Pass over Enemy"))
        .stdout(predicate::str::contains("Radar.tracked on"))
        .stdout(predicate::str::contains("Pass over Crate"))
        .stdout(predicate::str::contains("[SW-110]"));
}

#[test]
fn test_run_container_only_skips_instances() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, INSTANCED);

    scopewire_cmd(&dir)
        .arg("run")
        .arg(&manifest)
        .args(["--container", "Main"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Pass over Enemy").not());
}

#[test]
fn test_demo_scene_runs_clean() {
    let dir = TempDir::new().unwrap();
    let demo = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/scene.yaml");

    scopewire_cmd(&dir)
        .arg("run")
        .arg(&demo)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Soldier.sidearm"));
}

// ═══════════════════════════════════════════════════════════════
// VALIDATE
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_validate_valid_manifest() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, WIRED);

    scopewire_cmd(&dir)
        .arg("validate")
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn test_validate_reports_invalid_binding() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(
        &dir,
        r#"
types:
  interfaces: [IWeapon]
  components:
    Rifle: []
containers:
  - name: Main
    nodes:
      - name: Level
        scope:
          bindings:
            - bind: Rifle
              as: IWeapon
              locate:
                search: { direction: self }
"#,
    );

    scopewire_cmd(&dir)
        .arg("validate")
        .arg(&manifest)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[SW-100]"))
        .stdout(predicate::str::contains("1 invalid binding"));
}

#[test]
fn test_validate_rejects_unknown_fields() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, "bogus: true\n");

    scopewire_cmd(&dir)
        .arg("validate")
        .arg(&manifest)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("[SW-002]"));
}
