//! Patch and locate command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn patch_registers_resources() {
  let env = TestEnv::from_fixture("App.pbxproj");

  env
    .l10nsync_cmd()
    .args(["patch", "--resource", "en.lproj/Localizable.strings:en"])
    .args(["--resource", "de.lproj/Localizable.strings:de"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Registered: 2"));

  let manifest = env.manifest();
  assert_eq!(manifest.matches("path = en.lproj/Localizable.strings;").count(), 1);
  assert_eq!(manifest.matches("path = de.lproj/Localizable.strings;").count(), 1);
}

#[test]
fn patch_twice_reports_up_to_date() {
  let env = TestEnv::from_fixture("App.pbxproj");
  let args = ["patch", "--resource", "en.lproj/Localizable.strings:en"];

  env.l10nsync_cmd().args(args).assert().success();
  let first = env.manifest();

  env
    .l10nsync_cmd()
    .args(args)
    .assert()
    .success()
    .stdout(predicate::str::contains("already up to date"))
    .stdout(predicate::str::contains("Unchanged: 1"));
  assert_eq!(env.manifest(), first);
}

#[test]
fn patch_partial_failure_exits_with_two() {
  let env = TestEnv::from_fixture("App.pbxproj");

  env
    .l10nsync_cmd()
    .args(["patch", "--target", "AppTests"])
    .args(["--resource", "en.lproj/Localizable.strings:en", "--source-file", "Sources/L10n.swift"])
    .assert()
    .code(2)
    .stderr(predicate::str::contains("could not register 'Sources/L10n.swift'"));

  assert!(env.manifest().contains("path = en.lproj/Localizable.strings;"));
}

#[test]
fn patch_json_output() {
  let env = TestEnv::from_fixture("App.pbxproj");

  let output = env
    .l10nsync_cmd()
    .args(["--output", "json", "patch", "--resource", "en.lproj/Localizable.strings:en"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["written"], true);
  assert_eq!(report["integrated"][0], "en.lproj/Localizable.strings");
}

#[test]
fn patch_without_project_fails() {
  let temp = tempfile::TempDir::new().unwrap();

  assert_cmd::cargo::cargo_bin_cmd!("l10nsync")
    .current_dir(temp.path())
    .args(["patch", "--resource", "en.lproj/Localizable.strings:en"])
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains("project.pbxproj found in"));
}

#[test]
fn patch_requires_files() {
  let env = TestEnv::from_fixture("App.pbxproj");

  env
    .l10nsync_cmd()
    .arg("patch")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("Nothing to register"));
}

#[test]
fn locate_prints_manifest_path() {
  let env = TestEnv::from_fixture("App.pbxproj");

  env
    .l10nsync_cmd()
    .arg("locate")
    .assert()
    .success()
    .stdout(predicate::str::contains("App.xcodeproj").and(predicate::str::contains("project.pbxproj")));
}
