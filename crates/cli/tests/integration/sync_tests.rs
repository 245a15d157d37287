//! Sync command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

const TABLE: &str = "key,comment,en,de\nhello,Greeting,Hello,Hallo\n";

const CONFIG: &str = r#"{
  "source": "table.csv",
  "outputDir": "Resources",
  "enumPath": "Sources/L10n.swift",
  "projectDir": "."
}"#;

#[test]
fn sync_with_config_file() {
  let env = TestEnv::from_fixture("App.pbxproj");
  env.write_file("table.csv", TABLE);
  env.write_file("l10nsync.json", CONFIG);

  env
    .l10nsync_cmd()
    .arg("sync")
    .assert()
    .success()
    .stdout(predicate::str::contains("Sync complete"))
    .stdout(predicate::str::contains("Registered: 3"));

  assert!(env.read_file("Resources/de.lproj/Localizable.strings").contains("\"hello\" = \"Hallo\";"));
  assert!(env.read_file("Sources/L10n.swift").contains("case hello = \"hello\""));
  assert!(env.manifest().contains("path = Resources/en.lproj/Localizable.strings;"));
}

#[test]
fn sync_flags_override_config() {
  let env = TestEnv::from_fixture("App.pbxproj");
  env.write_file("other.csv", "key,fr\nhello,Bonjour\n");
  env.write_file("table.csv", TABLE);
  env.write_file("l10nsync.json", CONFIG);

  env
    .l10nsync_cmd()
    .args(["sync", "--source", "other.csv", "--out", "Out"])
    .assert()
    .success();

  assert!(env.read_file("Out/fr.lproj/Localizable.strings").contains("Bonjour"));
  assert!(!env.root().join("Resources").exists());
}

#[test]
fn sync_without_source_fails() {
  let env = TestEnv::from_fixture("App.pbxproj");

  env
    .l10nsync_cmd()
    .args(["sync", "--out", "Resources"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("missing required setting 'source'"));
}

#[test]
fn sync_with_missing_config_fails() {
  let env = TestEnv::from_fixture("App.pbxproj");

  env
    .l10nsync_cmd()
    .args(["sync", "--config", "missing.json"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("config file not found"));
}
