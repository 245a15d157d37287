//! End-to-end sync into a project.

use std::path::PathBuf;

use l10nsync_lib::fetch::{FetchOptions, Source};
use l10nsync_lib::pipeline::{SyncConfig, sync};
use tokio_util::sync::CancellationToken;

use super::common::{TestProject, count};

const TABLE: &str = "\
key,comment,en,de
welcome.title,Shown on launch,Welcome,Willkommen
welcome.body,,Glad you are here,
";

fn config(project: &TestProject) -> SyncConfig {
  let source = project.root().join("table.csv");
  std::fs::write(&source, TABLE).unwrap();

  SyncConfig {
    source: Source::Path(source),
    out_dir: project.root().join("Resources"),
    table_name: "Localizable.strings".into(),
    languages: None,
    fallback: true,
    enum_path: Some(project.root().join("Sources").join("L10n.swift")),
    enum_name: "L10n".into(),
    project_dir: Some(project.root().to_path_buf()),
    manifest_root: None,
    target: None,
    group: None,
    force: false,
    parallelism: 2,
    fetch: FetchOptions::default(),
  }
}

#[tokio::test]
async fn sync_generates_and_registers() {
  let project = TestProject::from_fixture("App.pbxproj");

  let result = sync(&config(&project), &CancellationToken::new()).await.unwrap();

  assert!(result.is_success());
  assert_eq!(result.languages, vec!["en", "de"]);
  assert_eq!(result.entries, 2);

  let de = std::fs::read_to_string(project.root().join("Resources/de.lproj/Localizable.strings")).unwrap();
  assert!(de.contains("\"welcome.title\" = \"Willkommen\";"));
  assert!(de.contains("\"welcome.body\" = \"Glad you are here\";"));

  let swift = std::fs::read_to_string(project.root().join("Sources/L10n.swift")).unwrap();
  assert!(swift.contains("case welcomeTitle = \"welcome.title\""));

  let patch = result.patch.unwrap();
  assert!(patch.written);
  assert_eq!(patch.integrated_count(), 3);

  let manifest = project.manifest_text();
  assert_eq!(count(&manifest, "path = Resources/en.lproj/Localizable.strings;"), 1);
  assert_eq!(count(&manifest, "path = Resources/de.lproj/Localizable.strings;"), 1);
  assert_eq!(count(&manifest, "path = Sources/L10n.swift;"), 1);
}

#[tokio::test]
async fn repeated_sync_is_idempotent() {
  let project = TestProject::from_fixture("App.pbxproj");
  let cfg = config(&project);

  sync(&cfg, &CancellationToken::new()).await.unwrap();
  let manifest = project.manifest_text();

  let second = sync(&cfg, &CancellationToken::new()).await.unwrap();

  assert!(second.generated.iter().all(|f| !f.changed));
  assert!(!second.enum_file.unwrap().changed);
  let patch = second.patch.unwrap();
  assert!(!patch.written);
  assert_eq!(patch.unchanged.len(), 3);
  assert_eq!(project.manifest_text(), manifest);
}

#[tokio::test]
async fn explicit_manifest_root_changes_registered_paths() {
  let project = TestProject::from_fixture("App.pbxproj");
  let mut cfg = config(&project);
  cfg.manifest_root = Some(PathBuf::from(project.root()).join("Resources"));
  cfg.enum_path = None;

  let result = sync(&cfg, &CancellationToken::new()).await.unwrap();

  assert_eq!(result.patch.unwrap().integrated_count(), 2);
  assert_eq!(count(&project.manifest_text(), "path = en.lproj/Localizable.strings;"), 1);
}
