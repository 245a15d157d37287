//! Manifest patching against real files on disk.

use l10nsync_lib::project::{
  NoopObserver, PatchError, PatchRequest, ResourceFile, patch_project, patch_project_default,
};
use l10nsync_lib::util::hash::hash_bytes;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::common::{TestProject, all_unique, count, declared_identifiers};

fn localization_request(project: &TestProject) -> PatchRequest {
  PatchRequest {
    project_dir: project.root().to_path_buf(),
    resources: vec![
      ResourceFile::new("Resources/en.lproj/Localizable.strings", Some("en")),
      ResourceFile::new("Resources/de.lproj/Localizable.strings", Some("de")),
    ],
    generated_source: Some("Sources/L10n.swift".into()),
    ..Default::default()
  }
}

#[test]
fn new_files_are_registered_exactly_once() {
  let project = TestProject::from_fixture("App.pbxproj");
  let original = project.manifest_text();

  let outcome = patch_project_default(&localization_request(&project)).unwrap();

  assert!(outcome.written);
  assert!(outcome.is_success());
  assert_eq!(outcome.integrated_count(), 3);

  let text = project.manifest_text();
  for path in [
    "Resources/en.lproj/Localizable.strings",
    "Resources/de.lproj/Localizable.strings",
    "Sources/L10n.swift",
  ] {
    assert_eq!(count(&text, &format!("path = {path};")), 1, "{path} should have one reference");
  }
  assert_eq!(count(&text, "Localizable.strings in Resources */ = {isa = PBXBuildFile"), 2);
  assert_eq!(count(&text, "L10n.swift in Sources */ = {isa = PBXBuildFile"), 1);
  assert_eq!(
    count(&text, "isa = PBXFileReference"),
    count(&original, "isa = PBXFileReference") + 3
  );
}

#[test]
fn three_languages_and_a_generated_source() {
  let project = TestProject::from_fixture("App.pbxproj");
  let original = project.manifest_text();
  let request = PatchRequest {
    project_dir: project.root().to_path_buf(),
    resources: ["en", "es", "fr"]
      .into_iter()
      .map(|lang| ResourceFile::new(format!("Resources/{lang}.lproj/Localizable.strings"), Some(lang)))
      .collect(),
    generated_source: Some("Generated/L10n.src".into()),
    ..Default::default()
  };

  let outcome = patch_project_default(&request).unwrap();
  assert!(outcome.written);
  assert_eq!(outcome.integrated_count(), 4);

  let text = project.manifest_text();
  assert_eq!(
    count(&text, "isa = PBXFileReference"),
    count(&original, "isa = PBXFileReference") + 4
  );
  assert_eq!(count(&text, "Localizable.strings in Resources */ = {isa = PBXBuildFile"), 3);
  assert_eq!(count(&text, "L10n.src in Sources */ = {isa = PBXBuildFile"), 1);

  let main_group = text.find("0C0000000000000000000007 = {").unwrap();
  let next_group = text.find("0C0000000000000000000008 /* Resources */ = {").unwrap();
  for child in ["/* en */,", "/* es */,", "/* fr */,", "/* L10n.src */,"] {
    assert_eq!(count(&text, child), 1, "{child} should be listed once");
    let at = text.find(child).unwrap();
    assert!(main_group < at && at < next_group, "{child} should be a child of the main group");
  }

  let written = std::fs::read(&project.manifest).unwrap();
  let rerun = patch_project_default(&request).unwrap();
  assert!(!rerun.written);
  assert_eq!(rerun.integrated_count(), 0);
  assert_eq!(rerun.unchanged.len(), 4);
  assert_eq!(std::fs::read(&project.manifest).unwrap(), written);
}

#[test]
fn second_run_leaves_file_untouched() {
  let project = TestProject::from_fixture("App.pbxproj");
  let request = localization_request(&project);

  patch_project_default(&request).unwrap();
  let after_first = std::fs::read(&project.manifest).unwrap();
  let modified = std::fs::metadata(&project.manifest).unwrap().modified().unwrap();

  let outcome = patch_project_default(&request).unwrap();

  assert!(!outcome.written);
  assert_eq!(outcome.integrated_count(), 0);
  assert_eq!(outcome.unchanged.len(), 3);
  assert_eq!(std::fs::read(&project.manifest).unwrap(), after_first);
  assert_eq!(std::fs::metadata(&project.manifest).unwrap().modified().unwrap(), modified);
}

#[test]
fn identifiers_stay_unique_across_runs() {
  let project = TestProject::from_fixture("App.pbxproj");

  patch_project_default(&localization_request(&project)).unwrap();
  let mut request = localization_request(&project);
  request.resources.push(ResourceFile::new("Resources/fr.lproj/Localizable.strings", Some("fr")));
  patch_project_default(&request).unwrap();

  let ids = declared_identifiers(&project.manifest_text());
  assert!(ids.len() > 20);
  assert!(all_unique(&ids));
}

#[test]
fn only_new_lines_are_added() {
  let project = TestProject::from_fixture("App.pbxproj");
  let original = project.manifest_text();

  let mut rng = StdRng::seed_from_u64(11);
  patch_project(&localization_request(&project), &mut rng, &mut NoopObserver).unwrap();

  let text = project.manifest_text();
  let original_lines: Vec<&str> = original.lines().collect();
  let kept: Vec<&str> = text.lines().filter(|line| original_lines.contains(line)).collect();
  assert_eq!(kept, original_lines);
  assert_eq!(text.lines().count(), original_lines.len() + 12);
}

#[test]
fn existing_reference_only_gains_build_file() {
  let project = TestProject::from_fixture("App.pbxproj");
  let request = PatchRequest {
    project_dir: project.root().to_path_buf(),
    resources: vec![ResourceFile::new("Base.lproj/Main.storyboard", None)],
    ..Default::default()
  };

  let outcome = patch_project_default(&request).unwrap();

  assert!(outcome.written);
  let text = project.manifest_text();
  assert_eq!(count(&text, "path = Base.lproj/Main.storyboard;"), 1);
  assert_eq!(count(&text, "fileRef = 5A0000000000000000000005 /* Main.storyboard */"), 1);
}

#[test]
fn missing_phase_in_target_is_a_partial_failure() {
  let project = TestProject::from_fixture("App.pbxproj");
  let mut request = localization_request(&project);
  request.target = Some("AppTests".into());

  let outcome = patch_project_default(&request).unwrap();

  assert!(outcome.written);
  assert!(!outcome.is_success());
  assert_eq!(outcome.integrated_count(), 2);
  assert_eq!(outcome.failed.len(), 1);
  assert_eq!(outcome.failed[0].path, "Sources/L10n.swift");
  assert!(matches!(outcome.failed[0].error, PatchError::PatternMismatch { .. }));
  assert_eq!(count(&project.manifest_text(), "L10n.swift"), 0);
}

#[test]
fn missing_manifest_is_not_found() {
  let temp = tempfile::TempDir::new().unwrap();
  let request = PatchRequest {
    project_dir: temp.path().to_path_buf(),
    resources: vec![ResourceFile::new("en.lproj/Localizable.strings", Some("en"))],
    ..Default::default()
  };

  assert!(matches!(patch_project_default(&request), Err(PatchError::NotFound { .. })));
}

#[test]
fn malformed_manifest_is_not_written() {
  let broken = super::common::fixture_content("App.pbxproj")
    .replace("/* Begin PBXGroup section */", "")
    .replace("/* End PBXGroup section */", "");
  let project = TestProject::with_manifest(&broken);
  let request = localization_request(&project);

  let result = patch_project_default(&request);

  assert!(matches!(result, Err(PatchError::Malformed { ref section, .. }) if section == "PBXGroup"));
  assert_eq!(project.manifest_text(), broken);
}

#[test]
fn search_starts_below_the_project() {
  let project = TestProject::from_fixture("App.pbxproj");
  let nested = project.root().join("Resources").join("en.lproj");
  std::fs::create_dir_all(&nested).unwrap();

  let mut request = localization_request(&project);
  request.project_dir = nested;

  let outcome = patch_project_default(&request).unwrap();
  assert_eq!(
    dunce::canonicalize(&outcome.manifest_path).unwrap(),
    dunce::canonicalize(&project.manifest).unwrap()
  );
}

#[test]
fn missing_file_reference_section_leaves_checksum_unchanged() {
  let broken = super::common::fixture_content("App.pbxproj")
    .replace("/* Begin PBXFileReference section */", "/* Begin PBXFileReferences section */");
  let project = TestProject::with_manifest(&broken);
  let before = hash_bytes(&std::fs::read(&project.manifest).unwrap());

  let result = patch_project_default(&localization_request(&project));

  assert!(matches!(result, Err(PatchError::Malformed { ref section, .. }) if section == "PBXFileReference"));
  assert_eq!(hash_bytes(&std::fs::read(&project.manifest).unwrap()), before);
}
