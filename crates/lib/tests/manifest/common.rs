//! Shared helpers for manifest integration tests.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// A project directory holding `App.xcodeproj/project.pbxproj`.
pub struct TestProject {
  pub temp: TempDir,
  pub manifest: PathBuf,
}

impl TestProject {
  /// Create from a fixture manifest.
  pub fn from_fixture(name: &str) -> Self {
    Self::with_manifest(&fixture_content(name))
  }

  pub fn with_manifest(content: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let container = temp.path().join("App.xcodeproj");
    std::fs::create_dir_all(&container).unwrap();
    let manifest = container.join("project.pbxproj");
    std::fs::write(&manifest, content).unwrap();
    Self { temp, manifest }
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  pub fn manifest_text(&self) -> String {
    std::fs::read_to_string(&self.manifest).unwrap()
  }
}

/// Identifiers of every record declared in `text`.
///
/// Records are the lines of the object table that open with an identifier
/// followed by an assignment.
pub fn declared_identifiers(text: &str) -> Vec<String> {
  text
    .lines()
    .map(str::trim_start)
    .filter(|line| line.contains(" = {"))
    .filter_map(|line| line.get(..24))
    .filter(|id| id.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_lowercase()))
    .map(str::to_string)
    .collect()
}

/// Whether no identifier is declared twice.
pub fn all_unique(ids: &[String]) -> bool {
  ids.iter().collect::<HashSet<_>>().len() == ids.len()
}

pub fn count(haystack: &str, needle: &str) -> usize {
  haystack.matches(needle).count()
}
