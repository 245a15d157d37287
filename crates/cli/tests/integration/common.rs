//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
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

/// Isolated project directory.
///
/// Holds `App.xcodeproj/project.pbxproj` copied from a fixture.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn from_fixture(name: &str) -> Self {
    let env = Self {
      temp: TempDir::new().unwrap(),
    };
    env.write_file("App.xcodeproj/project.pbxproj", &fixture_content(name));
    env
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn read_file(&self, relative_path: &str) -> String {
    std::fs::read_to_string(self.temp.path().join(relative_path)).unwrap()
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  pub fn manifest(&self) -> String {
    self.read_file("App.xcodeproj/project.pbxproj")
  }

  /// Command running in the project directory with a clean environment.
  pub fn l10nsync_cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("l10nsync");
    cmd
      .current_dir(self.temp.path())
      .env("XDG_CONFIG_HOME", self.temp.path().join("xdg"))
      .env_remove("RUST_LOG");
    cmd
  }
}
