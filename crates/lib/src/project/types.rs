//! Request, outcome, and error types for manifest patching.

use std::path::PathBuf;

use thiserror::Error;

/// Name of the manifest file inside a project container.
pub const MANIFEST_FILENAME: &str = "project.pbxproj";

/// Directory suffix identifying a project container.
pub const CONTAINER_SUFFIX: &str = ".xcodeproj";

/// Errors produced by the manifest integration engine.
#[derive(Debug, Error)]
pub enum PatchError {
  /// No manifest was found in the searched directories.
  #[error("no {CONTAINER_SUFFIX}/{MANIFEST_FILENAME} found in '{}' or its two parent directories", start.display())]
  NotFound { start: PathBuf },

  /// A required section marker is absent or duplicated.
  #[error("manifest '{}' is malformed: section '{section}' is missing or duplicated", path.display())]
  Malformed { path: PathBuf, section: String },

  /// An insertion anchor inside an existing section could not be located.
  #[error("could not register '{path}': {anchor} not found")]
  PatternMismatch { path: String, anchor: String },

  /// The same normalized path appeared more than once in one request.
  #[error("'{path}' was requested more than once")]
  DuplicateRequest { path: String },

  /// The manifest is not valid UTF-8.
  #[error("manifest '{}' is not valid UTF-8", path.display())]
  NotUtf8 { path: PathBuf },

  /// The manifest changed on disk after it was loaded.
  #[error("manifest '{}' was modified by another process while patching", path.display())]
  Modified { path: PathBuf },

  /// Reading, writing, or renaming the manifest failed.
  #[error("i/o error on '{}': {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Which build phase a logical file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
  /// Copied into the bundle by the resources phase.
  Resource,
  /// Compiled by the sources phase.
  Source,
}

impl FileKind {
  /// Manifest section holding the build phase for this kind.
  pub fn phase_section(self) -> &'static str {
    match self {
      FileKind::Resource => "PBXResourcesBuildPhase",
      FileKind::Source => "PBXSourcesBuildPhase",
    }
  }

  /// Phase name as it appears in build-file comments.
  pub fn phase_label(self) -> &'static str {
    match self {
      FileKind::Resource => "Resources",
      FileKind::Source => "Sources",
    }
  }
}

/// A per-language resource file to register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFile {
  /// Path relative to the directory holding the project container.
  pub path: String,
  /// Language tag, `None` for non-localized resources.
  pub language: Option<String>,
}

impl ResourceFile {
  pub fn new(path: impl Into<String>, language: Option<&str>) -> Self {
    Self {
      path: path.into(),
      language: language.map(str::to_string),
    }
  }
}

/// Everything the patcher needs to integrate one batch of files.
#[derive(Debug, Clone, Default)]
pub struct PatchRequest {
  /// Directory to start the manifest search from.
  pub project_dir: PathBuf,
  /// Localized resource files.
  pub resources: Vec<ResourceFile>,
  /// Generated source file, registered in the sources phase.
  pub generated_source: Option<String>,
  /// Also re-verify group membership of already-registered references.
  pub force: bool,
  /// Restrict build phases to this native target.
  pub target: Option<String>,
  /// Group receiving new references; defaults to the main group.
  pub group: Option<String>,
}

impl PatchRequest {
  /// Flatten the request into logical files in caller order.
  pub fn files(&self) -> Vec<FileDescriptor> {
    let mut files: Vec<FileDescriptor> = self
      .resources
      .iter()
      .map(|r| FileDescriptor::new(&r.path, FileKind::Resource, r.language.as_deref()))
      .collect();
    if let Some(source) = &self.generated_source {
      files.push(FileDescriptor::new(source, FileKind::Source, None));
    }
    files
  }
}

/// One logical file, with its path already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
  pub path: String,
  pub display_name: String,
  pub kind: FileKind,
  pub language: Option<String>,
}

impl FileDescriptor {
  pub fn new(path: &str, kind: FileKind, language: Option<&str>) -> Self {
    let path = normalize_path(path);
    let display_name = path.rsplit('/').next().unwrap_or(&path).to_string();
    Self {
      path,
      display_name,
      kind,
      language: language.map(str::to_string),
    }
  }
}

/// Bring a path into the manifest's relative-path convention.
pub fn normalize_path(path: &str) -> String {
  let mut path = path.replace('\\', "/");
  while let Some(rest) = path.strip_prefix("./") {
    path = rest.to_string();
  }
  path
}

/// A file that could not be integrated, and why.
#[derive(Debug)]
pub struct FailedRegistration {
  pub path: String,
  pub error: PatchError,
}

/// Result of a patch invocation that did not abort.
#[derive(Debug)]
pub struct PatchOutcome {
  pub manifest_path: PathBuf,
  /// Files that received at least one new record or list entry.
  pub integrated: Vec<String>,
  /// Files that were already fully registered.
  pub unchanged: Vec<String>,
  pub failed: Vec<FailedRegistration>,
  /// Whether the manifest was rewritten.
  pub written: bool,
}

impl PatchOutcome {
  pub fn integrated_count(&self) -> usize {
    self.integrated.len()
  }

  pub fn is_success(&self) -> bool {
    self.failed.is_empty()
  }
}
