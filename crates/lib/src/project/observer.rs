//! Observation hooks for a patch run.
//!
//! The merger reports what it does through a [`PatchObserver`] passed in by
//! the caller. [`TracingObserver`] forwards events to `tracing`; tests swap
//! in a recorder.

use std::path::Path;

use tracing::{debug, info, warn};

use super::types::PatchError;

/// What a file's registration added to the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Added {
  /// Identifier of the new file reference, if one was created.
  pub file_reference: Option<String>,
  /// Identifier of the new build file, if one was created.
  pub build_file: Option<String>,
  /// The file reference was added to the group's children.
  pub group_entry: bool,
}

pub trait PatchObserver {
  fn on_integrated(&mut self, _path: &str, _added: &Added) {}

  fn on_already_present(&mut self, _path: &str) {}

  fn on_failed(&mut self, _path: &str, _error: &PatchError) {}

  fn on_written(&mut self, _manifest: &Path, _insertions: usize) {}
}

/// Forwards patch events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PatchObserver for TracingObserver {
  fn on_integrated(&mut self, path: &str, added: &Added) {
    info!(
      path,
      file_ref = added.file_reference.as_deref().unwrap_or("-"),
      build_file = added.build_file.as_deref().unwrap_or("-"),
      group_entry = added.group_entry,
      "integrated file"
    );
  }

  fn on_already_present(&mut self, path: &str) {
    debug!(path, "already integrated");
  }

  fn on_failed(&mut self, path: &str, error: &PatchError) {
    warn!(path, error = %error, "could not integrate file");
  }

  fn on_written(&mut self, manifest: &Path, insertions: usize) {
    info!(manifest = %manifest.display(), insertions, "manifest written");
  }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PatchObserver for NoopObserver {}
