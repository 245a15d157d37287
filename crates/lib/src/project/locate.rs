//! Manifest discovery.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use super::types::{CONTAINER_SUFFIX, MANIFEST_FILENAME, PatchError};

/// How many directories are searched: the start and two ancestors.
const SEARCH_DEPTH: usize = 3;

/// Find the project manifest starting from `start`.
///
/// Searches `start`, then its parent, then its grandparent. Within a
/// directory, entries are visited in file-name order and the first
/// `*.xcodeproj` directory holding a `project.pbxproj` wins. `start` may
/// itself be a project container.
pub fn locate_manifest(start: &Path) -> Result<PathBuf, PatchError> {
  // Relative paths have no usable ancestors.
  let resolved = if start.is_relative() {
    dunce::canonicalize(start).unwrap_or_else(|_| start.to_path_buf())
  } else {
    start.to_path_buf()
  };
  let start = resolved.as_path();

  if is_container(start)
    && let Some(manifest) = manifest_in(start)
  {
    return Ok(manifest);
  }

  for dir in start.ancestors().take(SEARCH_DEPTH) {
    debug!(dir = %dir.display(), "searching for project container");
    let entries = WalkDir::new(dir)
      .min_depth(1)
      .max_depth(1)
      .sort_by_file_name()
      .into_iter()
      .filter_map(Result::ok);

    for entry in entries {
      if entry.file_type().is_dir()
        && is_container(entry.path())
        && let Some(manifest) = manifest_in(entry.path())
      {
        debug!(manifest = %manifest.display(), "found manifest");
        return Ok(manifest);
      }
    }
  }

  Err(PatchError::NotFound {
    start: start.to_path_buf(),
  })
}

fn is_container(path: &Path) -> bool {
  path
    .file_name()
    .and_then(|n| n.to_str())
    .is_some_and(|n| n.ends_with(CONTAINER_SUFFIX))
}

fn manifest_in(container: &Path) -> Option<PathBuf> {
  let manifest = container.join(MANIFEST_FILENAME);
  manifest.is_file().then_some(manifest)
}
