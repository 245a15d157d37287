//! Atomic manifest persistence.

use std::fs;
use std::io::Write;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::util::hash::hash_bytes;

use super::document::ManifestDocument;
use super::types::PatchError;

/// Replace the manifest with `text` if it differs from what was loaded.
///
/// The new content goes to a temporary file in the manifest's directory
/// which is then renamed over the original, so readers only ever see the
/// old or the new file. Fails with [`PatchError::Modified`] if the file on
/// disk no longer matches the loaded document. Returns whether a write
/// happened.
pub fn commit(doc: &ManifestDocument, text: &str) -> Result<bool, PatchError> {
  if text == doc.text() {
    debug!(manifest = %doc.path().display(), "manifest unchanged, skipping write");
    return Ok(false);
  }

  let path = doc.path();
  let io_err = |source| PatchError::Io {
    path: path.to_path_buf(),
    source,
  };

  let on_disk = fs::read(path).map_err(io_err)?;
  if &hash_bytes(&on_disk) != doc.digest() {
    return Err(PatchError::Modified {
      path: path.to_path_buf(),
    });
  }

  let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(std::path::Path::new("."));
  let mut temp = NamedTempFile::new_in(dir).map_err(io_err)?;
  temp.write_all(text.as_bytes()).map_err(io_err)?;
  temp.as_file().sync_all().map_err(io_err)?;

  let permissions = fs::metadata(path).map_err(io_err)?.permissions();
  fs::set_permissions(temp.path(), permissions).map_err(io_err)?;

  temp.persist(path).map_err(|e| io_err(e.error))?;

  debug!(
    manifest = %path.display(),
    before = doc.digest().short(),
    after = hash_bytes(text.as_bytes()).short(),
    "manifest replaced"
  );
  Ok(true)
}
