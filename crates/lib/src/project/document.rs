//! The manifest as loaded for one patch invocation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::util::hash::{ContentHash, hash_bytes};

use super::types::PatchError;

/// Raw manifest text plus what is needed to write it back safely.
#[derive(Debug, Clone)]
pub struct ManifestDocument {
  path: PathBuf,
  text: String,
  digest: ContentHash,
  newline: &'static str,
}

impl ManifestDocument {
  pub fn load(path: &Path) -> Result<Self, PatchError> {
    let bytes = fs::read(path).map_err(|source| PatchError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    let digest = hash_bytes(&bytes);
    let text = String::from_utf8(bytes).map_err(|_| PatchError::NotUtf8 {
      path: path.to_path_buf(),
    })?;

    Ok(Self::with_digest(path.to_path_buf(), text, digest))
  }

  /// Build a document from text that was not read from disk.
  pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
    let text = text.into();
    let digest = hash_bytes(text.as_bytes());
    Self::with_digest(path.into(), text, digest)
  }

  fn with_digest(path: PathBuf, text: String, digest: ContentHash) -> Self {
    let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
    Self {
      path,
      text,
      digest,
      newline,
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  /// Hash of the bytes as loaded.
  pub fn digest(&self) -> &ContentHash {
    &self.digest
  }

  /// Line ending used by the document.
  pub fn newline(&self) -> &'static str {
    self.newline
  }
}
