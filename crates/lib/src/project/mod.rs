//! Project manifest integration.
//!
//! Registers generated files in an Xcode-style `project.pbxproj` so the
//! build picks them up. The manifest is edited as text: only new records and
//! list entries are inserted, everything else is left byte-for-byte intact.
//!
//! A patch run:
//! 1. Locates the manifest from a starting directory
//! 2. Loads it once and indexes the sections it needs
//! 3. Queues the missing pieces of every requested file's registration
//! 4. Splices them in one pass and writes the result atomically, only if
//!    something was queued

pub mod document;
pub mod ident;
pub mod locate;
pub mod merge;
pub mod observer;
pub mod record;
pub mod section;
pub mod types;
pub mod write;

use tracing::info;

pub use document::ManifestDocument;
pub use ident::{IdSource, IdentifierAllocator};
pub use locate::locate_manifest;
pub use merge::{MergeResult, merge};
pub use observer::{Added, NoopObserver, PatchObserver, TracingObserver};
pub use types::{
  FailedRegistration, FileDescriptor, FileKind, PatchError, PatchOutcome, PatchRequest, ResourceFile, normalize_path,
};

/// Integrate the files of `request` into the project manifest.
///
/// `NotFound` and `Malformed` abort before anything is written. Files whose
/// anchors cannot be found are reported in [`PatchOutcome::failed`] while the
/// rest of the batch is still written.
pub fn patch_project(
  request: &PatchRequest,
  source: &mut dyn IdSource,
  observer: &mut dyn PatchObserver,
) -> Result<PatchOutcome, PatchError> {
  let manifest_path = locate_manifest(&request.project_dir)?;
  info!(manifest = %manifest_path.display(), files = request.files().len(), "patching project");

  let doc = ManifestDocument::load(&manifest_path)?;
  let merged = merge(&doc, request, source, observer)?;

  let written = match &merged.text {
    Some(text) => write::commit(&doc, text)?,
    None => false,
  };
  if written {
    observer.on_written(&manifest_path, merged.insertions);
  }

  Ok(PatchOutcome {
    manifest_path,
    integrated: merged.integrated,
    unchanged: merged.unchanged,
    failed: merged.failed,
    written,
  })
}

/// [`patch_project`] with thread-local randomness and `tracing` output.
pub fn patch_project_default(request: &PatchRequest) -> Result<PatchOutcome, PatchError> {
  let mut rng = rand::thread_rng();
  patch_project(request, &mut rng, &mut TracingObserver)
}
