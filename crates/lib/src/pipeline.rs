//! The end-to-end sync: download, parse, generate, register.
//!
//! Stages run in order and each waits for the previous one to finish. A
//! cancellation request is honoured between stages; a stage that has started
//! always runs to completion, so no output is ever left half-written.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::fetch::{FetchError, FetchOptions, Source, fetch_source};
use crate::generate::{self, EnumOptions, GenerateError, GenerateOptions, GeneratedFile};
use crate::project::{
  PatchError, PatchOutcome, PatchRequest, ResourceFile, locate_manifest, patch_project_default, types::CONTAINER_SUFFIX,
};
use crate::table::{StringTable, TableError};

/// Fully resolved settings for one sync.
#[derive(Debug, Clone)]
pub struct SyncConfig {
  pub source: Source,
  pub out_dir: PathBuf,
  pub table_name: String,
  /// Languages to emit; all table languages when `None`.
  pub languages: Option<Vec<String>>,
  pub fallback: bool,
  pub enum_path: Option<PathBuf>,
  pub enum_name: String,
  /// Project to register files in; registration is skipped when `None`.
  pub project_dir: Option<PathBuf>,
  pub manifest_root: Option<PathBuf>,
  pub target: Option<String>,
  pub group: Option<String>,
  pub force: bool,
  pub parallelism: usize,
  pub fetch: FetchOptions,
}

/// Pipeline stage, reported on cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  Download,
  Generate,
  Register,
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Stage::Download => write!(f, "download"),
      Stage::Generate => write!(f, "generate"),
      Stage::Register => write!(f, "register"),
    }
  }
}

#[derive(Debug, Error)]
pub enum SyncError {
  #[error("cancelled before {stage}")]
  Cancelled { stage: Stage },

  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error(transparent)]
  Table(#[from] TableError),

  #[error(transparent)]
  Generate(#[from] GenerateError),

  #[error(transparent)]
  Patch(#[from] PatchError),

  #[error("none of the requested languages are in the table (available: {available})")]
  NoLanguages { available: String },

  #[error("registration task failed: {0}")]
  Task(String),
}

#[derive(Debug)]
pub struct SyncResult {
  pub languages: Vec<String>,
  pub entries: usize,
  pub generated: Vec<GeneratedFile>,
  pub enum_file: Option<GeneratedFile>,
  /// `None` when no project is configured.
  pub patch: Option<PatchOutcome>,
}

impl SyncResult {
  /// Whether every generated file ended up registered.
  pub fn is_success(&self) -> bool {
    self.patch.as_ref().is_none_or(PatchOutcome::is_success)
  }
}

pub async fn sync(config: &SyncConfig, cancel: &CancellationToken) -> Result<SyncResult, SyncError> {
  check(cancel, Stage::Download)?;
  let text = fetch_source(&config.source, &config.fetch).await?;
  let mut table = StringTable::parse(&text)?;
  let available = table.languages.join(", ");

  if let Some(wanted) = &config.languages {
    let unknown = table.retain_languages(wanted);
    if !unknown.is_empty() {
      warn!(languages = ?unknown, "requested languages not in table");
    }
  }
  if table.languages.is_empty() {
    return Err(SyncError::NoLanguages { available });
  }
  info!(languages = ?table.languages, entries = table.entries.len(), "table ready");

  check(cancel, Stage::Generate)?;
  let table = Arc::new(table);
  let generated = generate::write_language_files(
    Arc::clone(&table),
    &GenerateOptions {
      out_dir: config.out_dir.clone(),
      table_name: config.table_name.clone(),
      fallback: config.fallback,
      parallelism: config.parallelism,
    },
  )
  .await?;

  let enum_file = match &config.enum_path {
    Some(path) => Some(
      generate::write_enum_file(
        &table,
        path,
        &EnumOptions {
          name: config.enum_name.clone(),
          table_name: config.table_name.clone(),
        },
      )
      .await?,
    ),
    None => None,
  };

  let patch = match &config.project_dir {
    Some(project_dir) => {
      check(cancel, Stage::Register)?;
      Some(register(config, project_dir, &generated, enum_file.as_ref()).await?)
    }
    None => None,
  };

  Ok(SyncResult {
    languages: table.languages.clone(),
    entries: table.entries.len(),
    generated,
    enum_file,
    patch,
  })
}

fn check(cancel: &CancellationToken, stage: Stage) -> Result<(), SyncError> {
  if cancel.is_cancelled() {
    warn!(%stage, "sync cancelled");
    return Err(SyncError::Cancelled { stage });
  }
  Ok(())
}

async fn register(
  config: &SyncConfig,
  project_dir: &Path,
  generated: &[GeneratedFile],
  enum_file: Option<&GeneratedFile>,
) -> Result<PatchOutcome, SyncError> {
  let root = match &config.manifest_root {
    Some(root) => root.clone(),
    None => container_parent(&locate_manifest(project_dir)?),
  };

  let resources = generated
    .iter()
    .map(|file| ResourceFile::new(manifest_relative(&file.path, &root), file.language.as_deref()))
    .collect();

  let request = PatchRequest {
    project_dir: project_dir.to_path_buf(),
    resources,
    generated_source: enum_file.map(|file| manifest_relative(&file.path, &root)),
    force: config.force,
    target: config.target.clone(),
    group: config.group.clone(),
  };

  tokio::task::spawn_blocking(move || patch_project_default(&request))
    .await
    .map_err(|e| SyncError::Task(e.to_string()))?
    .map_err(SyncError::from)
}

/// Directory holding the `.xcodeproj` container of `manifest`.
fn container_parent(manifest: &Path) -> PathBuf {
  manifest
    .ancestors()
    .find(|dir| dir.to_str().is_some_and(|s| s.ends_with(CONTAINER_SUFFIX)))
    .and_then(Path::parent)
    .unwrap_or_else(|| Path::new("."))
    .to_path_buf()
}

/// `path` relative to `root`, with `/` separators.
fn manifest_relative(path: &Path, root: &Path) -> String {
  let path = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
  let root = dunce::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());

  let path_parts: Vec<Component> = path.components().collect();
  let root_parts: Vec<Component> = root.components().collect();
  let common = path_parts.iter().zip(&root_parts).take_while(|(a, b)| a == b).count();

  let ups = std::iter::repeat_n("..".to_string(), root_parts.len() - common);
  let rest = path_parts[common..].iter().map(|c| c.as_os_str().to_string_lossy().into_owned());
  ups.chain(rest).collect::<Vec<_>>().join("/")
}
