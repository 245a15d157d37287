//! Output generation: per-language `.strings` files and the Swift accessor.
//!
//! Language files are independent of each other and are written by a
//! bounded set of tasks. Every write goes to a temporary file next to the
//! target and is renamed into place, so a reader never sees a partial file.
//! Files whose content is already up to date are not touched.

pub mod enum_source;
pub mod strings;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::table::StringTable;

pub use enum_source::EnumOptions;

/// Errors that can occur while generating output.
#[derive(Debug, Error)]
pub enum GenerateError {
  #[error("key '{0}' has no characters usable in an identifier")]
  InvalidKey(String),

  #[error("keys '{first}' and '{second}' both map to case '{case}'")]
  CaseCollision { case: String, first: String, second: String },

  #[error("failed to write '{path}': {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("generation task failed: {0}")]
  Task(String),
}

#[derive(Debug, Clone)]
pub struct GenerateOptions {
  pub out_dir: PathBuf,
  pub table_name: String,
  pub fallback: bool,
  /// Upper bound on concurrent writes; 0 means one per language.
  pub parallelism: usize,
}

/// A file produced by generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
  /// Language the file belongs to; `None` for the accessor source.
  pub language: Option<String>,
  /// Path relative to the output directory.
  pub relative: PathBuf,
  pub path: PathBuf,
  /// Whether the content on disk changed.
  pub changed: bool,
}

/// Write `<out_dir>/<lang>.lproj/<table_name>` for every language of the
/// table. Results are in language order.
pub async fn write_language_files(
  table: Arc<StringTable>,
  options: &GenerateOptions,
) -> Result<Vec<GeneratedFile>, GenerateError> {
  let limit = match options.parallelism {
    0 => table.languages.len().max(1),
    n => n,
  };
  let semaphore = Arc::new(Semaphore::new(limit));
  let mut set = JoinSet::new();

  for (index, language) in table.languages.iter().enumerate() {
    let table = Arc::clone(&table);
    let semaphore = Arc::clone(&semaphore);
    let language = language.clone();
    let relative = Path::new(&format!("{language}.lproj")).join(&options.table_name);
    let path = options.out_dir.join(&relative);
    let fallback = options.fallback;

    set.spawn(async move {
      let _permit = semaphore
        .acquire_owned()
        .await
        .map_err(|e| GenerateError::Task(e.to_string()))?;

      let content = strings::render(&table, &language, fallback);
      let changed = write_if_changed(&path, &content).await?;
      debug!(language = %language, path = %path.display(), changed, "wrote language file");

      Ok::<_, GenerateError>((
        index,
        GeneratedFile {
          language: Some(language),
          relative,
          path,
          changed,
        },
      ))
    });
  }

  let mut files = Vec::with_capacity(table.languages.len());
  while let Some(joined) = set.join_next().await {
    let result = joined.map_err(|e| GenerateError::Task(e.to_string()))?;
    files.push(result?);
  }
  files.sort_by_key(|(index, _)| *index);

  let files: Vec<GeneratedFile> = files.into_iter().map(|(_, file)| file).collect();
  info!(
    languages = files.len(),
    changed = files.iter().filter(|f| f.changed).count(),
    "generated language files"
  );
  Ok(files)
}

/// Write the Swift accessor to `path`.
pub async fn write_enum_file(
  table: &StringTable,
  path: &Path,
  options: &EnumOptions,
) -> Result<GeneratedFile, GenerateError> {
  let content = enum_source::render(table, options)?;
  let changed = write_if_changed(path, &content).await?;
  info!(path = %path.display(), cases = table.entries.len(), changed, "generated accessor source");

  Ok(GeneratedFile {
    language: None,
    relative: path.file_name().map(PathBuf::from).unwrap_or_default(),
    path: path.to_path_buf(),
    changed,
  })
}

/// Atomically replace `path` with `content` unless it already holds it.
async fn write_if_changed(path: &Path, content: &str) -> Result<bool, GenerateError> {
  let io_err = |source| GenerateError::Io {
    path: path.to_path_buf(),
    source,
  };

  match tokio::fs::read(path).await {
    Ok(existing) if existing == content.as_bytes() => return Ok(false),
    Ok(_) => {}
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
    Err(e) => return Err(io_err(e)),
  }

  if let Some(parent) = path.parent() {
    tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
  }

  let mut temp_name = path.as_os_str().to_os_string();
  temp_name.push(".tmp");
  let temp = PathBuf::from(temp_name);

  let replaced = async {
    tokio::fs::write(&temp, content).await?;
    tokio::fs::rename(&temp, path).await
  };
  if let Err(e) = replaced.await {
    let _ = tokio::fs::remove_file(&temp).await;
    return Err(io_err(e));
  }
  Ok(true)
}
