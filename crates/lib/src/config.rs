//! `l10nsync.json` configuration.
//!
//! The file is optional: every field can also be given on the command line,
//! and command-line values win. Relative paths in the file are resolved
//! against the directory holding it.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{APP_NAME, CONFIG_FILENAME, USER_CONFIG_FILENAME};
use crate::fetch::{FetchOptions, Source};
use crate::pipeline::SyncConfig;

/// Errors that can occur while loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("config file not found: {0}")]
  NotFound(PathBuf),

  #[error("failed to read config '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config '{path}': {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("missing required setting '{0}'")]
  Missing(&'static str),

  #[error("'source' and 'sheetId' are mutually exclusive")]
  ConflictingSource,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
  /// URL or path of the CSV table.
  pub source: Option<String>,
  pub sheet_id: Option<String>,
  pub gid: Option<String>,
  pub output_dir: Option<PathBuf>,
  pub table_name: Option<String>,
  pub languages: Option<Vec<String>>,
  pub fallback: Option<bool>,
  pub enum_path: Option<PathBuf>,
  pub enum_name: Option<String>,
  pub project_dir: Option<PathBuf>,
  /// Directory manifest paths are relative to; defaults to the one holding
  /// the project container.
  pub manifest_root: Option<PathBuf>,
  pub target: Option<String>,
  pub group: Option<String>,
  pub force: Option<bool>,
  pub parallelism: Option<usize>,
  #[serde(default)]
  pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FetchConfig {
  pub timeout_secs: Option<u64>,
  pub retries: Option<u32>,
  pub backoff_millis: Option<u64>,
}

impl Config {
  /// Load a config file.
  ///
  /// Returns `Ok(None)` if the file doesn't exist.
  pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(e) => {
        return Err(ConfigError::Read {
          path: path.to_path_buf(),
          source: e,
        });
      }
    };

    let config = serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
      path: path.to_path_buf(),
      source: e,
    })?;
    debug!(path = %path.display(), "loaded config");
    Ok(Some(config))
  }

  /// Turn the settings into a runnable configuration. Relative paths are
  /// joined onto `base_dir`.
  pub fn resolve(self, base_dir: &Path) -> Result<SyncConfig, ConfigError> {
    let resolve_path = |p: PathBuf| if p.is_absolute() { p } else { base_dir.join(p) };

    let source = match (self.source, self.sheet_id) {
      (Some(_), Some(_)) => return Err(ConfigError::ConflictingSource),
      (Some(source), None) => match Source::parse(&source) {
        Source::Path(path) => Source::Path(resolve_path(path)),
        url => url,
      },
      (None, Some(id)) => Source::google_sheet(&id, self.gid.as_deref()),
      (None, None) => return Err(ConfigError::Missing("source")),
    };

    let defaults = FetchOptions::default();
    let fetch = FetchOptions {
      timeout: self.fetch.timeout_secs.map(Duration::from_secs).unwrap_or(defaults.timeout),
      retries: self.fetch.retries.unwrap_or(defaults.retries),
      backoff: self.fetch.backoff_millis.map(Duration::from_millis).unwrap_or(defaults.backoff),
    };

    Ok(SyncConfig {
      source,
      out_dir: resolve_path(self.output_dir.ok_or(ConfigError::Missing("outputDir"))?),
      table_name: self.table_name.unwrap_or_else(|| "Localizable.strings".to_string()),
      languages: self.languages,
      fallback: self.fallback.unwrap_or(true),
      enum_path: self.enum_path.map(resolve_path),
      enum_name: self.enum_name.unwrap_or_else(|| "L10n".to_string()),
      project_dir: self.project_dir.map(resolve_path),
      manifest_root: self.manifest_root.map(resolve_path),
      target: self.target,
      group: self.group,
      force: self.force.unwrap_or(false),
      parallelism: self.parallelism.unwrap_or(0),
      fetch,
    })
  }
}

/// Find the config file to use.
///
/// An explicit path must exist. Otherwise `./l10nsync.json` is used if
/// present, then the user config file. Returns `Ok(None)` when there is none.
pub fn find_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
  if let Some(path) = explicit {
    if !path.exists() {
      return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    return Ok(Some(path.to_path_buf()));
  }

  let local = PathBuf::from(CONFIG_FILENAME);
  if local.exists() {
    return Ok(Some(local));
  }

  Ok(user_config_dir().map(|dir| dir.join(USER_CONFIG_FILENAME)).filter(|p| p.exists()))
}

/// Returns the directory for configuration files for the application
#[cfg(windows)]
fn user_config_dir() -> Option<PathBuf> {
  std::env::var_os("APPDATA").map(|appdata| PathBuf::from(appdata).join(APP_NAME))
}

/// Returns the directory for configuration files for the application
#[cfg(not(windows))]
fn user_config_dir() -> Option<PathBuf> {
  let config_home = std::env::var_os("XDG_CONFIG_HOME")
    .map(PathBuf::from)
    .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
  Some(config_home.join(APP_NAME))
}
