//! Implementation of the `l10nsync sync` command.
//!
//! Runs the whole pipeline: download the table, write the `.strings` files and
//! the Swift accessor, then register everything in the project. Ctrl-C stops
//! the run at the next stage boundary.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use l10nsync_lib::config::{Config, find_config_path};
use l10nsync_lib::pipeline::{SyncConfig, sync};

use super::Status;
use super::patch::{outcome_json, report, status};
use crate::output::{
  OutputFormat, format_duration, print_file, print_info, print_json, print_stat, print_success, symbols,
};

pub struct SyncArgs {
  pub config: Option<PathBuf>,
  pub source: Option<String>,
  pub out: Option<PathBuf>,
  pub project: Option<PathBuf>,
  pub timeout: Option<Duration>,
  pub force: bool,
}

pub fn cmd_sync(args: SyncArgs, output: OutputFormat) -> Result<Status> {
  let config = load_config(&args)?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let started = Instant::now();
  let result = rt
    .block_on(async {
      let cancel = CancellationToken::new();
      let on_signal = cancel.clone();
      tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
          warn!("interrupt received, stopping after the current stage");
          on_signal.cancel();
        }
      });
      sync(&config, &cancel).await
    })
    .context("Sync failed")?;
  let elapsed = started.elapsed();

  if output.is_json() {
    let json = serde_json::json!({
      "languages": result.languages,
      "entries": result.entries,
      "generated": result.generated.iter().map(|f| &f.path).collect::<Vec<_>>(),
      "changed": result.generated.iter().filter(|f| f.changed).count(),
      "enum_file": result.enum_file.as_ref().map(|f| &f.path),
      "patch": result.patch.as_ref().map(outcome_json).transpose()?,
      "duration_ms": elapsed.as_millis() as u64,
    });
    print_json(&json)?;
  } else {
    print_success(&format!("Sync complete in {}", format_duration(elapsed)));
    print_stat("Languages", &result.languages.join(", "));
    print_stat("Strings", &result.entries.to_string());
    for file in result.generated.iter().chain(&result.enum_file).filter(|f| f.changed) {
      print_file(symbols::MODIFY, &file.path.display().to_string());
    }

    match &result.patch {
      Some(outcome) => {
        println!();
        report(outcome, output)?;
      }
      None => print_info("No project configured, skipped registration"),
    }
  }

  Ok(result.patch.as_ref().map(status).unwrap_or(Status::Success))
}

/// Config file settings with command-line overrides applied.
fn load_config(args: &SyncArgs) -> Result<SyncConfig> {
  let cwd = std::env::current_dir().context("Failed to determine working directory")?;
  let path = find_config_path(args.config.as_deref())?;

  let (mut config, base_dir) = match &path {
    Some(path) => {
      let config = Config::load(path)?.unwrap_or_default();
      let base_dir = path.parent().map(|p| cwd.join(p)).unwrap_or_else(|| cwd.clone());
      info!(path = %path.display(), "using config file");
      (config, base_dir)
    }
    None => (Config::default(), cwd.clone()),
  };

  let absolute = |p: &Path| cwd.join(p);
  if let Some(source) = &args.source {
    config.source = Some(source.clone());
    config.sheet_id = None;
    // A relative source path given on the command line is relative to cwd.
    if !source.contains("://") {
      config.source = Some(absolute(Path::new(source)).to_string_lossy().into_owned());
    }
  }
  if let Some(out) = &args.out {
    config.output_dir = Some(absolute(out));
  }
  if let Some(project) = &args.project {
    config.project_dir = Some(absolute(project));
  }
  if let Some(timeout) = args.timeout {
    config.fetch.timeout_secs = Some(timeout.as_secs().max(1));
  }
  if args.force {
    config.force = Some(true);
  }

  config.resolve(&base_dir).context("Invalid configuration")
}
