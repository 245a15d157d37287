//! Implementation of the `l10nsync patch` command.
//!
//! Registers existing files in the project manifest without touching the
//! translation table.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use l10nsync_lib::project::{PatchOutcome, PatchRequest, ResourceFile, patch_project_default};

use super::Status;
use crate::output::{OutputFormat, print_file, print_json, print_stat, print_success, print_warning, symbols};

pub struct PatchArgs {
  pub project: PathBuf,
  pub resources: Vec<String>,
  pub source_file: Option<String>,
  pub force: bool,
  pub target: Option<String>,
  pub group: Option<String>,
}

pub fn cmd_patch(args: PatchArgs, output: OutputFormat) -> Result<Status> {
  if args.resources.is_empty() && args.source_file.is_none() {
    anyhow::bail!("Nothing to register: pass --resource or --source-file");
  }

  let request = PatchRequest {
    project_dir: args.project,
    resources: args.resources.iter().map(|spec| parse_resource(spec)).collect(),
    generated_source: args.source_file,
    force: args.force,
    target: args.target,
    group: args.group,
  };

  let outcome = patch_project_default(&request).context("Failed to patch project")?;
  report(&outcome, output)?;

  Ok(status(&outcome))
}

/// `PATH` or `PATH:LANG`. A suffix containing a path separator is part of
/// the path.
fn parse_resource(spec: &str) -> ResourceFile {
  match spec.rsplit_once(':') {
    Some((path, lang)) if !path.is_empty() && !lang.is_empty() && !lang.contains(['/', '\\']) => {
      ResourceFile::new(path, Some(lang))
    }
    _ => ResourceFile::new(spec, None),
  }
}

#[derive(Serialize)]
struct FailureReport<'a> {
  path: &'a str,
  error: String,
}

#[derive(Serialize)]
struct PatchReport<'a> {
  manifest: &'a std::path::Path,
  written: bool,
  integrated: &'a [String],
  unchanged: &'a [String],
  failed: Vec<FailureReport<'a>>,
}

impl<'a> PatchReport<'a> {
  fn new(outcome: &'a PatchOutcome) -> Self {
    Self {
      manifest: &outcome.manifest_path,
      written: outcome.written,
      integrated: &outcome.integrated,
      unchanged: &outcome.unchanged,
      failed: outcome
        .failed
        .iter()
        .map(|f| FailureReport {
          path: &f.path,
          error: f.error.to_string(),
        })
        .collect(),
    }
  }
}

pub(crate) fn status(outcome: &PatchOutcome) -> Status {
  if outcome.is_success() {
    Status::Success
  } else {
    Status::Partial
  }
}

/// JSON value describing `outcome`, for embedding in larger reports.
pub(crate) fn outcome_json(outcome: &PatchOutcome) -> Result<serde_json::Value> {
  serde_json::to_value(PatchReport::new(outcome)).context("Failed to serialize patch report")
}

pub(crate) fn report(outcome: &PatchOutcome, output: OutputFormat) -> Result<()> {
  if output.is_json() {
    return print_json(&PatchReport::new(outcome));
  }

  if outcome.written {
    print_success(&format!("Updated {}", outcome.manifest_path.display()));
  } else {
    print_success(&format!("{} already up to date", outcome.manifest_path.display()));
  }
  for path in &outcome.integrated {
    print_file(symbols::ADD, path);
  }
  print_stat("Registered", &outcome.integrated_count().to_string());
  print_stat("Unchanged", &outcome.unchanged.len().to_string());

  for failure in &outcome.failed {
    print_warning(&failure.error.to_string());
  }
  Ok(())
}
