//! Implementation of the `l10nsync locate` command.

use std::path::Path;

use anyhow::{Context, Result};

use l10nsync_lib::project::locate_manifest;

use super::Status;
use crate::output::{OutputFormat, print_json};

pub fn cmd_locate(dir: &Path, output: OutputFormat) -> Result<Status> {
  let manifest = locate_manifest(dir).context("Failed to locate project manifest")?;

  if output.is_json() {
    print_json(&serde_json::json!({ "manifest": manifest }))?;
  } else {
    println!("{}", manifest.display());
  }

  Ok(Status::Success)
}
