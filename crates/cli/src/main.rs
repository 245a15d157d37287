mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use output::{OutputFormat, print_error};

/// l10nsync - keep Xcode localizations in sync with a translation table
#[derive(Parser)]
#[command(name = "l10nsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Download the table, generate files and register them in the project
  Sync {
    /// Config file (default: ./l10nsync.json, then the user config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Table URL or CSV path, overriding the config
    #[arg(long)]
    source: Option<String>,

    /// Output directory for the .lproj folders, overriding the config
    #[arg(long)]
    out: Option<PathBuf>,

    /// Directory to search for the .xcodeproj, overriding the config
    #[arg(long)]
    project: Option<PathBuf>,

    /// Download timeout (e.g. "10s", "2m"), overriding the config
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Also repair group membership of already registered files
    #[arg(short, long)]
    force: bool,
  },

  /// Register files in a project manifest
  Patch {
    /// Directory to search for the .xcodeproj
    #[arg(short, long, default_value = ".")]
    project: PathBuf,

    /// Resource file as PATH or PATH:LANG, relative to the project directory
    #[arg(short, long = "resource", value_name = "PATH[:LANG]")]
    resources: Vec<String>,

    /// Source file to add to the sources build phase
    #[arg(long)]
    source_file: Option<String>,

    /// Also repair group membership of already registered files
    #[arg(short, long)]
    force: bool,

    /// Native target whose build phases receive the files
    #[arg(long)]
    target: Option<String>,

    /// Group receiving new file references (default: the main group)
    #[arg(long)]
    group: Option<String>,
  },

  /// Print the path of the project manifest
  Locate {
    /// Directory to start searching from
    #[arg(default_value = ".")]
    dir: PathBuf,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Sync {
      config,
      source,
      out,
      project,
      timeout,
      force,
    } => cmd::cmd_sync(
      cmd::SyncArgs {
        config,
        source,
        out,
        project,
        timeout,
        force,
      },
      cli.output,
    ),
    Commands::Patch {
      project,
      resources,
      source_file,
      force,
      target,
      group,
    } => cmd::cmd_patch(
      cmd::PatchArgs {
        project,
        resources,
        source_file,
        force,
        target,
        group,
      },
      cli.output,
    ),
    Commands::Locate { dir } => cmd::cmd_locate(&dir, cli.output),
  };

  match result {
    Ok(cmd::Status::Success) => ExitCode::SUCCESS,
    Ok(cmd::Status::Partial) => ExitCode::from(2),
    Err(e) => {
      print_error(&format!("{e:#}"));
      ExitCode::FAILURE
    }
  }
}
