//! Retrieval of the source table.
//!
//! The table is either downloaded over HTTP (typically a spreadsheet's CSV
//! export) or read from a local file. Downloads carry a per-request timeout
//! and are retried with exponential backoff on transport errors, 5xx and
//! 429 responses.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

/// Where the table comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
  Url(String),
  Path(PathBuf),
}

impl Source {
  /// Interpret a string as a URL if it has an HTTP scheme, else as a path.
  pub fn parse(value: &str) -> Self {
    if value.starts_with("https://") || value.starts_with("http://") {
      Source::Url(value.to_string())
    } else {
      Source::Path(PathBuf::from(value))
    }
  }

  /// CSV export URL of a Google Sheets document.
  pub fn google_sheet(id: &str, gid: Option<&str>) -> Self {
    let gid = gid.unwrap_or("0");
    Source::Url(format!(
      "https://docs.google.com/spreadsheets/d/{id}/export?format=csv&gid={gid}"
    ))
  }
}

impl std::fmt::Display for Source {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Source::Url(url) => write!(f, "{url}"),
      Source::Path(path) => write!(f, "{}", path.display()),
    }
  }
}

/// Network behaviour for downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
  pub timeout: Duration,
  /// Retries after the first attempt.
  pub retries: u32,
  /// Delay before the first retry; doubled for each further one.
  pub backoff: Duration,
}

impl Default for FetchOptions {
  fn default() -> Self {
    Self {
      timeout: Duration::from_secs(30),
      retries: 3,
      backoff: Duration::from_millis(500),
    }
  }
}

/// Errors that can occur while retrieving the table.
#[derive(Debug, Error)]
pub enum FetchError {
  /// Failed to build the HTTP client.
  #[error("failed to create HTTP client: {0}")]
  Client(#[source] reqwest::Error),

  /// The request failed at the transport level.
  #[error("request to '{url}' failed after {attempts} attempt(s): {source}")]
  Request {
    url: String,
    attempts: u32,
    #[source]
    source: reqwest::Error,
  },

  /// The server answered with a non-success status.
  #[error("request to '{url}' failed after {attempts} attempt(s): HTTP {status}")]
  Status { url: String, attempts: u32, status: u16 },

  /// Failed to read a local source file.
  #[error("failed to read '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The content is not valid UTF-8.
  #[error("content of '{0}' is not valid UTF-8")]
  NotUtf8(String),
}

/// Retrieve the table text from `source`.
pub async fn fetch_source(source: &Source, options: &FetchOptions) -> Result<String, FetchError> {
  let bytes = match source {
    Source::Url(url) => download(url, options).await?,
    Source::Path(path) => tokio::fs::read(path).await.map_err(|e| FetchError::Read {
      path: path.clone(),
      source: e,
    })?,
  };

  decode(bytes).ok_or_else(|| FetchError::NotUtf8(source.to_string()))
}

async fn download(url: &str, options: &FetchOptions) -> Result<Vec<u8>, FetchError> {
  let client = reqwest::Client::builder()
    .timeout(options.timeout)
    .build()
    .map_err(FetchError::Client)?;

  let mut attempt = 0;
  loop {
    attempt += 1;
    info!(url, attempt, "downloading table");

    let error = match client.get(url).send().await {
      Ok(response) if response.status().is_success() => match response.bytes().await {
        Ok(bytes) => {
          debug!(url, size = bytes.len(), "download complete");
          return Ok(bytes.to_vec());
        }
        Err(e) => FetchError::Request {
          url: url.to_string(),
          attempts: attempt,
          source: e,
        },
      },
      Ok(response) => FetchError::Status {
        url: url.to_string(),
        attempts: attempt,
        status: response.status().as_u16(),
      },
      Err(e) => FetchError::Request {
        url: url.to_string(),
        attempts: attempt,
        source: e,
      },
    };

    if !is_retryable(&error) || attempt > options.retries {
      return Err(error);
    }

    let delay = options.backoff * 2u32.saturating_pow(attempt - 1);
    warn!(url, attempt, error = %error, delay_ms = delay.as_millis() as u64, "download failed, retrying");
    tokio::time::sleep(delay).await;
  }
}

fn is_retryable(error: &FetchError) -> bool {
  match error {
    FetchError::Request { .. } => true,
    FetchError::Status { status, .. } => *status >= 500 || *status == 429,
    _ => false,
  }
}

/// UTF-8 decode, dropping a leading byte-order mark.
fn decode(bytes: Vec<u8>) -> Option<String> {
  let text = String::from_utf8(bytes).ok()?;
  Some(match text.strip_prefix('\u{feff}') {
    Some(rest) => rest.to_string(),
    None => text,
  })
}
