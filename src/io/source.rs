use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::LoadError;

/// Where a workbook lives. The local copy wins when it exists on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub local_path: Option<PathBuf>,
    pub remote_url: Option<String>,
}

/// A source after deciding between the local copy and the remote one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolvedSource {
    Local(PathBuf),
    Remote(String),
}

impl ResolvedSource {
    /// Stable identifier used as cache key and in log output.
    pub fn identifier(&self) -> String {
        match self {
            ResolvedSource::Local(path) => path.display().to_string(),
            ResolvedSource::Remote(url) => url.clone(),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, ResolvedSource::Local(_))
    }
}

impl DataSource {
    pub fn new(local_path: impl Into<PathBuf>, remote_url: Option<String>) -> Self {
        Self {
            local_path: Some(local_path.into()),
            remote_url,
        }
    }

    /// Interprets a single locator: `http(s)://` means remote, anything else
    /// is a local path.
    pub fn from_locator(locator: &str) -> Self {
        if is_remote(locator) {
            Self {
                local_path: None,
                remote_url: Some(locator.to_string()),
            }
        } else {
            Self {
                local_path: Some(PathBuf::from(locator)),
                remote_url: None,
            }
        }
    }

    pub fn resolve(&self) -> Result<ResolvedSource, LoadError> {
        if let Some(path) = self.local_path.as_ref().filter(|path| path.exists()) {
            return Ok(ResolvedSource::Local(path.clone()));
        }
        match &self.remote_url {
            Some(url) if is_remote(url) => Ok(ResolvedSource::Remote(url.clone())),
            _ => Err(LoadError::NotFound),
        }
    }
}

fn is_remote(locator: &str) -> bool {
    let lower = locator.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Blocking HTTP access to remote workbooks.
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    client: Client,
    timeout: Duration,
}

impl RemoteFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }

    /// Downloads the body of `url`, requiring a success status.
    #[instrument(level = "info", skip(self))]
    pub fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .map_err(|err| LoadError::Unreachable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "remote workbook request rejected");
            return Err(LoadError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .map_err(|err| LoadError::Unreachable(err.to_string()))?;
        info!(bytes = bytes.len(), "remote workbook downloaded");
        Ok(bytes.to_vec())
    }

    /// Reads the `Last-Modified` header of `url` with a HEAD request.
    pub fn last_modified(&self, url: &str) -> Result<Option<DateTime<Local>>, LoadError> {
        let response = self
            .client
            .head(url)
            .timeout(self.timeout)
            .send()
            .map_err(|err| LoadError::Unreachable(err.to_string()))?;
        if !response.status().is_success() {
            return Ok(None);
        }
        Ok(response
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_http_date))
    }
}

/// Reads the raw bytes behind a resolved source.
pub fn read_bytes(source: &ResolvedSource, fetcher: &RemoteFetcher) -> Result<Vec<u8>, LoadError> {
    match source {
        ResolvedSource::Local(path) => {
            debug!(path = %path.display(), "reading local workbook");
            fs::read(path).map_err(|err| LoadError::LocalRead {
                path: path.clone(),
                message: err.to_string(),
            })
        }
        ResolvedSource::Remote(url) => fetcher.fetch(url),
    }
}

/// Parses an HTTP date (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub fn parse_http_date(value: &str) -> Option<DateTime<Local>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|date| date.with_timezone(&Local))
}

pub const LAST_UPDATE_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// When the data behind a source last changed, as far as can be told.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum LastUpdate {
    /// Formatted timestamp.
    Known(String),
    /// The source answered but carried no usable timestamp.
    Unavailable,
    /// Looking up the timestamp failed.
    Failed,
    /// No source is configured at all.
    NoData,
}

impl LastUpdate {
    pub fn label(&self) -> &str {
        match self {
            LastUpdate::Known(value) => value,
            LastUpdate::Unavailable => "not available",
            LastUpdate::Failed => "failed to retrieve",
            LastUpdate::NoData => "no data",
        }
    }
}

/// Local modification time when the file exists, otherwise the remote
/// `Last-Modified` header.
pub fn last_update(source: &DataSource, fetcher: &RemoteFetcher) -> LastUpdate {
    if let Some(path) = source.local_path.as_deref().filter(|path| path.exists()) {
        return local_mtime(path)
            .map(|time| LastUpdate::Known(time.format(LAST_UPDATE_FORMAT).to_string()))
            .unwrap_or(LastUpdate::Failed);
    }

    match source.remote_url.as_deref() {
        Some(url) => match fetcher.last_modified(url) {
            Ok(Some(time)) => LastUpdate::Known(time.format(LAST_UPDATE_FORMAT).to_string()),
            Ok(None) => LastUpdate::Unavailable,
            Err(err) => {
                warn!(error = %err, "last-modified lookup failed");
                LastUpdate::Failed
            }
        },
        None => LastUpdate::NoData,
    }
}

fn local_mtime(path: &Path) -> Option<DateTime<Local>> {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .map(DateTime::<Local>::from)
}
