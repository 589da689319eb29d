use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, HrError>;

/// Error type for the conditions that halt report generation. Everything
/// recoverable is modelled by [`LoadError`] or [`PublishError`] and handed back
/// to the caller as a value instead.
#[derive(Debug, Error)]
pub enum HrError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Missing or invalid settings.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The primary workbook lacks a column every report depends on.
    #[error(
        "mandatory column not found: {field} (accepted names: {}); check the workbook structure",
        .aliases.join(", ")
    )]
    MissingColumn {
        field: &'static str,
        aliases: Vec<&'static str>,
    },

    /// The primary workbook could not be loaded.
    #[error("failed to load primary workbook: {0}")]
    Load(#[from] LoadError),

    /// Raised when the publish path is rejected before any remote call.
    #[error("publish rejected: {0}")]
    Publish(#[from] PublishError),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

/// Reasons a workbook could not be produced from a source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("file not found (neither locally nor remotely)")]
    NotFound,

    #[error("could not read {path}: {message}")]
    LocalRead { path: PathBuf, message: String },

    #[error("remote source unreachable: {0}")]
    Unreachable(String),

    #[error("remote source answered HTTP {status} for {url}")]
    BadStatus { url: String, status: u16 },

    #[error("content is not a readable spreadsheet: {0}")]
    Unparseable(String),

    #[error("sheet '{0}' not found in workbook")]
    MissingSheet(String),
}

/// Failure categories of a publish attempt. None of them touch data that has
/// already been loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("file not found: {0}")]
    MissingFile(PathBuf),

    #[error("publish credentials incomplete: {0}")]
    Credentials(String),

    #[error(
        "push failed (access): {0}\nhint: make sure the remote uses HTTPS with a token (or a valid SSH key) and that you have push access"
    )]
    Access(String),

    #[error(
        "author identity rejected: {0}\nhint: set HR_GIT_USER_NAME and HR_GIT_USER_EMAIL"
    )]
    AuthorIdentity(String),

    #[error(
        "commit signing failed: {0}\nhint: commit.gpgsign=false is already passed; check the global git config or hooks"
    )]
    Signing(String),

    #[error("push failed: timed out after {0} seconds")]
    Timeout(u64),

    #[error("git command failed: {0}")]
    Command(String),

    #[error("upload failed: HTTP {status} - {body}")]
    Rejected { status: u16, body: String },

    #[error("upload failed: {0}")]
    Transport(String),

    #[error("replacement workbook is invalid: {0}")]
    InvalidWorkbook(String),
}
