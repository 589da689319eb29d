//! Persisting a replacement workbook to the repository that serves it.

pub mod contents_api;
pub mod git;

use serde::Serialize;

use crate::error::PublishError;

pub use contents_api::ContentsApiPublisher;
pub use git::GitPublisher;

/// What a successful publish reports back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReceipt {
    pub path: String,
    pub message: String,
}

/// A destination for replacement workbooks.
pub trait Publisher {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Stores `content` at `path` (relative to the repository root) with the
    /// given commit message.
    fn publish(
        &self,
        content: &[u8],
        path: &str,
        commit_message: &str,
    ) -> Result<PublishReceipt, PublishError>;
}
