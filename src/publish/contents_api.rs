use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::RepositoryConfig;
use crate::error::PublishError;
use crate::publish::{PublishReceipt, Publisher};

const API_BASE: &str = "https://api.github.com";
const ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("hr-recap/", env!("CARGO_PKG_VERSION"));

/// Request body of a create-or-update call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentsPayload {
    pub message: String,
    pub content: String,
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

impl ContentsPayload {
    /// Encodes `content` as base64; `sha` identifies the blob being replaced.
    pub fn new(content: &[u8], message: &str, branch: &str, sha: Option<String>) -> Self {
        Self {
            message: message.to_string(),
            content: STANDARD.encode(content),
            branch: branch.to_string(),
            sha,
        }
    }
}

/// Creates or updates a file through the repository contents REST API.
#[derive(Debug, Clone)]
pub struct ContentsApiPublisher {
    client: Client,
    api_base: String,
    repository: RepositoryConfig,
    token: String,
    timeout: Duration,
}

impl ContentsApiPublisher {
    pub fn new(repository: RepositoryConfig, token: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            api_base: API_BASE.to_string(),
            repository,
            token: token.into(),
            timeout,
        }
    }

    /// Points the publisher at another API host (e.g. an enterprise server).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Endpoint for `path` inside the configured repository.
    pub fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            self.repository.owner,
            self.repository.name,
            path.trim_start_matches('/')
        )
    }

    /// Blob sha of the current file on the branch, if it exists.
    fn existing_sha(&self, url: &str) -> Option<String> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[("ref", self.repository.branch.as_str())])
            .timeout(self.timeout)
            .send()
            .ok()?;
        if response.status() != StatusCode::OK {
            debug!(status = response.status().as_u16(), "no existing file on branch");
            return None;
        }
        let body: Value = response.json().ok()?;
        body.get("sha").and_then(Value::as_str).map(str::to_string)
    }
}

impl Publisher for ContentsApiPublisher {
    fn name(&self) -> &'static str {
        "contents-api"
    }

    #[instrument(level = "info", skip(self, content), fields(bytes = content.len()))]
    fn publish(
        &self,
        content: &[u8],
        path: &str,
        commit_message: &str,
    ) -> Result<PublishReceipt, PublishError> {
        if self.token.trim().is_empty() {
            return Err(PublishError::Credentials("token is empty".into()));
        }

        let url = self.contents_url(path);
        let sha = self.existing_sha(&url);
        let payload = ContentsPayload::new(content, commit_message, &self.repository.branch, sha);

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .map_err(|err| {
                if err.is_timeout() {
                    PublishError::Timeout(self.timeout.as_secs())
                } else {
                    PublishError::Transport(err.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            info!(status = status.as_u16(), "file stored through contents API");
            return Ok(PublishReceipt {
                path: path.to_string(),
                message: "uploaded via contents API".to_string(),
            });
        }

        let body = response.text().unwrap_or_default();
        warn!(status = status.as_u16(), "contents API rejected upload");
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                PublishError::Access(format!("HTTP {} - {body}", status.as_u16()))
            }
            _ => PublishError::Rejected {
                status: status.as_u16(),
                body,
            },
        })
    }
}
