//! Runtime settings read from the environment (optionally seeded from `.env`).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_LOCAL_FILE: &str = "Cek Test Profile.xlsx";
pub const DEFAULT_ORG_STRUCTURE_FILE: &str = "Struktur Organisasi.xlsx";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_GIT_USER_NAME: &str = "HR Recap Bot";
pub const DEFAULT_GIT_USER_EMAIL: &str = "bot@example.com";

const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

/// Which publish strategy to use for replacement workbooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStrategy {
    /// Commit and push the file from a local checkout.
    Git,
    /// Create or update the file through the hosting service's contents API.
    ContentsApi,
}

impl PublishStrategy {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "git" => Ok(Self::Git),
            "contents-api" | "api" => Ok(Self::ContentsApi),
            other => Err(ConfigError::Invalid {
                key: "HR_PUBLISH_STRATEGY",
                value: other.to_string(),
            }),
        }
    }
}

/// Coordinates of the repository that holds the workbooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub owner: String,
    pub name: String,
    pub branch: String,
}

impl RepositoryConfig {
    /// Raw download URL for a file at the repository root.
    pub fn raw_url(&self, file: &str) -> String {
        format!(
            "https://raw.githubusercontent.com/{}/{}/{}/{}",
            self.owner, self.name, self.branch, file
        )
    }
}

/// Identity recorded on commits made by the git publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitIdentity {
    pub name: String,
    pub email: String,
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub primary_local: PathBuf,
    pub primary_url: String,
    pub org_local: PathBuf,
    pub org_url: Option<String>,
    pub repository: Option<RepositoryConfig>,
    pub token: Option<String>,
    pub identity: GitIdentity,
    pub publish_strategy: PublishStrategy,
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
    pub log_level: String,
}

impl AppConfig {
    /// Loads settings from the process environment after reading `.env`.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let primary_local = get("HR_LOCAL_FILE").unwrap_or_else(|| DEFAULT_LOCAL_FILE.to_string());
        let org_local = get("HR_ORG_STRUCTURE_FILE")
            .unwrap_or_else(|| DEFAULT_ORG_STRUCTURE_FILE.to_string());

        let repository = match (get("HR_REPO_OWNER"), get("HR_REPO_NAME")) {
            (Some(owner), Some(name)) => Some(RepositoryConfig {
                owner,
                name,
                branch: get("HR_BRANCH").unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            }),
            _ => None,
        };

        let primary_url = get("HR_DATABASE_URL")
            .or_else(|| repository.as_ref().map(|repo| repo.raw_url(&primary_local)))
            .ok_or(ConfigError::MissingSource)?;
        let org_url = get("HR_ORG_STRUCTURE_URL")
            .or_else(|| repository.as_ref().map(|repo| repo.raw_url(&org_local)));

        let token = get("HR_GITHUB_TOKEN");
        let publish_strategy = match get("HR_PUBLISH_STRATEGY") {
            Some(value) => PublishStrategy::parse(&value)?,
            None if token.is_some() => PublishStrategy::ContentsApi,
            None => PublishStrategy::Git,
        };

        Ok(Self {
            primary_local: PathBuf::from(primary_local),
            primary_url,
            org_local: PathBuf::from(org_local),
            org_url,
            repository,
            token,
            identity: GitIdentity {
                name: get("HR_GIT_USER_NAME").unwrap_or_else(|| DEFAULT_GIT_USER_NAME.to_string()),
                email: get("HR_GIT_USER_EMAIL")
                    .unwrap_or_else(|| DEFAULT_GIT_USER_EMAIL.to_string()),
            },
            publish_strategy,
            cache_ttl: Duration::from_secs(parse_secs(
                &get,
                "HR_CACHE_TTL_SECS",
                DEFAULT_CACHE_TTL_SECS,
            )?),
            fetch_timeout: Duration::from_secs(parse_secs(
                &get,
                "HR_FETCH_TIMEOUT_SECS",
                DEFAULT_FETCH_TIMEOUT_SECS,
            )?),
            log_level: get("HR_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_secs<G>(get: &G, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value
            .parse::<u64>()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error(
        "no data source configured: set HR_DATABASE_URL or both HR_REPO_OWNER and HR_REPO_NAME"
    )]
    MissingSource,

    #[error("invalid value '{value}' for {key}")]
    Invalid { key: &'static str, value: String },
}
