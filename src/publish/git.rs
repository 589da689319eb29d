use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{ChildStderr, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use crate::config::GitIdentity;
use crate::error::PublishError;
use crate::publish::{PublishReceipt, Publisher};

pub const PUSH_TIMEOUT: Duration = Duration::from_secs(45);
const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// How long to wait for the stderr reader once `git push` has exited.
const STDERR_GRACE: Duration = Duration::from_secs(2);

/// Commits the file inside a local checkout and pushes to the default remote.
#[derive(Debug, Clone)]
pub struct GitPublisher {
    repo_root: PathBuf,
    identity: GitIdentity,
    push_timeout: Duration,
}

impl GitPublisher {
    pub fn new(repo_root: impl Into<PathBuf>, identity: GitIdentity) -> Self {
        Self {
            repo_root: repo_root.into(),
            identity,
            push_timeout: PUSH_TIMEOUT,
        }
    }

    pub fn with_push_timeout(mut self, timeout: Duration) -> Self {
        self.push_timeout = timeout;
        self
    }

    fn git(&self) -> Command {
        let mut command = Command::new("git");
        command
            .current_dir(&self.repo_root)
            .env("GIT_AUTHOR_NAME", &self.identity.name)
            .env("GIT_AUTHOR_EMAIL", &self.identity.email)
            .env("GIT_COMMITTER_NAME", &self.identity.name)
            .env("GIT_COMMITTER_EMAIL", &self.identity.email);
        command
    }

    fn run(&self, args: &[&str]) -> Result<(), PublishError> {
        let output = self
            .git()
            .args(args)
            .output()
            .map_err(|err| PublishError::Command(format!("git {}: {err}", args.join(" "))))?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(classify_git_failure(&stderr)
            .unwrap_or_else(|| PublishError::Command(format!("git {}: {stderr}", args.join(" ")))))
    }

    fn push(&self) -> Result<(), PublishError> {
        let mut child = self
            .git()
            .arg("push")
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| PublishError::Command(format!("git push: {err}")))?;
        let stderr = child.stderr.take().map(drain_stderr);

        let deadline = Instant::now() + self.push_timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(PublishError::Timeout(self.push_timeout.as_secs()));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(err) => return Err(PublishError::Command(format!("git push: {err}"))),
            }
        };

        if status.success() {
            return Ok(());
        }
        // A credential helper spawned by git may still hold the pipe open.
        let stderr = stderr
            .and_then(|rx| rx.recv_timeout(STDERR_GRACE).ok())
            .unwrap_or_default();
        Err(classify_push_failure(stderr.trim()))
    }
}

/// Reads the whole stream on its own thread so a chatty push never blocks on
/// a full pipe.
fn drain_stderr(mut stderr: ChildStderr) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stderr.read_to_end(&mut buf);
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

impl Publisher for GitPublisher {
    fn name(&self) -> &'static str {
        "git"
    }

    #[instrument(level = "info", skip(self, content), fields(bytes = content.len()))]
    fn publish(
        &self,
        content: &[u8],
        path: &str,
        commit_message: &str,
    ) -> Result<PublishReceipt, PublishError> {
        let target = self.repo_root.join(path);
        write_target(&target, content)?;

        self.run(&["add", path])?;
        let user_name = format!("user.name={}", self.identity.name);
        let user_email = format!("user.email={}", self.identity.email);
        self.run(&[
            "-c",
            "commit.gpgsign=false",
            "-c",
            &user_name,
            "-c",
            &user_email,
            "commit",
            "-m",
            commit_message,
        ])?;

        if let Err(err) = self.push() {
            warn!(error = %err, "git push failed");
            return Err(err);
        }
        info!("pushed replacement workbook");
        Ok(PublishReceipt {
            path: path.to_string(),
            message: "pushed via git".to_string(),
        })
    }
}

fn write_target(target: &Path, content: &[u8]) -> Result<(), PublishError> {
    if let Some(parent) = target.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        if !parent.exists() {
            return Err(PublishError::MissingFile(parent.to_path_buf()));
        }
    }
    fs::write(target, content)
        .map_err(|err| PublishError::Command(format!("writing {}: {err}", target.display())))
}

/// Maps identity and signing failures reported by `git add`/`git commit`.
fn classify_git_failure(stderr: &str) -> Option<PublishError> {
    let lower = stderr.to_lowercase();
    if lower.contains("author identity unknown") || lower.contains("author is invalid") {
        Some(PublishError::AuthorIdentity(stderr.to_string()))
    } else if lower.contains("gpg failed to sign the data") {
        Some(PublishError::Signing(stderr.to_string()))
    } else {
        None
    }
}

/// Maps the stderr of a failed `git push` onto a failure category.
pub fn classify_push_failure(stderr: &str) -> PublishError {
    const ACCESS_MARKERS: [&str; 4] = [
        "Host key verification failed",
        "Permission denied",
        "Authentication failed",
        "could not read Username",
    ];
    if ACCESS_MARKERS.iter().any(|marker| stderr.contains(marker)) {
        return PublishError::Access(stderr.to_string());
    }
    classify_git_failure(stderr).unwrap_or_else(|| PublishError::Command(stderr.to_string()))
}
