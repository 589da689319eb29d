mod common;

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hr_recap::config::{AppConfig, GitIdentity, RepositoryConfig};
use hr_recap::dashboard::{self, Dashboard, PublishTarget};
use hr_recap::publish::contents_api::ContentsPayload;
use hr_recap::publish::git::classify_push_failure;
use hr_recap::publish::{ContentsApiPublisher, GitPublisher, Publisher};
use hr_recap::{HrError, PublishError};
use tempfile::tempdir;

use common::{employee_rows, write_xlsx, xlsx_bytes};

fn repository() -> RepositoryConfig {
    RepositoryConfig {
        owner: "acme".into(),
        name: "hr-data".into(),
        branch: "main".into(),
    }
}

#[test]
fn push_failures_are_categorised() {
    assert!(matches!(
        classify_push_failure("fatal: could not read Username for 'https://github.com'"),
        PublishError::Access(_)
    ));
    assert!(matches!(
        classify_push_failure("git@github.com: Permission denied (publickey)."),
        PublishError::Access(_)
    ));
    assert!(matches!(
        classify_push_failure("Author identity unknown"),
        PublishError::AuthorIdentity(_)
    ));
    assert!(matches!(
        classify_push_failure("error: gpg failed to sign the data"),
        PublishError::Signing(_)
    ));
    assert!(matches!(
        classify_push_failure("! [rejected] main -> main (fetch first)"),
        PublishError::Command(_)
    ));
}

#[test]
fn access_failure_message_carries_a_hint() {
    let message = PublishError::Access("Permission denied".into()).to_string();
    assert!(message.contains("hint:"));
}

#[test]
fn contents_payload_encodes_content() {
    let payload = ContentsPayload::new(b"xlsx bytes", "Update db", "main", None);
    assert_eq!(STANDARD.decode(&payload.content).expect("base64"), b"xlsx bytes");

    let json = serde_json::to_value(&payload).expect("serialised");
    assert_eq!(json["message"], "Update db");
    assert_eq!(json["branch"], "main");
    assert!(json.get("sha").is_none());

    let update = ContentsPayload::new(b"", "m", "main", Some("abc123".into()));
    assert_eq!(serde_json::to_value(&update).expect("serialised")["sha"], "abc123");
}

#[test]
fn contents_url_targets_the_repository_path() {
    let publisher = ContentsApiPublisher::new(repository(), "token", Duration::from_secs(5))
        .with_api_base("https://git.example.com/api/v3/");
    assert_eq!(
        publisher.contents_url("/Cek Test Profile.xlsx"),
        "https://git.example.com/api/v3/repos/acme/hr-data/contents/Cek Test Profile.xlsx"
    );
    assert_eq!(publisher.name(), "contents-api");
}

#[test]
fn empty_token_fails_before_any_request() {
    let publisher = ContentsApiPublisher::new(repository(), " ", Duration::from_secs(5));
    assert!(matches!(
        publisher.publish(b"x", "db.xlsx", "m"),
        Err(PublishError::Credentials(_))
    ));
}

#[test]
fn replacement_must_carry_mandatory_columns() {
    let good = xlsx_bytes(&[("Data", employee_rows())]);
    assert!(dashboard::validate_replacement(&good, PublishTarget::Primary).is_ok());

    let bad = xlsx_bytes(&[("Data", vec![vec!["Nama"], vec!["Andi"]])]);
    let err = dashboard::validate_replacement(&bad, PublishTarget::Primary).unwrap_err();
    assert!(matches!(
        err,
        HrError::Publish(PublishError::InvalidWorkbook(_))
    ));
    assert!(dashboard::validate_replacement(&bad, PublishTarget::Org).is_ok());

    let garbage = dashboard::validate_replacement(b"nope", PublishTarget::Org).unwrap_err();
    assert!(matches!(
        garbage,
        HrError::Publish(PublishError::InvalidWorkbook(_))
    ));
}

#[test]
fn failed_publish_keeps_cached_data() {
    let temp_dir = tempdir().expect("temporary directory");
    let db = temp_dir.path().join("db.xlsx");
    write_xlsx(&db, &[("Data", employee_rows())]);
    let replacement = temp_dir.path().join("new.xlsx");
    write_xlsx(&replacement, &[("Data", employee_rows())]);

    let env: HashMap<&str, String> = HashMap::from([
        ("HR_LOCAL_FILE", db.display().to_string()),
        ("HR_REPO_OWNER", "acme".to_string()),
        ("HR_REPO_NAME", "hr-data".to_string()),
        ("HR_PUBLISH_STRATEGY", "contents-api".to_string()),
    ]);
    let config = AppConfig::from_lookup(|key| env.get(key).cloned()).expect("configuration");
    let mut dashboard = Dashboard::new(config);

    assert_eq!(dashboard.units().expect("units"), vec!["Unit A", "Unit B"]);
    assert_eq!(dashboard.loader().cache().len(), 1);

    let err = dashboard
        .publish(&replacement, PublishTarget::Primary, None)
        .unwrap_err();
    assert!(matches!(
        err,
        HrError::Publish(PublishError::Credentials(_))
    ));
    assert_eq!(dashboard.loader().cache().len(), 1);

    let missing = dashboard
        .publish(&temp_dir.path().join("absent.xlsx"), PublishTarget::Primary, None)
        .unwrap_err();
    assert!(matches!(
        missing,
        HrError::Publish(PublishError::MissingFile(_))
    ));
}

#[test]
fn headcount_through_the_dashboard() {
    let temp_dir = tempdir().expect("temporary directory");
    let db = temp_dir.path().join("db.xlsx");
    write_xlsx(&db, &[("Data", employee_rows())]);
    let env: HashMap<&str, String> = HashMap::from([
        ("HR_LOCAL_FILE", db.display().to_string()),
        ("HR_DATABASE_URL", "https://files.example.invalid/db.xlsx".to_string()),
        (
            "HR_ORG_STRUCTURE_FILE",
            temp_dir.path().join("absent.xlsx").display().to_string(),
        ),
    ]);
    let config = AppConfig::from_lookup(|key| env.get(key).cloned()).expect("configuration");
    let mut dashboard = Dashboard::new(config);

    let report = dashboard
        .headcount(
            &hr_recap::report::UnitFilter::Unit("Unit A".into()),
            Default::default(),
        )
        .expect("report");
    assert_eq!(report.total, 3);

    // No org workbook locally and no URL configured: the section is skipped.
    let vacancy = dashboard.vacancy(&Default::default());
    assert_eq!(vacancy, Err(hr_recap::LoadError::NotFound));
}

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git available");
    assert!(output.status.success(), "git {args:?} failed: {output:?}");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn identity() -> GitIdentity {
    GitIdentity {
        name: "Recap Tester".into(),
        email: "tester@example.com".into(),
    }
}

#[test]
fn git_publisher_commits_before_pushing() {
    let repo = tempdir().expect("temporary directory");
    git(repo.path(), &["init", "-q"]);

    let publisher = GitPublisher::new(repo.path(), identity());
    let err = publisher
        .publish(b"workbook bytes", "db.xlsx", "Update db.xlsx")
        .unwrap_err();
    let PublishError::Command(message) = err else {
        panic!("expected a generic push failure, got {err:?}");
    };
    assert!(message.contains("No configured push destination"));

    assert_eq!(
        std::fs::read(repo.path().join("db.xlsx")).expect("file written"),
        b"workbook bytes"
    );
    assert_eq!(
        git(repo.path(), &["log", "-1", "--format=%s|%an|%ae"]),
        "Update db.xlsx|Recap Tester|tester@example.com"
    );
}

/// Points `origin` at an ssh remote whose transport runs `command` instead of ssh.
fn repo_with_ssh_command(command: &str) -> tempfile::TempDir {
    let repo = tempdir().expect("temporary directory");
    git(repo.path(), &["init", "-q"]);
    git(repo.path(), &["config", "push.default", "current"]);
    git(repo.path(), &["remote", "add", "origin", "ssh://example.invalid/hr-data.git"]);
    git(repo.path(), &["config", "ssh.variant", "simple"]);
    git(repo.path(), &["config", "core.sshCommand", command]);
    repo
}

#[test]
fn hanging_push_is_killed_after_the_timeout() {
    let repo = repo_with_ssh_command("sleep 30 #");
    let publisher =
        GitPublisher::new(repo.path(), identity()).with_push_timeout(Duration::from_secs(1));

    let started = Instant::now();
    let err = publisher
        .publish(b"x", "db.xlsx", "Update db.xlsx")
        .unwrap_err();
    assert_eq!(err, PublishError::Timeout(1));
    assert!(started.elapsed() < Duration::from_secs(20));
}

#[test]
fn noisy_push_failure_is_reported_without_waiting_for_the_timeout() {
    let repo = repo_with_ssh_command("yes remote-noise | head -c 200000 >&2; exit 1 #");
    let publisher =
        GitPublisher::new(repo.path(), identity()).with_push_timeout(Duration::from_secs(20));

    let started = Instant::now();
    let err = publisher
        .publish(b"x", "db.xlsx", "Update db.xlsx")
        .unwrap_err();
    let PublishError::Command(message) = err else {
        panic!("expected a generic push failure, got {err:?}");
    };
    assert!(message.contains("remote-noise"));
    assert!(started.elapsed() < Duration::from_secs(15));
}
