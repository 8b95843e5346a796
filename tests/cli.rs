use assert_cmd::Command;
use predicates::prelude::*;

fn spendlog(config_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("spendlog").unwrap();
    cmd.env("SPENDLOG_CONFIG_DIR", config_dir)
        .env("NO_COLOR", "1")
        .env_remove("SPENDLOG_API_URL")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn list_without_session_asks_for_login() {
    let dir = tempfile::tempdir().unwrap();
    spendlog(dir.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn expired_session_is_not_used() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("session.json"), r#"{"user":"alice"}"#).unwrap();
    spendlog(dir.path())
        .args(["export", "csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("spendlog login"));
}

#[test]
fn add_with_missing_fields_is_rejected_locally() {
    let dir = tempfile::tempdir().unwrap();
    spendlog(dir.path())
        .args(["add", "--amount", "250", "--mode", "cash", "--bank", "sbi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("All fields are required."));
}

#[test]
fn add_with_future_date_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    spendlog(dir.path())
        .args([
            "add", "--date", "2999-01-01", "--item", "Tea", "--amount", "20", "--mode", "cash",
            "--bank", "sbi",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("in the future"));
}

#[test]
fn edit_without_fields_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    spendlog(dir.path())
        .args(["edit", "abc123"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to change"));
}

#[test]
fn monthly_report_rejects_month_13() {
    let dir = tempfile::tempdir().unwrap();
    spendlog(dir.path())
        .args(["report", "monthly", "--month", "13", "--year", "2024"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Month must be between 1 and 12"));
}

#[test]
fn config_shows_defaults() {
    let dir = tempfile::tempdir().unwrap();
    spendlog(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("http://localhost:3500"))
        .stdout(predicate::str::contains("60"))
        .stdout(predicate::str::contains("Rs"));
}

#[test]
fn config_flags_are_saved() {
    let dir = tempfile::tempdir().unwrap();
    spendlog(dir.path())
        .args(["config", "--page-size", "25", "--currency", "USD"])
        .assert()
        .success();
    assert!(dir.path().join("settings.json").exists());

    spendlog(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("25"))
        .stdout(predicate::str::contains("USD"));
}

#[test]
fn config_rejects_zero_page_size() {
    let dir = tempfile::tempdir().unwrap();
    spendlog(dir.path())
        .args(["config", "--page-size", "0"])
        .assert()
        .failure();
    assert!(!dir.path().join("settings.json").exists());
}

#[test]
fn status_without_session() {
    let dir = tempfile::tempdir().unwrap();
    spendlog(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("not logged in"));
}

#[test]
fn logout_without_session() {
    let dir = tempfile::tempdir().unwrap();
    spendlog(dir.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("No session to end."));
}

#[test]
fn logout_removes_session_file() {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("session.json");
    std::fs::write(&session, r#"{"user":"bob","access_token":"t"}"#).unwrap();
    spendlog(dir.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out bob."));
    assert!(!session.exists());
}

#[test]
fn edit_to_uncategorized_is_a_real_change() {
    let dir = tempfile::tempdir().unwrap();
    spendlog(dir.path())
        .args(["edit", "abc123", "--category", "Uncategorized"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"))
        .stderr(predicate::str::contains("Nothing to change").not());
}
