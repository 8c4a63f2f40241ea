//! CLI integration tests using the compiled binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn verdant() -> Command {
    Command::cargo_bin("verdant").unwrap()
}

#[test]
fn help_lists_commands() {
    verdant()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("classify"))
        .stdout(predicate::str::contains("carbon"));
}

#[test]
fn classify_routes_grammar_text() {
    verdant()
        .args(["classify", "fix my grammar: i are happy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("grammar-100m"));
}

#[test]
fn classify_routes_email_text() {
    verdant()
        .args(["classify", "draft an email to the team"])
        .assert()
        .success()
        .stdout(predicate::str::contains("email-7b"));
}

#[test]
fn classify_rejects_empty_text() {
    verdant()
        .args(["classify", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty"));
}

#[test]
fn config_init_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("verdant.toml");

    verdant()
        .args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .success();

    assert!(path.exists());

    // Second run without --force refuses to clobber.
    verdant()
        .args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn endpoints_lists_configured_roster() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("verdant.toml");

    verdant()
        .args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .success();

    verdant()
        .args(["endpoints", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("grammar-us-west1"))
        .stdout(predicate::str::contains("email-us-central1"));
}

#[test]
fn completions_emit_script() {
    verdant()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("verdant"));
}
