use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn bookclub() -> Command {
    let mut cmd = Command::cargo_bin("bookclub").expect("locate bookclub binary");
    cmd.env_remove("BOOKCLUB_AUTH__SESSION_ID")
        .env_remove("BOOKCLUB_AUTH__CSRF_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn prints_version() {
    bookclub()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn prints_help() {
    bookclub()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bookclub"))
        .stdout(predicate::str::contains("discussion <group-id>"));
}

#[test]
fn rejects_unknown_command() {
    bookclub()
        .arg("launch")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown command"));
}

#[test]
fn dashboard_requires_session() {
    let dir = tempdir().unwrap();
    bookclub()
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .arg("dashboard")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not signed in"));
}
