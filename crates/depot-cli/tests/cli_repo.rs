use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn depot_cmd() -> Command {
    Command::cargo_bin("depot").unwrap()
}

/// A workspace with a writable `local` repository holding foo 1.0 and 2.0,
/// plus an empty read-only `release` repository.
fn workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("depot.toml"),
        r#"
[[repository]]
name = "local"
location = "repo"

[[repository]]
name = "release"
location = "release"
readonly = true
"#,
    )
    .unwrap();
    let foo = tmp.path().join("repo").join("foo");
    fs::create_dir_all(&foo).unwrap();
    fs::write(foo.join("foo-1.0.jar"), "one").unwrap();
    fs::write(foo.join("foo-2.0.jar"), "two").unwrap();
    fs::create_dir_all(tmp.path().join("release")).unwrap();
    tmp
}

#[test]
fn test_get_picks_highest_by_default() {
    let tmp = workspace();
    depot_cmd()
        .current_dir(tmp.path())
        .args(["repo", "get", "foo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("foo-2.0.jar"));
}

#[test]
fn test_get_with_lowest_strategy_and_range() {
    let tmp = workspace();
    depot_cmd()
        .current_dir(tmp.path())
        .args(["repo", "get", "foo", "--version", "[1.0,3.0)", "--strategy", "lowest"])
        .assert()
        .success()
        .stdout(predicate::str::contains("foo-1.0.jar"));
}

#[test]
fn test_get_exact_with_range_fails() {
    let tmp = workspace();
    depot_cmd()
        .current_dir(tmp.path())
        .args(["repo", "get", "foo", "--version", "[1.0,3.0)", "--strategy", "exact"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("EXACT needs a single version"));
}

#[test]
fn test_get_without_match_fails_with_not_found() {
    let tmp = workspace();
    depot_cmd()
        .current_dir(tmp.path())
        .args(["repo", "get", "foo", "--version", "[5.0,6.0)"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn test_versions_and_list() {
    let tmp = workspace();
    depot_cmd()
        .current_dir(tmp.path())
        .args(["repo", "versions", "foo"])
        .assert()
        .success()
        .stdout("1.0.0\n2.0.0\n");

    depot_cmd()
        .current_dir(tmp.path())
        .args(["repo", "list", "f*"])
        .assert()
        .success()
        .stdout("foo\n");
}

#[test]
fn test_put_stores_and_reports() {
    let tmp = workspace();
    fs::write(tmp.path().join("widget.jar"), "widget").unwrap();

    depot_cmd()
        .current_dir(tmp.path())
        .args(["repo", "put", "com.acme.widget", "1.2.3", "widget.jar"])
        .assert()
        .success()
        .stdout(predicate::str::contains("com.acme.widget-1.2.3.jar"))
        .stderr(predicate::str::contains("Stored"));

    let stored = tmp
        .path()
        .join("repo")
        .join("com.acme.widget")
        .join("com.acme.widget-1.2.3.jar");
    assert_eq!(fs::read_to_string(stored).unwrap(), "widget");
}

#[test]
fn test_put_into_read_only_repository_fails() {
    let tmp = workspace();
    fs::write(tmp.path().join("widget.jar"), "widget").unwrap();

    depot_cmd()
        .current_dir(tmp.path())
        .args(["repo", "put", "widget", "1.0", "widget.jar", "--repo", "release"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("read-only"));
}

#[test]
fn test_unknown_repository_name_fails() {
    let tmp = workspace();
    depot_cmd()
        .current_dir(tmp.path())
        .args(["repo", "list", "--repo", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("repository 'nope'"));
}

#[test]
fn test_maven_repository_cannot_list() {
    let tmp = workspace();
    depot_cmd()
        .current_dir(tmp.path())
        .args(["repo", "list", "--repo", "maven"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not support list"));
}
