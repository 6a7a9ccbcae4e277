//! End-to-end tests for the `bookshelf` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A `bookshelf` command isolated to `dir`: no config files, its own database.
fn bookshelf_in(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("bookshelf").unwrap();
    cmd.current_dir(dir)
        .env("BOOKSHELF_CONFIG_DIR", dir)
        .env("BOOKSHELF_ENV", "local")
        .env(
            "BOOKSHELF_DATABASE__URL",
            format!("sqlite://{}", dir.join("catalog.db").display()),
        )
        .env("RUST_LOG", "warn");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    bookshelf_in(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("import-genres"));
}

#[test]
fn migrate_creates_the_database() {
    let dir = TempDir::new().unwrap();
    bookshelf_in(dir.path()).arg("migrate").assert().success();
    assert!(dir.path().join("catalog.db").exists());

    // second run has nothing left to apply
    bookshelf_in(dir.path()).arg("migrate").assert().success();
}

#[test]
fn import_reports_missing_file() {
    let dir = TempDir::new().unwrap();
    bookshelf_in(dir.path())
        .args(["import-genres", "nowhere.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("file not found"));
}

#[test]
fn import_rejects_zero_batch_size() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("genres.csv"), "id,name\n").unwrap();
    bookshelf_in(dir.path())
        .args(["import-genres", "genres.csv", "--batch-size", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("batch-size"));
}

#[test]
fn import_prints_summary() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("genres.csv"),
        "id,name\n\
         0b6c9a4e-3f57-4c52-9a0e-2d0d5d1f8a11,Фантастика\n\
         5a3a4c0e-8d3e-4c3e-8b1a-6f7b2f0e9c22,Детектив\n\
         not-a-uuid,Поэзия\n",
    )
    .unwrap();

    let output = bookshelf_in(dir.path())
        .args(["import-genres", "genres.csv", "--batch-size", "1"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let summary: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(summary["created"], 2);
    assert_eq!(summary["updated"], 0);
    assert_eq!(summary["invalid"], 1);
    assert_eq!(summary["errors"], 0);

    // importing the same file again renames in place
    bookshelf_in(dir.path())
        .args(["import-genres", "genres.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"updated\":2"));
}
