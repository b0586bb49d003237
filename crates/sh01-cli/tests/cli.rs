use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn sh01() -> Command {
    Command::cargo_bin("sh01").unwrap()
}

fn filing_dir(root: &Path, date: &str, footer: &str) -> std::path::PathBuf {
    let dir = root.join(format!("{}_MzAwMDAwMDAw", date));
    std::fs::create_dir_all(dir.join("pages")).unwrap();
    std::fs::write(
        dir.join("metadata.json"),
        format!(
            r#"{{"type": "SH01", "date": "{}", "action_date": "{}", "transaction_id": "MzAwMDAwMDAw"}}"#,
            date, date
        ),
    )
    .unwrap();
    std::fs::write(dir.join("pages/form_type.txt"), footer).unwrap();
    dir
}

#[test]
fn help_lists_subcommands() {
    sh01()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("parse"))
        .stdout(predicate::str::contains("classify"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn config_path_follows_flag() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sh01.json");

    sh01()
        .args(["--config", path.to_str().unwrap(), "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sh01.json"));
}

#[test]
fn config_init_set_get() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sh01.json");
    let path = path.to_str().unwrap();

    sh01().args(["--config", path, "config", "init"]).assert().success();
    sh01()
        .args(["--config", path, "config", "get", "registry.items_per_page"])
        .assert()
        .success()
        .stdout(predicate::str::contains("100"));

    sh01()
        .args(["--config", path, "config", "set", "registry.retry_delay_secs", "5"])
        .assert()
        .success();
    sh01()
        .args(["--config", path, "config", "get", "registry.retry_delay_secs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("5"));

    sh01()
        .args(["--config", path, "config", "get", "registry.nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}

#[test]
fn run_requires_api_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sh01.json");
    std::fs::write(&path, "{}").unwrap();

    sh01()
        .args(["--config", path.to_str().unwrap(), "run", "01234567"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("registry.api_key is not set"));
}

#[test]
fn classify_uses_cached_footer() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("sh01.json");
    std::fs::write(&config, "{}").unwrap();
    let doc = filing_dir(dir.path(), "2016-05-01", "Electronically filed document");

    sh01()
        .args(["--config", config.to_str().unwrap(), "classify", doc.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::diff("online\n"));

    sh01()
        .args([
            "--config",
            config.to_str().unwrap(),
            "classify",
            doc.to_str().unwrap(),
            "--date",
            "2012-01-01",
        ])
        .assert()
        .success()
        .stdout(predicate::str::diff("online_old\n"));
}

#[test]
fn parse_unsupported_layout_writes_empty_record() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("sh01.json");
    std::fs::write(&config, "{}").unwrap();
    let doc = filing_dir(dir.path(), "2009-05-01", "SH01 version 4.0");

    sh01()
        .args(["--config", config.to_str().unwrap(), "parse", doc.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::diff("{}\n"));

    assert_eq!(std::fs::read_to_string(doc.join("result.json")).unwrap(), "{}");
}

#[test]
fn parse_missing_directory_fails() {
    sh01()
        .args(["parse", "/nonexistent/filing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Filing directory not found"));
}
