use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn billie() -> Command {
    Command::cargo_bin("billie").unwrap()
}

fn config_in(dir: &TempDir) -> String {
    dir.path().join("config.json").display().to_string()
}

#[test]
fn test_extract_missing_file() {
    let dir = TempDir::new().unwrap();

    billie()
        .args(["--config", &config_in(&dir), "config", "init"])
        .assert()
        .success();

    billie()
        .args(["--config", &config_in(&dir), "extract", "/nonexistent/invoice.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_config_init_and_show() {
    let dir = TempDir::new().unwrap();
    let path = config_in(&dir);

    billie()
        .args(["--config", &path, "config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));

    let content = std::fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json["ocr"]["language"], "eng");

    billie()
        .args(["--config", &path, "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"review_threshold\": 0.8"));
}

#[test]
fn test_config_init_refuses_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = config_in(&dir);

    billie().args(["--config", &path, "config", "init"]).assert().success();

    billie()
        .args(["--config", &path, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    billie()
        .args(["--config", &path, "config", "init", "--force"])
        .assert()
        .success();
}

#[test]
fn test_config_set_and_get() {
    let dir = TempDir::new().unwrap();
    let path = config_in(&dir);

    billie()
        .args(["--config", &path, "config", "set", "pdf.max_pages", "3"])
        .assert()
        .success();

    billie()
        .args(["--config", &path, "config", "get", "pdf.max_pages"])
        .assert()
        .success()
        .stdout(predicate::str::diff("3\n"));

    billie()
        .args(["--config", &path, "config", "set", "pdf.no_such_key", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}

#[test]
fn test_batch_without_matches() {
    let dir = TempDir::new().unwrap();
    let pattern = format!("{}/*.pdf", dir.path().display());

    billie()
        .args(["--config", &config_in(&dir), "config", "init"])
        .assert()
        .success();

    billie()
        .args(["--config", &config_in(&dir), "batch", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}
