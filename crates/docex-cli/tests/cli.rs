use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const INVOICE: &str = "Invoice #1001
Date: Mar 4, 2024
ITEMS
Consulting, 1,250.00
Travel, 80.00
TOTAL 1,330.00
";

fn docex() -> Command {
    let mut cmd: Command = cargo_bin_cmd!("docex").into();
    cmd.env("NO_COLOR", "1");
    cmd
}

fn init_profiles(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("profiles.json");
    docex()
        .args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .success();
    path
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn extract_formats_sample_invoice() {
    let dir = TempDir::new().unwrap();
    let profiles = init_profiles(&dir);
    let invoice = write(dir.path(), "invoice.txt", INVOICE);

    docex()
        .arg("--config")
        .arg(&profiles)
        .arg("extract")
        .arg(&invoice)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""invoice_number": "1001""#))
        .stdout(predicate::str::contains(r#""issue_date": "2024-03-04""#))
        .stdout(predicate::str::contains(r#""amount": "1250.00""#));
}

#[test]
fn extract_raw_keeps_matched_text() {
    let dir = TempDir::new().unwrap();
    let profiles = init_profiles(&dir);
    let invoice = write(dir.path(), "invoice.txt", INVOICE);

    docex()
        .arg("--config")
        .arg(&profiles)
        .args(["extract", "--raw", "--format", "csv"])
        .arg(&invoice)
        .assert()
        .success()
        .stdout(predicate::str::contains("Mar 4, 2024"))
        .stdout(predicate::str::contains("\"1,250.00\""));
}

#[test]
fn extract_fails_on_missing_required_entity() {
    let dir = TempDir::new().unwrap();
    let profiles = init_profiles(&dir);
    let receipt = write(dir.path(), "receipt.txt", "Receipt\nThanks!\n");

    docex()
        .arg("--config")
        .arg(&profiles)
        .arg("extract")
        .arg(&receipt)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invoice_number"));
}

#[test]
fn init_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    let profiles = init_profiles(&dir);

    docex()
        .args(["config", "init", "--output"])
        .arg(&profiles)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn check_reports_selected_profile() {
    let dir = TempDir::new().unwrap();
    let profiles = init_profiles(&dir);
    let euro = write(dir.path(), "euro.txt", &INVOICE.replace("Travel", "Travel €"));

    docex()
        .arg("--config")
        .arg(&profiles)
        .args(["config", "check"])
        .arg(&euro)
        .assert()
        .success()
        .stdout(predicate::str::contains("Extractor profile: invoice-eur"));
}

#[test]
fn batch_writes_outputs_and_summary() {
    let dir = TempDir::new().unwrap();
    let profiles = init_profiles(&dir);
    let docs = dir.path().join("docs");
    fs::create_dir_all(&docs).unwrap();
    write(&docs, "a.txt", INVOICE);
    write(&docs, "b.txt", &INVOICE.replace("1001", "1002"));
    write(&docs, "c.txt", "not an invoice");
    let out = dir.path().join("out");

    docex()
        .arg("--config")
        .arg(&profiles)
        .arg("batch")
        .arg(format!("{}/*.txt", docs.display()))
        .arg("--output-dir")
        .arg(&out)
        .args(["--summary", "--continue-on-error", "-j", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 successful"));

    let b = fs::read_to_string(out.join("b.json")).unwrap();
    assert!(b.contains(r#""invoice_number": "1002""#));

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.starts_with("filename,status,extractor"));
    assert!(summary.contains("a.txt,success,invoice,invoice,2,"));
    assert!(summary.contains("c.txt,error,"));
}

#[test]
fn batch_stops_on_first_error_by_default() {
    let dir = TempDir::new().unwrap();
    let profiles = init_profiles(&dir);
    write(dir.path(), "bad.txt", "not an invoice");

    docex()
        .arg("--config")
        .arg(&profiles)
        .arg("batch")
        .arg(format!("{}/*.txt", dir.path().display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad.txt"));
}
