use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const RECEIPT: &str = "STARBUCKS COFFEE\n123 Main St\n03/14/2024 08:12\nLatte 4.50\nMuffin 3.25\nTOTAL $45.67\nThank you!\n";

struct Workspace {
    dir: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.json");
        let data_dir = dir.path().join("data");
        let json = serde_json::json!({ "storage": { "data_dir": data_dir } });
        fs::write(&config, serde_json::to_string_pretty(&json).unwrap()).unwrap();
        Self { dir, config }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn rcpt(&self) -> Command {
        let mut cmd = Command::cargo_bin("rcpt").unwrap();
        cmd.arg("--config").arg(&self.config);
        cmd
    }

    fn write_receipt(&self, name: &str, text: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, text).unwrap();
        path
    }
}

#[test]
fn process_text_receipt_and_list_it() {
    let ws = Workspace::new();
    let receipt = ws.write_receipt("starbucks.txt", RECEIPT);

    ws.rcpt()
        .args(["vendors", "add", "Starbucks"])
        .assert()
        .success();

    ws.rcpt()
        .arg("process")
        .arg(&receipt)
        .args(["--reference-time", "2024-03-14T10:00:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\": \"1710410400000\""))
        .stdout(predicate::str::contains("\"vendor_name\": \"Starbucks Coffee\""))
        .stdout(predicate::str::contains("\"total_amount\": 45.67"))
        .stdout(predicate::str::contains("\"date\": \"2024-03-14\""))
        .stdout(predicate::str::contains("\"name\": \"Starbucks\""));

    ws.rcpt()
        .args(["receipts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1710410400000"))
        .stdout(predicate::str::contains("Food & Drinks"))
        .stdout(predicate::str::contains("1 receipt(s), total 45.67"));
}

#[test]
fn process_no_save_leaves_list_empty() {
    let ws = Workspace::new();
    let receipt = ws.write_receipt("scan.txt", RECEIPT);

    ws.rcpt()
        .arg("process")
        .arg(&receipt)
        .args(["--no-save", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("id,vendor_name,"));

    ws.rcpt()
        .args(["receipts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No receipts."));
}

#[test]
fn verbose_logging_keeps_stdout_parseable() {
    let ws = Workspace::new();
    let receipt = ws.write_receipt("scan.txt", RECEIPT);

    let output = ws
        .rcpt()
        .arg("-vvv")
        .arg("process")
        .arg(&receipt)
        .args(["--no-save", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["vendor_name"], "Starbucks Coffee");
}

#[test]
fn update_and_delete_receipt() {
    let ws = Workspace::new();
    let receipt = ws.write_receipt("scan.txt", RECEIPT);

    ws.rcpt()
        .arg("process")
        .arg(&receipt)
        .args(["--reference-time", "2024-03-14T10:00:00Z"])
        .assert()
        .success();

    ws.rcpt()
        .args(["receipts", "update", "1710410400000", "--total", "50.00", "--set", "note=team lunch"])
        .assert()
        .success();

    ws.rcpt()
        .args(["receipts", "show", "1710410400000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 50.00"))
        .stdout(predicate::str::contains("note: team lunch"));

    ws.rcpt()
        .args(["receipts", "delete", "1710410400000"])
        .assert()
        .success();

    ws.rcpt()
        .args(["receipts", "show", "1710410400000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Receipt not found"));
}

#[test]
fn saved_receipt_survives_failed_remote_delete() {
    let ws = Workspace::new();
    let data_dir = ws.path().join("data");
    let config = serde_json::json!({
        "storage": { "data_dir": data_dir },
        "remote": { "database_url": "http://127.0.0.1:9", "timeout_secs": 2 }
    });
    fs::write(&ws.config, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    let saved = serde_json::json!([{
        "id": "1710410400000",
        "vendor_name": "Starbucks Coffee",
        "total_amount": 45.67,
        "tax": 0.0,
        "date": "2024-03-14",
        "category": "Food & Drinks",
        "status": "saved",
        "createdAt": "2024-03-14T10:00:00Z",
        "firebase_id": "-Nremote1"
    }]);
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(
        data_dir.join("receipts.json"),
        serde_json::to_string_pretty(&saved).unwrap(),
    )
    .unwrap();

    ws.rcpt()
        .args(["receipts", "delete", "1710410400000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to delete remote copy"));

    ws.rcpt()
        .args(["receipts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1710410400000"));
}

#[test]
fn batch_processes_text_files() {
    let ws = Workspace::new();
    ws.write_receipt("a.txt", RECEIPT);
    ws.write_receipt("b.txt", "SHELL\n2024-02-10\nTOTAL 25.50\nTAX 2.00\n");
    let out = ws.path().join("out");
    let pattern = ws.path().join("*.txt");

    ws.rcpt()
        .arg("batch")
        .arg(pattern.to_str().unwrap())
        .arg("--output-dir")
        .arg(&out)
        .arg("--summary")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 successful, 0 failed"));

    assert!(out.join("a.json").exists());
    assert!(out.join("b.json").exists());
    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.contains("b.txt,success,"));

    ws.rcpt()
        .args(["summary", "--month", "2024-03", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"month\": \"2024-03\""))
        .stdout(predicate::str::contains("\"previous_total\": 25.5"));
}

#[test]
fn vendor_field_management() {
    let ws = Workspace::new();

    ws.rcpt()
        .args(["vendors", "add", "Cafe Uno"])
        .assert()
        .success();

    ws.rcpt()
        .args(["vendors", "add", "cafe uno"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    ws.rcpt()
        .args(["vendors", "add-field", "Cafe Uno", "Loyalty Card #", "--type", "boolean"])
        .assert()
        .success()
        .stdout(predicate::str::contains("loyalty_card"));

    ws.rcpt()
        .args(["vendors", "toggle-field", "Cafe Uno", "loyalty_card"])
        .assert()
        .success()
        .stdout(predicate::str::contains("disabled"));

    ws.rcpt()
        .args(["vendors", "remove-field", "Cafe Uno", "total_amount"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("common field"));

    ws.rcpt()
        .args(["vendors", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("General"))
        .stdout(predicate::str::contains("Cafe Uno"));
}

#[test]
fn last_vendor_cannot_be_removed() {
    let ws = Workspace::new();

    ws.rcpt()
        .args(["vendors", "remove", "General"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one vendor must remain"));
}

#[test]
fn config_get_and_set() {
    let ws = Workspace::new();

    ws.rcpt()
        .args(["config", "get", "extraction.vendor_scan_lines"])
        .assert()
        .success()
        .stdout(predicate::str::contains("8"));

    ws.rcpt()
        .args(["config", "set", "extraction.date_order", "day_first"])
        .assert()
        .success();

    ws.rcpt()
        .args(["config", "get", "extraction.date_order"])
        .assert()
        .success()
        .stdout(predicate::str::contains("day_first"));
}

#[test]
fn missing_config_file_is_an_error() {
    Command::cargo_bin("rcpt")
        .unwrap()
        .args(["--config", "/nonexistent/rcpt.json", "receipts", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}
