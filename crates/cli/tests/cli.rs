use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CATALOG: &str = r#"[
  {
    "id": 101,
    "name": "Rust for Beginners",
    "description": "<p>Learn <b>Rust</b> &amp; Cargo</p>",
    "price": "49.99",
    "sale_price": 0,
    "url": "https://www.udemy.com/course/rust/?couponCode=FREE",
    "store": "Udemy",
    "category": "Development"
  },
  {
    "id": 102,
    "name": "Async Rust in Practice",
    "shoer_description": "Tokio from the ground up",
    "price": 19.99,
    "sale_price": "9.99",
    "image": "https://img.example/async.jpg",
    "url": "https://www.udemy.com/course/async/?couponCode=HALF"
  }
]"#;

const DISPATCH_TO_OUTBOX: [&str; 4] = ["dispatch", "--outbox", "outbox.jsonl", "--json"];

fn workspace() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    fs::create_dir_all(dir.path().join("website")).expect("website dir");
    fs::create_dir_all(dir.path().join("scraper")).expect("scraper dir");
    dir
}

fn write_catalog(dir: &Path, content: &str) {
    fs::write(dir.join("website/coupons.json"), content).expect("write catalog");
}

fn write_channel(dir: &Path, channel: &str) {
    fs::write(dir.join("scraper/channel_id.txt"), channel).expect("write channel");
}

fn read_cursor(dir: &Path) -> Option<String> {
    fs::read_to_string(dir.join("scraper/last_sent.txt")).ok()
}

fn herald(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("coupon-herald");
    cmd.current_dir(dir)
        .env_remove("BOT_TOKEN")
        .env_remove("RUST_LOG")
        .env_remove("COUPON_HERALD__DESTINATION__CHANNEL");
    cmd
}

fn dispatch_json(cmd: &mut assert_cmd::Command) -> Value {
    let output = cmd.output().expect("run dispatch");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn config_init_writes_example_file() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("config.toml");

    herald(dir.path())
        .args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .success();

    let content = fs::read_to_string(&config_path).expect("read config");
    assert!(content.contains("caption_limit = 1024"));
    assert!(content.contains("bot_token_env = \"BOT_TOKEN\""));

    herald(dir.path())
        .args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn dispatch_to_outbox_walks_the_backlog_in_order() {
    let dir = workspace();
    write_catalog(dir.path(), CATALOG);
    write_channel(dir.path(), "@deals\n");

    let first = dispatch_json(herald(dir.path()).args(DISPATCH_TO_OUTBOX));
    assert_eq!(first["outcome"]["outcome"], "sent");
    assert_eq!(first["outcome"]["position"], 0);
    assert_eq!(first["outcome"]["variant"], "text");
    assert_eq!(first["destination"], "@deals");
    assert_eq!(read_cursor(dir.path()).as_deref(), Some("1"));

    let second = dispatch_json(herald(dir.path()).args(DISPATCH_TO_OUTBOX));
    assert_eq!(second["outcome"]["position"], 1);
    assert_eq!(second["outcome"]["variant"], "media");
    assert_eq!(read_cursor(dir.path()).as_deref(), Some("2"));

    let third = dispatch_json(herald(dir.path()).args(DISPATCH_TO_OUTBOX));
    assert_eq!(third["outcome"]["outcome"], "skipped");
    assert_eq!(third["outcome"]["reason"], "caught_up");
    assert_eq!(read_cursor(dir.path()).as_deref(), Some("2"));

    let outbox = fs::read_to_string(dir.path().join("outbox.jsonl")).expect("read outbox");
    let entries: Vec<Value> = outbox
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid json line"))
        .collect();
    assert_eq!(entries.len(), 2);

    let first_text = entries[0]["text"].as_str().expect("text");
    assert!(first_text.contains("Rust for Beginners"));
    assert!(first_text.contains("FREE"));
    assert!(first_text.contains("Learn Rust & Cargo"));
    assert_eq!(
        entries[0]["action_url"],
        "https://www.udemy.com/course/rust/?couponCode=FREE"
    );
    assert_eq!(entries[1]["media"], "https://img.example/async.jpg");
}

#[test]
fn dispatch_dry_run_needs_no_token_and_keeps_cursor() {
    let dir = workspace();
    write_catalog(dir.path(), CATALOG);
    write_channel(dir.path(), "@deals");

    let report = dispatch_json(herald(dir.path()).args(["dispatch", "--dry-run", "--json"]));

    assert_eq!(report["outcome"]["outcome"], "skipped");
    assert_eq!(report["outcome"]["reason"], "dry_run");
    assert_eq!(report["outcome"]["position"], 0);
    assert!(
        report["outcome"]["text"]
            .as_str()
            .expect("text")
            .contains("Rust for Beginners")
    );
    assert!(read_cursor(dir.path()).is_none());
}

#[test]
fn dispatch_without_destination_is_a_noop() {
    let dir = workspace();
    write_catalog(dir.path(), CATALOG);

    // Default telegram adapter and no BOT_TOKEN: still a clean no-op
    let report = dispatch_json(herald(dir.path()).args(["dispatch", "--json"]));

    assert_eq!(report["outcome"]["outcome"], "skipped");
    assert_eq!(report["outcome"]["reason"], "no_destination");
    assert!(report["destination"].is_null());
    assert!(read_cursor(dir.path()).is_none());
}

#[test]
fn dispatch_with_missing_catalog_skips() {
    let dir = workspace();

    let report = dispatch_json(
        herald(dir.path())
            .env("COUPON_HERALD__DELIVERY__ADAPTER", "stub")
            .env("COUPON_HERALD__DESTINATION__CHANNEL", "@deals")
            .args(["dispatch", "--json"]),
    );

    assert_eq!(report["outcome"]["reason"], "empty_catalog");
    assert!(read_cursor(dir.path()).is_none());
}

#[test]
fn dispatch_with_corrupt_cursor_starts_from_the_beginning() {
    let dir = workspace();
    write_catalog(dir.path(), CATALOG);
    write_channel(dir.path(), "@deals");
    fs::write(dir.path().join("scraper/last_sent.txt"), "not-a-number").expect("write cursor");

    let report = dispatch_json(
        herald(dir.path())
            .env("COUPON_HERALD__DELIVERY__ADAPTER", "stub")
            .args(["dispatch", "--json"]),
    );

    assert_eq!(report["outcome"]["outcome"], "sent");
    assert_eq!(report["outcome"]["position"], 0);
    assert_eq!(read_cursor(dir.path()).as_deref(), Some("1"));
}

#[test]
fn sent_event_names_the_delivery_adapter() {
    let dir = workspace();
    write_catalog(dir.path(), CATALOG);
    write_channel(dir.path(), "@deals");

    herald(dir.path())
        .env("COUPON_HERALD__DELIVERY__ADAPTER", "stub")
        .arg("dispatch")
        .assert()
        .success()
        .stderr(predicate::str::contains("Sent").and(predicate::str::contains("adapter")));
}

#[test]
fn failed_delivery_leaves_cursor_and_exits_cleanly() {
    let dir = workspace();
    write_catalog(dir.path(), CATALOG);
    write_channel(dir.path(), "@deals");
    fs::write(dir.path().join("scraper/last_sent.txt"), "1").expect("write cursor");

    let report = dispatch_json(
        herald(dir.path())
            .env("COUPON_HERALD__DELIVERY__ADAPTER", "stub")
            .env("COUPON_HERALD__DELIVERY__STUB_FAILURE", "unconfirmed")
            .args(["dispatch", "--json"]),
    );

    assert_eq!(report["outcome"]["outcome"], "failed");
    assert_eq!(report["outcome"]["stage"], "deliver");
    assert_eq!(read_cursor(dir.path()).as_deref(), Some("1"));
}

#[test]
fn dispatch_to_telegram_requires_bot_token() {
    let dir = workspace();
    write_catalog(dir.path(), CATALOG);
    write_channel(dir.path(), "@deals");

    herald(dir.path())
        .arg("dispatch")
        .assert()
        .failure()
        .stderr(predicate::str::contains("BOT_TOKEN"));

    assert!(read_cursor(dir.path()).is_none());
}

#[test]
fn dispatch_refuses_memory_backend_outside_dry_run() {
    let dir = workspace();
    write_catalog(dir.path(), CATALOG);
    write_channel(dir.path(), "@deals");

    herald(dir.path())
        .env("COUPON_HERALD__DELIVERY__ADAPTER", "stub")
        .env("COUPON_HERALD__STATE__BACKEND", "memory")
        .args(["dispatch", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not persist"));

    let report = dispatch_json(
        herald(dir.path())
            .env("COUPON_HERALD__STATE__BACKEND", "memory")
            .args(["dispatch", "--dry-run", "--json"]),
    );
    assert_eq!(report["outcome"]["reason"], "dry_run");
}

#[test]
fn preview_renders_requested_position() {
    let dir = workspace();
    write_catalog(dir.path(), CATALOG);

    let output = herald(dir.path())
        .args(["preview", "--position", "1", "--json"])
        .output()
        .expect("run preview");
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["position"], 1);
    assert_eq!(value["title"], "Async Rust in Practice");
    assert_eq!(value["announcement"]["media"], "https://img.example/async.jpg");
    assert_eq!(value["announcement"]["action"]["label"], "Enroll Now");

    let text = value["announcement"]["text"].as_str().expect("text");
    assert!(text.contains("Tokio from the ground up"));
    assert!(text.contains("$9.99"));
    assert!(read_cursor(dir.path()).is_none());

    herald(dir.path())
        .args(["preview", "--position", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn status_reports_pending_items() {
    let dir = workspace();
    write_catalog(dir.path(), CATALOG);
    write_channel(dir.path(), "-1001234567890");
    fs::write(dir.path().join("scraper/last_sent.txt"), "1").expect("write cursor");

    let output = herald(dir.path())
        .args(["status", "--json"])
        .output()
        .expect("run status");
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["destination"], "-1001234567890");
    assert_eq!(value["cursor"], "1");
    assert_eq!(value["catalog_items"], 2);
    assert_eq!(value["pending"], 1);
    assert_eq!(value["next"]["title"], "Async Rust in Practice");
}

#[test]
fn doctor_flags_missing_token() {
    let dir = workspace();
    write_catalog(dir.path(), CATALOG);
    write_channel(dir.path(), "@deals");

    let output = herald(dir.path())
        .args(["doctor", "--json"])
        .output()
        .expect("run doctor");
    assert!(!output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["catalog"]["status"], "ok");
    assert_eq!(value["destination"]["status"], "ok");
    assert_eq!(value["delivery"]["status"], "error");
    assert_eq!(value["overall"], "error");
}
