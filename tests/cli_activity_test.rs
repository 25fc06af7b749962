//! Integration tests for activity logging and staleness.

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_activity_add_marks_contacted() {
    let env = TestEnv::admin();
    let id = env.add_professor("Alice Chen", "Acme School", &[]);

    let stale = env.json(&["professor", "list", "--stale"]);
    assert_eq!(stale["count"], 1);

    let log = env.json(&["activity", "add", &id, "  Intro call  "]);
    assert_eq!(log["professor_id"], id.as_str());
    assert_eq!(log["entry"], "Intro call");
    assert_eq!(log["created_by"], "Team");
    assert!(log["last_contacted"].is_string());

    let stale = env.json(&["professor", "list", "--stale"]);
    assert_eq!(stale["count"], 0);

    let show = env.json(&["professor", "show", &id]);
    assert_eq!(show["stale"], false);
    assert_eq!(show["activity_logs"][0]["entry"], "Intro call");
}

#[test]
fn test_activity_created_by_defaults_to_liaison() {
    let env = TestEnv::admin();
    let id = env.add_professor("Bob", "Beta", &["--liaison", "Vanessa"]);

    let log = env.json(&["activity", "add", &id, "Coffee"]);
    assert_eq!(log["created_by"], "Vanessa");

    let log = env.json(&["activity", "add", &id, "Email", "--by", "Martin"]);
    assert_eq!(log["created_by"], "Martin");
}

#[test]
fn test_activity_list_newest_first() {
    let env = TestEnv::admin();
    let id = env.add_professor("Bob", "Beta", &[]);

    env.json(&["activity", "add", &id, "Older", "--date", "2026-01-05"]);
    env.json(&["activity", "add", &id, "Newest", "--date", "2026-03-01"]);
    env.json(&["activity", "add", &id, "Middle", "--date", "2026-02-10"]);

    let list = env.json(&["activity", "list", &id]);
    assert_eq!(list["count"], 3);
    let entries: Vec<&str> = list["activity_logs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["entry"].as_str().unwrap())
        .collect();
    assert_eq!(entries, vec!["Newest", "Middle", "Older"]);
    assert_eq!(list["activity_logs"][0]["date"], "2026-03-01");
}

#[test]
fn test_activity_add_rejects_empty_entry() {
    let env = TestEnv::admin();
    let id = env.add_professor("Bob", "Beta", &[]);
    env.pt()
        .args(["activity", "add", &id, "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("entry is required"));

    let list = env.json(&["activity", "list", &id]);
    assert_eq!(list["count"], 0);
}

#[test]
fn test_activity_add_unknown_professor() {
    let env = TestEnv::admin();
    env.pt()
        .args(["activity", "add", "missing", "Call"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Professor not found"));
}

#[test]
fn test_activity_add_bad_date() {
    let env = TestEnv::admin();
    let id = env.add_professor("Bob", "Beta", &[]);
    env.pt()
        .args(["activity", "add", &id, "Call", "--date", "03/01/2026"])
        .assert()
        .failure();
}

#[test]
fn test_activity_human_output() {
    let env = TestEnv::admin();
    let id = env.add_professor("Bob", "Beta", &[]);
    env.pt()
        .args(["-H", "activity", "add", &id, "Workshop pitch", "--date", "2026-04-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("on 2026-04-01: Workshop pitch"));

    env.pt()
        .args(["-H", "professor", "show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Activity (1):"))
        .stdout(predicate::str::contains("2026-04-01 Team - Workshop pitch"));
}

#[test]
fn test_activity_requires_admin() {
    let env = TestEnv::admin();
    let id = env.add_professor("Bob", "Beta", &[]);
    env.pt().arg("logout").assert().success();
    env.pt()
        .args(["activity", "add", &id, "Call"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}
