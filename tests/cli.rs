//! End-to-end tests for the `dt` binary against a throwaway database.

use assert_cmd::Command;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Env {
    dir: TempDir,
    db: PathBuf,
}

impl Env {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("data").join("daytrace.db");
        Self { dir, db }
    }

    fn home(&self) -> &Path {
        self.dir.path()
    }

    fn dt(&self) -> Command {
        self.dt_as("alice")
    }

    fn dt_as(&self, user: &str) -> Command {
        let mut cmd = Command::cargo_bin("dt").unwrap();
        cmd.env("HOME", self.home())
            .env_remove("DT_TEST_DB")
            .env_remove("DAYTRACE_DB")
            .env_remove("DT_CATALOG")
            .env_remove("RUST_LOG")
            .arg("--db")
            .arg(&self.db)
            .arg("--user")
            .arg(user)
            .arg("--json");
        cmd
    }

    fn init(&self) {
        self.dt().arg("init").assert().success();
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.dt().args(args).assert().success().get_output().stdout.clone();
        serde_json::from_slice(&output).unwrap()
    }

    fn error(&self, args: &[&str], exit_code: i32) -> Value {
        let output = self
            .dt()
            .args(args)
            .assert()
            .code(exit_code)
            .get_output()
            .stderr
            .clone();
        let err: Value = serde_json::from_slice(&output).unwrap();
        err["error"].clone()
    }
}

#[test]
fn commands_require_init() {
    let env = Env::new();
    let err = env.error(&["today"], 2);
    assert_eq!(err["code"], "NOT_INITIALIZED");

    env.init();
    let err = env.error(&["init"], 2);
    assert_eq!(err["code"], "ALREADY_INITIALIZED");
    env.dt().args(["init", "--force"]).assert().success();
}

#[test]
fn today_is_stable_and_refresh_is_bounded() {
    let env = Env::new();
    env.init();

    let first = env.json(&["today", "--date", "2024-03-01"]);
    let again = env.json(&["today", "--date", "2024-03-01"]);
    assert_eq!(first["set_id"], again["set_id"]);
    assert_eq!(first["tasks"].as_array().unwrap().len(), 3);
    assert_eq!(first["tasks"], again["tasks"]);

    for expected in 1..=2 {
        let outcome = env.json(&["refresh", "1", "--date", "2024-03-01"]);
        assert_eq!(outcome["refresh_count"], expected);
    }
    let err = env.error(&["refresh", "1", "--date", "2024-03-01"], 5);
    assert_eq!(err["code"], "REFRESH_LIMIT_REACHED");

    let today = env.json(&["today", "--date", "2024-03-01"]);
    assert_eq!(today["refresh_count"], 2);
    assert!(today["tasks"][0]["replaced_from_task_id"].is_string());
}

#[test]
fn completing_with_a_plan_records_traces() {
    let env = Env::new();
    env.init();
    env.json(&["year", "plan", "create", "2024", "steady"]);

    let today = env.json(&["today", "--date", "2024-03-01"]);
    let task_id = today["tasks"][0]["task_id"].as_str().unwrap().to_string();

    let done = env.json(&["task", "complete", &task_id, "--at", "2024-03-01T20:00:00Z"]);
    assert_eq!(done["status"], "done");
    assert!(!done["trace_events"].as_array().unwrap().is_empty());

    let err = env.error(&["task", "complete", &task_id], 4);
    assert_eq!(err["code"], "INVALID_TASK_STATUS");

    let summary = env.json(&["year", "summary", "2024"]);
    assert!(summary["plan"].is_object());
    assert!(!summary["trace_counts"].as_array().unwrap().is_empty());
    assert!(summary["soft_identity"]["title"].is_string());

    let month = env.json(&["year", "month", "2024", "3"]);
    assert_eq!(month[0]["id"], task_id.as_str());
}

#[test]
fn other_users_cannot_touch_tasks() {
    let env = Env::new();
    env.init();
    let today = env.json(&["today", "--date", "2024-03-01"]);
    let task_id = today["tasks"][0]["task_id"].as_str().unwrap();

    let output = env
        .dt_as("mallory")
        .args(["task", "skip", task_id])
        .assert()
        .code(3)
        .get_output()
        .stderr
        .clone();
    let err: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(err["error"]["code"], "TASK_NOT_FOUND");
}

#[test]
fn night_session_flow_with_note() {
    let env = Env::new();
    env.init();

    let programs = env.json(&["night", "programs"]);
    assert!(programs.as_array().unwrap().len() >= 2);

    let started = env.json(&["night", "start", "np2", "--date", "2024-04-02"]);
    assert_eq!(started["created"], true);
    let session_id = started["session"]["id"].as_str().unwrap().to_string();

    let again = env.json(&["night", "start", "np1", "--date", "2024-04-02"]);
    assert_eq!(again["created"], false);
    assert_eq!(again["session"]["id"], session_id.as_str());

    let done = env.json(&["night", "finish", &session_id, "-a", "q1=tea", "-a", "q2=my dog"]);
    assert_eq!(done["status"], "finished");

    let err = env.error(&["night", "finish", &session_id], 4);
    assert_eq!(err["code"], "INVALID_SESSION_STATUS");

    let note = env.json(&["note", "add", "night", &session_id, "slept well", "--mood", "calm"]);
    let note_id = note["id"].as_str().unwrap().to_string();

    let record = env.json(&["year", "record", "night", &session_id]);
    assert_eq!(record["note"]["content"], "slept well");
    assert_eq!(record["answers"].as_array().unwrap().len(), 2);

    env.json(&["note", "delete", &note_id]);
    let err = env.error(&["note", "delete", &note_id], 3);
    assert_eq!(err["code"], "NOTE_NOT_FOUND");
}

#[test]
fn review_and_poster() {
    let env = Env::new();
    env.init();

    let err = env.error(&["year", "review", "2024"], 3);
    assert_eq!(err["code"], "PLAN_NOT_FOUND");

    env.json(&["year", "plan", "create", "2024", "self_care"]);
    let review = env.json(&["year", "review", "2024"]);
    let review_id = review["id"].as_str().unwrap().to_string();
    assert_eq!(review["content"]["highlights"].as_array().unwrap().len(), 0);

    let first = env.json(&["year", "poster", &review_id, "sunrise"]);
    let second = env.json(&["year", "poster", &review_id, "forest"]);
    assert_eq!(first["poster_url"], second["poster_url"]);
    let third = env.json(&["year", "poster", &review_id, "warm night"]);
    assert_eq!(first["poster_url"], third["poster_url"]);
    assert_eq!(
        first["poster_url"],
        format!("/posters/{review_id}-sunrise.png").as_str()
    );
}

#[test]
fn invalid_theme_and_wipe() {
    let env = Env::new();
    env.init();

    let err = env.error(&["year", "plan", "create", "2024", "hustle"], 4);
    assert_eq!(err["code"], "INVALID_THEME");

    env.json(&["year", "plan", "create", "2024", "steady"]);
    env.json(&["today", "--date", "2024-03-01"]);

    let err = env.error(&["wipe"], 4);
    assert_eq!(err["code"], "INVALID_ARGUMENT");

    let stats = env.json(&["wipe", "--yes"]);
    assert_eq!(stats["task_sets"], 1);
    assert_eq!(stats["year_plans"], 1);

    let plan = env.json(&["year", "plan", "show", "2024"]);
    assert!(plan["plan"].is_null());
}

#[test]
fn plan_directions_can_be_rearranged() {
    let env = Env::new();
    env.init();

    let err = env.error(&["year", "plan", "directions", "2024"], 3);
    assert_eq!(err["code"], "PLAN_NOT_FOUND");

    env.json(&["year", "plan", "create", "2024", "steady"]);
    let shown = env.json(&["year", "plan", "show", "2024"]);
    assert_eq!(shown["directions"].as_array().unwrap().len(), 5);
    assert_eq!(shown["directions"][0]["direction_id"], "emotion");

    let updated = env.json(&[
        "year", "plan", "directions", "2024", "--disable", "body", "--order", "mind=0",
    ]);
    assert_eq!(updated[0]["direction_id"], "mind");
    let body = updated
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["direction_id"] == "body")
        .unwrap();
    assert_eq!(body["is_enabled"], false);

    let shown = env.json(&["year", "plan", "show", "2024"]);
    assert_eq!(shown["directions"], updated);

    let err = env.error(&["year", "plan", "directions", "2024", "--enable", "wealth"], 4);
    assert_eq!(err["code"], "INVALID_ARGUMENT");
    let err = env.error(&["year", "plan", "directions", "2024", "--order", "mind"], 4);
    assert_eq!(err["code"], "INVALID_ARGUMENT");
}
