use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_gddoc")))
}

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn read_json(path: &Path) -> Value {
    let text = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn names(list: &Value) -> Vec<&str> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect()
}

// -- stdin mode --

#[test]
fn stdin_mode_prints_tree() {
    let dir = TempDir::new().unwrap();
    let assert = cmd()
        .current_dir(dir.path())
        .write_stdin("## Does a thing.\nfunc foo(): pass\n")
        .assert()
        .success();
    let tree: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(tree["class_name"], "not exposed");
    assert_eq!(tree["funcs"][0]["name"], "foo");
    assert_eq!(tree["funcs"][0]["description"], "Does a thing.");
}

#[test]
fn stdin_mode_full_script() {
    let dir = TempDir::new().unwrap();
    let input = std::fs::read_to_string(fixture_path("project/actors/player.gd")).unwrap();
    let assert = cmd()
        .current_dir(dir.path())
        .write_stdin(input)
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
    let tree: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();

    assert_eq!(tree["class_name"], "Player");
    assert_eq!(tree["extends"], "CharacterBody2D");
    assert_eq!(tree["brief_description"], "The player character.");
    assert_eq!(tree["tags"][0]["kind"], "tutorial");
    assert_eq!(tree["tags"][0]["label"], "Movement");

    assert_eq!(names(&tree["signals"]), ["died", "hit"]);
    assert_eq!(tree["signals"][1]["description"], "Emitted on every hit.");
    assert_eq!(names(&tree["signals"][1]["args"]), ["amount", "source"]);

    let members = &tree["enums"][0]["members"];
    assert_eq!(names(members), ["IDLE", "RUN", "JUMP"]);
    assert_eq!(members[1]["value"], 1);
    assert_eq!(members[2]["value"], 4);
    assert_eq!(members[0]["description"], "Standing still.");
    assert_eq!(members[2]["description"], "In the air.");

    assert_eq!(tree["consts"][0]["name"], "MAX_HEALTH");
    assert_eq!(tree["consts"][0]["value"], "100");

    assert_eq!(names(&tree["vars"]), ["speed", "health", "sprite", "_state"]);
    let kinds: Vec<&str> = tree["vars"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, ["export_var", "export_var", "onready_var", "plain_var"]);
    assert_eq!(tree["vars"][0]["description"], "Pixels per second.");

    assert_eq!(names(&tree["funcs"]), ["_physics_process", "take_damage"]);
    let damage = &tree["funcs"][1];
    assert_eq!(damage["description"], "Applies damage.");
    assert_eq!(damage["return_type"], "bool");
    assert_eq!(damage["return_description"], "True when the player died.");
    assert_eq!(damage["args"][0]["description"], "Hit points to remove.");
    assert_eq!(damage["tags"][0]["kind"], "deprecated");

    let slot = &tree["inner_classes"][0];
    assert_eq!(slot["class_name"], "Slot");
    assert_eq!(slot["is_inner_class"], true);
    assert_eq!(slot["extends"], "RefCounted");
    assert_eq!(names(&slot["vars"]), ["item", "count"]);
}

#[test]
fn stdin_mode_reports_diagnostics() {
    let dir = TempDir::new().unwrap();
    cmd()
        .current_dir(dir.path())
        .write_stdin("## @tutorial: not-a-url\nsignal s\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("malformed tag"));
}

#[test]
fn deny_warnings_fails_on_diagnostics() {
    let dir = TempDir::new().unwrap();
    cmd()
        .current_dir(dir.path())
        .arg("--deny-warnings")
        .write_stdin("enum Broken {\n\tA,\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 diagnostic(s) reported"));
}

// -- file mode --

#[test]
fn file_mode_writes_one_json_per_script() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .arg(fixture_path("project"))
        .assert()
        .success();

    let player = read_json(&dir.path().join("player.json"));
    assert_eq!(player["class_name"], "Player");
    let hud = read_json(&dir.path().join("hud.json"));
    assert_eq!(hud["extends"], "CanvasLayer");
    assert_eq!(hud["funcs"][0]["args"][1]["value"], "2.0");
    assert!(!dir.path().join("project.json").exists());
}

#[test]
fn file_mode_stdout_without_output_dir() {
    let assert = cmd()
        .arg(fixture_path("project/hud.gd"))
        .assert()
        .success();
    let dump: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    let scripts = dump["scripts"].as_object().unwrap();
    assert_eq!(scripts.len(), 1);
    assert!(dump.get("project").is_none());
}

#[test]
fn file_mode_glob_pattern() {
    let dir = TempDir::new().unwrap();
    let pattern = format!("{}/*.gd", fixture_path("project"));

    cmd()
        .args(["-o", dir.path().to_str().unwrap()])
        .arg(&pattern)
        .assert()
        .success();

    assert!(dir.path().join("hud.json").exists());
    assert!(!dir.path().join("player.json").exists());
}

#[test]
fn file_mode_no_matches_fails() {
    let dir = TempDir::new().unwrap();
    cmd()
        .arg(format!("{}/*.gd", dir.path().display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no scripts found"));
}

#[test]
fn file_mode_spaces_indentation() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("spaced.gd");
    std::fs::write(
        &script,
        "func a():\n    pass\n\n## Second.\nfunc b():\n    return 1\n",
    )
    .unwrap();

    let assert = cmd()
        .args(["--indent", "4 spaces"])
        .arg(&script)
        .assert()
        .success();
    let dump: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    let tree = &dump["scripts"][script.to_str().unwrap()];
    assert_eq!(names(&tree["funcs"]), ["a", "b"]);
    assert_eq!(tree["funcs"][1]["description"], "Second.");
}

// -- config mode --

#[test]
fn init_writes_template_once() {
    let dir = TempDir::new().unwrap();

    cmd()
        .current_dir(dir.path())
        .arg("--init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created gddoc.yml"));
    let text = std::fs::read_to_string(dir.path().join("gddoc.yml")).unwrap();
    assert!(text.contains("project_scan: true"));

    cmd()
        .current_dir(dir.path())
        .arg("--init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn config_mode_scans_project() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("docs");
    let settings = format!(
        "doc_destination: {}\nproject_scan: true\nproject_scan_options:\n  src_path: {}\n",
        out.display(),
        fixture_path("project")
    );
    std::fs::write(dir.path().join("gddoc.yml"), settings).unwrap();

    cmd().current_dir(dir.path()).assert().success();

    assert_eq!(read_json(&out.join("player.json"))["class_name"], "Player");
    assert!(out.join("hud.json").exists());

    let project = read_json(&out.join("project.json"));
    assert_eq!(project["metadata"]["application/config/name"], "Dodge");
    assert_eq!(project["metadata"]["config_version"], "5");
    let links = project["scene_links"].as_object().unwrap();
    assert_eq!(links.len(), 1);
    let (script, scenes) = links.iter().next().unwrap();
    assert!(script.ends_with("player.gd"));
    assert!(scenes[0].as_str().unwrap().ends_with("main.tscn"));
}

#[test]
fn config_mode_file_list_and_output_override() {
    let dir = TempDir::new().unwrap();
    let settings = format!(
        "doc_destination: ignored\nfilelist_scan: true\nscan_list:\n  - {}\n",
        fixture_path("project/hud.gd")
    );
    let config = dir.path().join("custom.yml");
    std::fs::write(&config, settings).unwrap();
    let out = dir.path().join("out");

    cmd()
        .current_dir(dir.path())
        .args(["-c", config.to_str().unwrap()])
        .args(["-o", out.to_str().unwrap()])
        .assert()
        .success();

    assert!(out.join("hud.json").exists());
    assert!(!dir.path().join("ignored").exists());
    assert!(!out.join("project.json").exists());
}

#[test]
fn config_mode_missing_file() {
    let dir = TempDir::new().unwrap();
    cmd()
        .current_dir(dir.path())
        .args(["-c", "nope.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("doesn't exist"));
}

#[test]
fn config_mode_invalid_settings() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("gddoc.yml"), "project_scan: false\n").unwrap();
    cmd()
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to scan"));
}
