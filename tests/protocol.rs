//! Integration tests for the battle-tracker binary.
//!
//! Tests the full protocol session flow by spawning the tracker process,
//! sending commands via stdin, and verifying stdout responses.

use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;
use std::process::{Command, Stdio};

/// Sends a sequence of commands to the tracker and collects stdout lines.
fn run_tracker(commands: &[String]) -> Vec<String> {
    let exe = env!("CARGO_BIN_EXE_battle-tracker");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to start battle-tracker");

    let mut stdin = child.stdin.take().unwrap();
    let stdout = child.stdout.take().unwrap();
    let reader = std::io::BufReader::new(stdout);

    for cmd in commands {
        writeln!(stdin, "{}", cmd).unwrap();
    }
    stdin.flush().unwrap();
    drop(stdin);

    let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
    let status = child.wait().expect("failed to wait on child");
    assert!(status.success());
    lines
}

fn run(commands: &[&str]) -> Vec<String> {
    run_tracker(&commands.iter().map(|c| c.to_string()).collect::<Vec<_>>())
}

const BLUE_ARMY: &str = r#"{
    "id": "echo", "name": "Echo Base", "player": "Ana", "faction": "rebels",
    "units": [
        {"id": "luke", "name": "Luke Skywalker", "unit_type": "command", "wounds": 6, "abilities": ["deflect"]},
        {"id": "rt1", "name": "Rebel Troopers", "unit_type": "corps", "wounds": 4},
        {"id": "rt2", "name": "Rebel Troopers", "unit_type": "corps", "wounds": 4}
    ]
}"#;

const RED_ARMY: &str = r#"{
    "id": "blizzard", "name": "Blizzard Force", "player": "Ben", "faction": "empire",
    "command_cards": ["ambush", "push", "assault", "standing-orders"],
    "units": [
        {"id": "st1", "name": "Stormtroopers", "unit_type": "corps", "wounds": 4},
        {"id": "st2", "name": "Stormtroopers", "unit_type": "corps", "wounds": 4}
    ]
}"#;

const CATALOG: &str = r#"{
    "abilities": [
        {"id": "deflect", "name": "Deflect", "reminders": [
            {"text": "While defending, spend a dodge to gain surge.", "reminder_type": "defense"}
        ]}
    ]
}"#;

/// Writes both armies and the catalog into `dir`.
fn write_fixtures(dir: &Path) {
    fs::write(dir.join("blue.json"), BLUE_ARMY).unwrap();
    fs::write(dir.join("red.json"), RED_ARMY).unwrap();
    fs::write(dir.join("catalog.json"), CATALOG).unwrap();
}

fn newbattle(dir: &Path) -> String {
    format!(
        "newbattle hoth {} {} Battle of Hoth",
        dir.join("blue.json").display(),
        dir.join("red.json").display()
    )
}

#[test]
fn hello_handshake() {
    let lines = run(&["hello", "quit"]);
    assert_eq!(lines[0], "id name battle-tracker");
    assert_eq!(lines.last().map(String::as_str), Some("hellook"));
    let proto = lines.iter().position(|l| l == "protocol_version 1").unwrap();
    assert_eq!(proto, lines.len() - 2);
    for opt in lines.iter().filter(|l| l.starts_with("option ")) {
        assert!(opt.contains(" type "), "option line missing type: {}", opt);
    }
}

#[test]
fn isready_response() {
    assert_eq!(run(&["isready", "quit"]), vec!["readyok"]);
}

#[test]
fn unknown_and_malformed_commands_are_ignored() {
    let lines = run(&["foobar", "select", "order purple u1", "isready", "quit"]);
    assert_eq!(lines, vec!["readyok"]);
}

#[test]
fn commands_after_quit_are_not_processed() {
    assert!(run(&["quit", "isready"]).is_empty());
}

#[test]
fn full_round_session() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());

    let commands = vec![
        format!("catalog {}", dir.path().join("catalog.json").display()),
        newbattle(dir.path()),
        "cards red".to_string(),
        "select blue son-of-skywalker".to_string(),
        "select red assault".to_string(),
        "priority".to_string(),
        "order blue luke".to_string(),
        "order blue rt1".to_string(),
        "order blue rt2".to_string(),
        "advance".to_string(),
        "activate red st1".to_string(),
        "activate blue luke".to_string(),
        "pass".to_string(),
        "activate red st1".to_string(),
        "update red st1 current_wounds=1 suppression=4".to_string(),
        "pass".to_string(),
        "activate blue rt1".to_string(),
        "activate blue rt2".to_string(),
        "pass".to_string(),
        "activate red st2".to_string(),
        "advance".to_string(),
        "rally red st1".to_string(),
        "recover red st1".to_string(),
        "advance".to_string(),
        "quit".to_string(),
    ];
    let lines = run_tracker(&commands);
    let expected = [
        "catalog abilities 1 upgrades 0 cards 0",
        "status battle hoth round 1 phase command active blue complete false winner -",
        "side blue card - orders 0 unactivated 3 player Ana",
        "side red card - orders 0 unactivated 2 player Ben",
        "card ambush pips 1 usable name Ambush",
        "card push pips 2 usable name Push",
        "card assault pips 3 usable name Assault",
        "card standing-orders pips 4 usable name Standing Orders",
        "selected blue son-of-skywalker pips 2 orders 2",
        "selected red assault pips 3 orders 3",
        "priority blue lower 2 3",
        "order blue luke on",
        "order blue rt1 on",
        "error precondition failed: blue may only issue 2 order(s) this round",
        "phase activation round 1 active blue",
        "error precondition failed: red is not the active player",
        "activated blue luke",
        "active red",
        "activated red st1",
        "unit red st1 wounds 1/4 suppression 4 suppressed order false activated true defeated false tokens - name Stormtroopers",
        "active blue",
        "activated blue rt1",
        "activated blue rt2",
        "active red",
        "activated red st2",
        "phase end round 1 active red",
        "suppression red st1 3",
        "unit red st1 wounds 1/4 suppression 0 steady order false activated true defeated false tokens - name Stormtroopers",
        "phase command round 2 active blue",
    ];
    assert_eq!(lines, expected);
}

#[test]
fn tied_priority_stands_until_a_card_changes() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());

    let commands = vec![
        newbattle(dir.path()),
        "select blue push".to_string(),
        "select red push".to_string(),
        "priority".to_string(),
        "priority".to_string(),
        "priority".to_string(),
        "select red ambush".to_string(),
        "priority".to_string(),
        "quit".to_string(),
    ];
    let lines = run_tracker(&commands);
    let first = &lines[5];
    assert!(first.starts_with("priority ") && first.ends_with(" tie 2"), "unexpected: {first}");
    let winner = first.split(' ').nth(1).unwrap();
    let rejected = format!("error precondition failed: priority already resolved this round, {winner} won");
    assert_eq!(lines[6], rejected);
    assert_eq!(lines[7], rejected);
    assert_eq!(lines[8], "selected red ambush pips 1 orders 1");
    assert_eq!(lines[9], "priority red lower 1 2");
}

#[test]
fn reminders_follow_phase_and_selection() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());

    let commands = vec![
        format!("catalog {}", dir.path().join("catalog.json").display()),
        newbattle(dir.path()),
        "select red standing-orders".to_string(),
        "reminders".to_string(),
        "select blue ambush".to_string(),
        "priority".to_string(),
        "advance".to_string(),
        "reminders luke".to_string(),
        "reminders rt1".to_string(),
        "quit".to_string(),
    ];
    let lines = run_tracker(&commands);
    let reminders: Vec<&String> = lines.iter().filter(|l| l.starts_with("reminder ")).collect();
    assert_eq!(
        reminders,
        vec![
            "reminder general - red command card Standing Orders: Issue an order to 1 unit.",
            "reminder defense luke ability Deflect: While defending, spend a dodge to gain surge.",
            "reminder general - blue command card Ambush: Issue an order to 1 unit.",
            "reminder general - red command card Standing Orders: Issue an order to 1 unit.",
            "reminder general - blue command card Ambush: Issue an order to 1 unit.",
            "reminder general - red command card Standing Orders: Issue an order to 1 unit.",
        ]
    );
}

#[test]
fn ended_battle_rejects_changes_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());
    let store = dir.path().join("battles");

    let commands = vec![
        format!("setoption name StoreDir value {}", store.display()),
        newbattle(dir.path()),
        "end blue".to_string(),
        "advance".to_string(),
        "update red st1 current_wounds=0".to_string(),
        "quit".to_string(),
    ];
    let lines = run_tracker(&commands);
    assert!(lines.contains(&"ended winner blue".to_string()));
    assert_eq!(lines.iter().filter(|l| l.contains("battle is complete")).count(), 2);

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(store.join("hoth.json")).unwrap()).unwrap();
    assert_eq!(saved["is_complete"], true);
    assert_eq!(saved["winner"], "blue");

    let reload = vec![
        format!("setoption name StoreDir value {}", store.display()),
        "load hoth".to_string(),
        newbattle(dir.path()),
        "quit".to_string(),
    ];
    let lines = run_tracker(&reload);
    assert_eq!(
        lines[0],
        "status battle hoth round 1 phase command active blue complete true winner blue"
    );
    assert_eq!(lines.last().unwrap(), "error battle 'hoth' already exists");
}

#[test]
fn missing_army_file_is_reported() {
    let lines = run(&["newbattle b1 /nonexistent/blue.json /nonexistent/red.json", "status", "quit"]);
    assert!(lines[0].starts_with("error failed to load army /nonexistent/blue.json"));
    assert_eq!(lines[1], "error no battle loaded");
}

#[test]
fn shield_source_option() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("blue.json"),
        r#"{"id":"b","name":"Blue","player":"A","faction":"republic","units":[
            {"id":"tank","name":"Tank","unit_type":"heavy","wounds":8,"shielded":2}]}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("red.json"),
        r#"{"id":"r","name":"Red","player":"B","faction":"separatists","units":[
            {"id":"droid","name":"Droid","unit_type":"corps","wounds":6}]}"#,
    )
    .unwrap();

    let commands = vec![
        "setoption name ShieldSource value keyword".to_string(),
        format!(
            "newbattle s1 {} {}",
            dir.path().join("blue.json").display(),
            dir.path().join("red.json").display()
        ),
        "update blue tank shield=0 aim=2".to_string(),
        "select blue push".to_string(),
        "select red push".to_string(),
        "advance".to_string(),
        "activate blue tank".to_string(),
        "activate red droid".to_string(),
        "pass".to_string(),
        "activate red droid".to_string(),
        "advance".to_string(),
        "advance".to_string(),
        "units blue".to_string(),
        "quit".to_string(),
    ];
    let lines = run_tracker(&commands);
    assert!(lines.contains(&"unit blue tank wounds 8/8 suppression 0 steady order false activated false defeated false tokens aim=2 name Tank".to_string()));
    assert_eq!(
        lines.last().unwrap(),
        "unit blue tank wounds 8/8 suppression 0 steady order false activated false defeated false tokens shield=2 name Tank"
    );
}
