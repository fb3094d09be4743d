#![cfg(feature = "cli")]

use std::io::Write;
use std::process::{Command, Output, Stdio};

use serde_json::Value;

fn starwire(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_starwire"))
        .args(["--log-level", "error"])
        .args(args)
        .output()
        .expect("starwire should run")
}

fn json_lines(output: &Output) -> Vec<Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout line should be JSON"))
        .collect()
}

#[test]
fn parse_prints_message_fields() {
    let output = starwire(&[
        "--format",
        "json",
        "parse",
        "!!MASTER:ARM1:REQUEST:MAKE_STAR{size=10,glow}##",
    ]);
    assert!(output.status.success());

    let lines = json_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["kind"], "REQUEST");
    assert_eq!(lines[0]["address_chain"], serde_json::json!(["MASTER", "ARM1"]));
    assert_eq!(lines[0]["parameters"]["size"], "10");
    assert_eq!(lines[0]["parameters"]["glow"], "");
}

#[test]
fn parse_malformed_frame_exits_60() {
    let output = starwire(&["parse", "!!ARM1:REQUEST:MAKE_STAR{size=10##"]);
    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("malformed parameter block"));
}

#[test]
fn parse_reads_a_noisy_stream_from_stdin() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_starwire"))
        .args(["--log-level", "error", "--format", "raw", "parse"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("parse should start");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(b"reset\r\n!!ARM1:CONFIRM:MAKE_STAR##garbage!!ARM2:CONFIRM:ADD_STAR##!!ARM3")
        .expect("stdin should accept input");
    let output = child.wait_with_output().expect("parse should finish");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let frames: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        frames,
        vec!["!!ARM1:CONFIRM:MAKE_STAR##", "!!ARM2:CONFIRM:ADD_STAR##"]
    );
}

#[test]
fn build_emits_a_frame_that_parses_back() {
    let output = starwire(&[
        "--format",
        "raw",
        "build",
        "--command",
        "ADD_STAR",
        "--address",
        "CENTERPIECE",
        "--param",
        "star=constellation",
        "--param",
        "glow",
    ]);
    assert!(output.status.success());
    let frame = String::from_utf8_lossy(&output.stdout).trim().to_string();
    assert!(frame.starts_with("!!CENTERPIECE:REQUEST:ADD_STAR{"));

    let parsed = starwire(&["--format", "json", "parse", &frame]);
    let lines = json_lines(&parsed);
    assert_eq!(lines[0]["parameters"]["star"], "constellation");
    assert_eq!(lines[0]["parameters"]["glow"], "");
}

#[test]
fn build_rejects_separator_in_label() {
    let output = starwire(&["build", "--command", "MAKE_STAR", "--address", "ARM:1"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn simulate_default_script_with_hop_insert() {
    let output = starwire(&["--format", "json", "simulate"]);
    assert!(output.status.success());

    let exchanges = json_lines(&output);
    assert_eq!(exchanges.len(), 4);

    let send_star = &exchanges[1];
    assert!(send_star["sent"].as_str().unwrap().contains("SEND_STAR"));
    let received = send_star["received"].as_array().unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(received[1]["command"], "STAR_ARRIVED");
    assert_eq!(received[1]["address_chain"], serde_json::json!(["ARM1", "MASTER"]));
    assert_eq!(received[1]["parameters"]["arm"], "ARM1");

    let add_star = &exchanges[3];
    assert_eq!(
        add_star["received"][0]["address_chain"],
        serde_json::json!(["CENTERPIECE", "MASTER"])
    );
}

#[test]
fn simulate_strict_pair_with_given_frames() {
    let output = starwire(&[
        "--format",
        "raw",
        "simulate",
        "--policy",
        "strict-pair",
        "!!ARM3:REQUEST:MAKE_STAR{size=120}##",
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "!!ARM3:MASTER:CONFIRM:MAKE_STAR##");
}

#[test]
fn simulate_fail_on_drop_reports_unsupported_command() {
    let output = starwire(&[
        "--format",
        "json",
        "simulate",
        "--fail-on-drop",
        "!!ARM1:REQUEST:DANCE##",
    ]);
    assert_eq!(output.status.code(), Some(60));

    let exchanges = json_lines(&output);
    assert_eq!(exchanges[0]["dropped"], 1);
    assert_eq!(exchanges[0]["received"].as_array().unwrap().len(), 0);
}

#[cfg(unix)]
#[test]
fn simulate_over_unix_streams() {
    let output = starwire(&[
        "--format",
        "raw",
        "simulate",
        "--transport",
        "unix",
        "!!ARM2:REQUEST:CANCEL_STAR##",
    ]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "!!ARM2:MASTER:CONFIRM:CANCEL_STAR##"
    );
}

#[test]
fn version_extended_lists_policies() {
    let output = starwire(&["version", "--extended"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("starwire "));
    assert!(stdout.contains("hop-insert, strict-pair"));
}
