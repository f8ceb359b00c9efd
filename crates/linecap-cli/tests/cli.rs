use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("linecap"))
}

fn new_frame(width: u16, height: u16, format: u8) -> Vec<u8> {
    let mut bytes = vec![0x00, 0x01];
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.push(format);
    bytes
}

/// Two 2x2 frames: the first fully drawn, the second with one line.
fn sample_stream() -> Vec<u8> {
    let mut bytes = new_frame(2, 2, 0);
    bytes.extend_from_slice(&[0xF8, 0x1F, 0x07, 0xE0, 0x00, 0x02]);
    bytes.extend_from_slice(&[0x08, 0x1F, 0xFF, 0xFF, 0x00, 0x02]);
    bytes.extend_from_slice(&new_frame(2, 2, 0x09));
    bytes.extend_from_slice(&[0xF8, 0x1F, 0x00, 0x02]);
    bytes
}

fn write_capture(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, sample_stream()).expect("write capture");
    path
}

fn parse_lines(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8(stdout.to_vec())
        .expect("utf8 stdout")
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid json line"))
        .collect()
}

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("decode").and(contains("capture")).and(contains("ports")));
}

#[test]
fn decode_stdout_outputs_json_lines() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path(), "capture.bin");

    let assert = cmd()
        .arg("decode")
        .arg(input)
        .arg("--stdout")
        .assert()
        .success();
    let events = parse_lines(&assert.get_output().stdout);

    let kinds: Vec<_> = events
        .iter()
        .map(|event| event["event"].as_str().expect("event tag").to_string())
        .collect();
    assert_eq!(
        kinds,
        vec![
            "frame_started",
            "line_completed",
            "line_completed",
            "frame_started",
            "line_completed"
        ]
    );
    assert_eq!(events[0]["width"], 2);
    assert_eq!(events[0]["format"], "rgb565");
    assert_eq!(events[2]["line"], 1);
    assert_eq!(events[3]["frame"], 2);
    assert!(events[1].get("pixels").is_none());
}

#[test]
fn decode_with_pixels_includes_rgb() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path(), "capture.bin");

    let assert = cmd()
        .arg("decode")
        .arg(input)
        .arg("--stdout")
        .arg("--with-pixels")
        .assert()
        .success();
    let events = parse_lines(&assert.get_output().stdout);
    assert_eq!(events[1]["pixels"][0], serde_json::json!([248, 0, 248]));
    assert_eq!(events[1]["pixels"][1], serde_json::json!([0, 252, 0]));
}

#[test]
fn decode_reads_stdin() {
    let assert = cmd()
        .arg("decode")
        .arg("-")
        .arg("--stdout")
        .write_stdin(sample_stream())
        .assert()
        .success();
    assert_eq!(parse_lines(&assert.get_output().stdout).len(), 5);
}

#[test]
fn decode_writes_frames_and_event_file() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path(), "capture.bin");
    let frames = temp.path().join("frames");
    let events = temp.path().join("out").join("events.jsonl");

    cmd()
        .arg("decode")
        .arg(&input)
        .arg("--frames-dir")
        .arg(&frames)
        .arg("-o")
        .arg(&events)
        .assert()
        .success()
        .stderr(contains("OK: 2 frame(s) written"));

    let first = fs::read(frames.join("frame-00001.ppm")).expect("frame 1");
    let header = b"P6\n2 2\n255\n";
    assert_eq!(&first[..header.len()], header);
    assert_eq!(
        &first[header.len()..],
        &[248, 0, 248, 0, 252, 0, 8, 0, 248, 248, 252, 248]
    );
    assert!(frames.join("frame-00002.ppm").is_file());

    let logged = fs::read(&events).expect("event log");
    assert_eq!(parse_lines(&logged).len(), 5);
}

#[test]
fn summary_reports_counts() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path(), "capture.bin");

    cmd()
        .arg("decode")
        .arg(input)
        .arg("--summary")
        .assert()
        .success()
        .stderr(
            contains("\"frames_started\": 2")
                .and(contains("\"lines_completed\": 3"))
                .and(contains("\"unknown_pixel_formats\": 1")),
        );
}

#[test]
fn quiet_suppresses_ok_message() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path(), "capture.bin");

    cmd()
        .arg("decode")
        .arg(input)
        .arg("--quiet")
        .assert()
        .success()
        .stderr(contains("OK:").not());
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.bin");

    cmd()
        .arg("decode")
        .arg(missing)
        .assert()
        .failure()
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn glob_with_multiple_matches_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    write_capture(temp.path(), "a.bin");
    write_capture(temp.path(), "b.bin");

    cmd()
        .arg("decode")
        .arg(temp.path().join("*.bin"))
        .assert()
        .failure()
        .stderr(contains("multiple files match pattern"));
}

#[test]
fn glob_with_single_match_is_decoded() {
    let temp = TempDir::new().expect("tempdir");
    write_capture(temp.path(), "only.bin");

    let assert = cmd()
        .arg("decode")
        .arg(temp.path().join("*.bin"))
        .arg("--stdout")
        .assert()
        .success();
    assert_eq!(parse_lines(&assert.get_output().stdout).len(), 5);
}

#[test]
fn stdout_and_events_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path(), "capture.bin");

    cmd()
        .arg("decode")
        .arg(input)
        .arg("--stdout")
        .arg("-o")
        .arg(temp.path().join("events.jsonl"))
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn capture_rejects_unsupported_baud_rate() {
    cmd()
        .arg("capture")
        .arg("--port")
        .arg("/dev/null")
        .arg("--baud")
        .arg("12345")
        .assert()
        .failure()
        .stderr(contains("unsupported baud rate"));
}

#[test]
fn capture_reports_unopenable_port() {
    let temp = TempDir::new().expect("tempdir");
    let port = temp.path().join("no-such-tty");

    cmd()
        .arg("capture")
        .arg("--port")
        .arg(port)
        .assert()
        .failure()
        .stderr(contains("failed to open serial port").and(contains("hint:")));
}
