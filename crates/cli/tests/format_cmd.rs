//! CLI tests for the `ihex format` subcommand.

use std::fs;
use std::process::Command;

use assert_cmd::cargo;

fn ihex_cmd() -> Command {
    Command::new(cargo::cargo_bin!("ihex"))
}

fn write_temp_hex(content: &str) -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("test.hex");
    fs::write(&path, content).expect("write temp hex");
    (dir, path.to_string_lossy().to_string())
}

/// 64 bytes in two 32-byte lines, then end of file.
const WIDE_DOCUMENT: &str = concat!(
    ":200000000C94AE040C94D6040C94D6040C94D6040C94D6040C94D6040C94D6040C94D60438\n",
    ":200020000C94D6040C94D6040C9474320C94FB320C94D6040C94D6040C94D6040C94D604D1\n",
    ":00000001FF\n",
);

#[test]
fn format_help_shows_width_flag() {
    let output = ihex_cmd()
        .args(["format", "--help"])
        .output()
        .expect("run format help");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("--width"),
        "missing --width in format help output: {stdout}"
    );
}

#[test]
fn format_check_json_accepts_matching_width() {
    let (_dir, path) = write_temp_hex(WIDE_DOCUMENT);

    let output = ihex_cmd()
        .args(["format", &path, "--width", "32", "--check", "--output", "json"])
        .output()
        .expect("run format --check json");

    assert!(
        output.status.success(),
        "expected check to pass, stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid format json");
    assert_eq!(json["mode"], "check");
    assert_eq!(json["file"], path);
    assert_eq!(json["status"], "already formatted");
}

#[test]
fn format_check_json_reports_not_formatted_at_default_width() {
    let (_dir, path) = write_temp_hex(WIDE_DOCUMENT);

    let output = ihex_cmd()
        .args(["format", &path, "--check", "--output", "json"])
        .output()
        .expect("run format --check json");

    assert_eq!(
        output.status.code(),
        Some(1),
        "expected check mode to exit 1 for non-formatted input, stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid format json");
    assert_eq!(json["status"], "not formatted");
}

#[test]
fn format_write_rechunks_file_in_place() {
    let (_dir, path) = write_temp_hex(WIDE_DOCUMENT);

    let output = ihex_cmd()
        .args(["format", &path, "--width", "16", "--write", "--output", "json"])
        .output()
        .expect("run format --write json");

    assert!(
        output.status.success(),
        "expected write mode to succeed, stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid format json");
    assert_eq!(json["mode"], "write");
    assert_eq!(json["status"], "formatted");

    let rewritten = fs::read_to_string(&path).expect("read rewritten file");
    let lines: Vec<_> = rewritten.lines().collect();
    assert_eq!(lines.len(), 5, "got:\n{rewritten}");
    assert!(lines[..4].iter().all(|l| l.starts_with(":10")));
    assert!(lines[3].starts_with(":10003000"));
    assert_eq!(lines[4], ":00000001FF");

    // Writing again is a no-op.
    let again = ihex_cmd()
        .args(["format", &path, "--width", "16", "--check", "--output", "json"])
        .output()
        .expect("run format --check json");
    assert!(again.status.success());
}

#[test]
fn format_stdout_prints_rechunked_document() {
    let (_dir, path) = write_temp_hex(WIDE_DOCUMENT);

    let output = ihex_cmd()
        .args(["format", &path, "--width", "64"])
        .output()
        .expect("run format to stdout");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with(":40000000"));
    assert_eq!(lines[1], ":00000001FF");
}

#[test]
fn format_refuses_invalid_document() {
    let (_dir, path) = write_temp_hex(":01000000CB35\n:00000001FF\n");

    let output = ihex_cmd()
        .args(["format", &path, "--write", "--output", "json"])
        .output()
        .expect("run format on invalid input");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("diagnostics json");
    assert_eq!(json[0]["id"], "IHEX1201");
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        ":01000000CB35\n:00000001FF\n",
        "invalid file must be left untouched"
    );
}
