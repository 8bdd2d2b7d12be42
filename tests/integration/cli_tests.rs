use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

fn hardlink(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hardlink"))
        .args(args)
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "true")
        .output()
        .expect("failed to run hardlink binary")
}

fn ino(path: &Path) -> u64 {
    fs::metadata(path).unwrap().ino()
}

fn fixture() -> tempfile::TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), [b'X'; 100]).unwrap();
    fs::write(dir.path().join("b"), [b'X'; 100]).unwrap();
    let when = filetime::FileTime::from_unix_time(1_600_000_000, 0);
    filetime::set_file_mtime(dir.path().join("a"), when).unwrap();
    filetime::set_file_mtime(dir.path().join("b"), when).unwrap();
    dir
}

#[test]
fn test_missing_directory_argument_is_usage_error() {
    let output = hardlink(&[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("DIRECTORY"));
}

#[test]
fn test_text_statistics() {
    let dir = fixture();
    let output = hardlink(&[dir.path().to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Mode:     real"));
    assert!(stdout.contains("Files:    2"));
    assert!(stdout.contains("Linked:   1 files"));
    assert!(stdout.contains("Compared: 1 files"));
    assert!(stdout.contains("Saved:    100 B"));
    assert!(stdout.contains("Duration:"));
    assert_eq!(ino(&dir.path().join("a")), ino(&dir.path().join("b")));
}

#[test]
fn test_dry_run_verbose_reports_link() {
    let dir = fixture();
    let output = hardlink(&["-n", "-v", dir.path().to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[DryRun] Linking"), "stderr: {stderr}");
    assert!(String::from_utf8_lossy(&output.stdout).contains("Mode:     dry-run"));
    assert_ne!(ino(&dir.path().join("a")), ino(&dir.path().join("b")));
}

#[test]
fn test_json_statistics() {
    let dir = fixture();
    let output = hardlink(&["--output", "json", "-n", dir.path().to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["mode"], "dry-run");
    assert_eq!(value["linked"], 1);
    assert_eq!(value["saved"], 100);
    assert_eq!(value["exit_code"], 0);
}

#[test]
fn test_quiet_prints_nothing() {
    let dir = fixture();
    let output = hardlink(&["-q", dir.path().to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_invalid_regex_is_fatal() {
    let dir = fixture();
    let output = hardlink(&["-x", "(", dir.path().to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[HL001] Error:"), "stderr: {stderr}");
    assert_ne!(ino(&dir.path().join("a")), ino(&dir.path().join("b")));
}

#[test]
fn test_json_errors() {
    let dir = fixture();
    let output = hardlink(&["--json-errors", "-x", "(", dir.path().to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(value["code"], "HL001");
    assert_eq!(value["exit_code"], 1);
}

#[test]
fn test_missing_root_is_not_fatal() {
    let dir = fixture();
    let missing = dir.path().join("missing");
    let output = hardlink(&[missing.to_str().unwrap(), dir.path().to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Linked:   1 files"));
    assert!(stdout.contains("Errors:   1"));
}

#[test]
fn test_env_dry_run() {
    let dir = fixture();
    let output = Command::new(env!("CARGO_BIN_EXE_hardlink"))
        .arg(dir.path())
        .env("HARDLINK_DRY_RUN", "true")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Mode:     dry-run"));
    assert_ne!(ino(&dir.path().join("a")), ino(&dir.path().join("b")));
}
