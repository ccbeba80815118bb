//! Integration tests for the binary's exit contract.
//!
//! Every case here fails or finishes before the root check, so none of them
//! touch the host.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::{Command, Output};

fn router() -> Command {
    let mut cmd = Command::cargo_bin("lxc-subnet-router").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn assert_single_error_line(output: &Output) {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<&str> = stderr.lines().collect();
    assert_eq!(lines.len(), 1, "expected one stderr line, got {:?}", lines);
    assert!(lines[0].starts_with("Error: "), "unexpected stderr: {}", lines[0]);
}

#[test]
fn test_help_exits_zero() {
    router()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--container").and(predicate::str::contains("--subnet")))
        .stderr(predicate::str::is_empty());

    router()
        .args(["-c", "abc", "--bogus", "-h"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_invalid_container_exits_one() {
    let output = router().args(["-c", "abc"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_single_error_line(&output);
    assert!(output.stdout.is_empty());
}

#[test]
fn test_unknown_option_exits_one() {
    for args in [&["--bogus"][..], &["--"][..], &["-c", "102", "--"][..]] {
        let output = router().args(args).output().unwrap();
        assert_eq!(output.status.code(), Some(1), "args {:?}", args);
        assert_single_error_line(&output);
        assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown option"));
    }
}

#[test]
fn test_missing_value_exits_one() {
    let output = router().args(["-s"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_single_error_line(&output);
}

#[cfg(unix)]
#[test]
fn test_non_utf8_argument_exits_one() {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;

    let output = router()
        .arg("-c")
        .arg(OsString::from_vec(vec![0xff]))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_single_error_line(&output);
}
