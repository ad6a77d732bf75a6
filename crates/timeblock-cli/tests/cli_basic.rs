//! Basic CLI smoke tests.
//!
//! Tests invoke CLI commands via cargo run and verify usage output;
//! nothing here touches the calendar, keyring, or TaskWarrior.

use std::process::Command;

/// Run a CLI command and return output.
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "timeblock-cli", "--"])
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_help_lists_subcommands() {
    let (stdout, _, code) = run_cli(&["--help"]);
    assert_eq!(code, 0);
    for subcommand in ["plan", "apply", "config", "auth", "completions"] {
        assert!(
            stdout.contains(subcommand),
            "help output missing '{subcommand}'"
        );
    }
}

#[test]
fn test_plan_help() {
    let (stdout, _, code) = run_cli(&["plan", "--help"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("--strict-capacity"));
    assert!(stdout.contains("--json"));
}

#[test]
fn test_config_help() {
    let (stdout, _, code) = run_cli(&["config", "--help"]);
    assert_eq!(code, 0);
    for action in ["get", "set", "list", "reset", "path"] {
        assert!(stdout.contains(action), "config help missing '{action}'");
    }
}

#[test]
fn test_auth_help() {
    let (stdout, _, code) = run_cli(&["auth", "--help"]);
    assert_eq!(code, 0);
    for action in ["login", "logout", "status"] {
        assert!(stdout.contains(action), "auth help missing '{action}'");
    }
}

#[test]
fn test_completions_generate() {
    let (stdout, _, code) = run_cli(&["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("timeblock-cli"));
}

#[test]
fn test_unknown_subcommand_fails() {
    let (_, _, code) = run_cli(&["frobnicate"]);
    assert_ne!(code, 0);
}
