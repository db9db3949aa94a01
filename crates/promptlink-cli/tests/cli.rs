//! CLI conformance tests: run the built binary and check what it prints.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

const PAGE: &str = "https://example.github.io/promptlink/";

/// Run promptlink with args and capture (stdout, stderr, exit code).
fn run(args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_promptlink"))
        .args(args)
        .env("NO_COLOR", "1")
        .env("PROMPTLINK_LOG", "warn")
        .env("PROMPTLINK_CONFIG", "/nonexistent/promptlink/config.toml")
        .env_remove("PROMPTLINK_PAGE_URL")
        .env_remove("PROMPTLINK_SETTINGS_DIR")
        .env_remove("GITHUB_ACTIONS")
        .output()
        .expect("Failed to execute promptlink");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn write_config(dir: &Path, body: &str) -> String {
    let path = dir.join("config.toml");
    std::fs::write(&path, body).unwrap();
    path.to_string_lossy().into_owned()
}

// ── Help & usage ────────────────────────────────────────────────────────────

#[test]
fn test_help_shows_subcommands() {
    let (stdout, _, code) = run(&["--help"]);
    assert_eq!(code, 0, "Help should exit with code 0");
    assert!(stdout.contains("Usage:"));
    for cmd in ["link", "share", "submit", "preview", "play", "decode", "init"] {
        assert!(stdout.contains(cmd), "Help should list '{cmd}'");
    }
    assert!(stdout.contains("--page-url"));
    assert!(stdout.contains("--no-color"));
}

#[test]
fn test_version_output() {
    let (stdout, _, code) = run(&["--version"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("promptlink"));
    assert!(stdout.contains('.'));
}

#[test]
fn test_unknown_command_is_usage_error() {
    let (_, _, code) = run(&["nonexistent-command-xyz"]);
    assert_eq!(code, 2);
}

#[test]
fn test_link_requires_prompt() {
    let (_, _, code) = run(&["link"]);
    assert_eq!(code, 2);
}

// ── link ────────────────────────────────────────────────────────────────────

#[test]
fn test_link_prints_deep_link() {
    let (stdout, _, code) = run(&["link", "how", "do", "prompts", "work"]);
    assert_eq!(code, 0);
    assert_eq!(
        stdout.trim(),
        "vscode://GitHub.Copilot-Chat/chat?agent=agent&prompt=%40vscode%20how%20do%20prompts%20work"
    );
}

#[test]
fn test_link_secondary_protocol_and_agent() {
    let (stdout, _, code) = run(&[
        "link",
        "--protocol",
        "secondary",
        "--agent",
        "reviewer",
        "@vscode already mentioned",
    ]);
    assert_eq!(code, 0);
    assert_eq!(
        stdout.trim(),
        "vscode-insiders://GitHub.Copilot-Chat/chat?agent=reviewer&prompt=%40vscode%20already%20mentioned"
    );
}

#[test]
fn test_link_blank_prompt_prints_nothing() {
    let (stdout, _, code) = run(&["link", "   "]);
    assert_eq!(code, 0);
    assert!(stdout.is_empty());
}

#[test]
fn test_link_uses_configured_target() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        dir.path(),
        r#"
[target]
primary_scheme = "primary"
secondary_scheme = "secondary"
namespace = "example.namespace"
"#,
    );
    let (stdout, _, code) = run(&["--config", &config, "link", "how do prompts work"]);
    assert_eq!(code, 0);
    assert_eq!(
        stdout.trim(),
        "primary://example.namespace/chat?agent=agent&prompt=%40vscode%20how%20do%20prompts%20work"
    );
}

// ── share / submit / preview ────────────────────────────────────────────────

#[test]
fn test_share_prints_link_without_proto_for_primary() {
    let (stdout, stderr, code) = run(&["--page-url", PAGE, "share", "--dry-run", " test "]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), format!("{PAGE}?q=test"));
    assert!(stderr.contains("Would copy"));
    assert!(stderr.contains("Copied!"));
}

#[test]
fn test_share_marks_secondary_protocol() {
    let (stdout, _, code) = run(&[
        "--page-url",
        PAGE,
        "share",
        "--dry-run",
        "-p",
        "secondary",
        "test",
    ]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), format!("{PAGE}?q=test&proto=vscode-insiders"));
}

#[test]
fn test_submit_dry_run_reports_deep_link() {
    let (_, stderr, code) = run(&["--page-url", PAGE, "submit", "--dry-run", "hello there"]);
    assert_eq!(code, 0);
    assert!(stderr.contains(
        "vscode://GitHub.Copilot-Chat/chat?agent=agent&prompt=%40vscode%20hello%20there"
    ));
    assert!(stderr.contains(&format!("{PAGE}?q=hello+there")));
}

#[test]
fn test_preview_dry_run_reports_share_url() {
    let (_, stderr, code) = run(&["--page-url", PAGE, "preview", "--dry-run", "peek"]);
    assert_eq!(code, 0);
    assert!(stderr.contains(&format!("Would open : {PAGE}?q=peek")));
}

// ── decode / play ───────────────────────────────────────────────────────────

#[test]
fn test_decode_json() {
    let url = format!("{PAGE}?q=hi+there&a=helper&proto=vscode-insiders");
    let (stdout, _, code) = run(&["decode", "--json", &url]);
    assert_eq!(code, 0);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["prompt"], "hi there");
    assert_eq!(value["agent"], "helper");
    assert_eq!(value["protocol"], "secondary");
}

#[test]
fn test_decode_legacy_payload() {
    // "legacy" in base64
    let url = format!("{PAGE}?p=bGVnYWN5");
    let (stdout, _, code) = run(&["decode", &url]);
    assert_eq!(code, 0);
    assert!(stdout.contains("legacy"));
    assert!(stdout.contains("VS Code"));
}

#[test]
fn test_decode_without_prompt_fails() {
    let (_, stderr, code) = run(&["decode", &format!("{PAGE}?p=%%%")]);
    assert_eq!(code, 1);
    assert!(stderr.contains("carries no prompt"));
}

#[test]
fn test_play_without_payload_fails() {
    let (_, stderr, code) = run(&["play", "--dry-run", PAGE]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no prompt to replay"));
}

#[test]
fn test_play_dry_run_types_and_launches_once() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        dir.path(),
        r#"
[pacing]
base_delay_ms = 1
jitter_ms = 1
space_pause_ms = 0
punctuation_pause_ms = 0
settle_pause_ms = 5
launch_pause_ms = 5
"#,
    );
    let url = format!("{PAGE}?q=hi!");
    let (stdout, stderr, code) = run(&["--config", &config, "play", "--dry-run", &url]);
    assert_eq!(code, 0, "stderr: {stderr}");
    assert_eq!(stdout.trim(), "hi!");
    assert!(stderr.contains("Typing prompt and opening VS Code..."));
    assert!(stderr.contains("Done. Was that so hard?"));
    let launches = stderr.matches("Would open").count();
    assert_eq!(launches, 1, "stderr: {stderr}");
    assert!(stderr.contains("prompt=%40vscode%20hi%21"));
}

// ── init ────────────────────────────────────────────────────────────────────

#[test]
fn test_init_writes_config_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let path_str = path.to_string_lossy().into_owned();

    let (stdout, _, code) = run(&["--config", &path_str, "--page-url", PAGE, "init"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), path_str);
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains(PAGE));
    assert!(written.contains("[pacing]"));

    let (_, stderr, code) = run(&["--config", &path_str, "init"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("already exists"));

    let (_, _, code) = run(&["--config", &path_str, "init", "--force"]);
    assert_eq!(code, 0);
    let (stdout, _, code) = run(&["--config", &path_str, "link", "hi"]);
    assert_eq!(code, 0);
    assert_eq!(
        stdout.trim(),
        "vscode://GitHub.Copilot-Chat/chat?agent=agent&prompt=%40vscode%20hi"
    );
}
