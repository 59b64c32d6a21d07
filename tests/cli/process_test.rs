//! Tests for Claude process spawning and control.

#![cfg(unix)]

use std::time::{Duration, Instant};

use claude_stream::cli::{ClaudeProcess, SpawnError};
use claude_stream::config::LaunchConfig;
use serial_test::serial;
use tokio::io::AsyncReadExt;

use super::fake_cli;

#[tokio::test]
#[serial]
async fn spawned_process_receives_built_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let cli = fake_cli(dir.path(), r#"printf '%s\n' "$*""#);

    let config = LaunchConfig::new("hello").max_turns(2);
    let mut process = ClaudeProcess::spawn(&cli, &config).unwrap();
    let mut stdout = process.take_stdout().unwrap();
    assert!(process.take_stdout().is_none());

    let mut output = String::new();
    stdout.read_to_string(&mut output).await.unwrap();
    let status = process.wait().await.unwrap();

    assert!(status.success());
    assert_eq!(
        output.trim_end(),
        "--output-format stream-json --verbose --max-turns 2 --print hello"
    );
}

#[tokio::test]
#[serial]
async fn spawn_runs_in_working_dir() {
    let dir = tempfile::tempdir().unwrap();
    let cli = fake_cli(dir.path(), "pwd");
    let work = tempfile::tempdir().unwrap();

    let config = LaunchConfig::new("x").working_dir(work.path());
    let mut process = ClaudeProcess::spawn(&cli, &config).unwrap();
    let mut output = String::new();
    process
        .take_stdout()
        .unwrap()
        .read_to_string(&mut output)
        .await
        .unwrap();

    let reported = std::fs::canonicalize(output.trim_end()).unwrap();
    assert_eq!(reported, std::fs::canonicalize(work.path()).unwrap());
}

#[tokio::test]
#[serial]
async fn spawn_reports_missing_working_dir() {
    let dir = tempfile::tempdir().unwrap();
    let cli = fake_cli(dir.path(), "exit 0");

    let config = LaunchConfig::new("x").working_dir(dir.path().join("missing"));
    let err = ClaudeProcess::spawn(&cli, &config).unwrap_err();
    assert!(matches!(err, SpawnError::WorkingDirNotFound { .. }));
}

#[tokio::test]
#[serial]
async fn graceful_terminate_stops_cooperative_process() {
    let dir = tempfile::tempdir().unwrap();
    let cli = fake_cli(dir.path(), "exec sleep 30");

    let mut process = ClaudeProcess::spawn(&cli, &LaunchConfig::new("x")).unwrap();
    let started = Instant::now();
    process
        .graceful_terminate(Duration::from_secs(5))
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(process.try_wait().unwrap().is_some());
}

#[tokio::test]
#[serial]
async fn graceful_terminate_escalates_when_sigterm_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let cli = fake_cli(dir.path(), "trap '' TERM\nexec sleep 30");

    let mut process = ClaudeProcess::spawn(&cli, &LaunchConfig::new("x")).unwrap();
    // give the shell time to install the trap
    tokio::time::sleep(Duration::from_millis(200)).await;

    let started = Instant::now();
    process
        .graceful_terminate(Duration::from_millis(300))
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(300));
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(process.try_wait().unwrap().is_some());
}

#[tokio::test]
#[serial]
async fn kill_stops_process() {
    let dir = tempfile::tempdir().unwrap();
    let cli = fake_cli(dir.path(), "exec sleep 30");

    let mut process = ClaudeProcess::spawn(&cli, &LaunchConfig::new("x")).unwrap();
    assert!(process.id().is_some());
    process.kill().await.unwrap();
    assert!(process.try_wait().unwrap().is_some());
}
