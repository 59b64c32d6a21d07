//! CLI module tests.

mod config_test;
mod decoder_test;
mod process_test;

use std::path::{Path, PathBuf};

/// Write an executable shell script standing in for the `claude` binary.
#[cfg(unix)]
pub fn fake_cli(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("claude");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Verify the public API is exported from the library root.
#[test]
fn test_all_cli_types_exported() {
    use claude_stream::cli::{
        ClassifyError, DecodeError, DiscoveryError, ExitOutcome, Message, MessageStream,
        Session, SessionError, SpawnError, StreamDecoder, DEFAULT_TERMINATE_TIMEOUT,
        MAX_BUFFER_SIZE, MAX_STDERR_SIZE, STDERR_TIMEOUT,
    };

    let _ = StreamDecoder::new();
    let _ = Session::new(claude_stream::LaunchConfig::new("hi"));
    let _: fn() -> SessionError = || SessionError::NotConnected;
    let _: Option<(ClassifyError, DecodeError, DiscoveryError, SpawnError)> = None;
    let _: Option<(Message, MessageStream)> = None;
    assert_eq!(ExitOutcome::evaluate(0, String::new()), ExitOutcome::Clean);

    assert_eq!(MAX_BUFFER_SIZE, 1024 * 1024);
    assert_eq!(MAX_STDERR_SIZE, 10 * 1024 * 1024);
    assert_eq!(STDERR_TIMEOUT.as_secs(), 30);
    assert_eq!(DEFAULT_TERMINATE_TIMEOUT.as_secs(), 5);
}
