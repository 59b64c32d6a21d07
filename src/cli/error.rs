//! Error taxonomy for a Claude Code session.

use std::path::PathBuf;

use super::{ClassifyError, DecodeError, DiscoveryError, SpawnError};

/// Errors surfaced by [`Session`](super::Session) and [`query`](super::query).
///
/// Resolution and connection failures are returned before any output is
/// read. Decode, process, and protocol failures arrive as the final item of
/// the message stream, after every message decoded before them.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    /// The `claude` executable could not be resolved.
    #[error(transparent)]
    CliNotFound(#[from] DiscoveryError),

    /// The resolved executable could not be run.
    #[error("Claude Code not found at: {}", .path.display())]
    ExecutableNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The process could not be started.
    #[error("Failed to start Claude Code: {reason}")]
    Connection {
        reason: String,
        #[source]
        source: std::io::Error,
    },

    /// Stdout could not be decoded (overflow or read failure).
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The process exited with a non-zero status.
    #[error("{}", describe_process_failure(.exit_code, .stderr))]
    Process { exit_code: i32, stderr: String },

    /// A recognized message is missing a required field.
    #[error("Protocol violation: {0}")]
    Protocol(#[from] ClassifyError),

    /// Output was requested from a session that was never connected.
    #[error("Session is not connected")]
    NotConnected,

    /// Output was requested a second time.
    #[error("Session output has already been consumed")]
    AlreadyConsumed,
}

impl SessionError {
    /// Exit code of a process failure.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Process { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }

    /// Captured stderr of a process failure.
    #[must_use]
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Process { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// Whether stdout produced a partial document larger than the decoder limit.
    #[must_use]
    pub fn is_decode_overflow(&self) -> bool {
        matches!(self, Self::Decode(DecodeError::Overflow { .. }))
    }
}

impl From<SpawnError> for SessionError {
    fn from(err: SpawnError) -> Self {
        match err {
            SpawnError::NotFound { path, source } => Self::ExecutableNotFound { path, source },
            SpawnError::WorkingDirNotFound { dir, source } => Self::Connection {
                reason: format!("working directory does not exist: {}", dir.display()),
                source,
            },
            SpawnError::Io(source) => Self::Connection {
                reason: source.to_string(),
                source,
            },
        }
    }
}

fn describe_process_failure(exit_code: &i32, stderr: &str) -> String {
    if stderr.is_empty() {
        format!("Command failed with exit code {exit_code}")
    } else {
        format!("Command failed with exit code {exit_code}\nError output: {stderr}")
    }
}
