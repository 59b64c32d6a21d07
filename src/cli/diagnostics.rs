//! Bounded capture of Claude Code stderr and exit-status evaluation.
//!
//! Stderr is drained by a background task from spawn time so the child never
//! blocks on a full pipe. Once stdout is exhausted the session gives the task
//! a fixed time box to finish, then decides between a clean exit and a
//! process failure.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::SessionError;

/// Maximum stderr bytes kept for error reporting.
pub const MAX_STDERR_SIZE: usize = 10 * 1024 * 1024;

/// How long stderr collection may continue after stdout closes.
pub const STDERR_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit code reported when the real one cannot be determined.
pub const UNKNOWN_EXIT_CODE: i32 = -1;

const READ_CHUNK_SIZE: usize = 4096;

/// Size-capped stderr buffer.
#[derive(Debug)]
pub struct DiagnosticCapture {
    buffer: Vec<u8>,
    limit: usize,
    truncated: bool,
    timed_out: bool,
}

impl Default for DiagnosticCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticCapture {
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(MAX_STDERR_SIZE)
    }

    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buffer: Vec::new(),
            limit,
            truncated: false,
            timed_out: false,
        }
    }

    /// Append output. Anything past the limit is dropped without buffering.
    pub fn push(&mut self, bytes: &[u8]) {
        if self.truncated {
            return;
        }

        let room = self.limit - self.buffer.len();
        if bytes.len() > room {
            self.buffer.extend_from_slice(&bytes[..room]);
            self.truncated = true;
        } else {
            self.buffer.extend_from_slice(bytes);
        }
    }

    /// Record that collection was cut short by the time box.
    pub fn mark_timed_out(&mut self) {
        self.timed_out = true;
    }

    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// Render the captured text as-is, with a marker line for each limit hit.
    #[must_use]
    pub fn into_text(self) -> String {
        let mut text = String::from_utf8_lossy(&self.buffer).into_owned();

        if self.truncated {
            push_line(&mut text, &format!("[stderr truncated after {} bytes]", self.limit));
        }
        if self.timed_out {
            push_line(&mut text, "[stderr collection timed out]");
        }

        text
    }
}

/// Append `line` on a line of its own, reusing an existing trailing newline.
fn push_line(text: &mut String, line: &str) {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(line);
}

/// Background task draining one stderr stream into a [`DiagnosticCapture`].
#[derive(Debug)]
pub struct DiagnosticTask {
    handle: JoinHandle<DiagnosticCapture>,
    cancel: CancellationToken,
}

impl DiagnosticTask {
    /// Start draining `reader` with the default size limit.
    #[must_use]
    pub fn spawn<R>(reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        Self::spawn_with_limit(reader, MAX_STDERR_SIZE)
    }

    #[must_use]
    pub fn spawn_with_limit<R>(reader: R, limit: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let capture = DiagnosticCapture::with_limit(limit);
        let handle = tokio::spawn(drain(reader, capture, cancel.clone()));
        Self { handle, cancel }
    }

    /// Wait up to `timeout` for stderr to close and return the captured text.
    ///
    /// On timeout the drain is stopped and a marker line is appended.
    pub async fn finish(mut self, timeout: Duration) -> String {
        let joined = match tokio::time::timeout(timeout, &mut self.handle).await {
            Ok(joined) => joined,
            Err(_) => {
                tracing::warn!(timeout_secs = timeout.as_secs(), "Stderr collection timed out");
                self.cancel.cancel();
                (&mut self.handle).await
            }
        };

        match joined {
            Ok(capture) => capture.into_text(),
            Err(e) => {
                tracing::warn!(error = %e, "Stderr collector failed");
                String::new()
            }
        }
    }
}

impl Drop for DiagnosticTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn drain<R>(
    mut reader: R,
    mut capture: DiagnosticCapture,
    cancel: CancellationToken,
) -> DiagnosticCapture
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                capture.mark_timed_out();
                break;
            }
            read = reader.read(&mut chunk) => match read {
                Ok(0) => break,
                Ok(n) => capture.push(&chunk[..n]),
                Err(e) => {
                    tracing::debug!(error = %e, "Stderr read failed");
                    break;
                }
            },
        }
    }
    capture
}

/// How a finished process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Exit status 0 and nothing on stderr.
    Clean,
    /// Exit status 0 with stderr output, kept for logging only.
    CleanWithDiagnostics(String),
    /// Non-zero exit status.
    Failed { exit_code: i32, stderr: String },
}

impl ExitOutcome {
    /// Classify an exit code together with the captured stderr text.
    #[must_use]
    pub fn evaluate(exit_code: i32, stderr: String) -> Self {
        if exit_code != 0 {
            Self::Failed { exit_code, stderr }
        } else if stderr.is_empty() {
            Self::Clean
        } else {
            Self::CleanWithDiagnostics(stderr)
        }
    }

    /// Turn the outcome into the session result, logging clean-exit stderr.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Process` for a non-zero exit status.
    pub fn into_result(self) -> Result<(), SessionError> {
        match self {
            Self::Clean => Ok(()),
            Self::CleanWithDiagnostics(stderr) => {
                tracing::debug!(stderr = %stderr, "Claude Code wrote to stderr");
                Ok(())
            }
            Self::Failed { exit_code, stderr } => {
                tracing::debug!(exit_code, "Claude Code exited with failure");
                Err(SessionError::Process { exit_code, stderr })
            }
        }
    }
}
