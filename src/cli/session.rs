//! One Claude Code invocation from spawn to exit.

use std::time::Duration;

use futures_core::Stream;
use futures_util::StreamExt;
use serde_json::Value;
use tokio::process::ChildStdout;

use crate::config::LaunchConfig;

use super::{
    decode_stream, find_cli, ClaudeProcess, DiagnosticTask, ExitOutcome, SessionError,
    STDERR_TIMEOUT, UNKNOWN_EXIT_CODE,
};

/// Grace period between SIGTERM and SIGKILL on disconnect.
pub const DEFAULT_TERMINATE_TIMEOUT: Duration = Duration::from_secs(5);

/// A connection to a single Claude Code process.
///
/// Lifecycle: [`connect`](Self::connect), then
/// [`receive_messages`](Self::receive_messages) once, then
/// [`disconnect`](Self::disconnect). Dropping a connected session kills the
/// child without waiting.
#[derive(Debug)]
pub struct Session {
    config: LaunchConfig,
    process: Option<ClaudeProcess>,
    stdout: Option<ChildStdout>,
    diagnostics: Option<DiagnosticTask>,
    exited: bool,
    terminate_timeout: Duration,
}

impl Session {
    #[must_use]
    pub fn new(config: LaunchConfig) -> Self {
        Self {
            config,
            process: None,
            stdout: None,
            diagnostics: None,
            exited: false,
            terminate_timeout: DEFAULT_TERMINATE_TIMEOUT,
        }
    }

    /// Override the SIGTERM grace period used by [`disconnect`](Self::disconnect).
    #[must_use]
    pub fn with_terminate_timeout(mut self, timeout: Duration) -> Self {
        self.terminate_timeout = timeout;
        self
    }

    #[must_use]
    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }

    /// Whether a process is held and has not been observed to exit.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.process.is_some() && !self.exited
    }

    /// Resolve the executable and start the process.
    ///
    /// Stderr draining starts immediately. Calling this on a connected
    /// session does nothing. Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `CliNotFound`, `ExecutableNotFound`, or `Connection` if the
    /// process cannot be started.
    pub fn connect(&mut self) -> Result<(), SessionError> {
        if self.process.is_some() {
            return Ok(());
        }

        let binary = find_cli(self.config.options().cli_path.as_deref())?;
        let mut process = ClaudeProcess::spawn(&binary, &self.config)?;

        self.stdout = process.take_stdout();
        self.diagnostics = process.take_stderr().map(DiagnosticTask::spawn);
        self.exited = false;

        tracing::info!(
            pid = process.id(),
            cli = %binary.display(),
            "Claude Code started"
        );
        self.process = Some(process);
        Ok(())
    }

    /// Stream every JSON document written to stdout, in order.
    ///
    /// After stdout closes, stderr is collected and the exit status checked.
    /// A failure of any kind is the last item of the stream. The output can
    /// be consumed only once per connection.
    pub fn receive_messages(&mut self) -> impl Stream<Item = Result<Value, SessionError>> + '_ {
        async_stream::stream! {
            if self.process.is_none() {
                yield Err(SessionError::NotConnected);
                return;
            }
            let Some(stdout) = self.stdout.take() else {
                yield Err(SessionError::AlreadyConsumed);
                return;
            };

            {
                let documents = decode_stream(stdout);
                futures_util::pin_mut!(documents);
                while let Some(item) = documents.next().await {
                    match item {
                        Ok(document) => yield Ok(document),
                        Err(e) => {
                            tracing::warn!(error = %e, "Decoding stdout failed");
                            yield Err(SessionError::from(e));
                            return;
                        }
                    }
                }
            }

            if let Err(e) = self.finish().await {
                yield Err(e);
            }
        }
    }

    /// Collect stderr, reap the process, and judge the exit status.
    async fn finish(&mut self) -> Result<(), SessionError> {
        let stderr = match self.diagnostics.take() {
            Some(task) => task.finish(STDERR_TIMEOUT).await,
            None => String::new(),
        };

        let exit_code = match self.process.as_mut() {
            Some(process) => match process.wait().await {
                Ok(status) => {
                    self.exited = true;
                    status.code().unwrap_or(UNKNOWN_EXIT_CODE)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to wait for Claude Code");
                    UNKNOWN_EXIT_CODE
                }
            },
            None => UNKNOWN_EXIT_CODE,
        };

        tracing::debug!(exit_code, "Claude Code exited");
        ExitOutcome::evaluate(exit_code, stderr).into_result()
    }

    /// Release the process and its pipes.
    ///
    /// A still-running process gets SIGTERM, then SIGKILL after the grace
    /// period. Safe to call repeatedly or before `connect`.
    pub async fn disconnect(&mut self) {
        self.stdout = None;
        self.diagnostics = None;

        let Some(mut process) = self.process.take() else {
            return;
        };

        if !self.exited {
            match process.try_wait() {
                Ok(Some(_)) => {}
                Ok(None) => {
                    tracing::debug!(pid = process.id(), "Terminating Claude Code");
                    if let Err(e) = process.graceful_terminate(self.terminate_timeout).await {
                        tracing::debug!(error = %e, "Termination failed");
                    }
                }
                Err(e) => tracing::debug!(error = %e, "Failed to query process state"),
            }
        }
        self.exited = false;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.exited {
            return;
        }
        if let Some(process) = self.process.as_mut() {
            if let Err(e) = process.start_kill() {
                tracing::debug!(error = %e, "Kill on drop failed");
            }
        }
    }
}
