//! claude-stream - Run Claude Code non-interactively and stream its messages.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use futures_util::StreamExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use claude_stream::cli::{query, SessionError};
use claude_stream::config::{ConfigLoader, LaunchConfig, PermissionMode, QueryOptions};
use claude_stream::display;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PermissionArg {
    Default,
    #[value(name = "acceptEdits")]
    AcceptEdits,
    #[value(name = "bypassPermissions")]
    BypassPermissions,
    Plan,
}

impl From<PermissionArg> for PermissionMode {
    fn from(arg: PermissionArg) -> Self {
        match arg {
            PermissionArg::Default => PermissionMode::Default,
            PermissionArg::AcceptEdits => PermissionMode::AcceptEdits,
            PermissionArg::BypassPermissions => PermissionMode::BypassPermissions,
            PermissionArg::Plan => PermissionMode::Plan,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "claude-stream",
    about = "Run Claude Code and stream its messages",
    version
)]
struct Cli {
    /// The prompt to send.
    prompt: String,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file to load instead of the default search paths.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print each message as one JSON line.
    #[arg(long)]
    json: bool,

    /// Disable truncation of long values.
    #[arg(long)]
    raw: bool,

    /// Tools Claude may use without asking (comma separated).
    #[arg(long, value_delimiter = ',')]
    allowed_tools: Vec<String>,

    /// Tools Claude may not use (comma separated).
    #[arg(long, value_delimiter = ',')]
    disallowed_tools: Vec<String>,

    /// Maximum number of agent turns.
    #[arg(long)]
    max_turns: Option<u32>,

    /// Model name.
    #[arg(long)]
    model: Option<String>,

    /// Replace the system prompt.
    #[arg(long)]
    system_prompt: Option<String>,

    /// Append to the system prompt.
    #[arg(long)]
    append_system_prompt: Option<String>,

    /// Permission mode.
    #[arg(long, value_enum)]
    permission_mode: Option<PermissionArg>,

    /// Continue the most recent conversation.
    #[arg(long = "continue")]
    continue_conversation: bool,

    /// Resume a session by ID.
    #[arg(long)]
    resume: Option<String>,

    /// Working directory for Claude Code.
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Path to the claude executable.
    #[arg(long)]
    cli_path: Option<PathBuf>,
}

impl Cli {
    /// Apply command-line flags on top of file-based defaults.
    fn merge_into(&self, mut options: QueryOptions) -> QueryOptions {
        if !self.allowed_tools.is_empty() {
            options.allowed_tools.clone_from(&self.allowed_tools);
        }
        if !self.disallowed_tools.is_empty() {
            options.disallowed_tools.clone_from(&self.disallowed_tools);
        }
        if self.max_turns.is_some() {
            options.max_turns = self.max_turns;
        }
        if self.model.is_some() {
            options.model.clone_from(&self.model);
        }
        if self.system_prompt.is_some() {
            options.system_prompt.clone_from(&self.system_prompt);
        }
        if self.append_system_prompt.is_some() {
            options
                .append_system_prompt
                .clone_from(&self.append_system_prompt);
        }
        if let Some(mode) = self.permission_mode {
            options.permission_mode = Some(mode.into());
        }
        if self.continue_conversation {
            options.continue_conversation = true;
        }
        if self.resume.is_some() {
            options.resume.clone_from(&self.resume);
        }
        if self.cwd.is_some() {
            options.cwd.clone_from(&self.cwd);
        }
        if self.cli_path.is_some() {
            options.cli_path.clone_from(&self.cli_path);
        }
        options
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Process exit code to report for a failed run.
fn failure_code(err: &SessionError) -> ExitCode {
    match err.exit_code().and_then(|code| u8::try_from(code).ok()) {
        Some(code) if code != 0 => ExitCode::from(code),
        _ => ExitCode::FAILURE,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let loader = cli
        .config
        .clone()
        .map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let defaults = match loader.load() {
        Ok(options) => options,
        Err(e) => {
            display::print_error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    let config = LaunchConfig::with_options(cli.prompt.clone(), cli.merge_into(defaults));
    tracing::info!(
        model = ?config.options().model,
        permission_mode = ?config.options().permission_mode,
        "Starting Claude Code"
    );

    let mut messages = match query(config) {
        Ok(messages) => messages,
        Err(e) => {
            display::print_error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    while let Some(item) = messages.next().await {
        match item {
            Ok(message) if cli.json => {
                if let Err(e) = display::print_json(&message) {
                    tracing::warn!(error = %e, "Failed to serialize message");
                }
            }
            Ok(message) => display::print_message(&message, cli.raw),
            Err(e) => {
                display::print_error(&e.to_string());
                return failure_code(&e);
            }
        }
    }

    ExitCode::SUCCESS
}
