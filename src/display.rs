//! Colored terminal rendering of Claude Code messages.
//!
//! Used by the `claude-stream` binary; library callers get typed messages
//! and render them however they like.

use std::io::{self, Write};

use chrono::Utc;
use owo_colors::OwoColorize;
use serde_json::Value;

use crate::cli::{
    AssistantMessage, ContentBlock, Message, ResultMessage, SystemMessage, ToolResultBlock,
};

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Maximum length for truncated display strings.
const DEFAULT_MAX_LEN: usize = 80;

/// Truncate a string to at most `max_len` characters, adding an ellipsis if
/// anything was cut.
#[must_use]
pub fn truncate(s: &str, max_len: usize, raw_mode: bool) -> String {
    if raw_mode || s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return "...".to_string();
    }
    let kept: String = s.chars().take(max_len - 3).collect();
    format!("{kept}...")
}

/// Format tool input for display, truncating long values.
#[must_use]
pub fn format_tool_input(input: &Value, raw_mode: bool) -> String {
    match input {
        Value::Object(map) => {
            let pairs: Vec<String> = map
                .iter()
                .map(|(k, v)| {
                    let value_str = match v {
                        Value::String(s) => truncate(s, 50, raw_mode),
                        other => truncate(&other.to_string(), 50, raw_mode),
                    };
                    format!("{k}={value_str}")
                })
                .collect();
            pairs.join(", ")
        }
        other => truncate(&other.to_string(), DEFAULT_MAX_LEN, raw_mode),
    }
}

/// Flatten tool result content into plain text.
///
/// Content is either a string or a list of `{"type":"text","text":..}` parts.
#[must_use]
pub fn tool_result_text(content: Option<&Value>) -> String {
    match content {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        Some(other) => other.to_string(),
    }
}

/// Render one message.
pub fn print_message(message: &Message, raw_mode: bool) {
    match message {
        Message::System(system) if system.subtype == "init" => {
            print_session_start(system, raw_mode);
        }
        Message::System(system) => {
            tracing::debug!(subtype = %system.subtype, "System message");
        }
        Message::Assistant(assistant) => print_assistant(assistant, raw_mode),
        Message::User(user) => {
            if let Some(blocks) = user.content.as_array() {
                for block in blocks {
                    if let Ok(ContentBlock::ToolResult(result)) =
                        serde_json::from_value::<ContentBlock>(block.clone())
                    {
                        print_tool_result(&result, raw_mode);
                    }
                }
            }
        }
        Message::Result(result) => print_session_end(result, raw_mode),
    }
}

fn print_assistant(message: &AssistantMessage, raw_mode: bool) {
    for block in &message.content {
        match block {
            ContentBlock::Text(text) => print_text(&text.text),
            ContentBlock::ToolUse(tool_use) => {
                print_tool_request(&tool_use.name, &tool_use.input, raw_mode);
            }
            ContentBlock::ToolResult(result) => print_tool_result(result, raw_mode),
        }
    }
}

/// Print session start information from the `init` system message.
pub fn print_session_start(system: &SystemMessage, raw_mode: bool) {
    let model = system
        .data
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let session_id = system
        .data
        .get("session_id")
        .and_then(Value::as_str)
        .unwrap_or("");
    println!(
        "{} {} model={}, session={}",
        timestamp().dimmed(),
        "[SESSION]".blue().bold(),
        model.cyan(),
        truncate(session_id, 20, raw_mode).dimmed()
    );
    let _ = io::stdout().flush();
}

/// Print session end information.
pub fn print_session_end(result: &ResultMessage, raw_mode: bool) {
    let ts = timestamp();
    let session = format!("session_id={}", truncate(&result.session_id, 20, raw_mode));
    if result.is_error {
        println!(
            "{} {} Session ended with error ({}) {}",
            ts.dimmed(),
            "[SESSION]".red().bold(),
            result.subtype,
            session.dimmed()
        );
        if let Some(msg) = result.result.as_deref().filter(|m| !m.is_empty()) {
            println!(
                "{} {} {}",
                ts.dimmed(),
                "[ERROR]".red().bold(),
                truncate(msg, 200, raw_mode).red()
            );
        }
    } else if let Some(cost) = result.total_cost_usd {
        println!(
            "{} {} Session completed in {} turns (cost: ${:.4}) {}",
            ts.dimmed(),
            "[SESSION]".blue().bold(),
            result.num_turns,
            cost,
            session.dimmed()
        );
    } else {
        println!(
            "{} {} Session completed in {} turns {}",
            ts.dimmed(),
            "[SESSION]".blue().bold(),
            result.num_turns,
            session.dimmed()
        );
    }
    let _ = io::stdout().flush();
}

/// Print a tool request.
pub fn print_tool_request(name: &str, input: &Value, raw_mode: bool) {
    println!(
        "{} {} ({})",
        "[TOOL]".cyan().bold(),
        name.bold(),
        format_tool_input(input, raw_mode).dimmed()
    );
    let _ = io::stdout().flush();
}

/// Print text content.
pub fn print_text(text: &str) {
    println!("{text}");
    let _ = io::stdout().flush();
}

/// Print tool result output.
pub fn print_tool_result(result: &ToolResultBlock, raw_mode: bool) {
    let id_short = truncate(&result.tool_use_id, 12, raw_mode);
    let text = tool_result_text(result.content.as_ref());
    let content_short = truncate(&text, 150, raw_mode);
    if result.is_error.unwrap_or(false) {
        println!(
            "{} {} {}",
            "[RESULT]".red().bold(),
            id_short.dimmed(),
            content_short
        );
    } else {
        println!(
            "{} {} {}",
            "[RESULT]".green().bold(),
            id_short.dimmed(),
            content_short
        );
    }
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}

/// Print one message as a single JSON line.
///
/// # Errors
///
/// Returns an error if the message cannot be serialized.
pub fn print_json(message: &Message) -> Result<(), serde_json::Error> {
    let line = serde_json::to_string(message)?;
    println!("{line}");
    let _ = io::stdout().flush();
    Ok(())
}
