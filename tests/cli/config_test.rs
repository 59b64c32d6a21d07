//! Tests for launch configuration and argument building.

use claude_stream::config::{LaunchConfig, McpServerConfig, PermissionMode, QueryOptions};

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

#[test]
fn minimal_config_streams_json_and_prints_prompt_last() {
    let args = LaunchConfig::new("Fix the bug").build_args();

    assert_eq!(
        args,
        vec!["--output-format", "stream-json", "--verbose", "--print", "Fix the bug"]
    );
}

#[test]
fn allowed_tools_are_comma_joined() {
    let args = LaunchConfig::new("task")
        .allowed_tools(&["Read", "Write", "Bash"])
        .build_args();

    assert_eq!(flag_value(&args, "--allowedTools"), Some("Read,Write,Bash"));
}

#[test]
fn resume_and_continue() {
    let args = LaunchConfig::new("continue")
        .resume("session_abc123")
        .continue_conversation()
        .build_args();

    assert_eq!(flag_value(&args, "--resume"), Some("session_abc123"));
    assert!(args.contains(&"--continue".to_string()));
}

#[test]
fn max_turns_and_model() {
    let args = LaunchConfig::new("task")
        .max_turns(5)
        .model("claude-sonnet-4-20250514")
        .build_args();

    assert_eq!(flag_value(&args, "--max-turns"), Some("5"));
    assert_eq!(flag_value(&args, "--model"), Some("claude-sonnet-4-20250514"));
}

#[test]
fn system_prompts() {
    let args = LaunchConfig::new("task")
        .system_prompt("Custom system prompt")
        .append_system_prompt("Extra context here")
        .build_args();

    assert_eq!(flag_value(&args, "--system-prompt"), Some("Custom system prompt"));
    assert_eq!(
        flag_value(&args, "--append-system-prompt"),
        Some("Extra context here")
    );
}

#[test]
fn permission_mode_uses_cli_spelling() {
    let args = LaunchConfig::new("task")
        .permission_mode(PermissionMode::AcceptEdits)
        .build_args();

    assert_eq!(flag_value(&args, "--permission-mode"), Some("acceptEdits"));
}

#[test]
fn mcp_servers_are_serialized_under_mcp_servers_key() {
    let args = LaunchConfig::new("task")
        .mcp_server(
            "docs",
            McpServerConfig::Http {
                url: "http://localhost:9000/mcp".to_string(),
                headers: Default::default(),
            },
        )
        .build_args();

    let raw = flag_value(&args, "--mcp-config").unwrap();
    let parsed: serde_json::Value = serde_json::from_str(raw).unwrap();
    assert_eq!(parsed["mcpServers"]["docs"]["type"], "http");
    assert_eq!(parsed["mcpServers"]["docs"]["url"], "http://localhost:9000/mcp");
}

#[test]
fn options_from_toml_feed_launch_config() {
    let options: QueryOptions = toml::from_str(
        r#"
        allowed_tools = ["Read"]
        max_turns = 3
        permission_mode = "plan"
        "#,
    )
    .unwrap();

    let config = LaunchConfig::with_options("hello", options);
    let args = config.build_args();
    assert_eq!(flag_value(&args, "--allowedTools"), Some("Read"));
    assert_eq!(flag_value(&args, "--max-turns"), Some("3"));
    assert_eq!(flag_value(&args, "--permission-mode"), Some("plan"));
    assert_eq!(args.last().map(String::as_str), Some("hello"));
}
