//! Configuration types for a single Claude Code invocation.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Permission mode passed to `--permission-mode`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    /// Claude Code's own permission prompts.
    #[default]
    Default,
    /// Auto-approve file edits.
    AcceptEdits,
    /// Skip every permission check.
    BypassPermissions,
    /// Plan only, never execute.
    Plan,
}

impl PermissionMode {
    /// The value Claude Code expects on its command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::AcceptEdits => "acceptEdits",
            Self::BypassPermissions => "bypassPermissions",
            Self::Plan => "plan",
        }
    }
}

impl fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PermissionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "acceptEdits" => Ok(Self::AcceptEdits),
            "bypassPermissions" => Ok(Self::BypassPermissions),
            "plan" => Ok(Self::Plan),
            other => Err(format!("unknown permission mode: {other}")),
        }
    }
}

/// An MCP server made available to the agent through `--mcp-config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum McpServerConfig {
    /// Server launched as a child process speaking over stdio.
    Stdio {
        command: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        env: BTreeMap<String, String>,
    },
    /// Remote server reached over server-sent events.
    Sse {
        url: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        headers: BTreeMap<String, String>,
    },
    /// Remote server reached over streamable HTTP.
    Http {
        url: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        headers: BTreeMap<String, String>,
    },
}

/// Named options for a query. Every field is optional; unset fields emit no flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Tools the agent may use without asking.
    pub allowed_tools: Vec<String>,
    /// Tools the agent may never use.
    pub disallowed_tools: Vec<String>,
    /// Cap on agent turns.
    pub max_turns: Option<u32>,
    /// Model identifier.
    pub model: Option<String>,
    /// Replacement system prompt.
    pub system_prompt: Option<String>,
    /// Text appended to the default system prompt.
    pub append_system_prompt: Option<String>,
    /// MCP tool that answers permission prompts.
    pub permission_prompt_tool: Option<String>,
    pub permission_mode: Option<PermissionMode>,
    /// Continue the most recent conversation.
    pub continue_conversation: bool,
    /// Session ID to resume.
    pub resume: Option<String>,
    /// MCP servers keyed by name.
    pub mcp_servers: BTreeMap<String, McpServerConfig>,
    /// Working directory for the child process.
    pub cwd: Option<PathBuf>,
    /// Explicit path to the `claude` executable.
    pub cli_path: Option<PathBuf>,
}

/// Everything needed to launch one Claude Code invocation.
///
/// Built once per query and never mutated after the session takes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaunchConfig {
    prompt: String,
    options: QueryOptions,
}

impl LaunchConfig {
    /// Create a config with the given prompt and default options.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            options: QueryOptions::default(),
        }
    }

    /// Create a config from a prompt and a preloaded set of options.
    #[must_use]
    pub fn with_options(prompt: impl Into<String>, options: QueryOptions) -> Self {
        Self {
            prompt: prompt.into(),
            options,
        }
    }

    /// Set the allowed tools.
    #[must_use]
    pub fn allowed_tools(mut self, tools: &[&str]) -> Self {
        self.options.allowed_tools = tools.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Set the disallowed tools.
    #[must_use]
    pub fn disallowed_tools(mut self, tools: &[&str]) -> Self {
        self.options.disallowed_tools = tools.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Set the maximum number of turns.
    #[must_use]
    pub fn max_turns(mut self, turns: u32) -> Self {
        self.options.max_turns = Some(turns);
        self
    }

    /// Set the model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.options.model = Some(model.into());
        self
    }

    /// Set a custom system prompt.
    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.options.system_prompt = Some(prompt.into());
        self
    }

    /// Append to the system prompt.
    #[must_use]
    pub fn append_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.options.append_system_prompt = Some(prompt.into());
        self
    }

    /// Route permission prompts through an MCP tool.
    #[must_use]
    pub fn permission_prompt_tool(mut self, tool: impl Into<String>) -> Self {
        self.options.permission_prompt_tool = Some(tool.into());
        self
    }

    #[must_use]
    pub fn permission_mode(mut self, mode: PermissionMode) -> Self {
        self.options.permission_mode = Some(mode);
        self
    }

    /// Continue the most recent conversation.
    #[must_use]
    pub fn continue_conversation(mut self) -> Self {
        self.options.continue_conversation = true;
        self
    }

    /// Resume an existing session.
    #[must_use]
    pub fn resume(mut self, session_id: impl Into<String>) -> Self {
        self.options.resume = Some(session_id.into());
        self
    }

    /// Register an MCP server under `name`.
    #[must_use]
    pub fn mcp_server(mut self, name: impl Into<String>, server: McpServerConfig) -> Self {
        self.options.mcp_servers.insert(name.into(), server);
        self
    }

    /// Set the working directory for the Claude process.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.cwd = Some(dir.into());
        self
    }

    /// Use a specific `claude` executable instead of searching for one.
    #[must_use]
    pub fn cli_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.cli_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Get the working directory, if set.
    #[must_use]
    pub fn get_working_dir(&self) -> Option<&PathBuf> {
        self.options.cwd.as_ref()
    }

    /// Build the command-line arguments, excluding the executable itself.
    ///
    /// Optional flags always appear in the same order so the vector is stable
    /// across runs; the prompt is always last.
    #[must_use]
    pub fn build_args(&self) -> Vec<String> {
        let opts = &self.options;
        let mut args = vec![
            "--output-format".to_string(),
            "stream-json".to_string(),
            "--verbose".to_string(),
        ];

        if let Some(prompt) = &opts.system_prompt {
            args.push("--system-prompt".to_string());
            args.push(prompt.clone());
        }

        if let Some(prompt) = &opts.append_system_prompt {
            args.push("--append-system-prompt".to_string());
            args.push(prompt.clone());
        }

        if !opts.allowed_tools.is_empty() {
            args.push("--allowedTools".to_string());
            args.push(opts.allowed_tools.join(","));
        }

        if let Some(turns) = opts.max_turns {
            args.push("--max-turns".to_string());
            args.push(turns.to_string());
        }

        if !opts.disallowed_tools.is_empty() {
            args.push("--disallowedTools".to_string());
            args.push(opts.disallowed_tools.join(","));
        }

        if let Some(model) = &opts.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }

        if let Some(tool) = &opts.permission_prompt_tool {
            args.push("--permission-prompt-tool".to_string());
            args.push(tool.clone());
        }

        if let Some(mode) = opts.permission_mode {
            args.push("--permission-mode".to_string());
            args.push(mode.to_string());
        }

        if opts.continue_conversation {
            args.push("--continue".to_string());
        }

        if let Some(session_id) = &opts.resume {
            args.push("--resume".to_string());
            args.push(session_id.clone());
        }

        if !opts.mcp_servers.is_empty() {
            args.push("--mcp-config".to_string());
            args.push(mcp_config_json(&opts.mcp_servers));
        }

        args.push("--print".to_string());
        args.push(self.prompt.clone());

        args
    }
}

/// Encode the server map the way `--mcp-config` expects it.
fn mcp_config_json(servers: &BTreeMap<String, McpServerConfig>) -> String {
    serde_json::json!({ "mcpServers": servers }).to_string()
}
