//! Locating the `claude` executable.
//!
//! Search order: explicit override, then `PATH`, then the usual npm / yarn
//! install locations under the home directory.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Executable name looked up on `PATH`.
pub const CLI_NAME: &str = "claude";

/// System-wide install directory checked after the npm prefix.
pub const SYSTEM_BIN_DIR: &str = "/usr/local/bin";

const INSTALL_HINT: &str = "Install with:\n  npm install -g @anthropic-ai/claude-code\n\n\
If already installed locally, try:\n  export PATH=\"$HOME/node_modules/.bin:$PATH\"\n\n\
Or set `cli_path` in the launch options.";

const NODE_HINT: &str = "Claude Code requires Node.js, which is not installed.\n\n\
Install Node.js from: https://nodejs.org/\n\n\
After installing Node.js, install Claude Code:\n  npm install -g @anthropic-ai/claude-code";

/// Error type for executable resolution.
#[derive(thiserror::Error, Debug)]
pub enum DiscoveryError {
    /// No `claude` binary in any searched location.
    #[error("Claude Code not found. {}", INSTALL_HINT)]
    NotFound { searched: Vec<PathBuf> },
    /// Neither `claude` nor `node` is installed.
    #[error("{}", NODE_HINT)]
    NodeNotInstalled,
}

impl DiscoveryError {
    /// Remediation text suitable for showing to a user.
    #[must_use]
    pub fn hint(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => INSTALL_HINT,
            Self::NodeNotInstalled => NODE_HINT,
        }
    }
}

/// Resolve the `claude` executable using the process environment.
///
/// An explicit `override_path` is returned as-is; whether it actually runs is
/// reported when the process is spawned.
///
/// # Errors
///
/// Returns `DiscoveryError` if no executable is found.
pub fn find_cli(override_path: Option<&Path>) -> Result<PathBuf, DiscoveryError> {
    let path_var = std::env::var_os("PATH");
    let home = dirs::home_dir();
    find_cli_in(
        override_path,
        path_var.as_deref(),
        home.as_deref(),
        Path::new(SYSTEM_BIN_DIR),
    )
}

/// Resolve the executable against an explicit `PATH` value, home directory,
/// and system install directory.
///
/// # Errors
///
/// Returns `DiscoveryError` if no executable is found.
pub fn find_cli_in(
    override_path: Option<&Path>,
    path_var: Option<&OsStr>,
    home: Option<&Path>,
    system_dir: &Path,
) -> Result<PathBuf, DiscoveryError> {
    if let Some(path) = override_path {
        return Ok(path.to_path_buf());
    }

    if let Some(found) = search_path(CLI_NAME, path_var) {
        tracing::debug!(path = %found.display(), "Found claude on PATH");
        return Ok(found);
    }

    let candidates = well_known_locations(home, system_dir);
    if let Some(found) = candidates.iter().find(|p| is_executable(p)) {
        tracing::debug!(path = %found.display(), "Found claude in install location");
        return Ok(found.clone());
    }

    if search_path("node", path_var).is_none() {
        return Err(DiscoveryError::NodeNotInstalled);
    }

    Err(DiscoveryError::NotFound {
        searched: candidates,
    })
}

fn well_known_locations(home: Option<&Path>, system_dir: &Path) -> Vec<PathBuf> {
    let system = system_dir.join(CLI_NAME);
    let Some(home) = home else {
        return vec![system];
    };
    vec![
        home.join(".npm-global/bin").join(CLI_NAME),
        system,
        home.join(".local/bin").join(CLI_NAME),
        home.join("node_modules/.bin").join(CLI_NAME),
        home.join(".yarn/bin").join(CLI_NAME),
    ]
}

fn search_path(name: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    let path_var = path_var?;
    std::env::split_paths(path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
