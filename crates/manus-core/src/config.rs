//! Configuration for the agent core.
//!
//! Settings come from the environment with sensible defaults; CLI flags
//! override them. Nothing here is global: callers build a [`Settings`] value
//! and pass it down, so concurrent runs with different workspaces stay
//! isolated.

use std::path::PathBuf;

use crate::error::{AgentError, Result};
use crate::tools::shell::{DEFAULT_ALLOWLIST, DEFAULT_TIMEOUT_SECS};

/// Environment variable naming the workspace root.
pub const ENV_WORKSPACE: &str = "MANUS_WORKSPACE";

/// Environment variable naming the runs directory.
pub const ENV_RUNS_DIR: &str = "MANUS_RUNS_DIR";

/// Environment variable overriding the shell timeout in seconds.
pub const ENV_SHELL_TIMEOUT: &str = "MANUS_SHELL_TIMEOUT";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root directory for all sandboxed file operations
    pub workspace_root: PathBuf,

    /// Directory to store execution runs; defaults to `<workspace>/runs`
    pub runs_dir: Option<PathBuf>,

    /// Allowed shell command leading tokens
    pub shell_allowlist: Vec<String>,

    /// Default shell command time bound in seconds
    pub shell_timeout_secs: u64,
}

impl Settings {
    /// Load settings from environment variables, falling back to defaults.
    ///
    /// The default workspace root is the current working directory.
    pub fn load() -> Result<Self> {
        let workspace_root = match std::env::var_os(ENV_WORKSPACE) {
            Some(path) => PathBuf::from(path),
            None => std::env::current_dir().map_err(|e| {
                AgentError::config(format!("cannot determine current directory: {e}"))
            })?,
        };

        let runs_dir = std::env::var_os(ENV_RUNS_DIR).map(PathBuf::from);

        let shell_timeout_secs = match std::env::var(ENV_SHELL_TIMEOUT) {
            Ok(raw) => raw.parse().map_err(|_| {
                AgentError::config(format!(
                    "{ENV_SHELL_TIMEOUT} must be a number of seconds, got '{raw}'"
                ))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            workspace_root,
            runs_dir,
            shell_allowlist: DEFAULT_ALLOWLIST.iter().map(ToString::to_string).collect(),
            shell_timeout_secs,
        })
    }

    /// Override the workspace root (CLI flag wins over environment).
    pub fn with_workspace_root(mut self, root: Option<PathBuf>) -> Self {
        if let Some(root) = root {
            self.workspace_root = root;
        }
        self
    }

    /// Override the runs directory.
    pub fn with_runs_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.runs_dir = Some(dir);
        }
        self
    }
}
