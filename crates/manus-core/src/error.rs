//! Error types for the agent core.
//!
//! The taxonomy distinguishes recoverable planning errors (validation is
//! retried once before becoming [`AgentError::PlanGenerationFailed`]) from
//! fail-safe terminal errors (sandbox, allow-list and timeout violations are
//! never retried).

use std::path::PathBuf;

use thiserror::Error;

/// Comprehensive error type for all agent operations.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The planner produced invalid output twice in a row
    #[error("Plan generation failed: {reason}")]
    PlanGenerationFailed { reason: String },

    /// A candidate plan violated the plan schema
    #[error("Invalid plan field '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// A path escaped the workspace sandbox; the operation was never attempted
    #[error("Path '{path}' escapes workspace root '{workspace}'")]
    SandboxViolation { path: PathBuf, workspace: PathBuf },

    /// A shell command was blocked by the allow-list before any process spawned
    #[error("Command '{command}' is not allowed: {reason}")]
    CommandNotAllowed { command: String, reason: String },

    /// A shell command exceeded its time bound and was terminated
    #[error("Command '{command}' timed out after {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },

    /// A step input referenced an output that does not exist yet
    #[error("Unresolved reference '{reference}': {reason}")]
    UnresolvedReference { reference: String, reason: String },

    /// Generic tool failure carrying the underlying cause
    #[error("Tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },

    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl AgentError {
    /// Creates a validation error for a named plan field.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a tool execution error.
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Short machine-readable kind, recorded in trace entries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlanGenerationFailed { .. } => "plan_generation_failed",
            Self::Validation { .. } => "validation",
            Self::SandboxViolation { .. } => "sandbox_violation",
            Self::CommandNotAllowed { .. } => "command_not_allowed",
            Self::Timeout { .. } => "timeout",
            Self::UnresolvedReference { .. } => "unresolved_reference",
            Self::ToolExecution { .. } => "tool_execution",
            Self::FileSystem { .. } => "file_system",
            Self::Serialization { .. } => "serialization",
            Self::Configuration { .. } => "configuration",
        }
    }

    /// Non-binding suggested next action for the failure summary.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::SandboxViolation { workspace, .. } => Some(format!(
                "use a path inside the workspace root '{}'",
                workspace.display()
            )),
            Self::CommandNotAllowed { .. } => {
                Some("use a command from the shell allow-list".to_string())
            }
            Self::Timeout { timeout_secs, .. } => Some(format!(
                "increase the timeout (currently {timeout_secs}s) or simplify the command"
            )),
            Self::UnresolvedReference { .. } => {
                Some("reference only outputs of earlier steps".to_string())
            }
            Self::FileSystem { path, .. } => {
                Some(format!("check that '{}' exists and is readable", path.display()))
            }
            _ => None,
        }
    }
}

/// Extension trait mapping io errors to [`AgentError::FileSystem`] with the
/// offending path attached.
pub trait IoResultExt<T> {
    fn fs_context(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| AgentError::FileSystem {
            path: path.into(),
            source: e,
        })
    }
}

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let err = AgentError::CommandNotAllowed {
            command: "rm".to_string(),
            reason: "not in allow-list".to_string(),
        };
        assert_eq!(err.kind(), "command_not_allowed");
        assert!(err.to_string().contains("rm"));
    }

    #[test]
    fn sandbox_violation_suggests_workspace() {
        let err = AgentError::SandboxViolation {
            path: PathBuf::from("/etc/passwd"),
            workspace: PathBuf::from("/tmp/ws"),
        };
        assert!(err.suggestion().unwrap().contains("/tmp/ws"));
    }
}
