//! Capability-gated tool layer.
//!
//! A tool is a named unit of work the executor can invoke with a map of
//! resolved inputs. Every tool enforces its own policy before touching the
//! system: [`FileTool`] confines paths to the workspace sandbox, [`ShellTool`]
//! checks commands against a fixed allow-list before any process is spawned.
//! No tool performs network I/O.

pub mod file;
pub mod sandbox;
pub mod shell;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{AgentError, Result};

pub use file::FileTool;
pub use shell::ShellTool;

/// Result of a single tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Whether the operation succeeded
    pub success: bool,

    /// Structured output data (payload under `content`, paths under `path`)
    pub data: Option<Value>,

    /// Error message when `success` is false
    pub error: Option<String>,
}

impl ToolOutput {
    /// Successful output with data.
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed output with an error message.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// A capability-checked operation invokable by the executor.
///
/// Implementations return `Err` for policy violations that must halt the run
/// with a typed error (sandbox, allow-list, timeout) and `Ok` with
/// `success: false` for ordinary operational failures the trace should record
/// verbatim.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Registry name of this tool.
    fn name(&self) -> &str;

    /// Execute the tool with resolved inputs.
    async fn execute(&self, inputs: &Map<String, Value>) -> Result<ToolOutput>;
}

/// Mapping from tool name to operation.
///
/// The registry is passed explicitly into the executor at call time so that
/// concurrent runs stay isolated; there is no process-wide registry.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its name.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a tool with the same name is already
    /// registered.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(AgentError::config(format!(
                "tool '{name}' is already registered"
            )));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(Box::as_ref)
    }

    /// Whether a tool is registered under the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Names of all registered tools, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        async fn execute(&self, inputs: &Map<String, Value>) -> Result<ToolOutput> {
            Ok(ToolOutput::ok(Value::Object(inputs.clone())))
        }
    }

    #[test]
    fn registry_rejects_duplicate_names() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        let err = registry.register(Box::new(EchoTool)).unwrap_err();
        assert!(matches!(err, AgentError::Configuration { .. }));
    }

    #[test]
    fn registry_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        assert!(registry.contains("echo"));
        assert!(!registry.contains("file"));
        assert_eq!(registry.names(), vec!["echo"]);
    }
}
