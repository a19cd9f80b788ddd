//! File tool: sandboxed read, write and directory listing.

use std::path::PathBuf;

use async_trait::async_trait;
use glob::Pattern;
use log::debug;
use serde_json::{json, Map, Value};

use super::{sandbox, Tool, ToolOutput};
use crate::error::{AgentError, IoResultExt, Result};

/// Write behavior for `write_text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace any existing content
    Overwrite,

    /// Append to existing content, creating the file if absent
    Append,
}

/// Tool for file operations confined to the workspace root.
///
/// Dispatches on the `action` input: `read_text`, `write_text` (with optional
/// `mode` of `overwrite` or `append`) and `list_dir` (with optional glob
/// `pattern`). Every path input is resolved through the sandbox before any
/// filesystem access.
pub struct FileTool {
    workspace_root: PathBuf,
}

impl FileTool {
    /// Registry name of the file tool.
    pub const NAME: &'static str = "file";

    /// Create a file tool sandboxed to the given workspace root.
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
        }
    }

    fn require_str<'a>(inputs: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
        inputs
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::tool(Self::NAME, format!("missing '{key}' in inputs")))
    }

    fn read_text(&self, inputs: &Map<String, Value>) -> Result<ToolOutput> {
        let raw = Self::require_str(inputs, "path")?;
        let path = sandbox::resolve(&self.workspace_root, raw)?;
        debug!("file read_text {}", path.display());

        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(ToolOutput::ok(json!({
                "content": content,
                "path": path.to_string_lossy(),
            }))),
            Err(e) => Ok(ToolOutput::failed(format!(
                "failed to read '{raw}': {e}"
            ))),
        }
    }

    fn write_text(&self, inputs: &Map<String, Value>) -> Result<ToolOutput> {
        let raw = Self::require_str(inputs, "path")?;
        let content = Self::require_str(inputs, "content")?;
        let mode = match inputs.get("mode").and_then(Value::as_str) {
            None | Some("overwrite") => WriteMode::Overwrite,
            Some("append") => WriteMode::Append,
            Some(other) => {
                return Ok(ToolOutput::failed(format!(
                    "invalid mode '{other}': must be 'overwrite' or 'append'"
                )));
            }
        };

        let path = sandbox::resolve(&self.workspace_root, raw)?;
        debug!("file write_text {} ({mode:?})", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).fs_context(parent)?;
        }

        let write_result = match mode {
            WriteMode::Overwrite => std::fs::write(&path, content),
            WriteMode::Append => {
                use std::io::Write;
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .and_then(|mut f| f.write_all(content.as_bytes()))
            }
        };

        match write_result {
            Ok(()) => Ok(ToolOutput::ok(json!({
                "path": path.to_string_lossy(),
                "bytes_written": content.len(),
            }))),
            Err(e) => Ok(ToolOutput::failed(format!(
                "failed to write '{raw}': {e}"
            ))),
        }
    }

    fn list_dir(&self, inputs: &Map<String, Value>) -> Result<ToolOutput> {
        let raw = Self::require_str(inputs, "path")?;
        let path = sandbox::resolve(&self.workspace_root, raw)?;

        let pattern = match inputs.get("pattern").and_then(Value::as_str) {
            Some(p) => match Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    return Ok(ToolOutput::failed(format!("invalid pattern '{p}': {e}")));
                }
            },
            None => None,
        };

        if !path.is_dir() {
            return Ok(ToolOutput::failed(format!(
                "path is not a directory: {raw}"
            )));
        }

        let mut entries = Vec::new();
        let dir = std::fs::read_dir(&path).fs_context(&path)?;
        for entry in dir {
            let entry = entry.fs_context(&path)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(ref pattern) = pattern {
                if !pattern.matches(&name) {
                    continue;
                }
            }
            let metadata = entry.metadata().fs_context(entry.path())?;
            entries.push(json!({
                "name": name,
                "is_dir": metadata.is_dir(),
                "is_file": metadata.is_file(),
                "size": if metadata.is_file() { Some(metadata.len()) } else { None },
            }));
        }
        entries.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));

        Ok(ToolOutput::ok(json!({
            "path": path.to_string_lossy(),
            "count": entries.len(),
            "entries": entries,
        })))
    }
}

#[async_trait]
impl Tool for FileTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, inputs: &Map<String, Value>) -> Result<ToolOutput> {
        match inputs.get("action").and_then(Value::as_str) {
            Some("read_text") => self.read_text(inputs),
            Some("write_text") => self.write_text(inputs),
            Some("list_dir") => self.list_dir(inputs),
            Some(other) => Ok(ToolOutput::failed(format!(
                "unknown action '{other}': valid actions are read_text, write_text, list_dir"
            ))),
            None => Ok(ToolOutput::failed("missing 'action' in inputs")),
        }
    }
}
