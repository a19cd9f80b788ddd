use std::path::Path;

use manus_core::{Executor, ExecutorBuilder, FileTool, ShellTool, ToolRegistry};
use tempfile::TempDir;

/// Helper function to create a workspace with a sample input fixture
pub fn create_test_workspace() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    std::fs::create_dir_all(temp_dir.path().join("data")).expect("Failed to create data dir");
    std::fs::write(
        temp_dir.path().join("data/notes.txt"),
        "Meeting notes.\nDecide on the rollout date.\nAssign owners for follow-ups.\n",
    )
    .expect("Failed to write fixture");
    temp_dir
}

/// Helper function to create a registry with both built-in tools
pub fn create_test_registry(workspace: &Path) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry
        .register(Box::new(FileTool::new(workspace)))
        .expect("Failed to register file tool");
    registry
        .register(Box::new(ShellTool::new(workspace)))
        .expect("Failed to register shell tool");
    registry
}

/// Helper function to create an executor storing runs under the workspace
pub fn create_test_executor(workspace: &Path) -> Executor {
    ExecutorBuilder::new(workspace)
        .build()
        .expect("Failed to build executor")
}
