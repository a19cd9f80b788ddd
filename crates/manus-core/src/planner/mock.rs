//! Deterministic planner backend for testing.
//!
//! Returns fixed plans for a handful of recognizable goals so end-to-end
//! behavior can be exercised without a network-backed model. Downstream
//! handling (validation, classification, gating, execution, tracing) is
//! identical to any other backend.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::Planner;
use crate::error::Result;
use crate::models::{Plan, RiskLevel, Step};

/// Planner that returns predefined plans keyed on goal keywords.
#[derive(Debug, Default)]
pub struct MockPlanner {
    calls: AtomicUsize,
}

impl MockPlanner {
    /// Create a mock planner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `plan` was invoked.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn summarize_plan(goal: &str, workspace_root: &Path) -> Plan {
        let input_path = extract_path(goal).unwrap_or_else(|| "data/notes.txt".to_string());
        let output_path = extract_output_path(goal).unwrap_or_else(|| "out/summary.md".to_string());

        Plan {
            goal: goal.to_string(),
            risk_level: RiskLevel::Low,
            workspace_root: workspace_root.to_path_buf(),
            steps: vec![
                Step {
                    id: "1".to_string(),
                    description: "Read the source file".to_string(),
                    tool: "file".to_string(),
                    inputs: object(&[
                        ("action", json!("read_text")),
                        ("path", json!(input_path)),
                    ]),
                    produces: Some("content".to_string()),
                },
                Step {
                    id: "2".to_string(),
                    description: "Write summary bullet points".to_string(),
                    tool: "file".to_string(),
                    inputs: object(&[
                        ("action", json!("write_text")),
                        ("path", json!(output_path.clone())),
                        (
                            "content",
                            json!("- Summary point 1\n- Summary point 2\n- Summary point 3\n"),
                        ),
                        ("mode", json!("append")),
                    ]),
                    produces: Some(format!("file:{output_path}")),
                },
            ],
            success_criteria: vec![
                format!("File {output_path} exists"),
                "File contains 3 bullet points starting with '-'".to_string(),
                "All steps completed successfully".to_string(),
            ],
        }
    }

    fn deletion_plan(goal: &str, workspace_root: &Path) -> Plan {
        Plan {
            goal: goal.to_string(),
            risk_level: RiskLevel::High,
            workspace_root: workspace_root.to_path_buf(),
            steps: vec![Step {
                id: "1".to_string(),
                description: "Attempt to delete files".to_string(),
                tool: "shell".to_string(),
                inputs: object(&[("cmd", json!("rm -rf *"))]),
                produces: None,
            }],
            success_criteria: vec!["Files deleted".to_string()],
        }
    }

    fn default_plan(goal: &str, workspace_root: &Path) -> Plan {
        Plan {
            goal: goal.to_string(),
            risk_level: RiskLevel::Low,
            workspace_root: workspace_root.to_path_buf(),
            steps: vec![Step {
                id: "1".to_string(),
                description: "Read a file".to_string(),
                tool: "file".to_string(),
                inputs: object(&[("action", json!("read_text")), ("path", json!("test.txt"))]),
                produces: Some("content".to_string()),
            }],
            success_criteria: vec!["File read successfully".to_string()],
        }
    }
}

#[async_trait]
impl Planner for MockPlanner {
    fn name(&self) -> &str {
        "mock"
    }

    async fn plan(&self, task: &str, workspace_root: &Path) -> Result<Plan> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let lowered = task.to_lowercase();

        if lowered.contains("delete") || lowered.contains("rm -rf") {
            return Ok(Self::deletion_plan(task, workspace_root));
        }
        if lowered.contains("summarize") || lowered.contains("summary") {
            return Ok(Self::summarize_plan(task, workspace_root));
        }
        Ok(Self::default_plan(task, workspace_root))
    }
}

fn object(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

/// First token of the goal that names a workspace-relative file.
///
/// Bare file names default into the conventional `data/` input directory.
fn extract_path(goal: &str) -> Option<String> {
    let token = goal
        .split_whitespace()
        .map(|t| t.trim_matches(','))
        .find(|t| t.contains('.') && !t.starts_with('-') && !t.starts_with('/'))?;
    if token.contains('/') {
        Some(token.to_string())
    } else {
        Some(format!("data/{token}"))
    }
}

/// Token following "to" or "into" that looks like a file path.
fn extract_output_path(goal: &str) -> Option<String> {
    let tokens: Vec<&str> = goal.split_whitespace().collect();
    tokens
        .windows(2)
        .filter(|w| w[0] == "to" || w[0] == "into")
        .map(|w| w[1].trim_end_matches(|c: char| c == ',' || c == '.'))
        .find(|t| t.contains('/') || t.contains('.'))
        .map(ToString::to_string)
}
