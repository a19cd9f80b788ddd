//! Risk classification for plans.
//!
//! `classify` is a pure function of the plan: the same plan always yields the
//! same tier, and the function is total. A step shape the classifier does not
//! recognize contributes [`RiskLevel::High`] — fail safe, never fail open.

use serde_json::Value;

use crate::models::{Plan, RiskLevel, Step};
use crate::tools::{sandbox, FileTool, ShellTool};
use crate::tools::shell::DEFAULT_ALLOWLIST;

/// A single step writing more than this many distinct paths counts as a batch
/// write and contributes MEDIUM.
pub const BATCH_WRITE_THRESHOLD: usize = 3;

/// Tokens that signal deletion or relocation intent regardless of allow-list
/// membership.
const DESTRUCTIVE_TOKENS: &[&str] = &[
    "rm", "mv", "rmdir", "sudo", "dd", "mkfs", "chmod", "chown", "shred", "truncate",
];

/// Derive the risk tier of a plan from its steps.
///
/// Contributions are combined by taking the maximum across all steps.
pub fn classify(plan: &Plan) -> RiskLevel {
    plan.steps
        .iter()
        .map(classify_step)
        .max()
        .unwrap_or(RiskLevel::High)
}

fn classify_step(step: &Step) -> RiskLevel {
    match step.tool.as_str() {
        FileTool::NAME => classify_file_step(step),
        ShellTool::NAME => classify_shell_step(step),
        _ => RiskLevel::High,
    }
}

fn classify_file_step(step: &Step) -> RiskLevel {
    // Any path input leaving the workspace is HIGH before looking at the
    // action at all.
    if paths_escape_workspace(step) {
        return RiskLevel::High;
    }

    match step.inputs.get("action").and_then(Value::as_str) {
        Some("read_text" | "list_dir") => RiskLevel::Low,
        Some("write_text") => classify_write(step),
        // Unknown file action: could be a delete/move request the tool does
        // not support yet. Fail safe.
        _ => RiskLevel::High,
    }
}

fn classify_write(step: &Step) -> RiskLevel {
    let overwrite = match step.inputs.get("mode").and_then(Value::as_str) {
        Some("append") => false,
        Some("overwrite") | None => true,
        Some(_) => return RiskLevel::High,
    };

    if count_write_targets(step) > BATCH_WRITE_THRESHOLD {
        return RiskLevel::Medium;
    }

    if overwrite {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

fn classify_shell_step(step: &Step) -> RiskLevel {
    let Some(cmd) = step.inputs.get("cmd").and_then(Value::as_str) else {
        return RiskLevel::High;
    };

    let tokens: Vec<&str> = cmd.split_whitespace().collect();
    let Some(leading) = tokens.first() else {
        return RiskLevel::High;
    };

    // A destructive token anywhere taints the whole command, not just the
    // leading position.
    if tokens.iter().any(|t| DESTRUCTIVE_TOKENS.contains(t)) {
        return RiskLevel::High;
    }

    if !DEFAULT_ALLOWLIST.contains(leading) {
        return RiskLevel::High;
    }

    // Arguments that name paths outside the workspace taint the step even if
    // the command itself is allow-listed.
    if tokens
        .iter()
        .skip(1)
        .filter(|t| !t.starts_with('-'))
        .any(|t| sandbox::escapes(t))
    {
        return RiskLevel::High;
    }

    RiskLevel::Low
}

fn paths_escape_workspace(step: &Step) -> bool {
    collect_path_inputs(step)
        .iter()
        .any(|p| sandbox::escapes(p))
}

fn count_write_targets(step: &Step) -> usize {
    collect_path_inputs(step).len()
}

/// Gather the values of `path`/`paths` inputs, ignoring unresolved step
/// references (their targets are checked when the referenced step itself is
/// classified).
fn collect_path_inputs(step: &Step) -> Vec<String> {
    let mut paths = Vec::new();
    for key in ["path", "paths"] {
        match step.inputs.get(key) {
            Some(Value::String(s)) if !s.starts_with("step:") => paths.push(s.clone()),
            Some(Value::Array(items)) => {
                for item in items {
                    if let Some(s) = item.as_str() {
                        if !s.starts_with("step:") {
                            paths.push(s.to_string());
                        }
                    }
                }
            }
            _ => {}
        }
    }
    paths
}
