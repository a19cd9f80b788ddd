//! Plan schema validation.
//!
//! A candidate plan coming out of a planner backend is untrusted. Validation
//! checks the structural contract before classification and execution: steps
//! present, ids unique, tools registered, and references forming a
//! back-reference-only DAG. Reference resolution at execution time can then
//! be a simple earlier-index lookup with no cycle detection.

use std::collections::HashSet;

use crate::error::{AgentError, Result};
use crate::models::Plan;
use crate::refs;
use crate::tools::ToolRegistry;

/// Validate a candidate plan against the schema and the tool registry.
///
/// # Errors
///
/// Returns [`AgentError::Validation`] naming the offending field when the
/// plan violates the contract.
pub fn validate_plan(plan: &Plan, registry: &ToolRegistry) -> Result<()> {
    if plan.goal.trim().is_empty() {
        return Err(AgentError::validation("goal", "goal must not be empty"));
    }

    if !plan.workspace_root.is_absolute() {
        return Err(AgentError::validation(
            "workspace_root",
            format!(
                "workspace root '{}' must be an absolute path",
                plan.workspace_root.display()
            ),
        ));
    }

    if plan.steps.is_empty() {
        return Err(AgentError::validation(
            "steps",
            "plan must contain at least one step",
        ));
    }

    let mut seen_ids: HashSet<&str> = HashSet::new();
    for (index, step) in plan.steps.iter().enumerate() {
        let field = format!("steps[{index}]");

        if step.id.trim().is_empty() {
            return Err(AgentError::validation(field, "step id must not be empty"));
        }
        if !seen_ids.insert(&step.id) {
            return Err(AgentError::validation(
                field,
                format!("duplicate step id '{}'", step.id),
            ));
        }
        if step.description.trim().is_empty() {
            return Err(AgentError::validation(
                field,
                "step description must not be empty",
            ));
        }
        if !registry.contains(&step.tool) {
            return Err(AgentError::validation(
                field,
                format!(
                    "tool '{}' is not registered (available: {})",
                    step.tool,
                    registry.names().join(", ")
                ),
            ));
        }

        // References may only name strictly earlier steps; self and forward
        // references are schema violations, not runtime errors.
        for step_ref in refs::collect_refs(&step.inputs) {
            match plan.step_index(&step_ref.step_id) {
                Some(target) if target < index => {}
                Some(_) => {
                    return Err(AgentError::validation(
                        field,
                        format!(
                            "step '{}' references step '{}' which does not execute earlier",
                            step.id, step_ref.step_id
                        ),
                    ));
                }
                None => {
                    return Err(AgentError::validation(
                        field,
                        format!(
                            "step '{}' references unknown step '{}'",
                            step.id, step_ref.step_id
                        ),
                    ));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::{json, Map};

    use super::*;
    use crate::models::{RiskLevel, Step};
    use crate::tools::{FileTool, ShellTool};

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(FileTool::new("/tmp/ws"))).unwrap();
        registry.register(Box::new(ShellTool::new("/tmp/ws"))).unwrap();
        registry
    }

    fn step(id: &str, tool: &str, inputs: Map<String, serde_json::Value>) -> Step {
        Step {
            id: id.to_string(),
            description: format!("step {id}"),
            tool: tool.to_string(),
            inputs,
            produces: None,
        }
    }

    fn plan_with_steps(steps: Vec<Step>) -> Plan {
        Plan {
            goal: "test goal".to_string(),
            risk_level: RiskLevel::Low,
            workspace_root: PathBuf::from("/tmp/ws"),
            steps,
            success_criteria: vec![],
        }
    }

    fn inputs(pairs: &[(&str, serde_json::Value)]) -> Map<String, serde_json::Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn accepts_valid_plan() {
        let plan = plan_with_steps(vec![
            step("1", "file", inputs(&[("action", json!("read_text")), ("path", json!("a.txt"))])),
            step(
                "2",
                "file",
                inputs(&[
                    ("action", json!("write_text")),
                    ("path", json!("b.txt")),
                    ("content", json!("step:1.output")),
                ]),
            ),
        ]);
        assert!(validate_plan(&plan, &registry()).is_ok());
    }

    #[test]
    fn rejects_empty_goal() {
        let mut plan = plan_with_steps(vec![step("1", "file", Map::new())]);
        plan.goal = "  ".to_string();
        let err = validate_plan(&plan, &registry()).unwrap_err();
        assert!(matches!(err, AgentError::Validation { ref field, .. } if field == "goal"));
    }

    #[test]
    fn rejects_relative_workspace_root() {
        let mut plan = plan_with_steps(vec![step("1", "file", Map::new())]);
        plan.workspace_root = PathBuf::from("relative/path");
        assert!(validate_plan(&plan, &registry()).is_err());
    }

    #[test]
    fn rejects_empty_steps() {
        let plan = plan_with_steps(vec![]);
        let err = validate_plan(&plan, &registry()).unwrap_err();
        assert!(matches!(err, AgentError::Validation { ref field, .. } if field == "steps"));
    }

    #[test]
    fn rejects_duplicate_step_ids() {
        let plan = plan_with_steps(vec![
            step("1", "file", Map::new()),
            step("1", "file", Map::new()),
        ]);
        assert!(validate_plan(&plan, &registry()).is_err());
    }

    #[test]
    fn rejects_unknown_tool() {
        let plan = plan_with_steps(vec![step("1", "browser", Map::new())]);
        let err = validate_plan(&plan, &registry()).unwrap_err();
        assert!(err.to_string().contains("browser"));
    }

    #[test]
    fn rejects_forward_reference() {
        let plan = plan_with_steps(vec![
            step("1", "file", inputs(&[("content", json!("step:2.output"))])),
            step("2", "file", Map::new()),
        ]);
        let err = validate_plan(&plan, &registry()).unwrap_err();
        assert!(err.to_string().contains("does not execute earlier"));
    }

    #[test]
    fn rejects_self_reference() {
        let plan = plan_with_steps(vec![step(
            "1",
            "file",
            inputs(&[("content", json!("step:1.output"))]),
        )]);
        assert!(validate_plan(&plan, &registry()).is_err());
    }

    #[test]
    fn rejects_unknown_reference() {
        let plan = plan_with_steps(vec![step(
            "1",
            "file",
            inputs(&[("content", json!("step:99.output"))]),
        )]);
        let err = validate_plan(&plan, &registry()).unwrap_err();
        assert!(err.to_string().contains("unknown step '99'"));
    }
}
