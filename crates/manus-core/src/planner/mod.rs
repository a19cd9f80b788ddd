//! Planner interface.
//!
//! A planner turns a natural-language task into a candidate [`Plan`]. The
//! backend is a polymorphic boundary: a network-backed implementation and the
//! deterministic [`MockPlanner`] must be interchangeable with identical
//! downstream behavior. Whatever the backend produces is untrusted until it
//! passes schema validation, and the risk level it claims is always
//! overwritten by the classifier.

pub mod mock;

use std::path::Path;

use async_trait::async_trait;
use log::{info, warn};

use crate::error::{AgentError, Result};
use crate::models::Plan;
use crate::risk;
use crate::tools::ToolRegistry;
use crate::validate::validate_plan;

pub use mock::MockPlanner;

/// A planning backend producing candidate plans from task descriptions.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Name of the backend, for logging and reports.
    fn name(&self) -> &str;

    /// Produce a candidate plan for the task, sandboxed to the workspace.
    async fn plan(&self, task: &str, workspace_root: &Path) -> Result<Plan>;
}

/// Generate a validated, risk-classified plan.
///
/// Validation failures are recovered exactly once by regenerating; a second
/// failure surfaces as [`AgentError::PlanGenerationFailed`] with the
/// validation reason attached. No further automatic retries.
pub async fn generate_plan(
    planner: &dyn Planner,
    task: &str,
    workspace_root: &Path,
    registry: &ToolRegistry,
) -> Result<Plan> {
    let mut last_reason = String::new();

    for attempt in 0..2 {
        let candidate = match planner.plan(task, workspace_root).await {
            Ok(candidate) => candidate,
            Err(AgentError::Validation { field, reason }) => {
                last_reason = format!("{field}: {reason}");
                warn!(
                    "planner '{}' produced invalid output (attempt {}): {last_reason}",
                    planner.name(),
                    attempt + 1
                );
                continue;
            }
            Err(other) => return Err(other),
        };

        match validate_plan(&candidate, registry) {
            Ok(()) => {
                // Risk is derived, never planner-settable.
                let mut plan = candidate;
                plan.risk_level = risk::classify(&plan);
                info!(
                    "planner '{}' produced a {} step plan ({})",
                    planner.name(),
                    plan.steps.len(),
                    plan.risk_level
                );
                return Ok(plan);
            }
            Err(e) => {
                last_reason = e.to_string();
                warn!(
                    "plan validation failed (attempt {}): {last_reason}",
                    attempt + 1
                );
            }
        }
    }

    Err(AgentError::PlanGenerationFailed {
        reason: last_reason,
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::models::{RiskLevel, Step};
    use crate::tools::{FileTool, ShellTool};

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(FileTool::new("/tmp/ws"))).unwrap();
        registry.register(Box::new(ShellTool::new("/tmp/ws"))).unwrap();
        registry
    }

    /// Planner that emits an invalid plan a fixed number of times before a
    /// valid one.
    struct FlakyPlanner {
        invalid_attempts: usize,
        calls: AtomicUsize,
    }

    impl FlakyPlanner {
        fn new(invalid_attempts: usize) -> Self {
            Self {
                invalid_attempts,
                calls: AtomicUsize::new(0),
            }
        }

        fn valid_plan(workspace_root: &Path) -> Plan {
            Plan {
                goal: "read a file".to_string(),
                risk_level: RiskLevel::High, // classifier must overwrite this
                workspace_root: workspace_root.to_path_buf(),
                steps: vec![Step {
                    id: "1".to_string(),
                    description: "read".to_string(),
                    tool: "file".to_string(),
                    inputs: [
                        ("action".to_string(), json!("read_text")),
                        ("path".to_string(), json!("a.txt")),
                    ]
                    .into_iter()
                    .collect(),
                    produces: None,
                }],
                success_criteria: vec![],
            }
        }
    }

    #[async_trait]
    impl Planner for FlakyPlanner {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn plan(&self, _task: &str, workspace_root: &Path) -> Result<Plan> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.invalid_attempts {
                let mut plan = Self::valid_plan(workspace_root);
                plan.steps.clear(); // schema violation
                Ok(plan)
            } else {
                Ok(Self::valid_plan(workspace_root))
            }
        }
    }

    #[tokio::test]
    async fn valid_plan_is_classified_not_trusted() {
        let planner = FlakyPlanner::new(0);
        let plan = generate_plan(&planner, "read", &PathBuf::from("/tmp/ws"), &registry())
            .await
            .unwrap();
        // Planner claimed HIGH; a read-only plan classifies LOW.
        assert_eq!(plan.risk_level, RiskLevel::Low);
    }

    #[tokio::test]
    async fn validation_failure_retries_exactly_once() {
        let planner = FlakyPlanner::new(1);
        let plan = generate_plan(&planner, "read", &PathBuf::from("/tmp/ws"), &registry())
            .await
            .unwrap();
        assert_eq!(planner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(plan.steps.len(), 1);
    }

    #[tokio::test]
    async fn second_validation_failure_is_terminal() {
        let planner = FlakyPlanner::new(2);
        let err = generate_plan(&planner, "read", &PathBuf::from("/tmp/ws"), &registry())
            .await
            .unwrap_err();
        assert_eq!(planner.calls.load(Ordering::SeqCst), 2);
        match err {
            AgentError::PlanGenerationFailed { reason } => {
                assert!(reason.contains("at least one step"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
