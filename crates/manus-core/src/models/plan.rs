//! Plan and step model definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::RiskLevel;

/// A structured, validated representation of a task as an ordered list of
/// steps.
///
/// A plan is created once by a planner backend, validated against the tool
/// registry, stamped with a derived risk level, and never mutated afterwards.
/// Re-running a task means constructing a new plan or replaying a stored one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    /// Free-text description of the user's intent
    pub goal: String,

    /// Risk tier assigned by the classifier; immutable once assigned
    #[serde(default)]
    pub risk_level: RiskLevel,

    /// Absolute path defining the sandbox boundary; set at creation time
    pub workspace_root: PathBuf,

    /// Ordered steps; vector order is execution order
    pub steps: Vec<Step>,

    /// Human-readable success conditions, used for reporting only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub success_criteria: Vec<String>,
}

impl Plan {
    /// Look up a step by its id.
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Index of a step within the execution order.
    pub fn step_index(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }
}

/// Unit of executable work within a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Step {
    /// Identifier unique within the plan, stable ordering key
    pub id: String,

    /// Human-readable description of what the step does
    pub description: String,

    /// Name of the tool registry entry to invoke
    pub tool: String,

    /// Parameter name to literal value or `step:<id>.output` reference
    #[serde(default)]
    pub inputs: Map<String, Value>,

    /// Declared output name, queryable by later steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub produces: Option<String>,
}
