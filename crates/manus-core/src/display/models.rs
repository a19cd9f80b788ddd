//! Display implementations for domain models.
//!
//! Separated from the model definitions to keep the data shapes free of
//! presentation concerns. All output is markdown.

use std::fmt;

use serde_json::Value;

use crate::models::{Plan, RunStatus, Step, TraceStatus};

impl TraceStatus {
    /// Lowercase name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            TraceStatus::Pending => "pending",
            TraceStatus::Running => "running",
            TraceStatus::Success => "success",
            TraceStatus::Failure => "failure",
            TraceStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for TraceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
            RunStatus::Rejected => "rejected",
            RunStatus::DryRun => "dry run",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Plan: {}", self.goal)?;
        writeln!(f)?;

        // Metadata section
        writeln!(f, "- Risk: {}", self.risk_level)?;
        writeln!(f, "- Workspace: {}", self.workspace_root.display())?;
        writeln!(f, "- Steps: {}", self.steps.len())?;

        if !self.steps.is_empty() {
            writeln!(f, "\n## Steps")?;
            writeln!(f)?;
            for step in &self.steps {
                write!(f, "{step}")?;
            }
        }

        if !self.success_criteria.is_empty() {
            writeln!(f, "## Success criteria")?;
            writeln!(f)?;
            for criterion in &self.success_criteria {
                writeln!(f, "- {criterion}")?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "### {}. {} ({})", self.id, self.description, self.tool)?;
        writeln!(f)?;

        writeln!(f, "- Inputs: `{}`", Value::Object(self.inputs.clone()))?;
        if let Some(produces) = &self.produces {
            writeln!(f, "- Produces: {produces}")?;
        }
        writeln!(f)?;
        Ok(())
    }
}
