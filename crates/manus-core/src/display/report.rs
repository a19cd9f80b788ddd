//! Wrapper types for presenting plans, runs and traces.
//!
//! These hold references to the underlying data and add the framing for a
//! specific context: a plan shown before confirmation, a finished run
//! summarized as a report, a trace rendered for inspection.

use std::fmt;

use crate::models::{ExecutionResult, Plan, RiskLevel, TraceEntry};

use super::datetime::LocalDateTime;

/// A plan presented to the operator for confirmation.
///
/// Renders the full plan, plus an explicit warning block for plans that
/// will require a typed risk acknowledgment.
pub struct PlanPreview<'a>(pub &'a Plan);

impl fmt::Display for PlanPreview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;

        match self.0.risk_level {
            RiskLevel::Low => {}
            RiskLevel::Medium => {
                writeln!(f)?;
                writeln!(f, "**This plan modifies files in the workspace.**")?;
            }
            RiskLevel::High => {
                writeln!(f)?;
                writeln!(
                    f,
                    "**WARNING: this plan contains high-risk operations and may destroy data.**"
                )?;
            }
        }
        Ok(())
    }
}

/// A finished run summarized as a report.
pub struct RunReport<'a>(pub &'a ExecutionResult);

impl fmt::Display for RunReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;

        writeln!(f, "# Run {}: {}", result.run_id, result.status)?;
        writeln!(f)?;
        writeln!(f, "- Goal: {}", result.goal)?;
        writeln!(f, "- Risk: {}", result.risk_level)?;
        writeln!(
            f,
            "- Steps: {} total, {} succeeded, {} failed, {} skipped",
            result.total_steps,
            result.successful_steps,
            result.failed_steps,
            result.skipped_steps
        )?;
        writeln!(f, "- Started: {}", LocalDateTime(&result.start_time))?;
        if let Some(ms) = result.duration_ms() {
            writeln!(f, "- Duration: {ms} ms")?;
        }
        for path in &result.produced_files {
            writeln!(f, "- Produced: {}", path.display())?;
        }

        if let Some(summary) = &result.error_summary {
            writeln!(f)?;
            writeln!(f, "Error: {summary}")?;
        }
        if let Some(suggestion) = &result.suggestion {
            writeln!(f, "Suggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// A run's trace entries rendered for inspection.
pub struct TraceView<'a>(pub &'a [TraceEntry]);

impl fmt::Display for TraceView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## Trace")?;
        writeln!(f)?;

        if self.0.is_empty() {
            writeln!(f, "No steps were executed.")?;
            return Ok(());
        }

        for entry in self.0 {
            writeln!(f, "### Step {} ({}): {}", entry.step_id, entry.tool, entry.status)?;
            writeln!(f)?;
            writeln!(f, "- Inputs digest: {}", entry.inputs_digest)?;
            if let Some(digest) = &entry.output_digest {
                writeln!(f, "- Output digest: {digest}")?;
            }
            if let Some(ms) = entry.duration_ms() {
                writeln!(f, "- Duration: {ms} ms")?;
            }
            if let Some(error) = &entry.error {
                writeln!(f, "- Error ({}): {}", error.kind, error.message)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::{Plan, RiskLevel, RunStatus, Step, TraceEntry};

    fn plan(risk: RiskLevel) -> Plan {
        Plan {
            goal: "demo".to_string(),
            risk_level: risk,
            workspace_root: "/tmp/ws".into(),
            steps: vec![Step {
                id: "1".to_string(),
                description: "step".to_string(),
                tool: "file".to_string(),
                inputs: [("action".to_string(), json!("read_text"))].into_iter().collect(),
                produces: None,
            }],
            success_criteria: vec![],
        }
    }

    #[test]
    fn high_risk_preview_carries_warning() {
        let output = format!("{}", PlanPreview(&plan(RiskLevel::High)));
        assert!(output.contains("WARNING"));

        let output = format!("{}", PlanPreview(&plan(RiskLevel::Low)));
        assert!(!output.contains("WARNING"));
    }

    #[test]
    fn run_report_lists_counters_and_error() {
        let p = plan(RiskLevel::Low);
        let mut result = ExecutionResult::for_plan(&p, "20250125-120000");
        result.error_summary = Some("step '1' failed: boom".to_string());
        result.finalize(RunStatus::Failed);

        let output = format!("{}", RunReport(&result));
        assert!(output.contains("# Run 20250125-120000: failed"));
        assert!(output.contains("1 total"));
        assert!(output.contains("Error: step '1' failed: boom"));
    }

    #[test]
    fn empty_trace_view_says_so() {
        let output = format!("{}", TraceView(&[]));
        assert!(output.contains("No steps were executed."));
    }

    #[test]
    fn trace_view_renders_failure_detail() {
        let mut entry = TraceEntry::new("1", "shell", "d1".to_string());
        entry.mark_started();
        entry.mark_failure("timeout", "Command 'ls' timed out after 1s");

        let output = format!("{}", TraceView(std::slice::from_ref(&entry)));
        assert!(output.contains("### Step 1 (shell): failure"));
        assert!(output.contains("Error (timeout)"));
    }
}
