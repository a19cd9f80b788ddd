//! Trace and execution result models.
//!
//! A [`TraceEntry`] is appended exactly once per attempted step, in execution
//! order, and never mutated after append. The full ordered sequence for a run
//! plus summary counters forms the [`ExecutionResult`].

use std::path::PathBuf;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Plan, RiskLevel};

/// Status of a single step execution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TraceStatus {
    /// Entry created but execution has not started
    Pending,

    /// Tool invocation in flight
    Running,

    /// Step completed successfully
    Success,

    /// Step failed; the run halted here
    Failure,

    /// Step was never attempted because an earlier step failed
    Skipped,
}

/// One append-only record per attempted step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceEntry {
    /// ID of the step that was executed
    pub step_id: String,

    /// Name of the tool that was invoked
    pub tool: String,

    /// Content fingerprint of the resolved inputs (sha256, truncated)
    pub inputs_digest: String,

    /// Content fingerprint of the outputs, absent until completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_digest: Option<String>,

    /// When execution of this step started (UTC)
    pub start_time: Timestamp,

    /// When execution of this step ended (UTC)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,

    /// Execution status
    pub status: TraceStatus,

    /// Structured error kind plus message, present on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TraceError>,

    /// Actual inputs passed to the tool, after reference resolution
    #[serde(default)]
    pub inputs: Map<String, Value>,

    /// Actual outputs returned by the tool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Value>,
}

/// Structured error recorded in a trace entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceError {
    /// Machine-readable error kind (e.g. `sandbox_violation`)
    pub kind: String,

    /// Human-readable error message
    pub message: String,
}

impl TraceEntry {
    /// Create a pending entry for a step about to be attempted.
    pub fn new(step_id: impl Into<String>, tool: impl Into<String>, inputs_digest: String) -> Self {
        Self {
            step_id: step_id.into(),
            tool: tool.into(),
            inputs_digest,
            output_digest: None,
            start_time: Timestamp::now(),
            end_time: None,
            status: TraceStatus::Pending,
            error: None,
            inputs: Map::new(),
            outputs: None,
        }
    }

    /// Mark the step as started.
    pub fn mark_started(&mut self) {
        self.status = TraceStatus::Running;
        self.start_time = Timestamp::now();
    }

    /// Mark the step as successful with its outputs and output digest.
    pub fn mark_success(&mut self, outputs: Value, output_digest: String) {
        self.status = TraceStatus::Success;
        self.end_time = Some(Timestamp::now());
        self.output_digest = Some(output_digest);
        self.outputs = Some(outputs);
    }

    /// Mark the step as failed with a structured error.
    pub fn mark_failure(&mut self, kind: impl Into<String>, message: impl Into<String>) {
        self.status = TraceStatus::Failure;
        self.end_time = Some(Timestamp::now());
        self.error = Some(TraceError {
            kind: kind.into(),
            message: message.into(),
        });
    }

    /// Execution duration in milliseconds, if the step has ended.
    pub fn duration_ms(&self) -> Option<i64> {
        let end = self.end_time?;
        Some(end.duration_since(self.start_time).as_millis() as i64)
    }
}

/// Overall status of a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every attempted step succeeded
    Success,

    /// At least one step failed; the run halted there
    Failed,

    /// The confirmation gate rejected the plan; zero steps executed
    Rejected,

    /// Planning, classification and confirmation ran, but no tool was invoked
    DryRun,
}

impl RunStatus {
    /// Whether this status represents a run the caller should treat as ok.
    pub fn is_ok(&self) -> bool {
        matches!(self, RunStatus::Success | RunStatus::DryRun)
    }
}

/// Aggregate result of executing a complete plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionResult {
    /// The original goal from the plan
    pub goal: String,

    /// Risk tier of the executed plan
    pub risk_level: RiskLevel,

    /// Workspace root the run was sandboxed to
    pub workspace_root: PathBuf,

    /// Identifier of the run directory this result was persisted to
    pub run_id: String,

    /// Total number of steps in the plan
    pub total_steps: usize,

    /// Number of successfully executed steps
    pub successful_steps: usize,

    /// Number of failed steps (0 or 1; the run halts on first failure)
    pub failed_steps: usize,

    /// Number of steps never attempted because of an earlier failure
    pub skipped_steps: usize,

    /// Overall run status
    pub status: RunStatus,

    /// When the run started (UTC)
    pub start_time: Timestamp,

    /// When the run ended (UTC)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,

    /// Ordered trace entries, one per attempted step
    #[serde(default)]
    pub traces: Vec<TraceEntry>,

    /// Summary of the failure or rejection, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_summary: Option<String>,

    /// Non-binding suggested next action for the caller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    /// Paths written during the run, for quick access
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub produced_files: Vec<PathBuf>,
}

impl ExecutionResult {
    /// Create a result for a run that is about to start.
    pub fn for_plan(plan: &Plan, run_id: impl Into<String>) -> Self {
        Self {
            goal: plan.goal.clone(),
            risk_level: plan.risk_level,
            workspace_root: plan.workspace_root.clone(),
            run_id: run_id.into(),
            total_steps: plan.steps.len(),
            successful_steps: 0,
            failed_steps: 0,
            skipped_steps: 0,
            status: RunStatus::Failed,
            start_time: Timestamp::now(),
            end_time: None,
            traces: Vec::new(),
            error_summary: None,
            suggestion: None,
            produced_files: Vec::new(),
        }
    }

    /// Append a trace entry for an attempted step.
    pub fn add_trace(&mut self, trace: TraceEntry) {
        self.traces.push(trace);
    }

    /// Recompute counters from the traces and close the run.
    ///
    /// Steps that were never attempted are counted as skipped in the summary;
    /// the trace itself only records attempted steps.
    pub fn finalize(&mut self, status: RunStatus) {
        self.end_time = Some(Timestamp::now());
        self.successful_steps = self
            .traces
            .iter()
            .filter(|t| t.status == TraceStatus::Success)
            .count();
        self.failed_steps = self
            .traces
            .iter()
            .filter(|t| t.status == TraceStatus::Failure)
            .count();
        self.skipped_steps = self.total_steps - self.traces.len();
        self.status = status;
    }

    /// Total run duration in milliseconds, if the run has ended.
    pub fn duration_ms(&self) -> Option<i64> {
        let end = self.end_time?;
        Some(end.duration_since(self.start_time).as_millis() as i64)
    }
}
