//! Plan execution against the tool registry.
//!
//! Steps run strictly in declared order, one at a time. Serial execution is a
//! correctness and auditability requirement: the trace must read as the exact
//! history of the run, and replay must be trivial. The map of prior step
//! outputs is owned exclusively by the executor for the duration of the run
//! and never exposed for concurrent mutation. Multiple independent runs may
//! execute concurrently as long as each has its own workspace and runs
//! directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{info, warn};
use serde_json::Value;

use crate::digest::digest_value;
use crate::error::{AgentError, Result};
use crate::models::{ExecutionResult, Plan, RunStatus, TraceEntry};
use crate::refs;
use crate::store::RunStore;
use crate::tools::ToolRegistry;

/// Cancellation signal shared with the caller.
///
/// Cancellation is step-granular: it takes effect at the next step boundary.
/// A running shell command is already bounded by its own timeout and is
/// force-terminated when its future is dropped, never left running in the
/// background.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a flag in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation at the next step boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options controlling a single execution.
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Plan, classify and confirm, but invoke zero tools
    pub dry_run: bool,

    /// Optional cancellation signal, checked at step boundaries
    pub cancel: Option<CancelFlag>,
}

/// Builder for creating and configuring Executor instances.
#[derive(Debug, Clone)]
pub struct ExecutorBuilder {
    workspace_root: PathBuf,
    runs_dir: Option<PathBuf>,
}

impl ExecutorBuilder {
    /// Creates a builder for a workspace root.
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            runs_dir: None,
        }
    }

    /// Sets a custom runs directory.
    ///
    /// If not specified, runs are stored under `<workspace_root>/runs`.
    pub fn with_runs_dir<P: AsRef<Path>>(mut self, dir: Option<P>) -> Self {
        if let Some(dir) = dir {
            self.runs_dir = Some(dir.as_ref().to_path_buf());
        }
        self
    }

    /// Builds the configured executor.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the workspace root is not an
    /// absolute path to an existing directory.
    pub fn build(self) -> Result<Executor> {
        if !self.workspace_root.is_absolute() {
            return Err(AgentError::config(format!(
                "workspace root '{}' must be absolute",
                self.workspace_root.display()
            )));
        }
        if !self.workspace_root.is_dir() {
            return Err(AgentError::config(format!(
                "workspace root '{}' is not a directory",
                self.workspace_root.display()
            )));
        }

        let runs_dir = self
            .runs_dir
            .unwrap_or_else(|| self.workspace_root.join("runs"));

        Ok(Executor {
            workspace_root: self.workspace_root,
            store: RunStore::new(runs_dir),
        })
    }
}

/// Runs plans serially against a tool registry, recording a trace.
#[derive(Debug)]
pub struct Executor {
    workspace_root: PathBuf,
    store: RunStore,
}

impl Executor {
    /// Workspace root this executor is sandboxed to.
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Store the executor persists runs through.
    pub fn store(&self) -> &RunStore {
        &self.store
    }

    /// Execute a confirmed plan.
    ///
    /// The plan is persisted before the first step runs. On the first step
    /// failure the run halts immediately; remaining steps are counted as
    /// skipped in the result summary while the trace records only attempted
    /// steps.
    pub async fn execute(
        &self,
        plan: &Plan,
        registry: &ToolRegistry,
        options: &ExecuteOptions,
    ) -> Result<ExecutionResult> {
        let handle = self.store.create_run(plan)?;
        let mut result = ExecutionResult::for_plan(plan, handle.run_id.clone());

        if options.dry_run {
            info!("dry run {}: plan persisted, no tools invoked", handle.run_id);
            result.finalize(RunStatus::DryRun);
            self.store.finalize(&handle, &result)?;
            return Ok(result);
        }

        info!(
            "run {}: executing {} step(s) for goal '{}'",
            handle.run_id,
            plan.steps.len(),
            plan.goal
        );

        // Exclusively owned by this run; the only state shared between steps.
        let mut prior_outputs: BTreeMap<String, Value> = BTreeMap::new();
        let mut halted = false;

        for step in &plan.steps {
            if let Some(cancel) = &options.cancel {
                if cancel.is_cancelled() {
                    warn!("run {} cancelled before step '{}'", handle.run_id, step.id);
                    result.error_summary =
                        Some(format!("run cancelled before step '{}'", step.id));
                    halted = true;
                    break;
                }
            }

            let entry = self
                .execute_step(step, registry, &mut prior_outputs, &mut result)
                .await;
            let failed = entry.error.is_some();
            self.store.append_trace(&handle, &entry)?;
            result.add_trace(entry);

            if failed {
                halted = true;
                break;
            }
        }

        let status = if halted {
            RunStatus::Failed
        } else {
            RunStatus::Success
        };
        result.finalize(status);
        self.store.finalize(&handle, &result)?;
        Ok(result)
    }

    /// Persist a terminal result for a plan the confirmation gate rejected.
    ///
    /// Zero steps execute; the rejection reason lands in the result summary
    /// so the refusal is auditable like any other run.
    pub fn execute_rejected(&self, plan: &Plan, reason: &str) -> Result<ExecutionResult> {
        let handle = self.store.create_run(plan)?;
        let mut result = ExecutionResult::for_plan(plan, handle.run_id.clone());
        result.error_summary = Some(reason.to_string());
        result.finalize(RunStatus::Rejected);
        self.store.finalize(&handle, &result)?;
        warn!("run {} rejected: {reason}", handle.run_id);
        Ok(result)
    }

    async fn execute_step(
        &self,
        step: &crate::models::Step,
        registry: &ToolRegistry,
        prior_outputs: &mut BTreeMap<String, Value>,
        result: &mut ExecutionResult,
    ) -> TraceEntry {
        let resolved = match refs::resolve_inputs(&step.inputs, prior_outputs) {
            Ok(resolved) => resolved,
            Err(e) => {
                let mut entry = TraceEntry::new(
                    &step.id,
                    &step.tool,
                    digest_value(&Value::Object(step.inputs.clone())),
                );
                entry.inputs = step.inputs.clone();
                entry.mark_started();
                entry.mark_failure(e.kind(), e.to_string());
                self.summarize_failure(result, &step.id, &e);
                return entry;
            }
        };

        let mut entry = TraceEntry::new(
            &step.id,
            &step.tool,
            digest_value(&Value::Object(resolved.clone())),
        );
        entry.inputs = resolved.clone();

        // Validation guarantees the tool exists; stay defensive for saved
        // plans from older registries.
        let Some(tool) = registry.get(&step.tool) else {
            let e = AgentError::tool(&step.tool, "tool is not registered");
            entry.mark_started();
            entry.mark_failure(e.kind(), e.to_string());
            self.summarize_failure(result, &step.id, &e);
            return entry;
        };

        entry.mark_started();
        match tool.execute(&resolved).await {
            Err(e) => {
                entry.mark_failure(e.kind(), e.to_string());
                self.summarize_failure(result, &step.id, &e);
            }
            Ok(output) if !output.success => {
                let message = output
                    .error
                    .unwrap_or_else(|| "tool reported failure without a message".to_string());
                // Captured stdout/stderr still land in the trace.
                entry.outputs = output.data;
                let e = AgentError::tool(&step.tool, message);
                entry.mark_failure(e.kind(), e.to_string());
                self.summarize_failure(result, &step.id, &e);
            }
            Ok(output) => {
                let data = output.data.unwrap_or(Value::Null);
                if let Err(e) = self.check_postconditions(step, &data) {
                    entry.outputs = Some(data);
                    entry.mark_failure(e.kind(), e.to_string());
                    self.summarize_failure(result, &step.id, &e);
                    return entry;
                }

                if let Some(path) = produced_file(&data) {
                    result.produced_files.push(path);
                }
                prior_outputs.insert(step.id.clone(), data.clone());
                let digest = digest_value(&data);
                entry.mark_success(data, digest);
            }
        }
        entry
    }

    /// Basic postcondition check after a successful tool invocation: where a
    /// step declares an output, the output must be non-empty, and a reported
    /// output path must exist on disk.
    fn check_postconditions(&self, step: &crate::models::Step, data: &Value) -> Result<()> {
        if step.produces.is_some() {
            let empty = match data {
                Value::Null => true,
                Value::String(s) => s.is_empty(),
                Value::Object(map) => map.is_empty(),
                Value::Array(items) => items.is_empty(),
                _ => false,
            };
            if empty {
                return Err(AgentError::tool(
                    &step.tool,
                    format!(
                        "postcondition failed: step '{}' declares output '{}' but produced none",
                        step.id,
                        step.produces.as_deref().unwrap_or_default()
                    ),
                ));
            }
        }

        if let Some(path) = data.get("path").and_then(Value::as_str) {
            if !Path::new(path).exists() {
                return Err(AgentError::tool(
                    &step.tool,
                    format!("postcondition failed: reported output path '{path}' does not exist"),
                ));
            }
        }

        Ok(())
    }

    fn summarize_failure(&self, result: &mut ExecutionResult, step_id: &str, error: &AgentError) {
        result.error_summary = Some(format!("step '{step_id}' failed: {error}"));
        result.suggestion = error
            .suggestion()
            .or_else(|| Some("inspect the trace entry for this step".to_string()));
    }
}

/// A step that reports both a path and a byte count wrote a file.
fn produced_file(data: &Value) -> Option<PathBuf> {
    if data.get("bytes_written").is_some() {
        data.get("path")
            .and_then(Value::as_str)
            .map(PathBuf::from)
    } else {
        None
    }
}
