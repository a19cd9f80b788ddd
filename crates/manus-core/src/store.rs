//! Durable per-run storage.
//!
//! Each run owns a directory `runs/<runId>/` holding `plan.json` (written
//! before any step executes), `trace.jsonl` (append-only, one compact JSON
//! object per line, flushed per entry) and `result.json` (written on
//! finalize). A crash mid-run therefore leaves a valid, loadable partial
//! trace attributable to a concrete plan.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use jiff::{tz::TimeZone, Timestamp};
use log::info;

use crate::error::{AgentError, IoResultExt, Result};
use crate::models::{ExecutionResult, Plan, RunStatus, TraceEntry};

const PLAN_FILE: &str = "plan.json";
const TRACE_FILE: &str = "trace.jsonl";
const RESULT_FILE: &str = "result.json";

/// Handle to one run's directory.
#[derive(Debug, Clone)]
pub struct RunHandle {
    /// Unique run identifier (timestamp-based)
    pub run_id: String,

    /// Directory holding this run's artifacts
    pub dir: PathBuf,
}

impl RunHandle {
    /// Path to the persisted plan.
    pub fn plan_path(&self) -> PathBuf {
        self.dir.join(PLAN_FILE)
    }

    /// Path to the append-only trace log.
    pub fn trace_path(&self) -> PathBuf {
        self.dir.join(TRACE_FILE)
    }

    /// Path to the finalized result summary.
    pub fn result_path(&self) -> PathBuf {
        self.dir.join(RESULT_FILE)
    }
}

/// Store that persists plans and traces under a runs root directory.
#[derive(Debug, Clone)]
pub struct RunStore {
    runs_dir: PathBuf,
}

impl RunStore {
    /// Create a store rooted at `runs_dir`. The directory is created lazily
    /// on the first persisted run.
    pub fn new(runs_dir: impl Into<PathBuf>) -> Self {
        Self {
            runs_dir: runs_dir.into(),
        }
    }

    /// Root directory the store writes runs under.
    pub fn runs_dir(&self) -> &Path {
        &self.runs_dir
    }

    /// Allocate a fresh run directory and persist the plan into it.
    ///
    /// The plan hits disk before the caller can execute anything, so a crash
    /// mid-run is always attributable to a concrete plan.
    pub fn create_run(&self, plan: &Plan) -> Result<RunHandle> {
        std::fs::create_dir_all(&self.runs_dir).fs_context(&self.runs_dir)?;

        let handle = self.allocate_run_dir()?;
        let encoded = serde_json::to_string_pretty(plan)?;
        std::fs::write(handle.plan_path(), encoded).fs_context(handle.plan_path())?;

        info!("persisted plan for run {} at {}", handle.run_id, handle.dir.display());
        Ok(handle)
    }

    /// Append one trace entry to the run's trace log, flushed immediately.
    pub fn append_trace(&self, handle: &RunHandle, entry: &TraceEntry) -> Result<()> {
        let path = handle.trace_path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .fs_context(&path)?;

        let line = serde_json::to_string(entry)?;
        writeln!(file, "{line}").fs_context(&path)?;
        file.flush().fs_context(&path)?;
        Ok(())
    }

    /// Write the finalized execution result.
    pub fn finalize(&self, handle: &RunHandle, result: &ExecutionResult) -> Result<()> {
        let encoded = serde_json::to_string_pretty(result)?;
        std::fs::write(handle.result_path(), encoded).fs_context(handle.result_path())?;
        Ok(())
    }

    /// Load a persisted plan from an explicit `plan.json` path.
    pub fn load_plan(path: &Path) -> Result<Plan> {
        let content = std::fs::read_to_string(path).fs_context(path)?;
        let plan = serde_json::from_str(&content)?;
        Ok(plan)
    }

    /// Load a run directory for replay.
    ///
    /// A run that crashed before finalize has no `result.json`; in that case
    /// a partial result is rebuilt from the trace log so the run is still
    /// inspectable.
    pub fn load_run(dir: &Path) -> Result<(Plan, ExecutionResult)> {
        let plan = Self::load_plan(&dir.join(PLAN_FILE))?;

        let result_path = dir.join(RESULT_FILE);
        let result = if result_path.is_file() {
            let content = std::fs::read_to_string(&result_path).fs_context(&result_path)?;
            serde_json::from_str(&content)?
        } else {
            Self::partial_result(dir, &plan)?
        };

        Ok((plan, result))
    }

    /// Load the raw trace entries of a run.
    pub fn load_trace(dir: &Path) -> Result<Vec<TraceEntry>> {
        let path = dir.join(TRACE_FILE);
        if !path.is_file() {
            return Ok(Vec::new());
        }

        let file = File::open(&path).fs_context(&path)?;
        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.fs_context(&path)?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(&line)?);
        }
        Ok(entries)
    }

    fn partial_result(dir: &Path, plan: &Plan) -> Result<ExecutionResult> {
        let run_id = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut result = ExecutionResult::for_plan(plan, run_id);
        result.traces = Self::load_trace(dir)?;
        result.error_summary = Some("run was interrupted before finalize".to_string());
        // Incomplete even if every recorded step succeeded.
        result.finalize(RunStatus::Failed);
        Ok(result)
    }

    fn allocate_run_dir(&self) -> Result<RunHandle> {
        let base = run_id_stamp(Timestamp::now());

        // Timestamp resolution is one second; suffix on collision so
        // concurrent runs under one runs root never share a directory.
        for attempt in 0..1000 {
            let run_id = if attempt == 0 {
                base.clone()
            } else {
                format!("{base}-{attempt}")
            };
            let dir = self.runs_dir.join(&run_id);
            match std::fs::create_dir(&dir) {
                Ok(()) => return Ok(RunHandle { run_id, dir }),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(AgentError::FileSystem { path: dir, source: e }),
            }
        }

        Err(AgentError::config(format!(
            "could not allocate a unique run directory under '{}'",
            self.runs_dir.display()
        )))
    }
}

fn run_id_stamp(now: Timestamp) -> String {
    now.to_zoned(TimeZone::UTC)
        .strftime("%Y%m%d-%H%M%S")
        .to_string()
}
