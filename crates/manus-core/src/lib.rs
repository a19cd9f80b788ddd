//! Core library for the Manus task automation agent.
//!
//! This crate turns a natural-language task into a structured, auditable run:
//! a planner backend produces a candidate [`models::Plan`], the plan is schema
//! validated and risk classified, a confirmation gate decides whether it may
//! run, and the executor invokes sandboxed tools serially while appending an
//! immutable trace that can be replayed later.
//!
//! # Pipeline
//!
//! ```text
//! task ──▶ planner ──▶ validate ──▶ classify ──▶ gate ──▶ execute ──▶ trace
//! ```
//!
//! Every stage is fail-safe: planner output is untrusted until validated, the
//! risk tier is always derived (never planner-claimed), high-risk plans need a
//! distinguishable typed acknowledgment, and all file and shell activity is
//! confined to a single workspace root.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use manus_core::{
//!     executor::{ExecuteOptions, ExecutorBuilder},
//!     planner::{generate_plan, MockPlanner},
//!     tools::{FileTool, ShellTool, ToolRegistry},
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let workspace = std::env::current_dir()?;
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(Box::new(FileTool::new(&workspace)))?;
//! registry.register(Box::new(ShellTool::new(&workspace)))?;
//!
//! let planner = MockPlanner::new();
//! let plan = generate_plan(&planner, "summarize notes.txt", &workspace, &registry).await?;
//!
//! let executor = ExecutorBuilder::new(&workspace).build()?;
//! let result = executor
//!     .execute(&plan, &registry, &ExecuteOptions::default())
//!     .await?;
//! println!("run {} finished: {}", result.run_id, result.status);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod digest;
pub mod display;
pub mod error;
pub mod executor;
pub mod gate;
pub mod models;
pub mod planner;
pub mod refs;
pub mod risk;
pub mod store;
pub mod tools;
pub mod validate;

// Re-export commonly used types
pub use config::Settings;
pub use display::{LocalDateTime, PlanPreview, RunReport, TraceView};
pub use error::{AgentError, Result};
pub use executor::{CancelFlag, ExecuteOptions, Executor, ExecutorBuilder};
pub use gate::{Acknowledgment, ConfirmationGate, ConfirmationPrompt, GateDecision, GateState};
pub use models::{
    ExecutionResult, Plan, RiskLevel, RunStatus, Step, TraceEntry, TraceStatus,
};
pub use planner::{generate_plan, MockPlanner, Planner};
pub use store::{RunHandle, RunStore};
pub use tools::{FileTool, ShellTool, Tool, ToolOutput, ToolRegistry};
