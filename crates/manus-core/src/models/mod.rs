//! Data models for plans, steps and execution traces.
//!
//! This module contains the core domain models of the agent: the immutable
//! [`Plan`] produced by a planner backend, the [`RiskLevel`] derived from its
//! steps, and the append-only [`TraceEntry`]/[`ExecutionResult`] records
//! produced by the executor. Display implementations live in
//! [`crate::display`] to keep data structures separate from presentation.

pub mod plan;
pub mod risk;
pub mod trace;


pub use plan::{Plan, Step};
pub use risk::RiskLevel;
pub use trace::{ExecutionResult, RunStatus, TraceEntry, TraceStatus};
