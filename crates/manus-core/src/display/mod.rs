//! Display formatting for plans, runs and traces.
//!
//! Domain models carry `Display` implementations that render markdown;
//! wrapper types add context-specific framing (a plan shown for
//! confirmation, a finished run shown as a report, a trace shown for
//! inspection). All formatters produce markdown so the CLI can render
//! them richly or print them verbatim with colors disabled.
//!
//! ## Module Organization
//!
//! - [`datetime`]: Timestamp formatting in the system timezone
//! - [`models`]: Display implementations for domain models
//! - [`report`]: Wrapper types (PlanPreview, RunReport, TraceView)

pub mod datetime;
pub mod models;
pub mod report;

// Re-export commonly used types for convenience
pub use datetime::LocalDateTime;
pub use report::{PlanPreview, RunReport, TraceView};
