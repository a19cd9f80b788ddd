//! Risk-gated confirmation.
//!
//! The gate is a small state machine between classification and execution:
//! every plan starts PENDING and must reach CONFIRMED before the executor
//! sees it. LOW plans auto-confirm only under an explicit auto-approve flag;
//! MEDIUM plans need an explicit confirmation; HIGH plans need a
//! distinguishable "I understand the risk" acknowledgment and default to
//! REJECTED everywhere else, including unattended mode.

use log::warn;

use crate::error::Result;
use crate::models::{Plan, RiskLevel};

/// How a user answered a confirmation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgment {
    /// A plain confirmation ("yes")
    Plain,

    /// An explicit risk acknowledgment; the only answer that can confirm a
    /// HIGH plan
    RiskUnderstood,
}

/// Source of interactive confirmation decisions.
///
/// `Ok(None)` means the user declined (or the prompt timed out). Unattended
/// callers pass no prompt at all, which forbids confirmation of MEDIUM and
/// HIGH plans.
pub trait ConfirmationPrompt {
    /// Ask the user to confirm the plan.
    fn request(&mut self, plan: &Plan) -> Result<Option<Acknowledgment>>;
}

/// Confirmation states. Only [`GateState::Confirmed`] plans reach the
/// executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    /// Awaiting a decision
    #[default]
    Pending,

    /// Cleared for execution
    Confirmed,

    /// Blocked; the run terminates with a rejected result
    Rejected,
}

/// Outcome of gating a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Plan may execute
    Confirmed,

    /// Plan is blocked; the reason is persisted with the rejected result
    Rejected { reason: String },
}

impl GateDecision {
    fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Terminal gate state this decision transitions to.
    pub fn state(&self) -> GateState {
        match self {
            Self::Confirmed => GateState::Confirmed,
            Self::Rejected { .. } => GateState::Rejected,
        }
    }
}

/// Applies the risk policy to a classified plan.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfirmationGate {
    auto_approve: bool,
}

impl ConfirmationGate {
    /// Create a gate; `auto_approve` lets LOW plans proceed without a prompt.
    pub fn new(auto_approve: bool) -> Self {
        Self { auto_approve }
    }

    /// Decide whether a plan may execute.
    ///
    /// Passing `None` for the prompt means the caller runs unattended; only
    /// LOW plans under auto-approve can be confirmed that way.
    pub fn decide(
        &self,
        plan: &Plan,
        prompt: Option<&mut dyn ConfirmationPrompt>,
    ) -> Result<GateDecision> {
        match (plan.risk_level, prompt) {
            (RiskLevel::Low, _) if self.auto_approve => Ok(GateDecision::Confirmed),
            (RiskLevel::Low | RiskLevel::Medium, Some(prompt)) => {
                match prompt.request(plan)? {
                    Some(_) => Ok(GateDecision::Confirmed),
                    None => Ok(GateDecision::rejected(format!(
                        "{} risk plan declined by user",
                        plan.risk_level
                    ))),
                }
            }
            (RiskLevel::High, Some(prompt)) => match prompt.request(plan)? {
                // A plain confirm is insufficient for HIGH.
                Some(Acknowledgment::RiskUnderstood) => Ok(GateDecision::Confirmed),
                Some(Acknowledgment::Plain) | None => {
                    Ok(GateDecision::rejected(high_rejection_reason(plan)))
                }
            },
            (RiskLevel::High, None) => {
                warn!("rejecting HIGH risk plan in unattended mode");
                Ok(GateDecision::rejected(high_rejection_reason(plan)))
            }
            (level, None) => Ok(GateDecision::rejected(format!(
                "{level} risk plan requires explicit confirmation, none available in unattended mode"
            ))),
        }
    }
}

/// Rejection reason for HIGH plans, naming the offending command token where
/// one exists so the trace records why the run was blocked.
fn high_rejection_reason(plan: &Plan) -> String {
    let offending = plan.steps.iter().find_map(|step| {
        step.inputs
            .get("cmd")
            .and_then(serde_json::Value::as_str)
            .and_then(|cmd| cmd.split_whitespace().next())
            .map(str::to_string)
    });

    match offending {
        Some(token) => format!(
            "HIGH risk plan rejected: requires explicit risk acknowledgment (offending command token: '{token}')"
        ),
        None => "HIGH risk plan rejected: requires explicit risk acknowledgment".to_string(),
    }
}
