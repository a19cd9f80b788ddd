//! Risk tier enumeration.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Risk tier of a plan, derived from its steps and never user-settable.
///
/// The ordering is significant: tiers combine by taking the maximum, so
/// `Low < Medium < High` must hold.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default, Hash,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// Read-only operations or writes confined to the workspace
    #[default]
    Low,

    /// Overwrite-mode or batch writes inside the workspace
    Medium,

    /// Deletion, moves, disallowed commands, or paths outside the workspace
    High,
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOW" => Ok(RiskLevel::Low),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "HIGH" => Ok(RiskLevel::High),
            _ => Err(format!("Invalid risk level: {s}")),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl RiskLevel {
    /// Convert to the wire string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}
