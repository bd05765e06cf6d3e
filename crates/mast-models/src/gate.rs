use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GateName {
    Schema,
    Risk,
    Budget,
    ExecutionSafety,
    Simulation,
    ManualConfirm,
}

impl GateName {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateName::Schema => "schema",
            GateName::Risk => "risk",
            GateName::Budget => "budget",
            GateName::ExecutionSafety => "execution_safety",
            GateName::Simulation => "simulation",
            GateName::ManualConfirm => "manual_confirm",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "schema" => Some(GateName::Schema),
            "risk" => Some(GateName::Risk),
            "budget" => Some(GateName::Budget),
            "execution_safety" => Some(GateName::ExecutionSafety),
            "simulation" => Some(GateName::Simulation),
            "manual_confirm" => Some(GateName::ManualConfirm),
            _ => None,
        }
    }
}

/// Outcome of one gate, appended to the cycle's audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GateResult {
    pub gate: GateName,
    pub passed: bool,
    pub reason: String,
    pub meta: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskVerdict {
    Pass,
    Reduce,
    Reject,
}

impl RiskVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskVerdict::Pass => "pass",
            RiskVerdict::Reduce => "reduce",
            RiskVerdict::Reject => "reject",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pass" => Some(RiskVerdict::Pass),
            "reduce" => Some(RiskVerdict::Reduce),
            "reject" => Some(RiskVerdict::Reject),
            _ => None,
        }
    }
}

/// Result of the risk/budget assessor.
///
/// `adjusted_margin_usdt` is zero iff the verdict is `reject`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub verdict: RiskVerdict,
    pub reason: String,
    pub adjusted_margin_usdt: Decimal,
}
