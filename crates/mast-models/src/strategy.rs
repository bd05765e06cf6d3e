use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::objective::{RiskLevel, TimeframeHint};
use crate::plan::TradeSide;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TeamType {
    Trend,
    Arbitrage,
    MarketMaking,
}

impl TeamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamType::Trend => "trend",
            TeamType::Arbitrage => "arbitrage",
            TeamType::MarketMaking => "market_making",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "trend" => Some(TeamType::Trend),
            "arbitrage" => Some(TeamType::Arbitrage),
            "market_making" => Some(TeamType::MarketMaking),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategySource {
    Builtin,
    Ephemeral,
}

impl StrategySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategySource::Builtin => "builtin",
            StrategySource::Ephemeral => "ephemeral",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "builtin" => Some(StrategySource::Builtin),
            "ephemeral" => Some(StrategySource::Ephemeral),
            _ => None,
        }
    }
}

/// Generation parameters carried by a candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyParams {
    pub risk_level: RiskLevel,
    pub timeframe_hint: TimeframeHint,
    /// The raw objective text, kept only for ephemeral candidates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_text: Option<String>,
}

/// One candidate strategy. Candidates are regenerated every cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyCandidate {
    pub name: String,
    pub label: String,
    pub source: StrategySource,
    pub team_type: TeamType,
    pub symbol: String,
    pub side_bias: TradeSide,
    pub score: Decimal,
    pub rationale: String,
    /// Nominal remaining lifetime for ephemeral candidates.
    /// TODO: expiry is carried through the audit trail but not yet enforced
    /// by the cycle runtime (candidates are regenerated every cycle anyway).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_cycles: Option<u32>,
    pub params: StrategyParams,
}

/// Safety mode applied after the primary gate chain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SafetyMode {
    RiskOnly,
    RiskPlusSimulation,
    ManualConfirm,
}

impl SafetyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyMode::RiskOnly => "risk_only",
            SafetyMode::RiskPlusSimulation => "risk_plus_simulation",
            SafetyMode::ManualConfirm => "manual_confirm",
        }
    }
}

/// Why a strategy was selected, persisted with the decision record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyRationale {
    pub objective_summary: String,
    pub parsed_constraints: Vec<String>,
    pub candidates: Vec<StrategyCandidate>,
    pub selection_reason: String,
    pub safety_mode: SafetyMode,
    pub gate_summary: String,
}
