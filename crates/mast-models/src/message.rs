use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::plan::{OrderAction, TradeSide};
use crate::task::SpecialistType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignalQuality {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Staged,
    SingleMarket,
}

/// Structured specialist opinion, one variant per specialist role.
///
/// Serialized (tagged by `specialist`) only at the storage boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "specialist", rename_all = "snake_case")]
pub enum SpecialistOpinion {
    MarketAnalyst {
        trend_strength: Decimal,
        direction: TradeSide,
        symbol: String,
    },
    SignalValidator {
        signal_quality: SignalQuality,
        validated_confidence: Decimal,
        reward_risk_ratio: Decimal,
    },
    RiskAnalyst {
        risk_score: Decimal,
        suggested_scale: Decimal,
        max_leverage: u32,
    },
    ExecutionPlanner {
        execution_mode: ExecutionMode,
        max_slippage_bps: u32,
        action: OrderAction,
    },
}

impl SpecialistOpinion {
    /// Which specialist role this opinion belongs to.
    pub fn specialist_type(&self) -> SpecialistType {
        match self {
            SpecialistOpinion::MarketAnalyst { .. } => SpecialistType::MarketAnalyst,
            SpecialistOpinion::SignalValidator { .. } => SpecialistType::SignalValidator,
            SpecialistOpinion::RiskAnalyst { .. } => SpecialistType::RiskAnalyst,
            SpecialistOpinion::ExecutionPlanner { .. } => SpecialistType::ExecutionPlanner,
        }
    }
}

/// One opinion delivered to the collaboration board, keyed by (cycle, task).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InboxMessage {
    pub message_id: Uuid,
    pub cycle_id: Uuid,
    pub team_id: String,
    pub task_id: String,
    pub specialist_type: SpecialistType,
    pub opinion: SpecialistOpinion,
    pub created_at: DateTime<Utc>,
}
