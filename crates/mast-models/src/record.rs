use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gate::{GateResult, RiskVerdict};
use crate::message::InboxMessage;
use crate::plan::{OrderAction, TradeSide};
use crate::strategy::{StrategyRationale, StrategySource};
use crate::task::{TaskStatusCounts, TeamTask};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Open,
    Closed,
}

impl PositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Open => "open",
            PositionStatus::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(PositionStatus::Open),
            "closed" => Some(PositionStatus::Closed),
            _ => None,
        }
    }
}

/// One position per (team, symbol), upserted on fill. The sum of
/// `margin_used` over open positions is the shared budget consumption.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub team_id: String,
    pub symbol: String,
    pub side: TradeSide,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub leverage: u32,
    pub margin_used: Decimal,
    pub opened_at: DateTime<Utc>,
    pub status: PositionStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Filled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Filled => "filled",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(OrderStatus::Pending),
            "filled" => Some(OrderStatus::Filled),
            "cancelled" => Some(OrderStatus::Cancelled),
            "rejected" => Some(OrderStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRecord {
    pub order_id: String,
    pub team_id: String,
    pub symbol: String,
    pub side: TradeSide,
    pub action: OrderAction,
    pub price: Decimal,
    pub quantity: Decimal,
    pub status: OrderStatus,
    pub exchange_raw: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Full audit record for one cycle's decision. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    pub decision_id: Uuid,
    pub team_id: String,
    pub cycle_id: Uuid,
    pub signal_summary: String,
    pub decision_text: String,
    pub risk_verdict: RiskVerdict,
    pub risk_reason: String,
    pub execution_result: String,
    pub confidence: Decimal,
    pub reward_risk_ratio: Decimal,
    pub tasks_summary: TaskStatusCounts,
    pub objective_id: Option<Uuid>,
    pub selected_strategy: String,
    pub strategy_source: StrategySource,
    pub rationale: StrategyRationale,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    Running,
    Completed,
    Failed,
}

impl CycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleStatus::Running => "running",
            CycleStatus::Completed => "completed",
            CycleStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "running" => Some(CycleStatus::Running),
            "completed" => Some(CycleStatus::Completed),
            "failed" => Some(CycleStatus::Failed),
            _ => None,
        }
    }
}

/// Summary row for one end-to-end cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cycle {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub teams_count: u32,
    pub orders_count: u32,
    pub errors_count: u32,
    pub status: CycleStatus,
}

/// Full collaboration snapshot for one (cycle, team), upserted while the
/// cycle is still running to patch `finished_at`/status/execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleTrace {
    pub cycle_id: Uuid,
    pub team_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: CycleStatus,
    pub lead_conclusion: String,
    pub tasks: Vec<TeamTask>,
    pub inbox: Vec<InboxMessage>,
    pub gates: Vec<GateResult>,
    pub execution: Option<serde_json::Value>,
}

/// Audit entry recorded whenever a plan is declined.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskEvent {
    pub event_id: Uuid,
    pub team_id: String,
    pub symbol: String,
    pub rule_code: String,
    pub threshold: String,
    pub actual_value: String,
    pub action_taken: String,
    pub created_at: DateTime<Utc>,
}
