use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::plan::TradeSide;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SpecialistType {
    MarketAnalyst,
    SignalValidator,
    RiskAnalyst,
    ExecutionPlanner,
}

/// Every gate-relevant cycle requires one opinion from each of these.
pub const REQUIRED_SPECIALISTS: [SpecialistType; 4] = [
    SpecialistType::MarketAnalyst,
    SpecialistType::SignalValidator,
    SpecialistType::RiskAnalyst,
    SpecialistType::ExecutionPlanner,
];

impl SpecialistType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialistType::MarketAnalyst => "market_analyst",
            SpecialistType::SignalValidator => "signal_validator",
            SpecialistType::RiskAnalyst => "risk_analyst",
            SpecialistType::ExecutionPlanner => "execution_planner",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "market_analyst" => Some(SpecialistType::MarketAnalyst),
            "signal_validator" => Some(SpecialistType::SignalValidator),
            "risk_analyst" => Some(SpecialistType::RiskAnalyst),
            "execution_planner" => Some(SpecialistType::ExecutionPlanner),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
            TaskStatus::Skipped => "skipped",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(TaskStatus::Pending),
            "running" => Some(TaskStatus::Running),
            "succeeded" => Some(TaskStatus::Succeeded),
            "failed" => Some(TaskStatus::Failed),
            "skipped" => Some(TaskStatus::Skipped),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Skipped
        )
    }
}

/// The plan slice handed to a specialist, persisted with the task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskInputs {
    pub symbol: String,
    pub side: TradeSide,
    pub leverage: u32,
    pub margin_usdt: Decimal,
    pub signal_summary: String,
}

/// One specialist sub-task within a cycle.
///
/// Created `pending`, moved to `running` before invocation, terminates in
/// `succeeded` or `failed` and never reverts. `timeout_ms` is advisory
/// metadata for downstream monitoring; the runtime does not enforce it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamTask {
    pub task_id: String,
    pub cycle_id: Uuid,
    pub team_id: String,
    pub specialist_type: SpecialistType,
    pub objective: String,
    pub inputs: TaskInputs,
    pub timeout_ms: u64,
    pub priority: u32,
    pub status: TaskStatus,
    pub result_summary: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-status tally of a cycle's tasks.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskStatusCounts {
    pub pending: u32,
    pub running: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub skipped: u32,
}

impl TaskStatusCounts {
    pub fn record(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Pending => self.pending += 1,
            TaskStatus::Running => self.running += 1,
            TaskStatus::Succeeded => self.succeeded += 1,
            TaskStatus::Failed => self.failed += 1,
            TaskStatus::Skipped => self.skipped += 1,
        }
    }
}
