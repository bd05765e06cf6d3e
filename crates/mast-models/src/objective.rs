use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fallback used whenever no objective row is active.
pub const DEFAULT_OBJECTIVE_TEXT: &str = "Steady growth, controlled drawdown";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveStatus {
    Active,
    Archived,
}

impl ObjectiveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectiveStatus::Active => "active",
            ObjectiveStatus::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(ObjectiveStatus::Active),
            "archived" => Some(ObjectiveStatus::Archived),
            _ => None,
        }
    }
}

/// The operator's standing objective. At most one row is `active` at a time;
/// setting a new one archives the previous and bumps the lineage version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Objective {
    pub objective_id: Uuid,
    pub text: String,
    pub status: ObjectiveStatus,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeframeHint {
    Short,
    Medium,
    Long,
}

impl TimeframeHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeframeHint::Short => "short",
            TimeframeHint::Medium => "medium",
            TimeframeHint::Long => "long",
        }
    }
}

/// Structured interpretation of the free-text objective.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectiveProfile {
    pub summary: String,
    pub raw: String,
    pub symbol_hint: Option<String>,
    pub risk_level: RiskLevel,
    pub timeframe_hint: TimeframeHint,
    pub constraints: Vec<String>,
}
