use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::strategy::{StrategySource, TeamType};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Long,
    Short,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Long => "long",
            TradeSide::Short => "short",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "long" => Some(TradeSide::Long),
            "short" => Some(TradeSide::Short),
            _ => None,
        }
    }

    /// The opposite side, used when a negative 24h change flips the bias.
    pub fn flipped(&self) -> Self {
        match self {
            TradeSide::Long => TradeSide::Short,
            TradeSide::Short => TradeSide::Long,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    Open,
    Close,
}

impl OrderAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderAction::Open => "open",
            OrderAction::Close => "close",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(OrderAction::Open),
            "close" => Some(OrderAction::Close),
            _ => None,
        }
    }
}

/// A strategy candidate resolved into a concrete, gateable action.
///
/// Immutable once the gate chain starts; gates only narrow `margin_usdt`,
/// never widen it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionPlan {
    pub team_id: String,
    pub team_name: String,
    pub team_type: TeamType,
    pub symbol: String,
    pub side: TradeSide,
    pub action: OrderAction,
    pub leverage: u32,
    pub margin_usdt: Decimal,
    pub signal_summary: String,
    pub decision_text: String,
    pub confidence: Decimal,
    pub reward_risk_ratio: Decimal,
    pub strategy_name: String,
    pub strategy_source: StrategySource,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn side_flip() {
        assert_eq!(TradeSide::Long.flipped(), TradeSide::Short);
        assert_eq!(TradeSide::Short.flipped(), TradeSide::Long);
    }

    #[test]
    fn side_serialization() {
        assert_eq!(serde_json::to_string(&TradeSide::Long).unwrap(), "\"long\"");
        assert_eq!(
            serde_json::to_string(&TradeSide::Short).unwrap(),
            "\"short\""
        );
    }

    #[test]
    fn roundtrip_execution_plan() {
        let plan = ExecutionPlan {
            team_id: "master-01".to_string(),
            team_name: "Master Desk".to_string(),
            team_type: TeamType::Trend,
            symbol: "BTC".to_string(),
            side: TradeSide::Long,
            action: OrderAction::Open,
            leverage: 4,
            margin_usdt: dec!(20),
            signal_summary: "BTC 24h change 1.80%, objective-driven strategy".to_string(),
            decision_text: "selected trend following, direction long".to_string(),
            confidence: dec!(0.68),
            reward_risk_ratio: dec!(1.56),
            strategy_name: "trend_follow_master".to_string(),
            strategy_source: StrategySource::Builtin,
        };

        let json = serde_json::to_string(&plan).unwrap();
        let deserialized: ExecutionPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(plan, deserialized);
    }
}
