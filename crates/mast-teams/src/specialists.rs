use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use mast_models::message::{ExecutionMode, SignalQuality, SpecialistOpinion};
use mast_models::plan::ExecutionPlan;
use mast_models::strategy::TeamType;
use mast_models::task::{SpecialistType, TeamTask};

/// One specialist's answer: a human-readable summary plus the structured
/// opinion delivered to the collaboration board.
#[derive(Debug, Clone)]
pub struct SpecialistReply {
    pub summary: String,
    pub opinion: SpecialistOpinion,
}

/// Run the advisor for the task's specialist role. Pure and total: every
/// formula is clamped to explicit bounds and cannot fail on a well-formed
/// plan.
pub fn run_specialist(task: &TeamTask, plan: &ExecutionPlan) -> SpecialistReply {
    match task.specialist_type {
        SpecialistType::MarketAnalyst => market_analyst(plan),
        SpecialistType::SignalValidator => signal_validator(plan),
        SpecialistType::RiskAnalyst => risk_analyst(plan),
        SpecialistType::ExecutionPlanner => execution_planner(plan),
    }
}

fn market_analyst(plan: &ExecutionPlan) -> SpecialistReply {
    let trend_strength = dec!(0.95).min(dec!(0.55) + plan.confidence * dec!(0.4));
    SpecialistReply {
        summary: format!(
            "trend strength {}%",
            (trend_strength * dec!(100)).round_dp(1)
        ),
        opinion: SpecialistOpinion::MarketAnalyst {
            trend_strength,
            direction: plan.side,
            symbol: plan.symbol.clone(),
        },
    }
}

fn signal_validator(plan: &ExecutionPlan) -> SpecialistReply {
    let validated_confidence = plan.confidence.clamp(dec!(0.45), dec!(0.95));
    let signal_quality = if validated_confidence >= dec!(0.7) {
        SignalQuality::High
    } else {
        SignalQuality::Medium
    };
    let quality_label = match signal_quality {
        SignalQuality::High => "high",
        SignalQuality::Medium => "medium",
    };
    SpecialistReply {
        summary: format!(
            "signal quality {quality_label}, confidence {}",
            validated_confidence.round_dp(2)
        ),
        opinion: SpecialistOpinion::SignalValidator {
            signal_quality,
            validated_confidence,
            reward_risk_ratio: plan.reward_risk_ratio,
        },
    }
}

fn risk_analyst(plan: &ExecutionPlan) -> SpecialistReply {
    let risk_score =
        (Decimal::from(plan.leverage * 8) + plan.margin_usdt / dec!(4)).round_dp(2);
    let suggested_scale = if risk_score > dec!(70) {
        dec!(0.6)
    } else if risk_score > dec!(45) {
        dec!(0.8)
    } else {
        Decimal::ONE
    };
    SpecialistReply {
        summary: format!("risk score {risk_score}, suggested scale {suggested_scale}"),
        opinion: SpecialistOpinion::RiskAnalyst {
            risk_score,
            suggested_scale,
            max_leverage: plan.leverage,
        },
    }
}

fn execution_planner(plan: &ExecutionPlan) -> SpecialistReply {
    let max_slippage_bps = if plan.team_type == TeamType::MarketMaking {
        8
    } else {
        15
    };
    let execution_mode = if plan.team_type == TeamType::Arbitrage {
        ExecutionMode::Staged
    } else {
        ExecutionMode::SingleMarket
    };
    let mode_label = match execution_mode {
        ExecutionMode::Staged => "staged",
        ExecutionMode::SingleMarket => "single_market",
    };
    SpecialistReply {
        summary: format!("execution mode {mode_label}, max slippage {max_slippage_bps}bps"),
        opinion: SpecialistOpinion::ExecutionPlanner {
            execution_mode,
            max_slippage_bps,
            action: plan.action,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mast_models::plan::{OrderAction, TradeSide};
    use mast_models::strategy::StrategySource;
    use mast_models::task::{TaskInputs, TaskStatus};
    use uuid::Uuid;

    fn plan(team_type: TeamType, confidence: Decimal, leverage: u32, margin: Decimal) -> ExecutionPlan {
        ExecutionPlan {
            team_id: "master-01".to_string(),
            team_name: "Master Desk".to_string(),
            team_type,
            symbol: "BTC".to_string(),
            side: TradeSide::Long,
            action: OrderAction::Open,
            leverage,
            margin_usdt: margin,
            signal_summary: "test".to_string(),
            decision_text: "test".to_string(),
            confidence,
            reward_risk_ratio: dec!(1.5),
            strategy_name: "trend_follow_master".to_string(),
            strategy_source: StrategySource::Builtin,
        }
    }

    fn task(specialist_type: SpecialistType) -> TeamTask {
        TeamTask {
            task_id: "t1".to_string(),
            cycle_id: Uuid::new_v4(),
            team_id: "master-01".to_string(),
            specialist_type,
            objective: "test".to_string(),
            inputs: TaskInputs {
                symbol: "BTC".to_string(),
                side: TradeSide::Long,
                leverage: 4,
                margin_usdt: dec!(20),
                signal_summary: "test".to_string(),
            },
            timeout_ms: 1000,
            priority: 1,
            status: TaskStatus::Running,
            result_summary: None,
            error_message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn market_analyst_trend_strength_is_capped() {
        let reply = run_specialist(
            &task(SpecialistType::MarketAnalyst),
            &plan(TeamType::Trend, dec!(0.99), 4, dec!(20)),
        );
        match reply.opinion {
            SpecialistOpinion::MarketAnalyst { trend_strength, .. } => {
                assert_eq!(trend_strength, dec!(0.95));
            }
            other => panic!("unexpected opinion: {other:?}"),
        }
    }

    #[test]
    fn market_analyst_formula() {
        let reply = run_specialist(
            &task(SpecialistType::MarketAnalyst),
            &plan(TeamType::Trend, dec!(0.7), 4, dec!(20)),
        );
        match reply.opinion {
            SpecialistOpinion::MarketAnalyst { trend_strength, .. } => {
                assert_eq!(trend_strength, dec!(0.83));
            }
            other => panic!("unexpected opinion: {other:?}"),
        }
    }

    #[test]
    fn signal_validator_clamps_confidence() {
        let low = run_specialist(
            &task(SpecialistType::SignalValidator),
            &plan(TeamType::Trend, dec!(0.1), 4, dec!(20)),
        );
        match low.opinion {
            SpecialistOpinion::SignalValidator {
                validated_confidence,
                signal_quality,
                ..
            } => {
                assert_eq!(validated_confidence, dec!(0.45));
                assert_eq!(signal_quality, SignalQuality::Medium);
            }
            other => panic!("unexpected opinion: {other:?}"),
        }

        let high = run_specialist(
            &task(SpecialistType::SignalValidator),
            &plan(TeamType::Trend, dec!(0.99), 4, dec!(20)),
        );
        match high.opinion {
            SpecialistOpinion::SignalValidator {
                validated_confidence,
                signal_quality,
                ..
            } => {
                assert_eq!(validated_confidence, dec!(0.95));
                assert_eq!(signal_quality, SignalQuality::High);
            }
            other => panic!("unexpected opinion: {other:?}"),
        }
    }

    #[test]
    fn risk_analyst_scale_thresholds() {
        // leverage 6, margin 100 -> score 73 -> scale 0.6
        let hot = run_specialist(
            &task(SpecialistType::RiskAnalyst),
            &plan(TeamType::Trend, dec!(0.7), 6, dec!(100)),
        );
        match hot.opinion {
            SpecialistOpinion::RiskAnalyst {
                risk_score,
                suggested_scale,
                ..
            } => {
                assert_eq!(risk_score, dec!(73));
                assert_eq!(suggested_scale, dec!(0.6));
            }
            other => panic!("unexpected opinion: {other:?}"),
        }

        // leverage 5, margin 40 -> score 50 -> scale 0.8
        let warm = run_specialist(
            &task(SpecialistType::RiskAnalyst),
            &plan(TeamType::Trend, dec!(0.7), 5, dec!(40)),
        );
        match warm.opinion {
            SpecialistOpinion::RiskAnalyst { suggested_scale, .. } => {
                assert_eq!(suggested_scale, dec!(0.8));
            }
            other => panic!("unexpected opinion: {other:?}"),
        }

        // leverage 3, margin 20 -> score 29 -> scale 1.0
        let cool = run_specialist(
            &task(SpecialistType::RiskAnalyst),
            &plan(TeamType::Trend, dec!(0.7), 3, dec!(20)),
        );
        match cool.opinion {
            SpecialistOpinion::RiskAnalyst { suggested_scale, .. } => {
                assert_eq!(suggested_scale, Decimal::ONE);
            }
            other => panic!("unexpected opinion: {other:?}"),
        }
    }

    #[test]
    fn execution_planner_depends_on_team_type() {
        let mm = run_specialist(
            &task(SpecialistType::ExecutionPlanner),
            &plan(TeamType::MarketMaking, dec!(0.7), 4, dec!(20)),
        );
        match mm.opinion {
            SpecialistOpinion::ExecutionPlanner {
                max_slippage_bps,
                execution_mode,
                ..
            } => {
                assert_eq!(max_slippage_bps, 8);
                assert_eq!(execution_mode, ExecutionMode::SingleMarket);
            }
            other => panic!("unexpected opinion: {other:?}"),
        }

        let arb = run_specialist(
            &task(SpecialistType::ExecutionPlanner),
            &plan(TeamType::Arbitrage, dec!(0.7), 4, dec!(20)),
        );
        match arb.opinion {
            SpecialistOpinion::ExecutionPlanner {
                max_slippage_bps,
                execution_mode,
                ..
            } => {
                assert_eq!(max_slippage_bps, 15);
                assert_eq!(execution_mode, ExecutionMode::Staged);
            }
            other => panic!("unexpected opinion: {other:?}"),
        }
    }
}
