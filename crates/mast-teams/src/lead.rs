use std::collections::HashSet;

use chrono::Utc;
use uuid::Uuid;

use mast_models::message::InboxMessage;
use mast_models::plan::ExecutionPlan;
use mast_models::strategy::TeamType;
use mast_models::task::{SpecialistType, TaskInputs, TaskStatus, TeamTask, REQUIRED_SPECIALISTS};

/// The single master team coordinating every cycle.
pub const MASTER_TEAM_ID: &str = "master-01";
pub const MASTER_TEAM_NAME: &str = "Master Desk";

struct TaskTemplate {
    specialist_type: SpecialistType,
    objective: &'static str,
    timeout_ms: u64,
    priority: u32,
}

fn templates_for(team_type: TeamType) -> [TaskTemplate; 4] {
    match team_type {
        TeamType::Trend => [
            TaskTemplate {
                specialist_type: SpecialistType::MarketAnalyst,
                objective: "assess trend strength, volatility structure and directional consistency",
                timeout_ms: 1200,
                priority: 1,
            },
            TaskTemplate {
                specialist_type: SpecialistType::SignalValidator,
                objective: "validate signal quality and confidence interval",
                timeout_ms: 1000,
                priority: 2,
            },
            TaskTemplate {
                specialist_type: SpecialistType::RiskAnalyst,
                objective: "assess position risk and potential drawdown",
                timeout_ms: 1000,
                priority: 3,
            },
            TaskTemplate {
                specialist_type: SpecialistType::ExecutionPlanner,
                objective: "produce execution pacing and slippage control advice",
                timeout_ms: 900,
                priority: 4,
            },
        ],
        TeamType::Arbitrage => [
            TaskTemplate {
                specialist_type: SpecialistType::MarketAnalyst,
                objective: "assess spread persistence and volatility risk",
                timeout_ms: 1100,
                priority: 1,
            },
            TaskTemplate {
                specialist_type: SpecialistType::SignalValidator,
                objective: "verify spread thresholds and fill conditions",
                timeout_ms: 1000,
                priority: 2,
            },
            TaskTemplate {
                specialist_type: SpecialistType::RiskAnalyst,
                objective: "review capital usage and correlation risk",
                timeout_ms: 1000,
                priority: 3,
            },
            TaskTemplate {
                specialist_type: SpecialistType::ExecutionPlanner,
                objective: "determine order sequencing and cancellation policy",
                timeout_ms: 900,
                priority: 4,
            },
        ],
        TeamType::MarketMaking => [
            TaskTemplate {
                specialist_type: SpecialistType::MarketAnalyst,
                objective: "assess book depth, spread and short-term liquidity",
                timeout_ms: 1000,
                priority: 1,
            },
            TaskTemplate {
                specialist_type: SpecialistType::SignalValidator,
                objective: "validate quote direction and signal stability",
                timeout_ms: 900,
                priority: 2,
            },
            TaskTemplate {
                specialist_type: SpecialistType::RiskAnalyst,
                objective: "check inventory risk and one-sided exposure",
                timeout_ms: 900,
                priority: 3,
            },
            TaskTemplate {
                specialist_type: SpecialistType::ExecutionPlanner,
                objective: "plan quote and cancel pacing with protection thresholds",
                timeout_ms: 900,
                priority: 4,
            },
        ],
    }
}

/// Build the cycle's task plan from the team-type template. All tasks start
/// `pending`; timeouts are advisory metadata only.
pub fn build_task_plan(cycle_id: Uuid, team_id: &str, plan: &ExecutionPlan) -> Vec<TeamTask> {
    let now = Utc::now();
    templates_for(plan.team_type)
        .into_iter()
        .enumerate()
        .map(|(index, template)| TeamTask {
            task_id: format!(
                "{}_{}_{}_{}",
                cycle_id.simple(),
                team_id,
                template.specialist_type.as_str(),
                index + 1
            ),
            cycle_id,
            team_id: team_id.to_string(),
            specialist_type: template.specialist_type,
            objective: template.objective.to_string(),
            inputs: TaskInputs {
                symbol: plan.symbol.clone(),
                side: plan.side,
                leverage: plan.leverage,
                margin_usdt: plan.margin_usdt,
                signal_summary: plan.signal_summary.clone(),
            },
            timeout_ms: template.timeout_ms,
            priority: template.priority,
            status: TaskStatus::Pending,
            result_summary: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        })
        .collect()
}

/// One line summarizing what the lead collected this cycle.
pub fn summarize_lead_conclusion(
    team_name: &str,
    plan: &ExecutionPlan,
    messages: &[InboxMessage],
) -> String {
    let specialist_count = messages
        .iter()
        .map(|message| message.specialist_type)
        .collect::<HashSet<_>>()
        .len();
    format!(
        "{team_name} collected {specialist_count}/{} specialist replies; candidate {} {}, leverage {}x, margin {} USDT",
        REQUIRED_SPECIALISTS.len(),
        plan.symbol,
        plan.side.as_str(),
        plan.leverage,
        plan.margin_usdt.round_dp(2)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mast_models::plan::{OrderAction, TradeSide};
    use mast_models::strategy::StrategySource;
    use rust_decimal_macros::dec;

    fn plan(team_type: TeamType) -> ExecutionPlan {
        ExecutionPlan {
            team_id: MASTER_TEAM_ID.to_string(),
            team_name: MASTER_TEAM_NAME.to_string(),
            team_type,
            symbol: "BTC".to_string(),
            side: TradeSide::Long,
            action: OrderAction::Open,
            leverage: 4,
            margin_usdt: dec!(20),
            signal_summary: "BTC 24h change 1.80%".to_string(),
            decision_text: "test".to_string(),
            confidence: dec!(0.68),
            reward_risk_ratio: dec!(1.56),
            strategy_name: "trend_follow_master".to_string(),
            strategy_source: StrategySource::Builtin,
        }
    }

    #[test]
    fn task_plan_covers_all_specialists_in_priority_order() {
        let cycle_id = Uuid::new_v4();
        let tasks = build_task_plan(cycle_id, MASTER_TEAM_ID, &plan(TeamType::Trend));

        assert_eq!(tasks.len(), 4);
        let types: Vec<SpecialistType> = tasks.iter().map(|t| t.specialist_type).collect();
        assert_eq!(types, REQUIRED_SPECIALISTS);
        for (index, task) in tasks.iter().enumerate() {
            assert_eq!(task.priority, index as u32 + 1);
            assert_eq!(task.status, TaskStatus::Pending);
            assert!(task.task_id.contains(task.specialist_type.as_str()));
            assert_eq!(task.cycle_id, cycle_id);
        }
    }

    #[test]
    fn trend_templates_carry_advisory_timeouts() {
        let tasks = build_task_plan(Uuid::new_v4(), MASTER_TEAM_ID, &plan(TeamType::Trend));
        assert_eq!(tasks[0].timeout_ms, 1200);
        assert_eq!(tasks[3].timeout_ms, 900);
    }

    #[test]
    fn market_making_templates_differ() {
        let tasks = build_task_plan(
            Uuid::new_v4(),
            MASTER_TEAM_ID,
            &plan(TeamType::MarketMaking),
        );
        assert!(tasks[0].objective.contains("book depth"));
        assert_eq!(tasks[0].timeout_ms, 1000);
    }

    #[test]
    fn lead_conclusion_counts_distinct_specialists() {
        let plan = plan(TeamType::Trend);
        let conclusion = summarize_lead_conclusion(MASTER_TEAM_NAME, &plan, &[]);
        assert!(conclusion.contains("0/4"));
        assert!(conclusion.contains("BTC long"));
    }
}
