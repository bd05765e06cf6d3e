use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{error, info, warn};
use uuid::Uuid;

use mast_models::config::MastConfig;
use mast_models::gate::RiskVerdict;
use mast_models::message::InboxMessage;
use mast_models::objective::RiskLevel;
use mast_models::plan::{ExecutionPlan, OrderAction};
use mast_models::record::{
    Cycle, CycleStatus, CycleTrace, Decision, OrderRecord, OrderStatus, Position, PositionStatus,
    RiskEvent,
};
use mast_models::task::{TaskStatus, TeamTask};
use mast_store::SqliteStore;

use crate::board::CollaborationBoard;
use crate::error::TeamsError;
use crate::exchange::ExchangeClient;
use crate::execution::execute_plan_order;
use crate::gates::run_gates;
use crate::lead::{build_task_plan, summarize_lead_conclusion, MASTER_TEAM_ID, MASTER_TEAM_NAME};
use crate::objective::interpret;
use crate::specialists::run_specialist;
use crate::strategy::{
    choose_strategy, generate_candidates, legacy_isolation_set, BudgetSnapshot,
};

/// Sequences one full decision cycle end to end and persists the audit
/// trail. One runtime is shared by the scheduler and manual triggers.
pub struct CycleRuntime {
    store: Arc<SqliteStore>,
    exchange: Arc<dyn ExchangeClient>,
    config: MastConfig,
}

impl CycleRuntime {
    pub fn new(
        store: Arc<SqliteStore>,
        exchange: Arc<dyn ExchangeClient>,
        config: MastConfig,
    ) -> Self {
        Self {
            store,
            exchange,
            config,
        }
    }

    /// Run one cycle. Never fails: any error is caught, recorded as a
    /// `failed` cycle and swallowed so the next tick can still run.
    pub async fn run_cycle(&self) -> Cycle {
        let cycle_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(cycle_id = %cycle_id, "cycle started");

        match self.run_cycle_inner(cycle_id, started_at).await {
            Ok(cycle) => {
                info!(
                    cycle_id = %cycle_id,
                    orders = cycle.orders_count,
                    errors = cycle.errors_count,
                    "cycle completed"
                );
                cycle
            }
            Err(e) => {
                error!(cycle_id = %cycle_id, error = %e, "cycle failed");
                let cycle = Cycle {
                    cycle_id,
                    started_at,
                    finished_at: Utc::now(),
                    teams_count: 1,
                    orders_count: 0,
                    errors_count: 1,
                    status: CycleStatus::Failed,
                };
                if let Err(e) = self.store.insert_cycle(&cycle) {
                    error!(cycle_id = %cycle_id, error = %e, "failed to record failed cycle");
                }
                cycle
            }
        }
    }

    async fn run_cycle_inner(
        &self,
        cycle_id: Uuid,
        started_at: chrono::DateTime<Utc>,
    ) -> Result<Cycle, TeamsError> {
        // Snapshot shared state once per cycle.
        let objective = self.store.active_objective()?;
        let open_positions = self.store.list_open_positions()?;
        let exchange_positions = self.exchange.positions().await?;
        let legacy_store_symbols = self.store.legacy_open_symbols()?;

        let profile = interpret(objective.as_ref().map(|o| o.text.as_str()));
        let candidates =
            generate_candidates(&profile, self.config.master.allow_ephemeral_strategy);
        let (selected, mut rationale) =
            choose_strategy(&profile, candidates, self.config.master.safety_mode);

        // Resolve the candidate into a concrete plan off the live ticker.
        let contract = format!("{}_USDT", selected.symbol);
        let ticker = self.exchange.ticker(&contract).await?;
        let change = ticker.change_percentage_24h;
        let side = if change >= Decimal::ZERO {
            selected.side_bias
        } else {
            selected.side_bias.flipped()
        };

        let max_budget = Decimal::from(self.config.risk.max_budget_usdt);
        let margin_base = dec!(10).max(max_budget * dec!(0.08));
        let margin_usdt = match profile.risk_level {
            RiskLevel::Low => margin_base * dec!(0.7),
            RiskLevel::Medium => margin_base,
            RiskLevel::High => margin_base * dec!(1.2),
        };
        let leverage = match profile.risk_level {
            RiskLevel::Low => 3,
            RiskLevel::Medium => 4,
            RiskLevel::High => 6,
        };
        let confidence = dec!(0.9).min(dec!(0.62) + change.abs() / dec!(40)).round_dp(2);
        let reward_risk_ratio = (selected.score / dec!(50)).round_dp(2);

        let plan = ExecutionPlan {
            team_id: MASTER_TEAM_ID.to_string(),
            team_name: MASTER_TEAM_NAME.to_string(),
            team_type: selected.team_type,
            symbol: selected.symbol.clone(),
            side,
            action: OrderAction::Open,
            leverage,
            margin_usdt,
            signal_summary: format!(
                "{} 24h change {}%, objective-driven strategy",
                selected.symbol,
                change.round_dp(2)
            ),
            decision_text: format!("selected {}, direction {}", selected.label, side.as_str()),
            confidence,
            reward_risk_ratio,
            strategy_name: selected.name.clone(),
            strategy_source: selected.source,
        };

        // Collaboration phase: spawn the board and run each specialist task.
        let tasks = build_task_plan(cycle_id, MASTER_TEAM_ID, &plan);
        let mut board = CollaborationBoard::new(tasks);
        for task in board.list_tasks() {
            self.store.insert_task(&task)?;
        }
        for task in board.list_tasks() {
            self.execute_task(&mut board, &task, &plan, cycle_id);
        }

        let messages = board.messages();
        let lead_conclusion = summarize_lead_conclusion(MASTER_TEAM_NAME, &plan, &messages);

        // Gate phase against the budget snapshot.
        let active_margin_used: Decimal =
            open_positions.iter().map(|p| p.margin_used).sum();
        let snapshot = BudgetSnapshot {
            active_margin_used,
            max_budget_usdt: max_budget,
            team_open_positions: self.store.team_open_position_count(MASTER_TEAM_ID)?,
            max_team_positions: self.config.risk.max_team_positions,
            max_leverage: self.config.risk.max_leverage,
            legacy_symbols: legacy_isolation_set(&exchange_positions, &legacy_store_symbols),
        };
        let outcome = run_gates(&plan, &messages, &snapshot, self.config.master.safety_mode);
        for result in &outcome.results {
            board.push_gate_result(result.clone());
        }
        self.store
            .insert_gate_results(cycle_id, MASTER_TEAM_ID, &outcome.results)?;
        rationale.gate_summary = format!("{}: {}", outcome.verdict.as_str(), outcome.reason);

        // Execution phase.
        let mut orders_count = 0;
        let mut errors_count = 0;
        let mut execution_result = "not executed".to_string();
        let mut execution_payload =
            serde_json::json!({ "success": false, "message": outcome.reason.clone() });

        if outcome.verdict != RiskVerdict::Reject {
            let execution = execute_plan_order(
                &plan,
                outcome.adjusted_margin_usdt,
                self.exchange.as_ref(),
            )
            .await;
            execution_result = execution.message.clone();
            self.store.insert_order(&OrderRecord {
                order_id: execution.order_id.clone(),
                team_id: plan.team_id.clone(),
                symbol: plan.symbol.clone(),
                side: plan.side,
                action: plan.action,
                price: execution.price,
                quantity: execution.quantity,
                status: if execution.success {
                    OrderStatus::Filled
                } else {
                    OrderStatus::Rejected
                },
                exchange_raw: execution.exchange_raw.clone(),
                created_at: Utc::now(),
            })?;

            if execution.success {
                orders_count += 1;
                self.store.upsert_position(&Position {
                    team_id: plan.team_id.clone(),
                    symbol: plan.symbol.clone(),
                    side: plan.side,
                    quantity: execution.quantity,
                    entry_price: execution.price,
                    leverage: plan.leverage,
                    margin_used: outcome.adjusted_margin_usdt,
                    opened_at: Utc::now(),
                    status: PositionStatus::Open,
                })?;
            } else {
                errors_count += 1;
            }
            execution_payload = serde_json::to_value(&execution)?;
        } else {
            self.store.insert_risk_event(&RiskEvent {
                event_id: Uuid::new_v4(),
                team_id: plan.team_id.clone(),
                symbol: plan.symbol.clone(),
                rule_code: "MASTER_GATE_REJECT".to_string(),
                threshold: format!(
                    "safety_mode={}",
                    self.config.master.safety_mode.as_str()
                ),
                actual_value: outcome.reason.clone(),
                action_taken: "skip_execution".to_string(),
                created_at: Utc::now(),
            })?;
        }

        // Audit phase.
        self.store.insert_decision(&Decision {
            decision_id: Uuid::new_v4(),
            team_id: plan.team_id.clone(),
            cycle_id,
            signal_summary: plan.signal_summary.clone(),
            decision_text: plan.decision_text.clone(),
            risk_verdict: outcome.verdict,
            risk_reason: outcome.reason.clone(),
            execution_result,
            confidence: plan.confidence,
            reward_risk_ratio: plan.reward_risk_ratio,
            tasks_summary: board.status_counts(),
            objective_id: objective.as_ref().map(|o| o.objective_id),
            selected_strategy: plan.strategy_name.clone(),
            strategy_source: plan.strategy_source,
            rationale,
            created_at: Utc::now(),
        })?;

        let finished_at = Utc::now();
        self.store.upsert_cycle_trace(&CycleTrace {
            cycle_id,
            team_id: plan.team_id.clone(),
            started_at,
            finished_at,
            status: CycleStatus::Completed,
            lead_conclusion,
            tasks: board.list_tasks(),
            inbox: board.messages(),
            gates: board.gate_results(),
            execution: Some(execution_payload),
        })?;

        let cycle = Cycle {
            cycle_id,
            started_at,
            finished_at,
            teams_count: 1,
            orders_count,
            errors_count,
            status: CycleStatus::Completed,
        };
        self.store.insert_cycle(&cycle)?;
        Ok(cycle)
    }

    /// Run one specialist task. Failures are isolated to the task: the board
    /// and store record the error and the schema gate surfaces the missing
    /// opinion later.
    fn execute_task(
        &self,
        board: &mut CollaborationBoard,
        task: &TeamTask,
        plan: &ExecutionPlan,
        cycle_id: Uuid,
    ) {
        board.update_task(&task.task_id, TaskStatus::Running, None, None);
        if let Err(e) = self
            .store
            .update_task_status(&task.task_id, TaskStatus::Running, None, None)
        {
            warn!(task_id = %task.task_id, error = %e, "failed to mark task running");
        }

        let reply = run_specialist(task, plan);
        let message = InboxMessage {
            message_id: Uuid::new_v4(),
            cycle_id,
            team_id: task.team_id.clone(),
            task_id: task.task_id.clone(),
            specialist_type: task.specialist_type,
            opinion: reply.opinion,
            created_at: Utc::now(),
        };

        match self.deliver(&message, &task.task_id, &reply.summary) {
            Ok(()) => {
                board.push_message(message);
                board.update_task(
                    &task.task_id,
                    TaskStatus::Succeeded,
                    Some(reply.summary),
                    None,
                );
            }
            Err(e) => {
                warn!(task_id = %task.task_id, error = %e, "specialist task failed");
                board.update_task(
                    &task.task_id,
                    TaskStatus::Failed,
                    None,
                    Some(e.to_string()),
                );
                if let Err(e) = self.store.update_task_status(
                    &task.task_id,
                    TaskStatus::Failed,
                    None,
                    Some(&e.to_string()),
                ) {
                    warn!(task_id = %task.task_id, error = %e, "failed to mark task failed");
                }
            }
        }
    }

    fn deliver(
        &self,
        message: &InboxMessage,
        task_id: &str,
        summary: &str,
    ) -> Result<(), TeamsError> {
        self.store.insert_inbox_message(message)?;
        self.store
            .update_task_status(task_id, TaskStatus::Succeeded, Some(summary), None)?;
        Ok(())
    }
}
