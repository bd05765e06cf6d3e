//! End-to-end cycle scenarios on an in-memory store and mock exchange.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use mast_models::config::MastConfig;
use mast_models::gate::{GateName, RiskVerdict};
use mast_models::plan::TradeSide;
use mast_models::record::{CycleStatus, OrderStatus};
use mast_models::strategy::{SafetyMode, StrategySource};
use mast_models::task::TaskStatus;
use mast_store::SqliteStore;
use mast_teams::runtime::CycleRuntime;
use mast_teams::test_support::MockExchange;

fn runtime_with(
    store: Arc<SqliteStore>,
    exchange: MockExchange,
    config: MastConfig,
) -> CycleRuntime {
    CycleRuntime::new(store, Arc::new(exchange), config)
}

#[tokio::test]
async fn approved_cycle_executes_and_persists_full_audit_trail() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    store
        .set_active_objective("Steady growth, controlled drawdown")
        .unwrap();
    let runtime = runtime_with(store.clone(), MockExchange::new(), MastConfig::default());

    let cycle = runtime.run_cycle().await;

    assert_eq!(cycle.status, CycleStatus::Completed);
    assert_eq!(cycle.orders_count, 1);
    assert_eq!(cycle.errors_count, 0);

    // Decision: low-risk objective picks the builtin trend strategy on BTC.
    let decisions = store.list_recent_decisions(10).unwrap();
    assert_eq!(decisions.len(), 1);
    let decision = &decisions[0];
    assert_eq!(decision.cycle_id, cycle.cycle_id);
    assert_eq!(decision.risk_verdict, RiskVerdict::Pass);
    assert_eq!(decision.selected_strategy, "trend_follow_master");
    assert_eq!(decision.strategy_source, StrategySource::Builtin);
    assert_eq!(decision.tasks_summary.succeeded, 4);
    // change +2.0% -> confidence 0.62 + 2/40 = 0.67
    assert_eq!(decision.confidence, dec!(0.67));
    assert!(decision.objective_id.is_some());

    // Position: low risk margin = max(10, 200*0.08) * 0.7 = 11.2 at 3x long.
    let positions = store.list_open_positions().unwrap();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].symbol, "BTC");
    assert_eq!(positions[0].side, TradeSide::Long);
    assert_eq!(positions[0].leverage, 3);
    assert_eq!(positions[0].margin_used, dec!(11.2));
    assert_eq!(store.active_margin_used().unwrap(), dec!(11.2));

    // Order filled.
    let orders = store.list_recent_orders(10).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatus::Filled);

    // Tasks all succeeded; gate trail fully green including simulation.
    let tasks = store.list_tasks_for_cycle(cycle.cycle_id).unwrap();
    assert_eq!(tasks.len(), 4);
    assert!(tasks.iter().all(|t| t.status == TaskStatus::Succeeded));
    let gates = store.list_gate_results(cycle.cycle_id).unwrap();
    assert_eq!(gates.len(), 5);
    assert!(gates.iter().all(|g| g.passed));
    assert_eq!(gates.last().unwrap().gate, GateName::Simulation);

    // Trace captured with the execution payload.
    let trace = store.get_cycle_trace(cycle.cycle_id).unwrap().unwrap();
    assert_eq!(trace.status, CycleStatus::Completed);
    assert_eq!(trace.tasks.len(), 4);
    assert_eq!(trace.inbox.len(), 4);
    assert_eq!(trace.gates.len(), 5);
    assert_eq!(
        trace.execution.unwrap().get("success"),
        Some(&serde_json::Value::Bool(true))
    );
}

#[tokio::test]
async fn ephemeral_strategy_auto_rejected_under_manual_confirm() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    store
        .set_active_objective("go aggressive for high yield")
        .unwrap();
    let mut config = MastConfig::default();
    config.master.safety_mode = SafetyMode::ManualConfirm;
    let runtime = runtime_with(store.clone(), MockExchange::new(), config);

    let cycle = runtime.run_cycle().await;

    // The cycle itself completes; the rejection is a normal outcome.
    assert_eq!(cycle.status, CycleStatus::Completed);
    assert_eq!(cycle.orders_count, 0);
    assert_eq!(cycle.errors_count, 0);

    let decisions = store.list_recent_decisions(10).unwrap();
    assert_eq!(decisions[0].risk_verdict, RiskVerdict::Reject);
    assert_eq!(decisions[0].strategy_source, StrategySource::Ephemeral);
    assert!(decisions[0].risk_reason.contains("manual confirmation"));

    assert!(store.list_recent_orders(10).unwrap().is_empty());
    assert!(store.list_open_positions().unwrap().is_empty());
    assert_eq!(store.count_risk_events().unwrap(), 1);

    let gates = store.list_gate_results(cycle.cycle_id).unwrap();
    assert_eq!(gates.last().unwrap().gate, GateName::ManualConfirm);
    assert!(!gates.last().unwrap().passed);
}

#[tokio::test]
async fn legacy_symbol_is_proposed_but_never_executed() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    store.set_active_objective("focus on BTC").unwrap();
    store
        .insert_legacy_position("BTC", TradeSide::Long, dec!(1.5))
        .unwrap();
    let exchange = MockExchange::new().with_position("BTC_USDT", dec!(1.5));
    let runtime = runtime_with(store.clone(), exchange, MastConfig::default());

    let cycle = runtime.run_cycle().await;

    assert_eq!(cycle.status, CycleStatus::Completed);
    assert_eq!(cycle.orders_count, 0);

    // Candidate generation proposed BTC, the risk gate isolated it.
    let decisions = store.list_recent_decisions(10).unwrap();
    assert_eq!(decisions[0].risk_verdict, RiskVerdict::Reject);
    assert!(decisions[0].risk_reason.contains("legacy"));
    assert!(decisions[0]
        .rationale
        .candidates
        .iter()
        .any(|c| c.symbol == "BTC"));

    assert!(store.list_recent_orders(10).unwrap().is_empty());
    assert_eq!(store.count_risk_events().unwrap(), 1);
}

#[tokio::test]
async fn stale_legacy_row_does_not_block_execution() {
    // Legacy store says BTC is open, but the exchange shows it flat; the
    // two-source intersection must not isolate it.
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    store.set_active_objective("focus on BTC").unwrap();
    store
        .insert_legacy_position("BTC", TradeSide::Long, dec!(1.5))
        .unwrap();
    let exchange = MockExchange::new().with_position("BTC_USDT", Decimal::ZERO);
    let runtime = runtime_with(store.clone(), exchange, MastConfig::default());

    let cycle = runtime.run_cycle().await;

    assert_eq!(cycle.orders_count, 1);
    let decisions = store.list_recent_decisions(10).unwrap();
    assert_eq!(decisions[0].risk_verdict, RiskVerdict::Pass);
}

#[tokio::test]
async fn budget_exhaustion_rejects_regardless_of_plan_quality() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    store
        .set_active_objective("Steady growth, controlled drawdown")
        .unwrap();
    // Another team already consumed the whole budget.
    store
        .upsert_position(&mast_models::record::Position {
            team_id: "trend-02".to_string(),
            symbol: "ETH".to_string(),
            side: TradeSide::Long,
            quantity: dec!(10),
            entry_price: dec!(3300),
            leverage: 4,
            margin_used: dec!(200),
            opened_at: chrono::Utc::now(),
            status: mast_models::record::PositionStatus::Open,
        })
        .unwrap();
    let runtime = runtime_with(store.clone(), MockExchange::new(), MastConfig::default());

    let cycle = runtime.run_cycle().await;

    assert_eq!(cycle.orders_count, 0);
    let decisions = store.list_recent_decisions(10).unwrap();
    assert_eq!(decisions[0].risk_verdict, RiskVerdict::Reject);
    assert!(decisions[0].risk_reason.contains("budget pool exhausted"));
}

#[tokio::test]
async fn execution_failure_is_isolated_and_counted() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    store
        .set_active_objective("Steady growth, controlled drawdown")
        .unwrap();
    let runtime = runtime_with(
        store.clone(),
        MockExchange::new().failing_orders(),
        MastConfig::default(),
    );

    let cycle = runtime.run_cycle().await;

    assert_eq!(cycle.status, CycleStatus::Completed);
    assert_eq!(cycle.orders_count, 0);
    assert_eq!(cycle.errors_count, 1);

    let orders = store.list_recent_orders(10).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatus::Rejected);
    assert!(orders[0].order_id.starts_with("failed_"));
    assert!(store.list_open_positions().unwrap().is_empty());
}

#[tokio::test]
async fn top_level_failure_records_a_failed_cycle() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let runtime = runtime_with(
        store.clone(),
        MockExchange::new().failing_positions(),
        MastConfig::default(),
    );

    let cycle = runtime.run_cycle().await;

    assert_eq!(cycle.status, CycleStatus::Failed);
    assert_eq!(cycle.errors_count, 1);

    // The failed cycle is persisted and the next one still runs.
    let cycles = store.list_recent_cycles(10).unwrap();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].status, CycleStatus::Failed);
}

#[tokio::test]
async fn missing_objective_defaults_to_conservative_preset() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let runtime = runtime_with(store.clone(), MockExchange::new(), MastConfig::default());

    let cycle = runtime.run_cycle().await;

    assert_eq!(cycle.status, CycleStatus::Completed);
    let decisions = store.list_recent_decisions(10).unwrap();
    assert!(decisions[0].objective_id.is_none());
    assert_eq!(
        decisions[0].rationale.objective_summary,
        mast_models::objective::DEFAULT_OBJECTIVE_TEXT
    );
}

#[tokio::test]
async fn negative_change_flips_the_side_bias() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    store
        .set_active_objective("Steady growth, controlled drawdown")
        .unwrap();
    let runtime = runtime_with(
        store.clone(),
        MockExchange::new().with_change(dec!(-3.0)),
        MastConfig::default(),
    );

    runtime.run_cycle().await;

    // Low-risk bias is long; a falling market flips it short.
    let positions = store.list_open_positions().unwrap();
    assert_eq!(positions[0].side, TradeSide::Short);
}
