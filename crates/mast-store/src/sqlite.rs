use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use uuid::Uuid;

use mast_models::gate::{GateName, GateResult, RiskVerdict};
use mast_models::message::InboxMessage;
use mast_models::objective::{Objective, ObjectiveStatus};
use mast_models::plan::{OrderAction, TradeSide};
use mast_models::record::{
    Cycle, CycleStatus, CycleTrace, Decision, OrderRecord, OrderStatus, Position, PositionStatus,
    RiskEvent,
};
use mast_models::schema::STORE_DDL;
use mast_models::strategy::StrategySource;
use mast_models::task::{SpecialistType, TaskStatus, TeamTask};

use crate::error::StoreError;

/// SQLite-backed storage port for MAST.
///
/// The connection is wrapped in a `Mutex` since `rusqlite::Connection` is not
/// `Sync`; only one cycle runs at a time, so contention is negligible.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file. Enables WAL journal mode so a
    /// dashboard process can read while a cycle writes.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(STORE_DDL)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database for testing.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(STORE_DDL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    // ---- objectives -------------------------------------------------------

    /// Archive any active objective and insert the new one with the next
    /// lineage version, in one transaction. At most one row stays `active`.
    pub fn set_active_objective(&self, text: &str) -> Result<Objective, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = Utc::now();

        tx.execute(
            "UPDATE objectives SET status = 'archived', updated_at = ?1 WHERE status = 'active'",
            rusqlite::params![now],
        )?;

        let version: i64 = tx.query_row(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM objectives",
            [],
            |row| row.get(0),
        )?;

        let objective = Objective {
            objective_id: Uuid::new_v4(),
            text: text.to_string(),
            status: ObjectiveStatus::Active,
            version,
            created_at: now,
            updated_at: now,
        };

        tx.execute(
            "INSERT INTO objectives (objective_id, text, status, version, created_at, updated_at) \
             VALUES (?1, ?2, 'active', ?3, ?4, ?5)",
            rusqlite::params![
                objective.objective_id.to_string(),
                objective.text,
                objective.version,
                objective.created_at,
                objective.updated_at,
            ],
        )?;
        tx.commit()?;
        Ok(objective)
    }

    pub fn active_objective(&self) -> Result<Option<Objective>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT objective_id, text, status, version, created_at, updated_at \
             FROM objectives WHERE status = 'active' ORDER BY version DESC LIMIT 1",
        )?;
        let row = stmt.query_row([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, DateTime<Utc>>(4)?,
                row.get::<_, DateTime<Utc>>(5)?,
            ))
        });

        match row {
            Ok((id, text, status, version, created_at, updated_at)) => Ok(Some(Objective {
                objective_id: parse_uuid("objective_id", &id)?,
                text,
                status: ObjectiveStatus::parse(&status)
                    .ok_or_else(|| StoreError::corrupt("status", status))?,
                version,
                created_at,
                updated_at,
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    // ---- positions --------------------------------------------------------

    /// Insert or replace the (team, symbol) position after a fill.
    pub fn upsert_position(&self, position: &Position) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO positions \
             (team_id, symbol, side, quantity, entry_price, leverage, margin_used, opened_at, status) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
             ON CONFLICT(team_id, symbol) DO UPDATE SET \
               side = excluded.side, \
               quantity = excluded.quantity, \
               entry_price = excluded.entry_price, \
               leverage = excluded.leverage, \
               margin_used = excluded.margin_used, \
               opened_at = excluded.opened_at, \
               status = excluded.status",
            rusqlite::params![
                position.team_id,
                position.symbol,
                position.side.as_str(),
                position.quantity.to_string(),
                position.entry_price.to_string(),
                position.leverage,
                position.margin_used.to_string(),
                position.opened_at,
                position.status.as_str(),
            ],
        )?;
        Ok(())
    }

    pub fn list_open_positions(&self) -> Result<Vec<Position>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT team_id, symbol, side, quantity, entry_price, leverage, margin_used, \
                    opened_at, status \
             FROM positions WHERE status = 'open'",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, u32>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, DateTime<Utc>>(7)?,
                    row.get::<_, String>(8)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(team_id, symbol, side, quantity, entry_price, leverage, margin, opened, status)| {
                    Ok(Position {
                        team_id,
                        symbol,
                        side: TradeSide::parse(&side)
                            .ok_or_else(|| StoreError::corrupt("side", side))?,
                        quantity: parse_decimal("quantity", &quantity)?,
                        entry_price: parse_decimal("entry_price", &entry_price)?,
                        leverage,
                        margin_used: parse_decimal("margin_used", &margin)?,
                        opened_at: opened,
                        status: PositionStatus::parse(&status)
                            .ok_or_else(|| StoreError::corrupt("status", status))?,
                    })
                },
            )
            .collect()
    }

    /// Sum of margin committed to open positions. Decimal columns are TEXT,
    /// so the sum is computed here rather than in SQL.
    pub fn active_margin_used(&self) -> Result<Decimal, StoreError> {
        Ok(self
            .list_open_positions()?
            .iter()
            .map(|p| p.margin_used)
            .sum())
    }

    pub fn list_team_open_positions(&self, team_id: &str) -> Result<Vec<Position>, StoreError> {
        Ok(self
            .list_open_positions()?
            .into_iter()
            .filter(|position| position.team_id == team_id)
            .collect())
    }

    pub fn team_open_position_count(&self, team_id: &str) -> Result<u32, StoreError> {
        let conn = self.lock()?;
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM positions WHERE team_id = ?1 AND status = 'open'",
            rusqlite::params![team_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ---- legacy subsystem -------------------------------------------------

    /// Symbols currently recorded open by the legacy trading subsystem. The
    /// caller intersects these with live exchange positions to build the
    /// isolation set (stale legacy rows alone must not block a symbol).
    pub fn legacy_open_symbols(&self) -> Result<HashSet<String>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached("SELECT symbol FROM legacy_positions")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(rows)
    }

    /// Record a legacy-subsystem position. Only the legacy writer and tests
    /// use this; MAST itself never trades these symbols.
    pub fn insert_legacy_position(
        &self,
        symbol: &str,
        side: TradeSide,
        size: Decimal,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO legacy_positions (symbol, side, size, opened_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![symbol, side.as_str(), size.to_string(), Utc::now()],
        )?;
        Ok(())
    }

    // ---- orders -----------------------------------------------------------

    pub fn insert_order(&self, order: &OrderRecord) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO orders \
             (order_id, team_id, symbol, side, action, price, quantity, status, exchange_raw, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                order.order_id,
                order.team_id,
                order.symbol,
                order.side.as_str(),
                order.action.as_str(),
                order.price.to_string(),
                order.quantity.to_string(),
                order.status.as_str(),
                serde_json::to_string(&order.exchange_raw)?,
                order.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn list_recent_orders(&self, limit: u32) -> Result<Vec<OrderRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT order_id, team_id, symbol, side, action, price, quantity, status, \
                    exchange_raw, created_at \
             FROM orders ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![limit], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                    row.get::<_, DateTime<Utc>>(9)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(order_id, team_id, symbol, side, action, price, quantity, status, raw, created)| {
                    Ok(OrderRecord {
                        order_id,
                        team_id,
                        symbol,
                        side: TradeSide::parse(&side)
                            .ok_or_else(|| StoreError::corrupt("side", side))?,
                        action: OrderAction::parse(&action)
                            .ok_or_else(|| StoreError::corrupt("action", action))?,
                        price: parse_decimal("price", &price)?,
                        quantity: parse_decimal("quantity", &quantity)?,
                        status: OrderStatus::parse(&status)
                            .ok_or_else(|| StoreError::corrupt("status", status))?,
                        exchange_raw: serde_json::from_str(&raw)?,
                        created_at: created,
                    })
                },
            )
            .collect()
    }

    // ---- decisions --------------------------------------------------------

    pub fn insert_decision(&self, decision: &Decision) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO decisions \
             (decision_id, team_id, cycle_id, signal_summary, decision_text, risk_verdict, \
              risk_reason, execution_result, confidence, reward_risk_ratio, tasks_summary, \
              objective_id, selected_strategy, strategy_source, rationale, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            rusqlite::params![
                decision.decision_id.to_string(),
                decision.team_id,
                decision.cycle_id.to_string(),
                decision.signal_summary,
                decision.decision_text,
                decision.risk_verdict.as_str(),
                decision.risk_reason,
                decision.execution_result,
                decision.confidence.to_string(),
                decision.reward_risk_ratio.to_string(),
                serde_json::to_string(&decision.tasks_summary)?,
                decision.objective_id.map(|id| id.to_string()),
                decision.selected_strategy,
                decision.strategy_source.as_str(),
                serde_json::to_string(&decision.rationale)?,
                decision.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn list_recent_decisions(&self, limit: u32) -> Result<Vec<Decision>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT decision_id, team_id, cycle_id, signal_summary, decision_text, risk_verdict, \
                    risk_reason, execution_result, confidence, reward_risk_ratio, tasks_summary, \
                    objective_id, selected_strategy, strategy_source, rationale, created_at \
             FROM decisions ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![limit], |row| {
                Ok(DecisionRow {
                    decision_id: row.get(0)?,
                    team_id: row.get(1)?,
                    cycle_id: row.get(2)?,
                    signal_summary: row.get(3)?,
                    decision_text: row.get(4)?,
                    risk_verdict: row.get(5)?,
                    risk_reason: row.get(6)?,
                    execution_result: row.get(7)?,
                    confidence: row.get(8)?,
                    reward_risk_ratio: row.get(9)?,
                    tasks_summary: row.get(10)?,
                    objective_id: row.get(11)?,
                    selected_strategy: row.get(12)?,
                    strategy_source: row.get(13)?,
                    rationale: row.get(14)?,
                    created_at: row.get(15)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(decision_from_row).collect()
    }

    // ---- tasks ------------------------------------------------------------

    pub fn insert_task(&self, task: &TeamTask) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO tasks \
             (task_id, cycle_id, team_id, specialist_type, objective, inputs, timeout_ms, \
              priority, status, result_summary, error_message, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            rusqlite::params![
                task.task_id,
                task.cycle_id.to_string(),
                task.team_id,
                task.specialist_type.as_str(),
                task.objective,
                serde_json::to_string(&task.inputs)?,
                task.timeout_ms,
                task.priority,
                task.status.as_str(),
                task.result_summary,
                task.error_message,
                task.created_at,
                task.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update a task's status. `result_summary`/`error_message` are kept
    /// as-is when `None` is passed.
    pub fn update_task_status(
        &self,
        task_id: &str,
        status: TaskStatus,
        result_summary: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE tasks SET status = ?2, \
               result_summary = COALESCE(?3, result_summary), \
               error_message = COALESCE(?4, error_message), \
               updated_at = ?5 \
             WHERE task_id = ?1",
            rusqlite::params![task_id, status.as_str(), result_summary, error_message, Utc::now()],
        )?;
        Ok(())
    }

    pub fn list_tasks_for_cycle(&self, cycle_id: Uuid) -> Result<Vec<TeamTask>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT task_id, cycle_id, team_id, specialist_type, objective, inputs, timeout_ms, \
                    priority, status, result_summary, error_message, created_at, updated_at \
             FROM tasks WHERE cycle_id = ?1 ORDER BY priority ASC",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![cycle_id.to_string()], |row| {
                Ok(TaskRow {
                    task_id: row.get(0)?,
                    cycle_id: row.get(1)?,
                    team_id: row.get(2)?,
                    specialist_type: row.get(3)?,
                    objective: row.get(4)?,
                    inputs: row.get(5)?,
                    timeout_ms: row.get(6)?,
                    priority: row.get(7)?,
                    status: row.get(8)?,
                    result_summary: row.get(9)?,
                    error_message: row.get(10)?,
                    created_at: row.get(11)?,
                    updated_at: row.get(12)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(task_from_row).collect()
    }

    // ---- inbox & gates ----------------------------------------------------

    pub fn insert_inbox_message(&self, message: &InboxMessage) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO inbox_messages \
             (message_id, cycle_id, team_id, task_id, specialist_type, opinion, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                message.message_id.to_string(),
                message.cycle_id.to_string(),
                message.team_id,
                message.task_id,
                message.specialist_type.as_str(),
                serde_json::to_string(&message.opinion)?,
                message.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn insert_gate_results(
        &self,
        cycle_id: Uuid,
        team_id: &str,
        results: &[GateResult],
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "INSERT INTO gate_results (cycle_id, team_id, gate, passed, reason, meta, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for result in results {
            stmt.execute(rusqlite::params![
                cycle_id.to_string(),
                team_id,
                result.gate.as_str(),
                result.passed,
                result.reason,
                serde_json::to_string(&result.meta)?,
                result.created_at,
            ])?;
        }
        Ok(())
    }

    pub fn list_gate_results(&self, cycle_id: Uuid) -> Result<Vec<GateResult>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT gate, passed, reason, meta, created_at \
             FROM gate_results WHERE cycle_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![cycle_id.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, bool>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, DateTime<Utc>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(gate, passed, reason, meta, created_at)| {
                Ok(GateResult {
                    gate: GateName::parse(&gate)
                        .ok_or_else(|| StoreError::corrupt("gate", gate))?,
                    passed,
                    reason,
                    meta: serde_json::from_str(&meta)?,
                    created_at,
                })
            })
            .collect()
    }

    // ---- cycles & traces --------------------------------------------------

    pub fn insert_cycle(&self, cycle: &Cycle) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO cycles \
             (cycle_id, started_at, finished_at, teams_count, orders_count, errors_count, status) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                cycle.cycle_id.to_string(),
                cycle.started_at,
                cycle.finished_at,
                cycle.teams_count,
                cycle.orders_count,
                cycle.errors_count,
                cycle.status.as_str(),
            ],
        )?;
        Ok(())
    }

    pub fn list_recent_cycles(&self, limit: u32) -> Result<Vec<Cycle>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT cycle_id, started_at, finished_at, teams_count, orders_count, errors_count, \
                    status \
             FROM cycles ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![limit], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, DateTime<Utc>>(1)?,
                    row.get::<_, DateTime<Utc>>(2)?,
                    row.get::<_, u32>(3)?,
                    row.get::<_, u32>(4)?,
                    row.get::<_, u32>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, started, finished, teams, orders, errors, status)| {
                Ok(Cycle {
                    cycle_id: parse_uuid("cycle_id", &id)?,
                    started_at: started,
                    finished_at: finished,
                    teams_count: teams,
                    orders_count: orders,
                    errors_count: errors,
                    status: CycleStatus::parse(&status)
                        .ok_or_else(|| StoreError::corrupt("status", status))?,
                })
            })
            .collect()
    }

    /// Insert or patch the trace for this (cycle, team). Re-upserts while the
    /// same cycle is still running update `finished_at`, status and the
    /// collaboration snapshots.
    pub fn upsert_cycle_trace(&self, trace: &CycleTrace) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO cycle_traces \
             (cycle_id, team_id, started_at, finished_at, status, lead_conclusion, tasks_json, \
              inbox_json, gates_json, execution_json) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) \
             ON CONFLICT(cycle_id, team_id) DO UPDATE SET \
               finished_at = excluded.finished_at, \
               status = excluded.status, \
               lead_conclusion = excluded.lead_conclusion, \
               tasks_json = excluded.tasks_json, \
               inbox_json = excluded.inbox_json, \
               gates_json = excluded.gates_json, \
               execution_json = excluded.execution_json",
            rusqlite::params![
                trace.cycle_id.to_string(),
                trace.team_id,
                trace.started_at,
                trace.finished_at,
                trace.status.as_str(),
                trace.lead_conclusion,
                serde_json::to_string(&trace.tasks)?,
                serde_json::to_string(&trace.inbox)?,
                serde_json::to_string(&trace.gates)?,
                trace
                    .execution
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
            ],
        )?;
        Ok(())
    }

    pub fn get_cycle_trace(&self, cycle_id: Uuid) -> Result<Option<CycleTrace>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT cycle_id, team_id, started_at, finished_at, status, lead_conclusion, \
                    tasks_json, inbox_json, gates_json, execution_json \
             FROM cycle_traces WHERE cycle_id = ?1 LIMIT 1",
        )?;
        let row = stmt.query_row(rusqlite::params![cycle_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, DateTime<Utc>>(2)?,
                row.get::<_, DateTime<Utc>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, String>(8)?,
                row.get::<_, Option<String>>(9)?,
            ))
        });

        match row {
            Ok((id, team_id, started, finished, status, conclusion, tasks, inbox, gates, exec)) => {
                Ok(Some(CycleTrace {
                    cycle_id: parse_uuid("cycle_id", &id)?,
                    team_id,
                    started_at: started,
                    finished_at: finished,
                    status: CycleStatus::parse(&status)
                        .ok_or_else(|| StoreError::corrupt("status", status))?,
                    lead_conclusion: conclusion,
                    tasks: serde_json::from_str(&tasks)?,
                    inbox: serde_json::from_str(&inbox)?,
                    gates: serde_json::from_str(&gates)?,
                    execution: exec.map(|e| serde_json::from_str(&e)).transpose()?,
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    // ---- risk events ------------------------------------------------------

    pub fn insert_risk_event(&self, event: &RiskEvent) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO risk_events \
             (event_id, team_id, symbol, rule_code, threshold, actual_value, action_taken, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                event.event_id.to_string(),
                event.team_id,
                event.symbol,
                event.rule_code,
                event.threshold,
                event.actual_value,
                event.action_taken,
                event.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn count_risk_events(&self) -> Result<u32, StoreError> {
        let conn = self.lock()?;
        let count: u32 = conn.query_row("SELECT COUNT(*) FROM risk_events", [], |row| row.get(0))?;
        Ok(count)
    }
}

struct DecisionRow {
    decision_id: String,
    team_id: String,
    cycle_id: String,
    signal_summary: String,
    decision_text: String,
    risk_verdict: String,
    risk_reason: String,
    execution_result: String,
    confidence: String,
    reward_risk_ratio: String,
    tasks_summary: String,
    objective_id: Option<String>,
    selected_strategy: String,
    strategy_source: String,
    rationale: String,
    created_at: DateTime<Utc>,
}

fn decision_from_row(row: DecisionRow) -> Result<Decision, StoreError> {
    Ok(Decision {
        decision_id: parse_uuid("decision_id", &row.decision_id)?,
        team_id: row.team_id,
        cycle_id: parse_uuid("cycle_id", &row.cycle_id)?,
        signal_summary: row.signal_summary,
        decision_text: row.decision_text,
        risk_verdict: RiskVerdict::parse(&row.risk_verdict)
            .ok_or_else(|| StoreError::corrupt("risk_verdict", row.risk_verdict.clone()))?,
        risk_reason: row.risk_reason,
        execution_result: row.execution_result,
        confidence: parse_decimal("confidence", &row.confidence)?,
        reward_risk_ratio: parse_decimal("reward_risk_ratio", &row.reward_risk_ratio)?,
        tasks_summary: serde_json::from_str(&row.tasks_summary)?,
        objective_id: row
            .objective_id
            .map(|id| parse_uuid("objective_id", &id))
            .transpose()?,
        selected_strategy: row.selected_strategy,
        strategy_source: StrategySource::parse(&row.strategy_source)
            .ok_or_else(|| StoreError::corrupt("strategy_source", row.strategy_source.clone()))?,
        rationale: serde_json::from_str(&row.rationale)?,
        created_at: row.created_at,
    })
}

struct TaskRow {
    task_id: String,
    cycle_id: String,
    team_id: String,
    specialist_type: String,
    objective: String,
    inputs: String,
    timeout_ms: u64,
    priority: u32,
    status: String,
    result_summary: Option<String>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn task_from_row(row: TaskRow) -> Result<TeamTask, StoreError> {
    Ok(TeamTask {
        task_id: row.task_id,
        cycle_id: parse_uuid("cycle_id", &row.cycle_id)?,
        team_id: row.team_id,
        specialist_type: SpecialistType::parse(&row.specialist_type)
            .ok_or_else(|| StoreError::corrupt("specialist_type", row.specialist_type.clone()))?,
        objective: row.objective,
        inputs: serde_json::from_str(&row.inputs)?,
        timeout_ms: row.timeout_ms,
        priority: row.priority,
        status: TaskStatus::parse(&row.status)
            .ok_or_else(|| StoreError::corrupt("status", row.status.clone()))?,
        result_summary: row.result_summary,
        error_message: row.error_message,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn parse_decimal(column: &'static str, value: &str) -> Result<Decimal, StoreError> {
    value
        .parse::<Decimal>()
        .map_err(|_| StoreError::corrupt(column, value))
}

fn parse_uuid(column: &'static str, value: &str) -> Result<Uuid, StoreError> {
    value
        .parse::<Uuid>()
        .map_err(|_| StoreError::corrupt(column, value))
}
