/// SQLite schema owned by the MAST store.
///
/// Decimal columns are TEXT (exact decimal strings); timestamps are RFC3339
/// TEXT. The `legacy_positions` table belongs to the independently-operated
/// legacy trading subsystem sharing the exchange account; MAST only reads its
/// symbols for the isolation set.
pub const STORE_DDL: &str = "\
CREATE TABLE IF NOT EXISTS objectives (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    objective_id  TEXT NOT NULL UNIQUE,
    text          TEXT NOT NULL,
    status        TEXT NOT NULL,
    version       INTEGER NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_objectives_status ON objectives(status);

CREATE TABLE IF NOT EXISTS positions (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    team_id      TEXT NOT NULL,
    symbol       TEXT NOT NULL,
    side         TEXT NOT NULL,
    quantity     TEXT NOT NULL,
    entry_price  TEXT NOT NULL,
    leverage     INTEGER NOT NULL,
    margin_used  TEXT NOT NULL,
    opened_at    TEXT NOT NULL,
    status       TEXT NOT NULL,
    UNIQUE(team_id, symbol)
);
CREATE INDEX IF NOT EXISTS idx_positions_status ON positions(status);

CREATE TABLE IF NOT EXISTS orders (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id      TEXT NOT NULL UNIQUE,
    team_id       TEXT NOT NULL,
    symbol        TEXT NOT NULL,
    side          TEXT NOT NULL,
    action        TEXT NOT NULL,
    price         TEXT NOT NULL,
    quantity      TEXT NOT NULL,
    status        TEXT NOT NULL,
    exchange_raw  TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS decisions (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    decision_id        TEXT NOT NULL UNIQUE,
    team_id            TEXT NOT NULL,
    cycle_id           TEXT NOT NULL,
    signal_summary     TEXT NOT NULL,
    decision_text      TEXT NOT NULL,
    risk_verdict       TEXT NOT NULL,
    risk_reason        TEXT NOT NULL,
    execution_result   TEXT NOT NULL,
    confidence         TEXT NOT NULL,
    reward_risk_ratio  TEXT NOT NULL,
    tasks_summary      TEXT NOT NULL,
    objective_id       TEXT,
    selected_strategy  TEXT NOT NULL,
    strategy_source    TEXT NOT NULL,
    rationale          TEXT NOT NULL,
    created_at         TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_decisions_cycle ON decisions(cycle_id);

CREATE TABLE IF NOT EXISTS tasks (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id         TEXT NOT NULL UNIQUE,
    cycle_id        TEXT NOT NULL,
    team_id         TEXT NOT NULL,
    specialist_type TEXT NOT NULL,
    objective       TEXT NOT NULL,
    inputs          TEXT NOT NULL,
    timeout_ms      INTEGER NOT NULL,
    priority        INTEGER NOT NULL,
    status          TEXT NOT NULL,
    result_summary  TEXT,
    error_message   TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tasks_cycle ON tasks(cycle_id);

CREATE TABLE IF NOT EXISTS inbox_messages (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    message_id      TEXT NOT NULL UNIQUE,
    cycle_id        TEXT NOT NULL,
    team_id         TEXT NOT NULL,
    task_id         TEXT NOT NULL,
    specialist_type TEXT NOT NULL,
    opinion         TEXT NOT NULL,
    created_at      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_inbox_cycle ON inbox_messages(cycle_id);

CREATE TABLE IF NOT EXISTS gate_results (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    cycle_id   TEXT NOT NULL,
    team_id    TEXT NOT NULL,
    gate       TEXT NOT NULL,
    passed     INTEGER NOT NULL,
    reason     TEXT NOT NULL,
    meta       TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_gate_results_cycle ON gate_results(cycle_id);

CREATE TABLE IF NOT EXISTS cycles (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    cycle_id      TEXT NOT NULL UNIQUE,
    started_at    TEXT NOT NULL,
    finished_at   TEXT NOT NULL,
    teams_count   INTEGER NOT NULL,
    orders_count  INTEGER NOT NULL,
    errors_count  INTEGER NOT NULL,
    status        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cycle_traces (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    cycle_id        TEXT NOT NULL,
    team_id         TEXT NOT NULL,
    started_at      TEXT NOT NULL,
    finished_at     TEXT NOT NULL,
    status          TEXT NOT NULL,
    lead_conclusion TEXT NOT NULL,
    tasks_json      TEXT NOT NULL,
    inbox_json      TEXT NOT NULL,
    gates_json      TEXT NOT NULL,
    execution_json  TEXT,
    UNIQUE(cycle_id, team_id)
);

CREATE TABLE IF NOT EXISTS risk_events (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id     TEXT NOT NULL UNIQUE,
    team_id      TEXT NOT NULL,
    symbol       TEXT NOT NULL,
    rule_code    TEXT NOT NULL,
    threshold    TEXT NOT NULL,
    actual_value TEXT NOT NULL,
    action_taken TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS legacy_positions (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol     TEXT NOT NULL,
    side       TEXT NOT NULL,
    size       TEXT NOT NULL,
    opened_at  TEXT NOT NULL
);
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ddl_covers_all_tables() {
        for table in [
            "objectives",
            "positions",
            "orders",
            "decisions",
            "tasks",
            "inbox_messages",
            "gate_results",
            "cycles",
            "cycle_traces",
            "risk_events",
            "legacy_positions",
        ] {
            assert!(
                STORE_DDL.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")),
                "missing table {table}"
            );
        }
    }
}
