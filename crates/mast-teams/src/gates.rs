use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

use mast_models::gate::{GateName, GateResult, RiskVerdict};
use mast_models::message::InboxMessage;
use mast_models::plan::ExecutionPlan;
use mast_models::strategy::{SafetyMode, StrategySource};
use mast_models::task::REQUIRED_SPECIALISTS;

use crate::strategy::{assess_candidate_risk, BudgetSnapshot, MIN_VIABLE_MARGIN_USDT};

/// Final verdict of the gate chain for one plan.
#[derive(Debug, Clone)]
pub struct GateOutcome {
    pub verdict: RiskVerdict,
    pub reason: String,
    pub adjusted_margin_usdt: Decimal,
    pub results: Vec<GateResult>,
}

/// Run the full gate chain over a plan.
///
/// The primary chain (schema → risk → budget → execution-safety) is
/// fail-fast: a failing gate ends it immediately with a `reject` verdict,
/// zero margin and the partial result list. The safety-mode gate is then
/// always evaluated and appended; its failure downgrades a non-reject verdict
/// to `reject` but never upgrades a reject.
pub fn run_gates(
    plan: &ExecutionPlan,
    messages: &[InboxMessage],
    snapshot: &BudgetSnapshot,
    safety_mode: SafetyMode,
) -> GateOutcome {
    let mut outcome = primary_chain(plan, messages, snapshot);

    let safety = safety_mode_gate(safety_mode, plan);
    let safety_failed = !safety.passed;
    let safety_reason = safety.reason.clone();
    outcome.results.push(safety);

    if safety_failed && outcome.verdict != RiskVerdict::Reject {
        outcome.verdict = RiskVerdict::Reject;
        outcome.reason = safety_reason;
        outcome.adjusted_margin_usdt = Decimal::ZERO;
    }

    outcome
}

fn primary_chain(
    plan: &ExecutionPlan,
    messages: &[InboxMessage],
    snapshot: &BudgetSnapshot,
) -> GateOutcome {
    let mut results = Vec::new();

    let (schema_passed, schema_reason) = schema_gate(messages);
    results.push(gate_result(
        GateName::Schema,
        schema_passed,
        &schema_reason,
        json!({ "message_count": messages.len() }),
    ));
    if !schema_passed {
        return rejected(schema_reason, results);
    }

    let assessment = assess_candidate_risk(plan, snapshot);
    let risk_passed = assessment.verdict != RiskVerdict::Reject;
    results.push(gate_result(
        GateName::Risk,
        risk_passed,
        &assessment.reason,
        json!({ "adjusted_margin_usdt": assessment.adjusted_margin_usdt }),
    ));
    if !risk_passed {
        return rejected(assessment.reason, results);
    }

    let remaining = snapshot.max_budget_usdt - snapshot.active_margin_used;
    if remaining <= Decimal::ZERO {
        let reason = "budget pool exhausted".to_string();
        results.push(gate_result(
            GateName::Budget,
            false,
            &reason,
            json!({ "remaining": remaining }),
        ));
        return rejected(reason, results);
    }
    let capped = assessment.adjusted_margin_usdt.min(remaining);
    if capped < MIN_VIABLE_MARGIN_USDT {
        let reason = format!(
            "available budget below minimum margin {} USDT",
            MIN_VIABLE_MARGIN_USDT
        );
        results.push(gate_result(
            GateName::Budget,
            false,
            &reason,
            json!({ "remaining": remaining, "capped": capped }),
        ));
        return rejected(reason, results);
    }
    let was_capped = capped < assessment.adjusted_margin_usdt;
    results.push(gate_result(
        GateName::Budget,
        true,
        if was_capped {
            "margin capped to remaining budget"
        } else {
            "budget check passed"
        },
        json!({ "adjusted_margin_usdt": capped, "capped": was_capped }),
    ));

    if let Some(reason) = execution_safety_violation(plan, capped, snapshot.max_leverage) {
        results.push(gate_result(GateName::ExecutionSafety, false, &reason, json!({})));
        return rejected(reason, results);
    }
    results.push(gate_result(
        GateName::ExecutionSafety,
        true,
        "execution safety checks passed",
        json!({}),
    ));

    let verdict = if capped < plan.margin_usdt {
        RiskVerdict::Reduce
    } else {
        RiskVerdict::Pass
    };
    GateOutcome {
        verdict,
        reason: match verdict {
            RiskVerdict::Reduce => "approved with reduced margin".to_string(),
            _ => "passed risk and execution gates".to_string(),
        },
        adjusted_margin_usdt: capped,
        results,
    }
}

/// Every required specialist must have submitted exactly one opinion, and
/// the opinion variant must match the declared specialist type.
fn schema_gate(messages: &[InboxMessage]) -> (bool, String) {
    for required in REQUIRED_SPECIALISTS {
        let count = messages
            .iter()
            .filter(|message| message.specialist_type == required)
            .count();
        if count == 0 {
            return (
                false,
                format!("missing specialist reply: {}", required.as_str()),
            );
        }
        if count > 1 {
            return (
                false,
                format!("duplicate specialist reply: {}", required.as_str()),
            );
        }
    }

    for message in messages {
        if message.opinion.specialist_type() != message.specialist_type {
            return (
                false,
                format!(
                    "malformed specialist reply: {}",
                    message.specialist_type.as_str()
                ),
            );
        }
    }

    (true, "all specialist replies present".to_string())
}

fn execution_safety_violation(
    plan: &ExecutionPlan,
    adjusted_margin: Decimal,
    max_leverage: u32,
) -> Option<String> {
    if plan.leverage == 0 || plan.leverage > max_leverage {
        return Some(format!("leverage out of bounds: {}", plan.leverage));
    }
    let symbol_ok =
        !plan.symbol.is_empty() && plan.symbol.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    if !symbol_ok {
        return Some(format!("invalid symbol format: {}", plan.symbol));
    }
    if adjusted_margin <= Decimal::ZERO {
        return Some("invalid execution margin".to_string());
    }
    None
}

fn safety_mode_gate(mode: SafetyMode, plan: &ExecutionPlan) -> GateResult {
    match mode {
        SafetyMode::RiskOnly => gate_result(
            GateName::Simulation,
            true,
            "risk-only mode, simulation skipped",
            json!({ "mode": mode.as_str() }),
        ),
        SafetyMode::RiskPlusSimulation => {
            let passed = plan.confidence >= dec!(0.6);
            gate_result(
                GateName::Simulation,
                passed,
                if passed {
                    "simulation gate passed"
                } else {
                    "simulation gate failed: confidence below 0.6"
                },
                json!({ "mode": mode.as_str(), "confidence": plan.confidence }),
            )
        }
        SafetyMode::ManualConfirm => {
            let passed = plan.strategy_source == StrategySource::Builtin;
            gate_result(
                GateName::ManualConfirm,
                passed,
                if passed {
                    "builtin strategy requires no manual confirmation"
                } else {
                    "ephemeral strategy requires manual confirmation, auto-rejected"
                },
                json!({
                    "mode": mode.as_str(),
                    "strategy_source": plan.strategy_source.as_str(),
                }),
            )
        }
    }
}

fn rejected(reason: String, results: Vec<GateResult>) -> GateOutcome {
    GateOutcome {
        verdict: RiskVerdict::Reject,
        reason,
        adjusted_margin_usdt: Decimal::ZERO,
        results,
    }
}

fn gate_result(
    gate: GateName,
    passed: bool,
    reason: &str,
    meta: serde_json::Value,
) -> GateResult {
    GateResult {
        gate,
        passed,
        reason: reason.to_string(),
        meta,
        created_at: Utc::now(),
    }
}
