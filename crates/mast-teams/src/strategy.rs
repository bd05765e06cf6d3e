use std::collections::HashSet;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use mast_models::gate::{RiskAssessment, RiskVerdict};
use mast_models::objective::{ObjectiveProfile, RiskLevel, TimeframeHint};
use mast_models::plan::{ExecutionPlan, TradeSide};
use mast_models::strategy::{
    SafetyMode, StrategyCandidate, StrategyParams, StrategyRationale, StrategySource, TeamType,
};

use crate::exchange::ExchangePosition;

/// Margin below this is not worth opening a position for.
pub const MIN_VIABLE_MARGIN_USDT: Decimal = dec!(5);

/// Shared budget/position state read once per cycle.
#[derive(Debug, Clone)]
pub struct BudgetSnapshot {
    pub active_margin_used: Decimal,
    pub max_budget_usdt: Decimal,
    pub team_open_positions: u32,
    pub max_team_positions: u32,
    pub max_leverage: u32,
    /// Symbols held by the legacy subsystem, excluded from execution.
    pub legacy_symbols: HashSet<String>,
}

/// Build the per-cycle candidate set: one builtin per team archetype, plus an
/// objective-driven ephemeral candidate when allowed. Sorted by score
/// descending; ties keep insertion order (trend, arbitrage, market-making,
/// ephemeral).
pub fn generate_candidates(
    profile: &ObjectiveProfile,
    allow_ephemeral: bool,
) -> Vec<StrategyCandidate> {
    let hint = profile.symbol_hint.as_deref();
    let mut candidates = vec![
        builtin_candidate(
            "trend_follow_master",
            "Trend Following",
            TeamType::Trend,
            hint.unwrap_or("BTC"),
            profile,
        ),
        builtin_candidate(
            "arb_opportunistic_master",
            "Spread Arbitrage",
            TeamType::Arbitrage,
            hint.unwrap_or("ETH"),
            profile,
        ),
        builtin_candidate(
            "liquidity_mm_master",
            "Liquidity Market Making",
            TeamType::MarketMaking,
            hint.unwrap_or("SOL"),
            profile,
        ),
    ];

    if allow_ephemeral {
        candidates.push(ephemeral_candidate(profile));
    }

    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    candidates
}

/// Pick the top candidate and record why. An empty candidate list falls back
/// to a synthesized default trend candidate; it should not occur in normal
/// operation.
pub fn choose_strategy(
    profile: &ObjectiveProfile,
    candidates: Vec<StrategyCandidate>,
    safety_mode: SafetyMode,
) -> (StrategyCandidate, StrategyRationale) {
    let selected = candidates.first().cloned().unwrap_or_else(|| {
        builtin_candidate(
            "trend_follow_master",
            "Trend Following",
            TeamType::Trend,
            profile.symbol_hint.as_deref().unwrap_or("BTC"),
            profile,
        )
    });

    let rationale = StrategyRationale {
        objective_summary: profile.summary.clone(),
        parsed_constraints: profile.constraints.clone(),
        candidates,
        selection_reason: format!(
            "selected {}, score {}, rationale: {}",
            selected.label,
            selected.score.round_dp(1),
            selected.rationale
        ),
        safety_mode,
        gate_summary: "pending gate evaluation".to_string(),
    };

    (selected, rationale)
}

fn builtin_candidate(
    name: &str,
    label: &str,
    team_type: TeamType,
    symbol: &str,
    profile: &ObjectiveProfile,
) -> StrategyCandidate {
    let side_bias = bias_for(profile);
    let base_score = match team_type {
        TeamType::Trend => dec!(78),
        TeamType::Arbitrage => dec!(72),
        TeamType::MarketMaking => dec!(68),
    };
    let score_boost = if profile.symbol_hint.is_some() {
        dec!(6)
    } else {
        Decimal::ZERO
    };

    StrategyCandidate {
        name: name.to_string(),
        label: label.to_string(),
        source: StrategySource::Builtin,
        team_type,
        symbol: symbol.to_string(),
        side_bias,
        score: base_score + score_boost,
        rationale: format!("{label} matches the objective risk appetite"),
        expires_in_cycles: None,
        params: StrategyParams {
            risk_level: profile.risk_level,
            timeframe_hint: profile.timeframe_hint,
            objective_text: None,
        },
    }
}

fn ephemeral_candidate(profile: &ObjectiveProfile) -> StrategyCandidate {
    let symbol = profile.symbol_hint.as_deref().unwrap_or("BTC");
    let side_bias = if profile.timeframe_hint == TimeframeHint::Short {
        TradeSide::Short
    } else {
        TradeSide::Long
    };
    let score = if profile.risk_level == RiskLevel::High {
        dec!(83)
    } else {
        dec!(74)
    };
    let team_type = if profile.timeframe_hint == TimeframeHint::Short {
        TeamType::MarketMaking
    } else {
        TeamType::Trend
    };

    StrategyCandidate {
        name: format!("ephemeral_goal_{}", Uuid::new_v4().simple()),
        label: "Objective-Driven Ephemeral".to_string(),
        source: StrategySource::Ephemeral,
        team_type,
        symbol: symbol.to_string(),
        side_bias,
        score,
        rationale: "generated from the current objective with a bounded lifetime".to_string(),
        expires_in_cycles: Some(2),
        params: StrategyParams {
            risk_level: profile.risk_level,
            timeframe_hint: profile.timeframe_hint,
            objective_text: Some(profile.raw.clone()),
        },
    }
}

fn bias_for(profile: &ObjectiveProfile) -> TradeSide {
    if profile.risk_level == RiskLevel::Low {
        TradeSide::Long
    } else if profile.timeframe_hint == TimeframeHint::Short {
        TradeSide::Short
    } else {
        TradeSide::Long
    }
}

/// Pure risk/budget assessment of a plan against the shared snapshot.
/// Checks run in a fixed order; the first violation wins.
pub fn assess_candidate_risk(plan: &ExecutionPlan, snapshot: &BudgetSnapshot) -> RiskAssessment {
    if plan.leverage > snapshot.max_leverage {
        return RiskAssessment {
            verdict: RiskVerdict::Reject,
            reason: format!(
                "leverage {} exceeds system ceiling {}",
                plan.leverage, snapshot.max_leverage
            ),
            adjusted_margin_usdt: Decimal::ZERO,
        };
    }

    if snapshot.legacy_symbols.contains(&plan.symbol) {
        return RiskAssessment {
            verdict: RiskVerdict::Reject,
            reason: format!(
                "{} is held by the legacy trading system, isolated",
                plan.symbol
            ),
            adjusted_margin_usdt: Decimal::ZERO,
        };
    }

    if snapshot.team_open_positions >= snapshot.max_team_positions {
        return RiskAssessment {
            verdict: RiskVerdict::Reject,
            reason: format!(
                "team open positions at cap {}",
                snapshot.max_team_positions
            ),
            adjusted_margin_usdt: Decimal::ZERO,
        };
    }

    let remaining = snapshot.max_budget_usdt - snapshot.active_margin_used;
    if remaining <= Decimal::ZERO {
        return RiskAssessment {
            verdict: RiskVerdict::Reject,
            reason: "budget pool exhausted".to_string(),
            adjusted_margin_usdt: Decimal::ZERO,
        };
    }

    if plan.margin_usdt > remaining {
        let adjusted = MIN_VIABLE_MARGIN_USDT.max(remaining);
        return RiskAssessment {
            verdict: RiskVerdict::Reduce,
            reason: format!(
                "budget shortfall, margin reduced from {} to {}",
                plan.margin_usdt,
                adjusted.round_dp(2)
            ),
            adjusted_margin_usdt: adjusted,
        };
    }

    RiskAssessment {
        verdict: RiskVerdict::Pass,
        reason: "risk checks passed".to_string(),
        adjusted_margin_usdt: plan.margin_usdt,
    }
}

/// Symbols MAST must not touch: open with nonzero size on the exchange AND
/// recorded open by the legacy subsystem's own store. The intersection avoids
/// false positives from stale legacy rows for positions already closed on the
/// exchange.
pub fn legacy_isolation_set(
    exchange_positions: &[ExchangePosition],
    legacy_store_symbols: &HashSet<String>,
) -> HashSet<String> {
    let mut isolated = HashSet::new();
    for position in exchange_positions {
        if position.size == Decimal::ZERO {
            continue;
        }
        let symbol = position
            .contract
            .strip_suffix("_USDT")
            .unwrap_or(&position.contract);
        if legacy_store_symbols.contains(symbol) {
            isolated.insert(symbol.to_string());
        }
    }
    isolated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::interpret;
    use mast_models::plan::OrderAction;

    fn plan_with(symbol: &str, leverage: u32, margin: Decimal) -> ExecutionPlan {
        ExecutionPlan {
            team_id: "master-01".to_string(),
            team_name: "Master Desk".to_string(),
            team_type: TeamType::Trend,
            symbol: symbol.to_string(),
            side: TradeSide::Long,
            action: OrderAction::Open,
            leverage,
            margin_usdt: margin,
            signal_summary: "test".to_string(),
            decision_text: "test".to_string(),
            confidence: dec!(0.7),
            reward_risk_ratio: dec!(1.5),
            strategy_name: "trend_follow_master".to_string(),
            strategy_source: StrategySource::Builtin,
        }
    }

    fn snapshot(used: Decimal, budget: Decimal) -> BudgetSnapshot {
        BudgetSnapshot {
            active_margin_used: used,
            max_budget_usdt: budget,
            team_open_positions: 0,
            max_team_positions: 3,
            max_leverage: 10,
            legacy_symbols: HashSet::new(),
        }
    }

    #[test]
    fn candidates_sorted_by_score_with_hint_bonus() {
        let profile = interpret(Some("focus on BTC"));
        let candidates = generate_candidates(&profile, false);

        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].team_type, TeamType::Trend);
        assert_eq!(candidates[0].score, dec!(84));
        assert_eq!(candidates[1].score, dec!(78));
        assert_eq!(candidates[2].score, dec!(74));
        assert!(candidates.iter().all(|c| c.symbol == "BTC"));
    }

    #[test]
    fn no_hint_uses_default_symbols_and_base_scores() {
        let profile = interpret(Some("do something sensible"));
        let candidates = generate_candidates(&profile, false);

        assert_eq!(candidates[0].symbol, "BTC");
        assert_eq!(candidates[1].symbol, "ETH");
        assert_eq!(candidates[2].symbol, "SOL");
        assert_eq!(candidates[0].score, dec!(78));
    }

    #[test]
    fn ephemeral_outranks_builtins_only_at_high_risk() {
        let calm = interpret(Some("do something sensible"));
        let calm_candidates = generate_candidates(&calm, true);
        assert_eq!(calm_candidates.len(), 4);
        assert_eq!(calm_candidates[0].source, StrategySource::Builtin);

        let aggressive = interpret(Some("high yield aggressive moves"));
        let hot_candidates = generate_candidates(&aggressive, true);
        assert_eq!(hot_candidates[0].source, StrategySource::Ephemeral);
        assert_eq!(hot_candidates[0].score, dec!(83));
        assert_eq!(hot_candidates[0].expires_in_cycles, Some(2));
    }

    #[test]
    fn short_timeframe_ephemeral_is_market_making_short() {
        let profile = interpret(Some("high risk intraday scalp"));
        let candidates = generate_candidates(&profile, true);
        let ephemeral = candidates
            .iter()
            .find(|c| c.source == StrategySource::Ephemeral)
            .unwrap();
        assert_eq!(ephemeral.team_type, TeamType::MarketMaking);
        assert_eq!(ephemeral.side_bias, TradeSide::Short);
    }

    #[test]
    fn choose_returns_top_candidate() {
        let profile = interpret(Some("focus on BTC"));
        let candidates = generate_candidates(&profile, false);
        let top_name = candidates[0].name.clone();
        let (selected, rationale) = choose_strategy(&profile, candidates, SafetyMode::RiskOnly);

        assert_eq!(selected.name, top_name);
        assert_eq!(rationale.candidates.len(), 3);
        assert!(rationale.selection_reason.contains("Trend Following"));
    }

    #[test]
    fn choose_falls_back_on_empty_list() {
        let profile = interpret(Some("do something sensible"));
        let (selected, _) = choose_strategy(&profile, Vec::new(), SafetyMode::RiskOnly);
        assert_eq!(selected.team_type, TeamType::Trend);
        assert_eq!(selected.source, StrategySource::Builtin);
    }

    #[test]
    fn assessor_rejects_excess_leverage() {
        let assessment = assess_candidate_risk(
            &plan_with("BTC", 999, dec!(20)),
            &snapshot(Decimal::ZERO, dec!(200)),
        );
        assert_eq!(assessment.verdict, RiskVerdict::Reject);
        assert!(assessment.reason.contains("leverage 999"));
        assert_eq!(assessment.adjusted_margin_usdt, Decimal::ZERO);
    }

    #[test]
    fn assessor_rejects_legacy_symbols() {
        let mut snap = snapshot(Decimal::ZERO, dec!(200));
        snap.legacy_symbols.insert("BTC".to_string());
        let assessment = assess_candidate_risk(&plan_with("BTC", 5, dec!(20)), &snap);
        assert_eq!(assessment.verdict, RiskVerdict::Reject);
        assert!(assessment.reason.contains("legacy"));
    }

    #[test]
    fn assessor_rejects_at_position_cap() {
        let mut snap = snapshot(Decimal::ZERO, dec!(200));
        snap.team_open_positions = 3;
        let assessment = assess_candidate_risk(&plan_with("BTC", 5, dec!(20)), &snap);
        assert_eq!(assessment.verdict, RiskVerdict::Reject);
        assert!(assessment.reason.contains("cap 3"));
    }

    #[test]
    fn assessor_rejects_when_budget_exhausted() {
        let assessment = assess_candidate_risk(
            &plan_with("BTC", 5, dec!(20)),
            &snapshot(dec!(999), dec!(200)),
        );
        assert_eq!(assessment.verdict, RiskVerdict::Reject);
        assert_eq!(assessment.reason, "budget pool exhausted");
    }

    #[test]
    fn assessor_reduces_to_remaining_with_floor() {
        let assessment = assess_candidate_risk(
            &plan_with("BTC", 5, dec!(20)),
            &snapshot(dec!(185), dec!(200)),
        );
        assert_eq!(assessment.verdict, RiskVerdict::Reduce);
        assert_eq!(assessment.adjusted_margin_usdt, dec!(15));

        // Remaining below the floor is still reduced, never rejected here;
        // the budget gate enforces the hard minimum afterwards.
        let tight = assess_candidate_risk(
            &plan_with("BTC", 5, dec!(20)),
            &snapshot(dec!(198), dec!(200)),
        );
        assert_eq!(tight.verdict, RiskVerdict::Reduce);
        assert_eq!(tight.adjusted_margin_usdt, MIN_VIABLE_MARGIN_USDT);
    }

    #[test]
    fn assessor_passes_within_budget() {
        let assessment = assess_candidate_risk(
            &plan_with("BTC", 5, dec!(20)),
            &snapshot(Decimal::ZERO, dec!(200)),
        );
        assert_eq!(assessment.verdict, RiskVerdict::Pass);
        assert_eq!(assessment.adjusted_margin_usdt, dec!(20));
    }

    #[test]
    fn isolation_set_is_two_source_intersection() {
        let exchange_positions = vec![
            ExchangePosition {
                contract: "BTC_USDT".to_string(),
                size: dec!(1.5),
            },
            ExchangePosition {
                contract: "ETH_USDT".to_string(),
                size: Decimal::ZERO,
            },
            ExchangePosition {
                contract: "SOL_USDT".to_string(),
                size: dec!(-3),
            },
        ];
        let legacy_store: HashSet<String> =
            ["BTC", "ETH", "DOGE"].iter().map(|s| s.to_string()).collect();

        let isolated = legacy_isolation_set(&exchange_positions, &legacy_store);

        // BTC: open both sides. ETH: flat on exchange (stale legacy row).
        // SOL: open on exchange but not legacy. DOGE: legacy only.
        assert_eq!(isolated.len(), 1);
        assert!(isolated.contains("BTC"));
    }
}
