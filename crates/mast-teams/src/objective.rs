use mast_models::objective::{
    ObjectiveProfile, RiskLevel, TimeframeHint, DEFAULT_OBJECTIVE_TEXT,
};

/// Symbols the master desk is allowed to hint at.
pub const SUPPORTED_SYMBOLS: [&str; 6] = ["BTC", "ETH", "SOL", "BNB", "XRP", "DOGE"];

const LOW_RISK_KEYWORDS: [&str; 5] = [
    "low risk",
    "conservative",
    "steady",
    "capital preservation",
    "drawdown",
];
const HIGH_RISK_KEYWORDS: [&str; 5] = [
    "aggressive",
    "high risk",
    "high yield",
    "all in",
    "max gains",
];
const SHORT_TIMEFRAME_KEYWORDS: [&str; 5] = ["intraday", "scalp", "day trade", "minutes", "quick"];
const LONG_TIMEFRAME_KEYWORDS: [&str; 5] =
    ["weekly", "monthly", "swing", "long term", "position trade"];

/// Turn free-text operator intent into a structured profile.
///
/// Keyword based, never fails: low-risk keywords take precedence over
/// high-risk ones, unmatched text lands on medium/medium, the symbol hint is
/// the first supported ticker appearing in the text (case-insensitive).
pub fn interpret(text: Option<&str>) -> ObjectiveProfile {
    let raw = text
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_OBJECTIVE_TEXT)
        .to_string();
    let lower = raw.to_lowercase();
    let upper = raw.to_uppercase();

    let symbol_hint = SUPPORTED_SYMBOLS
        .iter()
        .find(|symbol| upper.contains(*symbol))
        .map(|symbol| symbol.to_string());

    let risk_level = if LOW_RISK_KEYWORDS.iter().any(|k| lower.contains(k)) {
        RiskLevel::Low
    } else if HIGH_RISK_KEYWORDS.iter().any(|k| lower.contains(k)) {
        RiskLevel::High
    } else {
        RiskLevel::Medium
    };

    let timeframe_hint = if SHORT_TIMEFRAME_KEYWORDS.iter().any(|k| lower.contains(k)) {
        TimeframeHint::Short
    } else if LONG_TIMEFRAME_KEYWORDS.iter().any(|k| lower.contains(k)) {
        TimeframeHint::Long
    } else {
        TimeframeHint::Medium
    };

    let mut constraints = Vec::new();
    if risk_level == RiskLevel::Low {
        constraints.push("prioritize drawdown and leverage control".to_string());
    }
    if risk_level == RiskLevel::High {
        constraints.push("prioritize returns with hard risk stops".to_string());
    }
    if let Some(symbol) = &symbol_hint {
        constraints.push(format!("preferred symbol: {symbol}"));
    }
    constraints.push(format!(
        "timeframe preference: {}",
        timeframe_hint.as_str()
    ));

    ObjectiveProfile {
        summary: raw.clone(),
        raw,
        symbol_hint,
        risk_level,
        timeframe_hint,
        constraints,
    }
}
