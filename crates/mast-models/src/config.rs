use serde::{Deserialize, Serialize};

use crate::strategy::SafetyMode;

/// Top-level configuration for MAST, loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MastConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub master: MasterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sqlite_path: default_sqlite_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulerConfig {
    /// Master switch for the cycle scheduler.
    #[serde(default)]
    pub enabled: bool,
    /// Seconds between cycles. Floored to 5 at start time.
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_seconds: default_interval_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskConfig {
    /// Shared margin budget across all open positions, whole USDT.
    #[serde(default = "default_max_budget_usdt")]
    pub max_budget_usdt: u32,
    /// Open-position cap per team.
    #[serde(default = "default_max_team_positions")]
    pub max_team_positions: u32,
    /// System-wide leverage ceiling.
    #[serde(default = "default_max_leverage")]
    pub max_leverage: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_budget_usdt: default_max_budget_usdt(),
            max_team_positions: default_max_team_positions(),
            max_leverage: default_max_leverage(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MasterConfig {
    #[serde(default = "default_safety_mode")]
    pub safety_mode: SafetyMode,
    /// Whether objective-driven ephemeral strategies may be generated.
    #[serde(default = "default_true")]
    pub allow_ephemeral_strategy: bool,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            safety_mode: default_safety_mode(),
            allow_ephemeral_strategy: true,
        }
    }
}

fn default_sqlite_path() -> String {
    "data/mast.db".to_string()
}
fn default_interval_seconds() -> u64 {
    30
}
fn default_max_budget_usdt() -> u32 {
    200
}
fn default_max_team_positions() -> u32 {
    3
}
fn default_max_leverage() -> u32 {
    10
}
fn default_safety_mode() -> SafetyMode {
    SafetyMode::RiskPlusSimulation
}
fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = MastConfig::default();
        assert!(!config.scheduler.enabled);
        assert_eq!(config.scheduler.interval_seconds, 30);
        assert_eq!(config.risk.max_budget_usdt, 200);
        assert_eq!(config.risk.max_team_positions, 3);
        assert_eq!(config.risk.max_leverage, 10);
        assert_eq!(config.master.safety_mode, SafetyMode::RiskPlusSimulation);
        assert!(config.master.allow_ephemeral_strategy);
    }

    #[test]
    fn config_from_toml() {
        let toml_str = r#"
[store]
sqlite_path = "/tmp/mast-test.db"

[scheduler]
enabled = true
interval_seconds = 15

[risk]
max_budget_usdt = 500
max_team_positions = 2
max_leverage = 8

[master]
safety_mode = "manual_confirm"
allow_ephemeral_strategy = false
"#;

        let config: MastConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.store.sqlite_path, "/tmp/mast-test.db");
        assert!(config.scheduler.enabled);
        assert_eq!(config.scheduler.interval_seconds, 15);
        assert_eq!(config.risk.max_budget_usdt, 500);
        assert_eq!(config.master.safety_mode, SafetyMode::ManualConfirm);
        assert!(!config.master.allow_ephemeral_strategy);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let toml_str = r#"
[scheduler]
enabled = true
"#;
        let config: MastConfig = toml::from_str(toml_str).unwrap();
        assert!(config.scheduler.enabled);
        assert_eq!(config.scheduler.interval_seconds, 30);
        assert_eq!(config.store.sqlite_path, "data/mast.db");
        assert_eq!(config.risk.max_leverage, 10);
    }

    #[test]
    fn roundtrip_toml() {
        let config = MastConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: MastConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }
}
