//! MAST - Master Agent Strategy Teams
//!
//! A crypto-futures decision daemon: a reentrancy-guarded scheduler fires
//! cycles that interpret the standing objective, select a strategy, collect
//! four simulated specialist opinions, pass the plan through a sequential
//! quality gate chain and, if approved, size and submit an order while
//! persisting a full audit trail.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mast::models::config::MastConfig;
//! use mast::teams::{CycleScheduler, PaperExchange};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = MastConfig::default();
//! let store = mast::open_store(&config)?;
//! let runtime = mast::build_runtime(&config, store, Arc::new(PaperExchange::new()));
//! let scheduler = CycleScheduler::new(runtime);
//! scheduler.start(config.scheduler.interval_seconds).await;
//! # Ok(())
//! # }
//! ```

pub use mast_models as models;
pub use mast_store as store;
pub use mast_teams as teams;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use mast_models::config::MastConfig;
use mast_store::SqliteStore;
use mast_teams::exchange::ExchangeClient;
use mast_teams::runtime::CycleRuntime;

/// Load configuration from a TOML file; a missing file yields the defaults.
pub fn load_config(path: &str) -> anyhow::Result<MastConfig> {
    if !Path::new(path).exists() {
        tracing::info!(path, "config file not found, using defaults");
        return Ok(MastConfig::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {path}"))?;
    toml::from_str(&raw).with_context(|| format!("failed to parse config: {path}"))
}

/// Open the SQLite store at the configured path, creating parent
/// directories as needed.
pub fn open_store(config: &MastConfig) -> anyhow::Result<Arc<SqliteStore>> {
    if let Some(parent) = Path::new(&config.store.sqlite_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let store = SqliteStore::open(&config.store.sqlite_path)
        .with_context(|| format!("failed to open store: {}", config.store.sqlite_path))?;
    Ok(Arc::new(store))
}

/// Wire a cycle runtime from its ports.
pub fn build_runtime(
    config: &MastConfig,
    store: Arc<SqliteStore>,
    exchange: Arc<dyn ExchangeClient>,
) -> Arc<CycleRuntime> {
    Arc::new(CycleRuntime::new(store, exchange, config.clone()))
}
