pub mod config;
pub mod gate;
pub mod message;
pub mod objective;
pub mod plan;
pub mod record;
pub mod schema;
pub mod strategy;
pub mod task;

pub use config::{MastConfig, MasterConfig, RiskConfig, SchedulerConfig, StoreConfig};
pub use gate::{GateName, GateResult, RiskAssessment, RiskVerdict};
pub use message::{ExecutionMode, InboxMessage, SignalQuality, SpecialistOpinion};
pub use objective::{
    Objective, ObjectiveProfile, ObjectiveStatus, RiskLevel, TimeframeHint, DEFAULT_OBJECTIVE_TEXT,
};
pub use plan::{ExecutionPlan, OrderAction, TradeSide};
pub use record::{
    Cycle, CycleStatus, CycleTrace, Decision, OrderRecord, OrderStatus, Position, PositionStatus,
    RiskEvent,
};
pub use strategy::{
    SafetyMode, StrategyCandidate, StrategyParams, StrategyRationale, StrategySource, TeamType,
};
pub use task::{
    SpecialistType, TaskInputs, TaskStatus, TaskStatusCounts, TeamTask, REQUIRED_SPECIALISTS,
};
