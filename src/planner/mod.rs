//! The HOS planning pipeline: C4 (Stop Planner) -> C5 (Logbook
//! Transformer) -> C6 (Compliance Validator), composed by C7
//! (orchestrator).

pub mod logbook;
pub mod orchestrator;
pub mod stop_planner;
pub mod validator;

pub use logbook::split_into_log_days;
pub use orchestrator::{PersistencePlan, PlannerOrchestrator};
pub use stop_planner::{plan_stops, StopPlanInput, StopPlanOutput};
pub use validator::validate;
