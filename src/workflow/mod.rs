pub mod job_tracker;
pub mod unit_ctx;
pub mod unit_flow;

pub use job_tracker::{DocumentStatus, JobTracker, UnitState};
pub use unit_ctx::UnitCtx;
pub use unit_flow::UnitFlow;
