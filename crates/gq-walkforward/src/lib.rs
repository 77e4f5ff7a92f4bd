//! gq-walkforward
//!
//! Rolling in-sample / out-of-sample evaluation of the Backtest Loop.
//!
//! - Windows step by the OOS length; the next IS overlaps the previous OOS
//! - Every slice gets a fresh engine, ledger and market state (no carry-over)
//! - Seeds derive from (base seed, window, phase): sequential == parallel

mod harness;
mod types;

pub use harness::{derive_seed, plan_windows, run_walk_forward};
pub use types::{
    AggregateMetrics, Phase, PhaseResult, WalkForwardConfig, WalkForwardError, WalkForwardReport,
    WindowPlan, WindowResult,
};
