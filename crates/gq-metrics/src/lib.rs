//! gq-metrics
//!
//! Performance Audit over a closed-trade ledger.
//!
//! - Profit factor keeps its infinite value when there are no losses
//! - Drawdown is measured on the trade-indexed equity curve
//! - Expectancy is the mean R-multiple; an empty ledger audits to zeros
//! - Per-regime expectancy breakdown

mod evaluator;
mod regime;
mod types;

pub use evaluator::{
    audit_trades, expectancy, max_drawdown_pct, profit_factor, walk_forward_efficiency,
};
pub use regime::{regime_breakdown, RegimeBreakdown, RegimeStats};
pub use types::{float_repr, AuditMetrics};
