//! gq-risk
//!
//! Pre-trade gate, position sizing, and the equity kill switch.
//!
//! - Trade Validator: typed run-state in, Approve / Reject(reason) out
//! - Position Sizer: ATR bracket + fixed-fractional size; zero stop distance rejects
//! - Kill Switch: sticky drawdown / expectancy breaker, `reset` is the only way out
//! - Equity Ledger: equity, peak, drawdown %, running expectancy for one run
//!
//! Deterministic, pure logic. No IO, no clock.

mod gate;
mod kill_switch;
mod ledger;
mod sizing;
mod types;

pub use gate::validate_intent;
pub use kill_switch::KillSwitch;
pub use ledger::{EquityLedger, EquityState};
pub use sizing::{apply_sl_tp, calculate_position_size, size_trade};
pub use types::*;
