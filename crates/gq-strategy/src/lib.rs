//! gq-strategy
//!
//! Signal policy contract:
//! - A policy maps one enriched bar to one `Direction` (Buy / Sell / Flat)
//! - Pure: no state, no IO, no randomness; same bar => same intent
//! - Gating (kill switch, open position) is not a policy concern; see gq-risk

mod regime;
mod types;

pub use regime::{RegimeSignalPolicy, SignalConfig};
pub use types::*;
