//! gq-backtest
//!
//! Backtest Loop (bar-by-bar replay)
//!
//! Pipeline: BAR -> MARKET STATE -> POLICY -> GATE -> SIZER -> GATEWAY -> LEDGER
//!
//! - Deterministic replay (same bars + config + seed => identical ledgers)
//! - No lookahead (state for bar i only sees bars <= i; exits scan bars > i)
//! - One open position at a time; forward-scanned trades block new entries
//! - Kill switch trip ends the run early with a status, never an error
//! - Run-scoped telemetry through an injected `RunEventSink`

mod engine;
pub mod events;
mod loader;
pub mod types;

pub use engine::{BacktestEngine, BacktestError};
pub use events::{NullSink, RecordingSink, RunEvent, RunEventSink, SinkError, TeeSink, TracingSink};
pub use loader::{load_csv_file, parse_csv_bars, LoadError};
pub use types::{BacktestConfig, BacktestReport, RunStatus};
