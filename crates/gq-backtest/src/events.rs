//! Run-scoped telemetry port.
//!
//! The engine reports what happened through a `RunEventSink` passed into
//! `run`; it never writes files or global state itself. Sinks live for one run.

use gq_execution::TradeRecord;
use gq_risk::{EquityState, TripReason};
use gq_schemas::Direction;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::types::RunStatus;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    RunStarted {
        symbol: String,
        policy: String,
        bars: usize,
        starting_equity: f64,
    },
    /// A non-flat intent was refused by the gate.
    IntentGated {
        bar_index: usize,
        ts: i64,
        direction: Direction,
        reason: String,
    },
    /// Sizing could not produce a trade (zero stop distance, bad risk inputs).
    EntrySkipped {
        bar_index: usize,
        ts: i64,
        direction: Direction,
        reason: String,
    },
    TradeOpened {
        bar_index: usize,
        ts: i64,
        trade: TradeRecord,
    },
    TradeRejected {
        bar_index: usize,
        ts: i64,
        trade: TradeRecord,
    },
    TradeClosed {
        bar_index: usize,
        ts: i64,
        trade: TradeRecord,
        equity: EquityState,
    },
    KillSwitchTripped {
        bar_index: usize,
        ts: i64,
        reason: TripReason,
        equity: EquityState,
    },
    RunFinished {
        status: RunStatus,
        bars_processed: usize,
        trades: usize,
        final_equity: f64,
    },
}

impl RunEvent {
    /// Stable snake_case event name.
    pub fn kind(&self) -> &'static str {
        match self {
            RunEvent::RunStarted { .. } => "run_started",
            RunEvent::IntentGated { .. } => "intent_gated",
            RunEvent::EntrySkipped { .. } => "entry_skipped",
            RunEvent::TradeOpened { .. } => "trade_opened",
            RunEvent::TradeRejected { .. } => "trade_rejected",
            RunEvent::TradeClosed { .. } => "trade_closed",
            RunEvent::KillSwitchTripped { .. } => "kill_switch_tripped",
            RunEvent::RunFinished { .. } => "run_finished",
        }
    }

    /// Bar timestamp the event belongs to, if any.
    pub fn ts(&self) -> Option<i64> {
        match self {
            RunEvent::IntentGated { ts, .. }
            | RunEvent::EntrySkipped { ts, .. }
            | RunEvent::TradeOpened { ts, .. }
            | RunEvent::TradeRejected { ts, .. }
            | RunEvent::TradeClosed { ts, .. }
            | RunEvent::KillSwitchTripped { ts, .. } => Some(*ts),
            RunEvent::RunStarted { .. } | RunEvent::RunFinished { .. } => None,
        }
    }
}

/// A sink failed to record an event. Aborts the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkError {
    pub message: String,
}

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "event sink: {}", self.message)
    }
}

impl std::error::Error for SinkError {}

pub trait RunEventSink {
    fn on_event(&mut self, event: &RunEvent) -> Result<(), SinkError>;
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl RunEventSink for NullSink {
    fn on_event(&mut self, _event: &RunEvent) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Forwards events to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl RunEventSink for TracingSink {
    fn on_event(&mut self, event: &RunEvent) -> Result<(), SinkError> {
        match event {
            RunEvent::RunStarted {
                symbol,
                policy,
                bars,
                starting_equity,
            } => info!(%symbol, %policy, bars, starting_equity, "run started"),
            RunEvent::IntentGated {
                bar_index, reason, ..
            } => debug!(bar_index, %reason, "intent gated"),
            RunEvent::EntrySkipped {
                bar_index, reason, ..
            } => debug!(bar_index, %reason, "entry skipped"),
            RunEvent::TradeOpened { bar_index, trade, .. } => debug!(
                bar_index,
                trade_id = trade.trade_id,
                direction = trade.direction.as_str(),
                entry = trade.entry_price,
                volume = trade.volume,
                "trade opened"
            ),
            RunEvent::TradeRejected { bar_index, trade, .. } => debug!(
                bar_index,
                reason = trade.reject_reason.as_deref().unwrap_or(""),
                "trade rejected"
            ),
            RunEvent::TradeClosed {
                bar_index,
                trade,
                equity,
                ..
            } => debug!(
                bar_index,
                trade_id = trade.trade_id,
                pnl = trade.pnl,
                r = trade.r_multiple,
                equity = equity.equity,
                "trade closed"
            ),
            RunEvent::KillSwitchTripped {
                bar_index, reason, ..
            } => warn!(bar_index, %reason, "kill switch tripped"),
            RunEvent::RunFinished {
                bars_processed,
                trades,
                final_equity,
                ..
            } => info!(bars_processed, trades, final_equity, "run finished"),
        }
        Ok(())
    }
}

/// Keeps every event in memory (tests, artifact writers).
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<RunEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.iter().map(RunEvent::kind).collect()
    }
}

impl RunEventSink for RecordingSink {
    fn on_event(&mut self, event: &RunEvent) -> Result<(), SinkError> {
        self.events.push(event.clone());
        Ok(())
    }
}

/// Fan-out to two sinks, in order.
pub struct TeeSink<'a> {
    first: &'a mut dyn RunEventSink,
    second: &'a mut dyn RunEventSink,
}

impl<'a> TeeSink<'a> {
    pub fn new(first: &'a mut dyn RunEventSink, second: &'a mut dyn RunEventSink) -> Self {
        Self { first, second }
    }
}

impl RunEventSink for TeeSink<'_> {
    fn on_event(&mut self, event: &RunEvent) -> Result<(), SinkError> {
        self.first.on_event(event)?;
        self.second.on_event(event)
    }
}
