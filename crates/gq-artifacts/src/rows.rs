//! Flat CSV row shapes. Floats that can be infinite are written as text.

use gq_execution::TradeRecord;
use gq_metrics::float_repr::to_text;
use gq_walkforward::{PhaseResult, WindowResult};
use serde::Serialize;

pub trait CsvHeader {
    const HEADER: &'static [&'static str];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRow {
    pub trade_id: u64,
    pub symbol: String,
    pub direction: &'static str,
    pub regime: &'static str,
    /// +1/-1 for trend entries, 0 otherwise.
    pub regime_bias: i8,
    pub entry_index: usize,
    pub entry_ts: i64,
    pub requested_price: f64,
    pub entry_price: f64,
    pub stop: f64,
    pub target: f64,
    pub volume: f64,
    pub commission: f64,
    pub exit_index: Option<usize>,
    pub exit_ts: Option<i64>,
    pub exit_price: Option<f64>,
    pub exit_reason: Option<&'static str>,
    pub pnl: f64,
    pub r_multiple: f64,
}

impl TradeRow {
    pub fn from_record(t: &TradeRecord) -> Self {
        Self {
            trade_id: t.trade_id,
            symbol: t.symbol.clone(),
            direction: t.direction.as_str(),
            regime: t.regime.label(),
            regime_bias: t.regime.bias(),
            entry_index: t.entry_index,
            entry_ts: t.entry_ts,
            requested_price: t.requested_price,
            entry_price: t.entry_price,
            stop: t.stop,
            target: t.target,
            volume: t.volume,
            commission: t.commission,
            exit_index: t.exit_index,
            exit_ts: t.exit_ts,
            exit_price: t.exit_price,
            exit_reason: t.exit_reason.map(|r| r.as_str()),
            pnl: t.pnl,
            r_multiple: t.r_multiple,
        }
    }
}

impl CsvHeader for TradeRow {
    const HEADER: &'static [&'static str] = &[
        "trade_id",
        "symbol",
        "direction",
        "regime",
        "regime_bias",
        "entry_index",
        "entry_ts",
        "requested_price",
        "entry_price",
        "stop",
        "target",
        "volume",
        "commission",
        "exit_index",
        "exit_ts",
        "exit_price",
        "exit_reason",
        "pnl",
        "r_multiple",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRow {
    pub trade_id: u64,
    pub symbol: String,
    pub direction: &'static str,
    pub bar_index: usize,
    pub ts: i64,
    pub requested_price: f64,
    pub stop: f64,
    pub target: f64,
    pub volume: f64,
    pub reason: String,
}

impl RejectedRow {
    pub fn from_record(t: &TradeRecord) -> Self {
        Self {
            trade_id: t.trade_id,
            symbol: t.symbol.clone(),
            direction: t.direction.as_str(),
            bar_index: t.entry_index,
            ts: t.entry_ts,
            requested_price: t.requested_price,
            stop: t.stop,
            target: t.target,
            volume: t.volume,
            reason: t.reject_reason.clone().unwrap_or_default(),
        }
    }
}

impl CsvHeader for RejectedRow {
    const HEADER: &'static [&'static str] = &[
        "trade_id",
        "symbol",
        "direction",
        "bar_index",
        "ts",
        "requested_price",
        "stop",
        "target",
        "volume",
        "reason",
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquityRow {
    pub ts: i64,
    pub equity: f64,
}

impl CsvHeader for EquityRow {
    const HEADER: &'static [&'static str] = &["ts", "equity"];
}

/// One line per walk-forward window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowRow {
    pub window: usize,
    pub is_start: usize,
    pub is_end: usize,
    pub oos_start: usize,
    pub oos_end: usize,
    pub start_ts: i64,
    pub end_ts: i64,
    pub is_trades: usize,
    pub is_profit_factor: String,
    pub is_expectancy: f64,
    pub is_status: &'static str,
    pub oos_trades: usize,
    pub oos_profit_factor: String,
    pub oos_expectancy: f64,
    pub oos_max_drawdown_pct: f64,
    pub oos_status: &'static str,
    pub wfe: String,
}

fn status_label(p: &PhaseResult) -> &'static str {
    if p.status.is_completed() {
        "completed"
    } else {
        "terminated"
    }
}

impl WindowRow {
    pub fn from_result(w: &WindowResult) -> Self {
        let is = &w.in_sample;
        let oos = &w.out_of_sample;
        Self {
            window: w.plan.index,
            is_start: w.plan.is_start,
            is_end: w.plan.is_end,
            oos_start: w.plan.oos_start,
            oos_end: w.plan.oos_end,
            start_ts: w.start_ts,
            end_ts: w.end_ts,
            is_trades: is.metrics.trades,
            is_profit_factor: to_text(is.metrics.profit_factor),
            is_expectancy: is.metrics.expectancy,
            is_status: status_label(is),
            oos_trades: oos.metrics.trades,
            oos_profit_factor: to_text(oos.metrics.profit_factor),
            oos_expectancy: oos.metrics.expectancy,
            oos_max_drawdown_pct: oos.metrics.max_drawdown_pct,
            oos_status: status_label(oos),
            wfe: to_text(w.wfe),
        }
    }
}

impl CsvHeader for WindowRow {
    const HEADER: &'static [&'static str] = &[
        "window",
        "is_start",
        "is_end",
        "oos_start",
        "oos_end",
        "start_ts",
        "end_ts",
        "is_trades",
        "is_profit_factor",
        "is_expectancy",
        "is_status",
        "oos_trades",
        "oos_profit_factor",
        "oos_expectancy",
        "oos_max_drawdown_pct",
        "oos_status",
        "wfe",
    ];
}
