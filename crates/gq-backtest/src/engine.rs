use std::collections::BTreeMap;

use gq_execution::{
    ExitFill, ExitResolver, OrderGateway, OrderRequest, OrderSimulator, TradeRecord,
};
use gq_features::MarketStateBuilder;
use gq_risk::{
    size_trade, validate_intent, EquityLedger, GateDecision, KillSwitchState, RunState,
};
use gq_schemas::{validate_bars, Bar, InputSchemaError};
use gq_strategy::{RegimeSignalPolicy, SignalPolicy};
use tracing::{debug, info, warn};

use crate::events::{RunEvent, RunEventSink, SinkError};
use crate::types::{BacktestConfig, BacktestReport, RunStatus};

/// Backtest error variants. A kill switch trip is a status, not an error.
#[derive(Clone, Debug, PartialEq)]
pub enum BacktestError {
    /// Bars failed schema validation; nothing was simulated.
    InputSchema(InputSchemaError),
    /// A configuration value is out of range.
    InvalidConfig { field: String, reason: String },
    /// The event sink refused an event.
    Sink(SinkError),
}

impl core::fmt::Display for BacktestError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BacktestError::InputSchema(e) => write!(f, "input schema: {}", e),
            BacktestError::InvalidConfig { field, reason } => {
                write!(f, "invalid config {}: {}", field, reason)
            }
            BacktestError::Sink(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for BacktestError {}

impl From<InputSchemaError> for BacktestError {
    fn from(e: InputSchemaError) -> Self {
        BacktestError::InputSchema(e)
    }
}

impl From<SinkError> for BacktestError {
    fn from(e: SinkError) -> Self {
        BacktestError::Sink(e)
    }
}

fn invalid(field: &str, reason: impl std::fmt::Display) -> BacktestError {
    BacktestError::InvalidConfig {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

impl BacktestConfig {
    /// Check every section before any bar runs.
    pub fn validate(&self) -> Result<(), BacktestError> {
        if self.symbol.trim().is_empty() {
            return Err(invalid("run.symbol", "must not be empty"));
        }
        if !(self.starting_equity.is_finite() && self.starting_equity > 0.0) {
            return Err(invalid("run.starting_equity", "must be > 0"));
        }
        self.features.validate().map_err(|e| invalid("features", e))?;
        self.signal.validate().map_err(|e| invalid("signal", e))?;
        self.gate.validate().map_err(|e| invalid(e.field, &e))?;
        self.sizing.validate().map_err(|e| invalid(e.field, &e))?;
        self.kill_switch.validate().map_err(|e| invalid(e.field, &e))?;
        self.execution.validate().map_err(|e| invalid("execution", e))?;
        Ok(())
    }
}

/// Deterministic bar-by-bar replay.
///
/// Per bar: settle due trade -> kill switch -> intent -> gate -> size ->
/// submit -> resolve exit. At most one position is open at a time.
///
/// The gateway keeps its state (e.g. the simulator's RNG) across `run`
/// calls; build a fresh engine per run for replay-identical results.
pub struct BacktestEngine<G = OrderSimulator> {
    config: BacktestConfig,
    gateway: G,
    policy: Box<dyn SignalPolicy>,
}

impl BacktestEngine<OrderSimulator> {
    /// Engine backed by the seeded in-process simulator.
    pub fn new(config: BacktestConfig) -> Result<Self, BacktestError> {
        config.validate()?;
        let sim = OrderSimulator::new(config.execution.clone())
            .map_err(|e| invalid("execution", e))?;
        Self::with_gateway(config, sim)
    }
}

impl<G: OrderGateway + ExitResolver> BacktestEngine<G> {
    /// Engine backed by any gateway honouring the execution contract.
    pub fn with_gateway(config: BacktestConfig, gateway: G) -> Result<Self, BacktestError> {
        config.validate()?;
        let policy =
            RegimeSignalPolicy::new(config.signal.clone()).map_err(|e| invalid("signal", e))?;
        Ok(Self {
            config,
            gateway,
            policy: Box::new(policy),
        })
    }

    /// Replace the signal policy.
    pub fn with_policy(mut self, policy: Box<dyn SignalPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Run over `bars` (ascending timestamps). Returns the ledger even when
    /// the kill switch ends the run early.
    pub fn run(
        &mut self,
        bars: &[Bar],
        sink: &mut dyn RunEventSink,
    ) -> Result<BacktestReport, BacktestError> {
        validate_bars(bars)?;

        let cfg = &self.config;
        let mut builder =
            MarketStateBuilder::new(cfg.features.clone()).map_err(|e| invalid("features", e))?;
        let mut ledger = EquityLedger::new(cfg.starting_equity, cfg.kill_switch.clone())
            .map_err(|e| invalid(e.field, &e))?;

        let mut trades: Vec<TradeRecord> = Vec::new();
        let mut rejected: Vec<TradeRecord> = Vec::new();
        let mut equity_curve: Vec<(i64, f64)> = Vec::with_capacity(bars.len());
        let mut skipped: BTreeMap<String, u64> = BTreeMap::new();
        let mut pending: Option<(TradeRecord, ExitFill)> = None;
        let mut status = RunStatus::Completed;
        let mut bars_processed = 0usize;
        let mut reject_seq = 0u64;

        sink.on_event(&RunEvent::RunStarted {
            symbol: cfg.symbol.clone(),
            policy: self.policy.spec().name,
            bars: bars.len(),
            starting_equity: cfg.starting_equity,
        })?;

        for (i, bar) in bars.iter().enumerate() {
            let state = builder.push(bar);
            bars_processed = i + 1;

            // 1. Settle a trade whose exit bar has arrived.
            if matches!(&pending, Some((t, f)) if t.entry_index + f.bars_held <= i) {
                if let Some((open, fill)) = pending.take() {
                    settle(open, &fill, &mut ledger, &mut trades, sink)?;
                }
            }

            // 2. Kill switch. Terminal for the run.
            if let Some(tripped) = check_kill_switch(&mut ledger, i, bar.ts, sink)? {
                equity_curve.push((bar.ts, ledger.equity()));
                status = tripped;
                break;
            }

            // 3. Intent.
            let intent = self.policy.decide(&state);

            // 4. Gate.
            let run_state = RunState {
                kill_switch_active: true,
                open_position: pending.is_some(),
            };
            if let GateDecision::Reject(reason) =
                validate_intent(intent, &run_state, state.regime, state.vol_pct, &cfg.gate)
            {
                if !intent.is_flat() {
                    *skipped.entry(reason.as_str().to_string()).or_default() += 1;
                    sink.on_event(&RunEvent::IntentGated {
                        bar_index: i,
                        ts: bar.ts,
                        direction: intent,
                        reason: reason.as_str().to_string(),
                    })?;
                }
                equity_curve.push((bar.ts, ledger.equity()));
                continue;
            }

            // 5. Size. Zero stop distance rejects the entry.
            let (bracket, volume) =
                match size_trade(bar.close, intent, state.atr, ledger.equity(), &cfg.sizing) {
                    Ok(v) => v,
                    Err(e) => {
                        debug!(bar_index = i, error = %e, "entry skipped by sizing");
                        *skipped.entry("SIZING".to_string()).or_default() += 1;
                        sink.on_event(&RunEvent::EntrySkipped {
                            bar_index: i,
                            ts: bar.ts,
                            direction: intent,
                            reason: e.to_string(),
                        })?;
                        equity_curve.push((bar.ts, ledger.equity()));
                        continue;
                    }
                };

            // 6. Submit.
            let req = OrderRequest {
                symbol: cfg.symbol.clone(),
                direction: intent,
                bar_index: i,
                ts: bar.ts,
                entry: bar.close,
                stop: bracket.stop,
                target: bracket.target,
                volume,
                regime: state.regime,
            };
            match self.gateway.submit(&req) {
                Err(rej) => {
                    reject_seq += 1;
                    let record = TradeRecord::rejected(reject_seq, &req, rej.to_string());
                    sink.on_event(&RunEvent::TradeRejected {
                        bar_index: i,
                        ts: bar.ts,
                        trade: record.clone(),
                    })?;
                    rejected.push(record);
                }
                Ok(open) => {
                    sink.on_event(&RunEvent::TradeOpened {
                        bar_index: i,
                        ts: bar.ts,
                        trade: open.clone(),
                    })?;
                    // 7. Exit resolution over the bars after entry.
                    let fill = self.gateway.resolve_exit(&open, &bars[i + 1..]);
                    if fill.bars_held == 0 {
                        settle(open, &fill, &mut ledger, &mut trades, sink)?;
                        // Settled on its own entry bar: the next bar's check may never come.
                        if let Some(tripped) = check_kill_switch(&mut ledger, i, bar.ts, sink)? {
                            equity_curve.push((bar.ts, ledger.equity()));
                            status = tripped;
                            break;
                        }
                    } else {
                        pending = Some((open, fill));
                    }
                }
            }

            equity_curve.push((bar.ts, ledger.equity()));
        }

        if let Some((open, fill)) = pending.take() {
            settle(open, &fill, &mut ledger, &mut trades, sink)?;
            // A resolver may report an exit past the last bar; book it and check once more.
            let last = bars.len().checked_sub(1).map(|idx| (idx, bars[idx].ts));
            if let (true, Some((idx, ts))) = (status.is_completed(), last) {
                if let Some(tripped) = check_kill_switch(&mut ledger, idx, ts, sink)? {
                    status = tripped;
                }
            }
        }

        let final_state = ledger.into_state();
        info!(
            bars_processed,
            trades = trades.len(),
            rejected = rejected.len(),
            final_equity = final_state.equity,
            completed = status.is_completed(),
            "backtest finished"
        );
        sink.on_event(&RunEvent::RunFinished {
            status: status.clone(),
            bars_processed,
            trades: trades.len(),
            final_equity: final_state.equity,
        })?;

        Ok(BacktestReport {
            status,
            trades,
            rejected,
            equity_curve,
            final_state,
            bars_processed,
            skipped_intents: skipped,
        })
    }
}

/// Trip check after equity may have moved. `Some` ends the run at `bar_index`.
fn check_kill_switch(
    ledger: &mut EquityLedger,
    bar_index: usize,
    ts: i64,
    sink: &mut dyn RunEventSink,
) -> Result<Option<RunStatus>, BacktestError> {
    let KillSwitchState::Tripped(reason) = ledger.check() else {
        return Ok(None);
    };
    warn!(bar_index, %reason, "kill switch tripped; terminating run");
    sink.on_event(&RunEvent::KillSwitchTripped {
        bar_index,
        ts,
        reason,
        equity: ledger.state().clone(),
    })?;
    Ok(Some(RunStatus::Terminated {
        bar_index,
        ts,
        reason,
    }))
}

fn settle(
    open: TradeRecord,
    fill: &ExitFill,
    ledger: &mut EquityLedger,
    trades: &mut Vec<TradeRecord>,
    sink: &mut dyn RunEventSink,
) -> Result<(), BacktestError> {
    let closed = open
        .close(fill)
        .map_err(|e| invalid("execution", e))?;
    ledger.apply_closed_trade(closed.pnl, closed.r_multiple);
    sink.on_event(&RunEvent::TradeClosed {
        bar_index: closed.exit_index.unwrap_or(closed.entry_index),
        ts: fill.ts,
        trade: closed.clone(),
        equity: ledger.state().clone(),
    })?;
    trades.push(closed);
    Ok(())
}
