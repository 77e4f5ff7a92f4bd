use gq_schemas::{Bar, Direction, Regime};
use serde::{Deserialize, Serialize};

/// A gated and sized entry, ready for a gateway.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub direction: Direction,
    /// Index of the signal bar within the run.
    pub bar_index: usize,
    pub ts: i64,
    /// Reference entry price (signal bar close), before slippage.
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub volume: f64,
    pub regime: Regime,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    Open,
    Closed,
    Rejected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    /// Held for the maximum number of bars without a touch.
    TimeExit,
    /// No bars left in the run after entry.
    EndOfData,
    /// Seeded draw chose "no move".
    Flat,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::TakeProfit => "take_profit",
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TimeExit => "time_exit",
            ExitReason::EndOfData => "end_of_data",
            ExitReason::Flat => "flat",
        }
    }
}

/// Where and why a trade closes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExitFill {
    /// Bars after the entry bar; 0 closes on the entry bar itself.
    pub bars_held: usize,
    pub ts: i64,
    pub price: f64,
    pub reason: ExitReason,
}

/// One trade, from acceptance to terminal state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub trade_id: u64,
    pub symbol: String,
    pub direction: Direction,
    pub regime: Regime,
    pub status: TradeStatus,
    pub entry_index: usize,
    pub entry_ts: i64,
    /// Signal price before slippage.
    pub requested_price: f64,
    /// Filled entry price.
    pub entry_price: f64,
    pub stop: f64,
    pub target: f64,
    pub volume: f64,
    pub commission: f64,
    pub exit_index: Option<usize>,
    pub exit_ts: Option<i64>,
    pub exit_price: Option<f64>,
    pub exit_reason: Option<ExitReason>,
    /// Net of commission. 0 until closed.
    pub pnl: f64,
    pub r_multiple: f64,
    pub reject_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TradeStateError {
    pub trade_id: u64,
    pub status: TradeStatus,
}

impl std::fmt::Display for TradeStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "trade {} is {:?}; only open trades can be closed",
            self.trade_id, self.status
        )
    }
}

impl std::error::Error for TradeStateError {}

impl TradeRecord {
    /// Accepted entry at `entry_price`.
    pub fn open(trade_id: u64, req: &OrderRequest, entry_price: f64, commission: f64) -> Self {
        Self {
            trade_id,
            symbol: req.symbol.clone(),
            direction: req.direction,
            regime: req.regime,
            status: TradeStatus::Open,
            entry_index: req.bar_index,
            entry_ts: req.ts,
            requested_price: req.entry,
            entry_price,
            stop: req.stop,
            target: req.target,
            volume: req.volume,
            commission,
            exit_index: None,
            exit_ts: None,
            exit_price: None,
            exit_reason: None,
            pnl: 0.0,
            r_multiple: 0.0,
            reject_reason: None,
        }
    }

    /// Terminal record for a request that never filled.
    pub fn rejected(trade_id: u64, req: &OrderRequest, reason: impl Into<String>) -> Self {
        let mut t = Self::open(trade_id, req, req.entry, 0.0);
        t.status = TradeStatus::Rejected;
        t.reject_reason = Some(reason.into());
        t
    }

    /// Close an open trade. Consumes the open record; the returned one is final.
    pub fn close(self, fill: &ExitFill) -> Result<TradeRecord, TradeStateError> {
        if self.status != TradeStatus::Open {
            return Err(TradeStateError {
                trade_id: self.trade_id,
                status: self.status,
            });
        }
        let gross = (fill.price - self.entry_price) * self.direction.sign() * self.volume;
        let pnl = gross - self.commission;
        let r = r_multiple(pnl, self.volume, self.entry_price);
        Ok(TradeRecord {
            status: TradeStatus::Closed,
            exit_index: Some(self.entry_index + fill.bars_held),
            exit_ts: Some(fill.ts),
            exit_price: Some(fill.price),
            exit_reason: Some(fill.reason),
            pnl,
            r_multiple: r,
            ..self
        })
    }
}

/// R-multiple by convention: PnL per 1% of entry notional.
/// 0 when the notional is 0.
pub fn r_multiple(pnl: f64, volume: f64, entry_price: f64) -> f64 {
    let unit = volume * entry_price * 0.01;
    if unit == 0.0 {
        0.0
    } else {
        pnl / unit
    }
}

/// Why a gateway refused a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatewayReject {
    /// The request itself is malformed (flat, non-positive volume, ...).
    InvalidRequest { reason: String },
    /// The venue declined a well-formed request.
    Refused { reason: String },
}

impl std::fmt::Display for GatewayReject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayReject::InvalidRequest { reason } => {
                write!(f, "invalid order request: {}", reason)
            }
            GatewayReject::Refused { reason } => write!(f, "order refused: {}", reason),
        }
    }
}

impl std::error::Error for GatewayReject {}

/// Entry side of execution. The simulator and a live adapter are interchangeable here.
pub trait OrderGateway {
    fn submit(&mut self, req: &OrderRequest) -> Result<TradeRecord, GatewayReject>;
}

/// Exit side of execution.
///
/// `path` holds the bars strictly after the entry bar, within the current run.
pub trait ExitResolver {
    fn resolve_exit(&mut self, trade: &TradeRecord, path: &[Bar]) -> ExitFill;
}

impl<T: OrderGateway + ?Sized> OrderGateway for &mut T {
    fn submit(&mut self, req: &OrderRequest) -> Result<TradeRecord, GatewayReject> {
        (**self).submit(req)
    }
}

impl<T: ExitResolver + ?Sized> ExitResolver for &mut T {
    fn resolve_exit(&mut self, trade: &TradeRecord, path: &[Bar]) -> ExitFill {
        (**self).resolve_exit(trade, path)
    }
}
