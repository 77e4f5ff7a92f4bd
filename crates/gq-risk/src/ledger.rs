use serde::{Deserialize, Serialize};

use crate::{KillSwitch, KillSwitchConfig, KillSwitchState, RiskConfigError, TripReason};

/// Equity snapshot for one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquityState {
    pub starting_equity: f64,
    pub equity: f64,
    /// Never decreases within a run.
    pub peak_equity: f64,
    /// `(peak - equity) / peak * 100`, clamped to `[0, 100]`.
    pub drawdown_pct: f64,
    /// Mean R-multiple of closed trades; 0 before the first close.
    pub expectancy: f64,
    pub closed_trades: usize,
    pub tripped: bool,
    pub trip_reason: Option<TripReason>,
}

impl EquityState {
    fn new(starting_equity: f64) -> Self {
        Self {
            starting_equity,
            equity: starting_equity,
            peak_equity: starting_equity,
            drawdown_pct: 0.0,
            expectancy: 0.0,
            closed_trades: 0,
            tripped: false,
            trip_reason: None,
        }
    }
}

/// Owns the run's `EquityState` and its `KillSwitch`. One ledger per run;
/// nothing is shared between runs.
#[derive(Clone, Debug)]
pub struct EquityLedger {
    state: EquityState,
    kill_switch: KillSwitch,
    r_sum: f64,
}

impl EquityLedger {
    pub fn new(starting_equity: f64, cfg: KillSwitchConfig) -> Result<Self, RiskConfigError> {
        if !starting_equity.is_finite() || starting_equity <= 0.0 {
            return Err(RiskConfigError {
                field: "run.starting_equity",
                value: starting_equity,
                expected: "x > 0",
            });
        }
        let mut kill_switch = KillSwitch::new(cfg)?;
        kill_switch.reset(starting_equity);
        Ok(Self {
            state: EquityState::new(starting_equity),
            kill_switch,
            r_sum: 0.0,
        })
    }

    pub fn state(&self) -> &EquityState {
        &self.state
    }

    pub fn into_state(self) -> EquityState {
        self.state
    }

    pub fn equity(&self) -> f64 {
        self.state.equity
    }

    pub fn is_tripped(&self) -> bool {
        self.state.tripped
    }

    /// Book one closed trade.
    pub fn apply_closed_trade(&mut self, pnl: f64, r_multiple: f64) {
        let s = &mut self.state;
        s.equity += pnl;
        if s.equity > s.peak_equity {
            s.peak_equity = s.equity;
        }
        s.drawdown_pct = if s.peak_equity > 0.0 {
            ((s.peak_equity - s.equity) / s.peak_equity * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        s.closed_trades += 1;
        self.r_sum += r_multiple;
        s.expectancy = self.r_sum / s.closed_trades as f64;
    }

    /// Run the kill switch on current equity and expectancy.
    ///
    /// The expectancy floor is only enforced once `expectancy_min_trades`
    /// trades have closed.
    pub fn check(&mut self) -> KillSwitchState {
        let min_trades = self.kill_switch.config().expectancy_min_trades;
        let expectancy = if self.state.closed_trades >= min_trades {
            Some(self.state.expectancy)
        } else {
            None
        };
        let st = self.kill_switch.evaluate(self.state.equity, expectancy);
        if let KillSwitchState::Tripped(reason) = st {
            self.state.tripped = true;
            self.state.trip_reason = Some(reason);
        }
        st
    }
}
