use crate::{KillSwitchConfig, KillSwitchState, RiskConfigError, TripReason};

/// Sticky equity breaker.
///
/// States: Active -> Tripped. Tripped is terminal until `reset(equity)`.
/// Drawdown is measured from the peak equity seen since the last reset.
#[derive(Clone, Debug, PartialEq)]
pub struct KillSwitch {
    cfg: KillSwitchConfig,
    start_equity: Option<f64>,
    peak_equity: Option<f64>,
    tripped: Option<TripReason>,
}

impl KillSwitch {
    pub fn new(cfg: KillSwitchConfig) -> Result<Self, RiskConfigError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            start_equity: None,
            peak_equity: None,
            tripped: None,
        })
    }

    pub fn config(&self) -> &KillSwitchConfig {
        &self.cfg
    }

    /// Re-arm: start = peak = `equity`, state back to Active.
    pub fn reset(&mut self, equity: f64) {
        self.start_equity = Some(equity);
        self.peak_equity = Some(equity);
        self.tripped = None;
    }

    pub fn start_equity(&self) -> Option<f64> {
        self.start_equity
    }

    pub fn peak_equity(&self) -> Option<f64> {
        self.peak_equity
    }

    pub fn state(&self) -> KillSwitchState {
        match self.tripped {
            Some(r) => KillSwitchState::Tripped(r),
            None => KillSwitchState::Active,
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.is_some()
    }

    /// True when trading may continue. Runs both checks on this call and
    /// trips on either failure; once tripped, always false until `reset`.
    pub fn is_system_active(&mut self, equity: f64, expectancy: f64) -> bool {
        self.evaluate(equity, Some(expectancy)).is_active()
    }

    /// Same as `is_system_active`, with the expectancy leg optional
    /// (`None` skips it).
    ///
    /// The first call on an un-reset switch treats `equity` as the start.
    pub fn evaluate(&mut self, equity: f64, expectancy: Option<f64>) -> KillSwitchState {
        if let Some(r) = self.tripped {
            return KillSwitchState::Tripped(r);
        }
        if self.start_equity.is_none() {
            self.reset(equity);
        }

        let peak = self.peak_equity.map_or(equity, |p| p.max(equity));
        self.peak_equity = Some(peak);

        let drawdown = if peak > 0.0 { (peak - equity) / peak } else { 0.0 };
        if drawdown >= self.cfg.max_drawdown_pct {
            self.tripped = Some(TripReason::Drawdown {
                drawdown_pct: (drawdown * 100.0).clamp(0.0, 100.0),
            });
        } else if let Some(e) = expectancy {
            if e < self.cfg.min_expectancy {
                self.tripped = Some(TripReason::Expectancy { expectancy: e });
            }
        }

        self.state()
    }
}
