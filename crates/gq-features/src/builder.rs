use gq_schemas::{Bar, Bias, Regime};
use serde::{Deserialize, Serialize};

use crate::rolling::{percentile_rank_of_last, RollingWindow};

/// Lookback lengths and regime thresholds for the market state builder.
///
/// Every field is required when deserialized; `standard()` is the reference
/// profile used by tests and the sample config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureConfig {
    pub sma_short: usize,
    pub sma_long: usize,
    /// Std of returns, short lookback.
    pub vol_short: usize,
    /// Std of returns, long lookback.
    pub vol_long: usize,
    pub atr_window: usize,
    pub zscore_window: usize,
    /// Std of returns whose percentile rank drives Chaos detection.
    pub vol_window: usize,
    /// Trailing history length used to rank `vol_window` volatility.
    pub vol_rank_window: usize,
    pub momentum_window: usize,
    /// Trailing bars for the mean absolute close-to-close change.
    pub slope_window: usize,
    /// Trend threshold = `slope_mult` * mean |close change|.
    pub slope_mult: f64,
    /// `vol_pct` above this marks the bar Chaos.
    pub chaos_vol_pct: f64,
}

impl FeatureConfig {
    pub fn standard() -> Self {
        Self {
            sma_short: 5,
            sma_long: 10,
            vol_short: 5,
            vol_long: 10,
            atr_window: 14,
            zscore_window: 20,
            vol_window: 20,
            vol_rank_window: 100,
            momentum_window: 10,
            slope_window: 20,
            slope_mult: 0.5,
            chaos_vol_pct: 0.90,
        }
    }

    pub fn validate(&self) -> Result<(), FeatureConfigError> {
        for (field, v) in [
            ("sma_short", self.sma_short),
            ("sma_long", self.sma_long),
            ("atr_window", self.atr_window),
            ("vol_rank_window", self.vol_rank_window),
            ("slope_window", self.slope_window),
        ] {
            if v == 0 {
                return Err(FeatureConfigError::ZeroWindow { field });
            }
        }
        // Sample std needs two observations.
        for (field, v) in [
            ("vol_short", self.vol_short),
            ("vol_long", self.vol_long),
            ("zscore_window", self.zscore_window),
            ("vol_window", self.vol_window),
            ("momentum_window", self.momentum_window),
        ] {
            if v < 2 {
                return Err(FeatureConfigError::WindowTooShort { field, min: 2 });
            }
        }
        if !self.slope_mult.is_finite() || self.slope_mult < 0.0 {
            return Err(FeatureConfigError::OutOfRange {
                field: "slope_mult",
                value: self.slope_mult,
            });
        }
        if !(0.0..=1.0).contains(&self.chaos_vol_pct) {
            return Err(FeatureConfigError::OutOfRange {
                field: "chaos_vol_pct",
                value: self.chaos_vol_pct,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FeatureConfigError {
    ZeroWindow { field: &'static str },
    WindowTooShort { field: &'static str, min: usize },
    OutOfRange { field: &'static str, value: f64 },
}

impl std::fmt::Display for FeatureConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureConfigError::ZeroWindow { field } => write!(f, "features.{} must be > 0", field),
            FeatureConfigError::WindowTooShort { field, min } => {
                write!(f, "features.{} must be >= {}", field, min)
            }
            FeatureConfigError::OutOfRange { field, value } => {
                write!(f, "features.{} out of range: {}", field, value)
            }
        }
    }
}

impl std::error::Error for FeatureConfigError {}

/// A bar plus everything derived from it and the bars before it.
///
/// Any statistic whose lookback is not yet satisfied is `0.0`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    pub bar: Bar,
    pub returns: f64,
    pub sma_short: f64,
    pub sma_long: f64,
    pub sma_diff: f64,
    pub vol_short: f64,
    pub vol_long: f64,
    pub atr: f64,
    pub zscore: f64,
    pub vol_pct: f64,
    pub momentum: f64,
    pub ma_slope: f64,
    pub regime: Regime,
}

/// Incremental builder: one `push` per bar, in time order.
///
/// Holds only trailing windows, so the state emitted for bar `i` cannot
/// depend on any bar after `i`.
#[derive(Clone, Debug)]
pub struct MarketStateBuilder {
    cfg: FeatureConfig,
    prev_close: Option<f64>,
    prev_sma_long: Option<f64>,
    close_short: RollingWindow,
    close_long: RollingWindow,
    close_z: RollingWindow,
    ret_short: RollingWindow,
    ret_long: RollingWindow,
    ret_vol: RollingWindow,
    ret_mom: RollingWindow,
    true_range: RollingWindow,
    abs_change: RollingWindow,
    vol_history: RollingWindow,
}

impl MarketStateBuilder {
    pub fn new(cfg: FeatureConfig) -> Result<Self, FeatureConfigError> {
        cfg.validate()?;
        Ok(Self {
            prev_close: None,
            prev_sma_long: None,
            close_short: RollingWindow::new(cfg.sma_short),
            close_long: RollingWindow::new(cfg.sma_long),
            close_z: RollingWindow::new(cfg.zscore_window),
            ret_short: RollingWindow::new(cfg.vol_short),
            ret_long: RollingWindow::new(cfg.vol_long),
            ret_vol: RollingWindow::new(cfg.vol_window),
            ret_mom: RollingWindow::new(cfg.momentum_window),
            true_range: RollingWindow::new(cfg.atr_window),
            abs_change: RollingWindow::new(cfg.slope_window),
            vol_history: RollingWindow::new(cfg.vol_rank_window),
            cfg,
        })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.cfg
    }

    pub fn push(&mut self, bar: &Bar) -> MarketState {
        let close = bar.close;

        // Returns exist from the second bar on.
        let returns = match self.prev_close {
            Some(p) if p != 0.0 => {
                let r = close / p - 1.0;
                self.ret_short.push(r);
                self.ret_long.push(r);
                self.ret_vol.push(r);
                self.ret_mom.push(r);
                self.abs_change.push((close - p).abs());
                r
            }
            _ => 0.0,
        };

        let tr = match self.prev_close {
            Some(p) => (bar.high - bar.low)
                .max((bar.high - p).abs())
                .max((bar.low - p).abs()),
            None => bar.high - bar.low,
        };
        self.true_range.push(tr);

        self.close_short.push(close);
        self.close_long.push(close);
        self.close_z.push(close);
        self.prev_close = Some(close);

        let sma_short = self.close_short.mean();
        let sma_long = self.close_long.mean();
        let sma_diff = match (sma_short, sma_long) {
            (Some(s), Some(l)) => s - l,
            _ => 0.0,
        };

        let ma_slope = match (sma_long, self.prev_sma_long) {
            (Some(now), Some(prev)) => now - prev,
            _ => 0.0,
        };
        if sma_long.is_some() {
            self.prev_sma_long = sma_long;
        }

        let zscore = match (self.close_z.mean(), self.close_z.std()) {
            (Some(m), Some(s)) if s > 0.0 => (close - m) / s,
            _ => 0.0,
        };

        let momentum = match (self.ret_mom.mean(), self.ret_mom.std()) {
            (Some(m), Some(s)) if s > 0.0 => m / s,
            _ => 0.0,
        };

        let vol_pct = match self.ret_vol.std() {
            Some(v) => {
                self.vol_history.push(v);
                percentile_rank_of_last(&self.vol_history).unwrap_or(0.0)
            }
            None => 0.0,
        };

        let regime = self.classify(vol_pct, ma_slope);

        MarketState {
            bar: bar.clone(),
            returns,
            sma_short: sma_short.unwrap_or(0.0),
            sma_long: sma_long.unwrap_or(0.0),
            sma_diff,
            vol_short: self.ret_short.std().unwrap_or(0.0),
            vol_long: self.ret_long.std().unwrap_or(0.0),
            atr: self.true_range.mean().unwrap_or(0.0),
            zscore,
            vol_pct,
            momentum,
            ma_slope,
            regime,
        }
    }

    fn classify(&self, vol_pct: f64, ma_slope: f64) -> Regime {
        if vol_pct > self.cfg.chaos_vol_pct {
            return Regime::Chaos;
        }
        let threshold = self.abs_change.mean().unwrap_or(0.0) * self.cfg.slope_mult;
        if threshold > 0.0 && ma_slope.abs() > threshold {
            let bias = if ma_slope > 0.0 { Bias::Long } else { Bias::Short };
            return Regime::Trend(bias);
        }
        Regime::Range
    }
}

/// Enrich a whole bar series. Output has the same length and order as `bars`.
pub fn build_market_state(
    bars: &[Bar],
    cfg: &FeatureConfig,
) -> Result<Vec<MarketState>, FeatureConfigError> {
    let mut builder = MarketStateBuilder::new(cfg.clone())?;
    Ok(bars.iter().map(|b| builder.push(b)).collect())
}
