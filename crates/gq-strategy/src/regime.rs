use gq_features::MarketState;
use gq_schemas::{Direction, Regime};
use serde::{Deserialize, Serialize};

use crate::{PolicySpec, SignalConfigError, SignalPolicy};

/// Thresholds for `RegimeSignalPolicy`. All required.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignalConfig {
    /// |zscore| beyond this is an entry candidate.
    pub z_thresh: f64,
    /// Trend entries need momentum beyond this, in the trade direction.
    pub mom_thresh: f64,
    /// Volatility percentile above which every bar is Flat.
    pub flat_above_vol_pct: f64,
}

impl SignalConfig {
    pub fn validate(&self) -> Result<(), SignalConfigError> {
        for (field, v) in [("z_thresh", self.z_thresh), ("mom_thresh", self.mom_thresh)] {
            if !v.is_finite() {
                return Err(SignalConfigError::NotFinite { field });
            }
            if v < 0.0 {
                return Err(SignalConfigError::Negative { field, value: v });
            }
        }
        if !(0.0..=1.0).contains(&self.flat_above_vol_pct) {
            return Err(SignalConfigError::OutOfUnitRange {
                field: "flat_above_vol_pct",
                value: self.flat_above_vol_pct,
            });
        }
        Ok(())
    }
}

/// Mean reversion in Range, pullback-with-momentum in Trend, nothing in Chaos.
#[derive(Clone, Debug, PartialEq)]
pub struct RegimeSignalPolicy {
    cfg: SignalConfig,
}

impl RegimeSignalPolicy {
    pub fn new(cfg: SignalConfig) -> Result<Self, SignalConfigError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &SignalConfig {
        &self.cfg
    }
}

impl SignalPolicy for RegimeSignalPolicy {
    fn spec(&self) -> PolicySpec {
        PolicySpec::new("regime_zscore", 1)
    }

    fn decide(&self, s: &MarketState) -> Direction {
        let z = self.cfg.z_thresh;
        let m = self.cfg.mom_thresh;

        // First match wins.
        if s.regime == Regime::Chaos || s.vol_pct > self.cfg.flat_above_vol_pct {
            return Direction::Flat;
        }

        match s.regime {
            Regime::Trend(_) => {
                if s.zscore < -z && s.momentum > m {
                    Direction::Buy
                } else if s.zscore > z && s.momentum < -m {
                    Direction::Sell
                } else {
                    Direction::Flat
                }
            }
            Regime::Range => {
                if s.zscore < -z {
                    Direction::Buy
                } else if s.zscore > z {
                    Direction::Sell
                } else {
                    Direction::Flat
                }
            }
            Regime::Chaos => Direction::Flat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_threshold_rejected() {
        let cfg = SignalConfig {
            z_thresh: -1.0,
            mom_thresh: 0.0,
            flat_above_vol_pct: 0.95,
        };
        assert_eq!(
            RegimeSignalPolicy::new(cfg),
            Err(SignalConfigError::Negative {
                field: "z_thresh",
                value: -1.0
            })
        );
    }

    #[test]
    fn ceiling_outside_unit_interval_rejected() {
        let cfg = SignalConfig {
            z_thresh: 1.0,
            mom_thresh: 0.0,
            flat_above_vol_pct: 1.5,
        };
        assert!(matches!(
            cfg.validate(),
            Err(SignalConfigError::OutOfUnitRange { .. })
        ));
    }
}
