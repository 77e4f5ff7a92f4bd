use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Per-run state the gate needs. Owned by the backtest loop, passed by reference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunState {
    pub kill_switch_active: bool,
    pub open_position: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
    /// Entries are refused when `vol_pct` is strictly above this.
    pub vol_pct_ceiling: f64,
}

/// Why the gate refused an intent. Checked in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateReason {
    FlatIntent,
    KillSwitchInactive,
    ChaosRegime,
    VolatilityCeiling,
    OpenPosition,
}

impl GateReason {
    pub fn as_str(self) -> &'static str {
        match self {
            GateReason::FlatIntent => "FLAT_INTENT",
            GateReason::KillSwitchInactive => "KILL_SWITCH_INACTIVE",
            GateReason::ChaosRegime => "CHAOS_REGIME",
            GateReason::VolatilityCeiling => "VOLATILITY_CEILING",
            GateReason::OpenPosition => "OPEN_POSITION",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Approve,
    Reject(GateReason),
}

impl GateDecision {
    pub fn is_approved(self) -> bool {
        self == GateDecision::Approve
    }
}

// ---------------------------------------------------------------------------
// Sizing
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizingConfig {
    /// Fraction of current equity risked per trade (0.01 = 1%).
    pub risk_fraction: f64,
    pub sl_atr_mult: f64,
    pub tp_atr_mult: f64,
    /// Smallest tradable size; smaller raw sizes are raised to this.
    pub min_position_units: f64,
}

/// Stop-loss / take-profit levels for one entry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub stop: f64,
    pub target: f64,
    pub stop_distance: f64,
    pub target_distance: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SizingError {
    /// Brackets only exist for Buy / Sell.
    FlatDirection,
    /// Entry equals stop; size would be unbounded.
    ZeroRiskDistance { entry: f64, stop: f64 },
    /// Equity or risk fraction is not positive.
    InvalidRisk { equity: f64, risk_fraction: f64 },
    NonFinite { field: &'static str },
}

impl std::fmt::Display for SizingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizingError::FlatDirection => write!(f, "cannot bracket a flat intent"),
            SizingError::ZeroRiskDistance { entry, stop } => {
                write!(f, "zero risk distance: entry={} stop={}", entry, stop)
            }
            SizingError::InvalidRisk {
                equity,
                risk_fraction,
            } => write!(
                f,
                "invalid risk inputs: equity={} risk_fraction={}",
                equity, risk_fraction
            ),
            SizingError::NonFinite { field } => write!(f, "non-finite sizing input: {}", field),
        }
    }
}

impl std::error::Error for SizingError {}

// ---------------------------------------------------------------------------
// Kill switch
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KillSwitchConfig {
    /// Drawdown from peak that trips the switch, as a fraction (0.2 = 20%).
    pub max_drawdown_pct: f64,
    /// Running expectancy (mean R) below this trips the switch.
    pub min_expectancy: f64,
    /// Closed trades required before the expectancy floor is enforced.
    pub expectancy_min_trades: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TripReason {
    /// `drawdown_pct` is in percent (25.0 = 25%).
    Drawdown { drawdown_pct: f64 },
    Expectancy { expectancy: f64 },
}

impl std::fmt::Display for TripReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TripReason::Drawdown { drawdown_pct } => {
                write!(f, "max drawdown breached: {:.2}%", drawdown_pct)
            }
            TripReason::Expectancy { expectancy } => {
                write!(f, "expectancy below floor: {:.4}", expectancy)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KillSwitchState {
    Active,
    Tripped(TripReason),
}

impl KillSwitchState {
    pub fn is_active(self) -> bool {
        self == KillSwitchState::Active
    }
}

// ---------------------------------------------------------------------------
// Config validation
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct RiskConfigError {
    pub field: &'static str,
    pub value: f64,
    pub expected: &'static str,
}

impl std::fmt::Display for RiskConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {} (expected {})", self.field, self.value, self.expected)
    }
}

impl std::error::Error for RiskConfigError {}

fn check(
    field: &'static str,
    value: f64,
    ok: bool,
    expected: &'static str,
) -> Result<(), RiskConfigError> {
    if value.is_finite() && ok {
        Ok(())
    } else {
        Err(RiskConfigError {
            field,
            value,
            expected,
        })
    }
}

impl GateConfig {
    pub fn validate(&self) -> Result<(), RiskConfigError> {
        let v = self.vol_pct_ceiling;
        check("gate.vol_pct_ceiling", v, (0.0..=1.0).contains(&v), "0 <= x <= 1")
    }
}

impl SizingConfig {
    pub fn validate(&self) -> Result<(), RiskConfigError> {
        let r = self.risk_fraction;
        check("sizing.risk_fraction", r, r > 0.0 && r < 1.0, "0 < x < 1")?;
        check("sizing.sl_atr_mult", self.sl_atr_mult, self.sl_atr_mult > 0.0, "x > 0")?;
        check("sizing.tp_atr_mult", self.tp_atr_mult, self.tp_atr_mult > 0.0, "x > 0")?;
        check(
            "sizing.min_position_units",
            self.min_position_units,
            self.min_position_units >= 0.0,
            "x >= 0",
        )
    }
}

impl KillSwitchConfig {
    pub fn validate(&self) -> Result<(), RiskConfigError> {
        let d = self.max_drawdown_pct;
        check("kill_switch.max_drawdown_pct", d, d > 0.0 && d <= 1.0, "0 < x <= 1")?;
        check("kill_switch.min_expectancy", self.min_expectancy, true, "finite")
    }
}
