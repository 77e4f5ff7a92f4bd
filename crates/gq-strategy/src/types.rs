use gq_features::MarketState;
use gq_schemas::Direction;

/// Policy identity, reported in run summaries and audit events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicySpec {
    pub name: String,
    pub version: u32,
}

impl PolicySpec {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

/// Per-bar signal policy.
///
/// Implementations must be pure functions of `state`; the backtest loop
/// relies on this for replay determinism.
pub trait SignalPolicy: Send + Sync {
    fn spec(&self) -> PolicySpec;

    fn decide(&self, state: &MarketState) -> Direction;
}

/// Run a policy over a whole enriched series (one intent per bar).
pub fn generate_signals<P: SignalPolicy + ?Sized>(
    policy: &P,
    states: &[MarketState],
) -> Vec<Direction> {
    states.iter().map(|s| policy.decide(s)).collect()
}

#[derive(Clone, Debug, PartialEq)]
pub enum SignalConfigError {
    Negative { field: &'static str, value: f64 },
    NotFinite { field: &'static str },
    OutOfUnitRange { field: &'static str, value: f64 },
}

impl std::fmt::Display for SignalConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalConfigError::Negative { field, value } => {
                write!(f, "signal.{} must be >= 0, got {}", field, value)
            }
            SignalConfigError::NotFinite { field } => write!(f, "signal.{} must be finite", field),
            SignalConfigError::OutOfUnitRange { field, value } => {
                write!(f, "signal.{} must be within [0, 1], got {}", field, value)
            }
        }
    }
}

impl std::error::Error for SignalConfigError {}
