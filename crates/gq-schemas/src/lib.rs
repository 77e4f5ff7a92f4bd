//! gq-schemas
//!
//! Shared value types for the simulation core:
//! - `Bar`: immutable OHLC input (epoch-second timestamp, optional volume)
//! - `Regime` / `Bias`: market condition tag attached by the feature builder
//! - `Direction`: discrete trade intent (Buy / Sell / Flat)
//!
//! Schema validation runs once, before any simulation starts.

use serde::{Deserialize, Serialize};

/// One OHLC bar. Never mutated after load; derived fields live in `MarketState`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar timestamp (epoch seconds).
    pub ts: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl Bar {
    pub fn new(ts: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            ts,
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// True when the bar's high/low range includes `price`.
    pub fn touches(&self, price: f64) -> bool {
        self.low <= price && price <= self.high
    }
}

/// Trend direction carried by `Regime::Trend`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bias {
    Long,
    Short,
}

impl Bias {
    pub fn sign(self) -> i8 {
        match self {
            Bias::Long => 1,
            Bias::Short => -1,
        }
    }
}

/// Market regime. Exactly one per bar.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    Range,
    Trend(Bias),
    Chaos,
}

impl Regime {
    /// Stable numeric code: Range=0, Trend=1, Chaos=2.
    pub fn code(self) -> u8 {
        match self {
            Regime::Range => 0,
            Regime::Trend(_) => 1,
            Regime::Chaos => 2,
        }
    }

    /// Directional bias: +1/-1 for Trend bars, 0 otherwise.
    pub fn bias(self) -> i8 {
        match self {
            Regime::Trend(b) => b.sign(),
            _ => 0,
        }
    }

    pub fn is_chaos(self) -> bool {
        self == Regime::Chaos
    }

    pub fn label(self) -> &'static str {
        match self {
            Regime::Range => "RANGE",
            Regime::Trend(_) => "TREND",
            Regime::Chaos => "CHAOS",
        }
    }
}

/// Discrete trade intent produced once per bar.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Sell,
    Flat,
    Buy,
}

impl Direction {
    /// -1 / 0 / +1.
    pub fn as_i8(self) -> i8 {
        match self {
            Direction::Sell => -1,
            Direction::Flat => 0,
            Direction::Buy => 1,
        }
    }

    /// Same as `as_i8`, as a float multiplier for PnL arithmetic.
    pub fn sign(self) -> f64 {
        f64::from(self.as_i8())
    }

    pub fn from_i8(v: i8) -> Option<Self> {
        match v {
            -1 => Some(Direction::Sell),
            0 => Some(Direction::Flat),
            1 => Some(Direction::Buy),
            _ => None,
        }
    }

    pub fn is_flat(self) -> bool {
        self == Direction::Flat
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Sell => "SELL",
            Direction::Flat => "FLAT",
            Direction::Buy => "BUY",
        }
    }
}

/// Fatal input problems. Raised at setup, before any bar is simulated.
#[derive(Clone, Debug, PartialEq)]
pub enum InputSchemaError {
    /// A required column/field is absent from the source.
    MissingField { field: String },
    /// A field is present but could not be parsed.
    BadValue {
        row: usize,
        field: String,
        value: String,
    },
    /// OHLC contains NaN or infinity.
    NonFinite { index: usize, field: &'static str },
    /// Price is zero or negative.
    NonPositivePrice { index: usize, field: &'static str },
    /// high < low, or open/close outside [low, high].
    InconsistentRange { index: usize },
    /// Timestamps must be strictly increasing.
    NonMonotonicTimestamp { index: usize, prev_ts: i64, ts: i64 },
}

impl std::fmt::Display for InputSchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputSchemaError::MissingField { field } => {
                write!(f, "missing required field: {}", field)
            }
            InputSchemaError::BadValue { row, field, value } => {
                write!(f, "row {}: cannot parse {}={:?}", row, field, value)
            }
            InputSchemaError::NonFinite { index, field } => {
                write!(f, "bar {}: non-finite {}", index, field)
            }
            InputSchemaError::NonPositivePrice { index, field } => {
                write!(f, "bar {}: non-positive {}", index, field)
            }
            InputSchemaError::InconsistentRange { index } => {
                write!(f, "bar {}: open/close outside [low, high] or high < low", index)
            }
            InputSchemaError::NonMonotonicTimestamp { index, prev_ts, ts } => write!(
                f,
                "bar {}: timestamp {} is not after previous {}",
                index, ts, prev_ts
            ),
        }
    }
}

impl std::error::Error for InputSchemaError {}

/// Validate a bar sequence: finite positive prices, consistent ranges,
/// strictly increasing timestamps. An empty sequence is valid.
pub fn validate_bars(bars: &[Bar]) -> Result<(), InputSchemaError> {
    let mut prev_ts: Option<i64> = None;

    for (index, bar) in bars.iter().enumerate() {
        for (field, v) in [
            ("open", bar.open),
            ("high", bar.high),
            ("low", bar.low),
            ("close", bar.close),
        ] {
            if !v.is_finite() {
                return Err(InputSchemaError::NonFinite { index, field });
            }
            if v <= 0.0 {
                return Err(InputSchemaError::NonPositivePrice { index, field });
            }
        }
        if let Some(v) = bar.volume {
            if !v.is_finite() {
                return Err(InputSchemaError::NonFinite {
                    index,
                    field: "volume",
                });
            }
        }

        if bar.high < bar.low
            || !bar.touches(bar.open)
            || !bar.touches(bar.close)
        {
            return Err(InputSchemaError::InconsistentRange { index });
        }

        if let Some(p) = prev_ts {
            if bar.ts <= p {
                return Err(InputSchemaError::NonMonotonicTimestamp {
                    index,
                    prev_ts: p,
                    ts: bar.ts,
                });
            }
        }
        prev_ts = Some(bar.ts);
    }

    Ok(())
}
