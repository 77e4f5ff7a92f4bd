use serde::{Deserialize, Serialize};

/// Audit of one trade ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditMetrics {
    /// Closed trades audited.
    pub trades: usize,
    /// Gross profit / gross loss. Infinite when nothing lost and something won.
    #[serde(with = "float_repr")]
    pub profit_factor: f64,
    /// Percent (25.0 = 25%).
    pub max_drawdown_pct: f64,
    /// Mean R-multiple.
    pub expectancy: f64,
    /// Fraction of trades with positive PnL.
    pub win_rate: f64,
    pub net_pnl: f64,
}

impl AuditMetrics {
    pub fn empty() -> Self {
        Self {
            trades: 0,
            profit_factor: 0.0,
            max_drawdown_pct: 0.0,
            expectancy: 0.0,
            win_rate: 0.0,
            net_pnl: 0.0,
        }
    }
}

/// JSON has no infinity or NaN: non-finite values travel as the strings
/// `"inf"`, `"-inf"` and `"nan"`; finite values stay numbers.
pub mod float_repr {
    use serde::de::{self, Deserializer, Visitor};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
        if v.is_nan() {
            s.serialize_str("nan")
        } else if *v == f64::INFINITY {
            s.serialize_str("inf")
        } else if *v == f64::NEG_INFINITY {
            s.serialize_str("-inf")
        } else {
            s.serialize_f64(*v)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        d.deserialize_any(FloatVisitor)
    }

    /// Text form used by CSV writers and summary lines.
    pub fn to_text(v: f64) -> String {
        if v.is_nan() {
            "nan".to_string()
        } else if v == f64::INFINITY {
            "inf".to_string()
        } else if v == f64::NEG_INFINITY {
            "-inf".to_string()
        } else {
            v.to_string()
        }
    }

    struct FloatVisitor;

    impl<'de> Visitor<'de> for FloatVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a number or one of \"inf\", \"-inf\", \"nan\"")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            match v {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                "nan" => Ok(f64::NAN),
                other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
            }
        }
    }
}
