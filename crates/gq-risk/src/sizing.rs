use gq_schemas::Direction;

use crate::{Bracket, SizingConfig, SizingError};

/// ATR-scaled stop and target around `entry`. Sell brackets are mirrored.
pub fn apply_sl_tp(
    entry: f64,
    direction: Direction,
    atr: f64,
    sl_mult: f64,
    tp_mult: f64,
) -> Result<Bracket, SizingError> {
    for (field, v) in [
        ("entry", entry),
        ("atr", atr),
        ("sl_mult", sl_mult),
        ("tp_mult", tp_mult),
    ] {
        if !v.is_finite() {
            return Err(SizingError::NonFinite { field });
        }
    }
    if direction.is_flat() {
        return Err(SizingError::FlatDirection);
    }

    let stop_distance = (atr * sl_mult).abs();
    let target_distance = (atr * tp_mult).abs();
    let sign = direction.sign();

    Ok(Bracket {
        stop: entry - sign * stop_distance,
        target: entry + sign * target_distance,
        stop_distance,
        target_distance,
    })
}

/// Fixed-fractional size: `equity * risk_fraction / |entry - stop|`, raised
/// to `min_units` when smaller.
///
/// A zero distance is an error; the caller rejects the trade.
pub fn calculate_position_size(
    entry: f64,
    stop: f64,
    equity: f64,
    risk_fraction: f64,
    min_units: f64,
) -> Result<f64, SizingError> {
    for (field, v) in [
        ("entry", entry),
        ("stop", stop),
        ("equity", equity),
        ("risk_fraction", risk_fraction),
        ("min_units", min_units),
    ] {
        if !v.is_finite() {
            return Err(SizingError::NonFinite { field });
        }
    }
    if equity <= 0.0 || risk_fraction <= 0.0 {
        return Err(SizingError::InvalidRisk {
            equity,
            risk_fraction,
        });
    }

    let distance = (entry - stop).abs();
    if distance == 0.0 {
        return Err(SizingError::ZeroRiskDistance { entry, stop });
    }

    let raw = equity * risk_fraction / distance;
    Ok(raw.max(min_units))
}

/// Bracket and size in one step, using `cfg`'s multipliers and risk fraction.
pub fn size_trade(
    entry: f64,
    direction: Direction,
    atr: f64,
    equity: f64,
    cfg: &SizingConfig,
) -> Result<(Bracket, f64), SizingError> {
    let bracket = apply_sl_tp(entry, direction, atr, cfg.sl_atr_mult, cfg.tp_atr_mult)?;
    let size = calculate_position_size(
        entry,
        bracket.stop,
        equity,
        cfg.risk_fraction,
        cfg.min_position_units,
    )?;
    Ok((bracket, size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sell_bracket_is_mirrored() {
        let b = apply_sl_tp(2000.0, Direction::Sell, 10.0, 1.0, 2.0).unwrap();
        assert_eq!(b.stop, 2010.0);
        assert_eq!(b.target, 1980.0);
        assert_eq!(b.stop_distance, 10.0);
        assert_eq!(b.target_distance, 20.0);
    }

    #[test]
    fn flat_has_no_bracket() {
        assert_eq!(
            apply_sl_tp(2000.0, Direction::Flat, 10.0, 1.0, 2.0),
            Err(SizingError::FlatDirection)
        );
    }

    #[test]
    fn tiny_raw_size_is_raised_to_minimum() {
        // 100 * 0.01 / 500 = 0.002
        let size = calculate_position_size(1000.0, 500.0, 100.0, 0.01, 1.0).unwrap();
        assert_eq!(size, 1.0);
    }

    #[test]
    fn non_positive_equity_is_invalid() {
        assert!(matches!(
            calculate_position_size(100.0, 99.0, 0.0, 0.01, 1.0),
            Err(SizingError::InvalidRisk { .. })
        ));
    }

    #[test]
    fn nan_entry_is_rejected() {
        assert_eq!(
            calculate_position_size(f64::NAN, 99.0, 1000.0, 0.01, 1.0),
            Err(SizingError::NonFinite { field: "entry" })
        );
    }
}
