use gq_risk::*;
use gq_schemas::Direction;

#[test]
fn scenario_buy_bracket_straddles_entry() {
    let b = apply_sl_tp(2000.0, Direction::Buy, 10.0, 1.0, 2.0).expect("bracket");
    assert!(b.stop < 2000.0);
    assert!(2000.0 < b.target);
    assert_eq!(b.stop, 1990.0);
    assert_eq!(b.target, 2020.0);
}

#[test]
fn scenario_fixed_fractional_size() {
    let size = calculate_position_size(2000.0, 1990.0, 100_000.0, 0.01, 1.0).expect("size");
    assert_eq!(size, 100.0);
}

#[test]
fn scenario_zero_distance_is_rejected_not_defaulted() {
    assert_eq!(
        calculate_position_size(2000.0, 2000.0, 100_000.0, 0.01, 1.0),
        Err(SizingError::ZeroRiskDistance {
            entry: 2000.0,
            stop: 2000.0
        })
    );
}

#[test]
fn scenario_zero_atr_flows_into_zero_distance() {
    let cfg = SizingConfig {
        risk_fraction: 0.01,
        sl_atr_mult: 1.5,
        tp_atr_mult: 3.0,
        min_position_units: 1.0,
    };
    assert!(matches!(
        size_trade(2000.0, Direction::Sell, 0.0, 100_000.0, &cfg),
        Err(SizingError::ZeroRiskDistance { .. })
    ));
}

#[test]
fn scenario_size_trade_combines_bracket_and_size() {
    let cfg = SizingConfig {
        risk_fraction: 0.02,
        sl_atr_mult: 2.0,
        tp_atr_mult: 4.0,
        min_position_units: 1.0,
    };
    let (b, size) = size_trade(500.0, Direction::Sell, 5.0, 50_000.0, &cfg).expect("sized");
    assert_eq!(b.stop, 510.0);
    assert_eq!(b.target, 480.0);
    // 50_000 * 0.02 / 10
    assert_eq!(size, 100.0);
}

#[test]
fn scenario_sizing_config_requires_every_field() {
    let missing = serde_json::from_str::<SizingConfig>(
        r#"{"risk_fraction":0.01,"sl_atr_mult":1.0,"tp_atr_mult":2.0}"#,
    );
    assert!(missing.is_err());
}

#[test]
fn scenario_sizing_config_bounds() {
    let mut cfg = SizingConfig {
        risk_fraction: 0.01,
        sl_atr_mult: 1.0,
        tp_atr_mult: 2.0,
        min_position_units: 1.0,
    };
    assert_eq!(cfg.validate(), Ok(()));
    cfg.risk_fraction = 1.5;
    let err = cfg.validate().unwrap_err();
    assert_eq!(err.field, "sizing.risk_fraction");
}
