use gq_schemas::{validate_bars, Bar, InputSchemaError};

fn bar(ts: i64, close: f64) -> Bar {
    Bar::new(ts, close, close + 1.0, close - 1.0, close)
}

#[test]
fn well_formed_series_passes() {
    let bars: Vec<Bar> = (0..10).map(|i| bar(60 * (i + 1), 2000.0 + i as f64)).collect();
    assert_eq!(validate_bars(&bars), Ok(()));
    assert_eq!(validate_bars(&[]), Ok(()));
}

#[test]
fn duplicate_timestamp_is_rejected() {
    let bars = vec![bar(60, 2000.0), bar(120, 2001.0), bar(120, 2002.0)];
    assert_eq!(
        validate_bars(&bars),
        Err(InputSchemaError::NonMonotonicTimestamp {
            index: 2,
            prev_ts: 120,
            ts: 120
        })
    );
}

#[test]
fn nan_close_is_rejected() {
    let mut b = bar(60, 2000.0);
    b.close = f64::NAN;
    assert_eq!(
        validate_bars(&[b]),
        Err(InputSchemaError::NonFinite {
            index: 0,
            field: "close"
        })
    );
}

#[test]
fn close_above_high_is_rejected() {
    let b = Bar::new(60, 2000.0, 2001.0, 1999.0, 2005.0);
    assert_eq!(
        validate_bars(&[b]),
        Err(InputSchemaError::InconsistentRange { index: 0 })
    );
}

#[test]
fn zero_price_is_rejected() {
    let b = Bar::new(60, 0.0, 1.0, 0.0, 0.5);
    assert_eq!(
        validate_bars(&[b]),
        Err(InputSchemaError::NonPositivePrice {
            index: 0,
            field: "open"
        })
    );
}

#[test]
fn volume_is_optional_on_the_wire() {
    let b: Bar = serde_json::from_str(r#"{"ts":60,"open":1.0,"high":2.0,"low":0.5,"close":1.5}"#)
        .expect("bar without volume");
    assert_eq!(b.volume, None);
}
