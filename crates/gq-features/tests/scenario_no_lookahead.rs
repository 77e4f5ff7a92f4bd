use gq_features::{build_market_state, FeatureConfig, MarketStateBuilder};
use gq_testkit::random_walk;

#[test]
fn prefix_states_do_not_change_when_future_bars_are_appended() {
    let bars = random_walk(17, 300, 2000.0, 0.004);
    let cfg = FeatureConfig::standard();

    let full = build_market_state(&bars, &cfg).expect("full");
    let prefix = build_market_state(&bars[..150], &cfg).expect("prefix");

    assert_eq!(full.len(), 300);
    assert_eq!(&full[..150], &prefix[..]);
}

#[test]
fn incremental_builder_matches_batch() {
    let bars = random_walk(5, 200, 150.0, 0.01);
    let cfg = FeatureConfig::standard();

    let batch = build_market_state(&bars, &cfg).expect("batch");
    let mut b = MarketStateBuilder::new(cfg).expect("builder");
    let incremental: Vec<_> = bars.iter().map(|bar| b.push(bar)).collect();

    assert_eq!(batch, incremental);
}

#[test]
fn ohlc_is_carried_through_unchanged() {
    let bars = random_walk(9, 50, 80.0, 0.01);
    let states = build_market_state(&bars, &FeatureConfig::standard()).expect("states");
    for (s, b) in states.iter().zip(&bars) {
        assert_eq!(&s.bar, b);
    }
}
