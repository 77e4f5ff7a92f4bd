use gq_risk::*;

fn switch() -> KillSwitch {
    KillSwitch::new(KillSwitchConfig {
        max_drawdown_pct: 0.2,
        min_expectancy: 0.1,
        expectancy_min_trades: 0,
    })
    .expect("config")
}

#[test]
fn scenario_documented_thresholds() {
    let mut ks = switch();
    ks.reset(100_000.0);
    // 10% drawdown, expectancy above floor.
    assert!(ks.is_system_active(90_000.0, 0.2));
    // 25% drawdown.
    assert!(!ks.is_system_active(75_000.0, 0.2));

    let mut ks = switch();
    ks.reset(100_000.0);
    // Expectancy 0.05 under the 0.1 floor.
    assert!(!ks.is_system_active(100_000.0, 0.05));
    assert_eq!(
        ks.state(),
        KillSwitchState::Tripped(TripReason::Expectancy { expectancy: 0.05 })
    );
}

#[test]
fn scenario_trip_is_sticky_until_reset() {
    let mut ks = switch();
    ks.reset(100_000.0);
    assert!(!ks.is_system_active(75_000.0, 0.2));

    // Recovery does not re-arm.
    for equity in [80_000.0, 100_000.0, 150_000.0, 1_000_000.0] {
        assert!(!ks.is_system_active(equity, 5.0));
        assert!(!ks.evaluate(equity, None).is_active());
    }
    assert_eq!(
        ks.state(),
        KillSwitchState::Tripped(TripReason::Drawdown { drawdown_pct: 25.0 })
    );

    ks.reset(75_000.0);
    assert!(ks.is_system_active(75_000.0, 0.2));
    assert_eq!(ks.peak_equity(), Some(75_000.0));
}

#[test]
fn scenario_drawdown_exactly_at_limit_trips() {
    let mut ks = switch();
    ks.reset(100_000.0);
    assert!(!ks.is_system_active(80_000.0, 1.0));
}

#[test]
fn scenario_drawdown_is_measured_from_running_peak() {
    let mut ks = switch();
    ks.reset(100_000.0);
    assert!(ks.is_system_active(200_000.0, 1.0));
    // 15% off the 200k peak, though still above start.
    assert!(ks.is_system_active(170_000.0, 1.0));
    // 20.5% off the peak.
    assert!(!ks.is_system_active(159_000.0, 1.0));
}
