use gq_execution::*;
use gq_schemas::{Direction, Regime};
use gq_testkit::bar_at;

fn sim(max_hold_bars: usize) -> OrderSimulator {
    OrderSimulator::new(SimulatorConfig {
        seed: 1,
        slippage_frac: 0.0,
        commission_per_trade: 0.0,
        outcome: OutcomeModel::ForwardScan { max_hold_bars },
    })
    .expect("sim")
}

fn long_request() -> OrderRequest {
    OrderRequest {
        symbol: "XAUUSD".to_string(),
        direction: Direction::Buy,
        bar_index: 0,
        ts: gq_testkit::ts_at(0),
        entry: 100.0,
        stop: 95.0,
        target: 110.0,
        volume: 2.0,
        regime: Regime::Range,
    }
}

#[test]
fn scenario_first_touch_wins() {
    let mut s = sim(10);
    let t = s.submit(&long_request()).expect("open");
    assert_eq!(t.status, TradeStatus::Open);
    assert_eq!(t.entry_price, 100.0);

    let path = vec![
        bar_at(1, 100.0, 104.0, 97.0, 103.0),
        bar_at(2, 103.0, 111.0, 102.0, 109.0),
        bar_at(3, 109.0, 109.0, 90.0, 91.0),
    ];
    let fill = s.resolve_exit(&t, &path);
    assert_eq!(fill.reason, ExitReason::TakeProfit);
    assert_eq!(fill.bars_held, 2);
    assert_eq!(fill.price, 110.0);
    assert_eq!(fill.ts, gq_testkit::ts_at(2));

    let closed = t.close(&fill).expect("close");
    assert_eq!(closed.pnl, 20.0);
    assert_eq!(closed.exit_index, Some(2));
}

#[test]
fn scenario_bar_touching_both_resolves_to_stop() {
    let mut s = sim(10);
    let t = s.submit(&long_request()).expect("open");
    let path = vec![bar_at(1, 100.0, 115.0, 90.0, 100.0)];
    let fill = s.resolve_exit(&t, &path);
    assert_eq!(fill.reason, ExitReason::StopLoss);
    assert_eq!(fill.price, 95.0);
}

#[test]
fn scenario_short_stop_is_above_entry() {
    let mut s = sim(10);
    let req = OrderRequest {
        direction: Direction::Sell,
        stop: 105.0,
        target: 90.0,
        ..long_request()
    };
    let t = s.submit(&req).expect("open");
    let path = vec![
        bar_at(1, 100.0, 101.0, 96.0, 97.0),
        bar_at(2, 97.0, 106.0, 96.0, 104.0),
    ];
    let fill = s.resolve_exit(&t, &path);
    assert_eq!(fill.reason, ExitReason::StopLoss);
    let closed = t.close(&fill).expect("close");
    assert_eq!(closed.pnl, -10.0);
}

#[test]
fn scenario_no_touch_exits_at_last_scanned_close() {
    let mut s = sim(2);
    let t = s.submit(&long_request()).expect("open");
    let path = vec![
        bar_at(1, 100.0, 101.0, 99.0, 100.5),
        bar_at(2, 100.5, 102.0, 99.5, 101.5),
        bar_at(3, 101.5, 120.0, 101.0, 119.0),
    ];
    let fill = s.resolve_exit(&t, &path);
    assert_eq!(fill.reason, ExitReason::TimeExit);
    assert_eq!(fill.bars_held, 2);
    assert_eq!(fill.price, 101.5);
}

#[test]
fn scenario_empty_path_closes_at_entry() {
    let mut s = sim(5);
    let t = s.submit(&long_request()).expect("open");
    let fill = s.resolve_exit(&t, &[]);
    assert_eq!(fill.reason, ExitReason::EndOfData);
    assert_eq!(fill.bars_held, 0);
    assert_eq!(fill.price, t.entry_price);
}

#[test]
fn scenario_invalid_requests_are_refused() {
    let mut s = sim(5);
    let flat = OrderRequest {
        direction: Direction::Flat,
        ..long_request()
    };
    assert!(matches!(
        s.submit(&flat),
        Err(GatewayReject::InvalidRequest { .. })
    ));
    let empty = OrderRequest {
        volume: 0.0,
        ..long_request()
    };
    assert!(matches!(
        s.submit(&empty),
        Err(GatewayReject::InvalidRequest { .. })
    ));
}
