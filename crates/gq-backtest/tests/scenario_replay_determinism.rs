use gq_backtest::{BacktestConfig, BacktestEngine, NullSink, RecordingSink};
use gq_execution::OutcomeModel;
use gq_testkit::{mixed_regimes, random_walk};

fn run(cfg: &BacktestConfig, bars: &[gq_schemas::Bar]) -> gq_backtest::BacktestReport {
    let mut engine = BacktestEngine::new(cfg.clone()).expect("engine");
    engine.run(bars, &mut NullSink).expect("run")
}

#[test]
fn replay_determinism_identical_results() {
    let bars = random_walk(21, 1500, 2000.0, 0.004);
    let cfg = BacktestConfig::test_defaults();

    let a = run(&cfg, &bars);
    let b = run(&cfg, &bars);

    assert_eq!(a.status, b.status);
    assert_eq!(a.trades, b.trades);
    assert_eq!(a.rejected, b.rejected);
    assert_eq!(a.equity_curve, b.equity_curve);
    assert_eq!(a.final_state, b.final_state);
    assert_eq!(a.skipped_intents, b.skipped_intents);
    assert!(!a.trades.is_empty(), "random walk should produce trades");
}

#[test]
fn replay_determinism_with_seeded_draw_and_slippage() {
    let bars = mixed_regimes(4, 300);
    let mut cfg = BacktestConfig::test_defaults();
    cfg.execution.seed = 77;
    cfg.execution.slippage_frac = 0.0005;
    cfg.execution.commission_per_trade = 2.5;
    cfg.execution.outcome = OutcomeModel::SeededDraw {
        take_profit_weight: 0.5,
        stop_loss_weight: 0.3,
        flat_weight: 0.2,
    };

    let a = run(&cfg, &bars);
    let b = run(&cfg, &bars);
    assert_eq!(a.trades, b.trades);
    assert_eq!(a.equity_curve, b.equity_curve);

    // Seeded-draw trades settle on their entry bar.
    for t in &a.trades {
        assert_eq!(t.exit_index, Some(t.entry_index));
    }
}

#[test]
fn equity_invariants_hold_across_a_run() {
    let bars = random_walk(8, 2000, 500.0, 0.006);
    let mut engine = BacktestEngine::new(BacktestConfig::test_defaults()).expect("engine");
    let mut sink = RecordingSink::new();
    let report = engine.run(&bars, &mut sink).expect("run");

    assert_eq!(report.equity_curve.len(), report.bars_processed);

    let mut last_peak = report.final_state.starting_equity;
    for ev in &sink.events {
        if let gq_backtest::RunEvent::TradeClosed { equity, .. } = ev {
            assert!(equity.peak_equity >= last_peak);
            assert!((0.0..=100.0).contains(&equity.drawdown_pct));
            last_peak = equity.peak_equity;
        }
    }

    let booked: f64 = report.trades.iter().map(|t| t.pnl).sum();
    let expected = report.final_state.starting_equity + booked;
    assert!((report.final_state.equity - expected).abs() < 1e-6);
}
