use gq_backtest::{BacktestConfig, BacktestEngine, NullSink};
use gq_metrics::{audit_trades, walk_forward_efficiency};
use gq_schemas::{validate_bars, Bar};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::types::{
    AggregateMetrics, Phase, PhaseResult, WalkForwardConfig, WalkForwardError, WalkForwardReport,
    WindowPlan, WindowResult,
};

/// Every IS/OOS pair that fits in `total` bars, stepping by `oos`.
pub fn plan_windows(
    total: usize,
    is: usize,
    oos: usize,
) -> Result<Vec<WindowPlan>, WalkForwardError> {
    if is == 0 || oos == 0 {
        return Err(WalkForwardError::InvalidWindow {
            is_window: is,
            oos_window: oos,
        });
    }
    let mut out = Vec::new();
    let mut start = 0usize;
    while start + is + oos <= total {
        out.push(WindowPlan {
            index: out.len(),
            is_start: start,
            is_end: start + is,
            oos_start: start + is,
            oos_end: start + is + oos,
        });
        start += oos;
    }
    Ok(out)
}

/// Seed for one phase of one window. Pure function of its inputs.
pub fn derive_seed(base: u64, window: usize, phase: Phase) -> u64 {
    let tag = (window as u64) << 1 | matches!(phase, Phase::OutOfSample) as u64;
    splitmix64(base ^ splitmix64(tag))
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Run the harness over `bars`. Fewer bars than one IS+OOS pair is not an
/// error: the report simply has no windows.
pub fn run_walk_forward(
    bars: &[Bar],
    base: &BacktestConfig,
    wf: &WalkForwardConfig,
) -> Result<WalkForwardReport, WalkForwardError> {
    let plans = plan_windows(bars.len(), wf.is_window, wf.oos_window)?;
    base.validate().map_err(WalkForwardError::Setup)?;
    validate_bars(bars).map_err(|e| WalkForwardError::Setup(e.into()))?;

    info!(
        bars = bars.len(),
        windows = plans.len(),
        is_window = wf.is_window,
        oos_window = wf.oos_window,
        parallel = wf.parallel,
        "walk-forward started"
    );

    let windows: Vec<WindowResult> = if wf.parallel {
        plans
            .par_iter()
            .map(|p| run_window(bars, base, p))
            .collect::<Result<_, _>>()?
    } else {
        plans
            .iter()
            .map(|p| run_window(bars, base, p))
            .collect::<Result<_, _>>()?
    };

    let bars_unused = bars.len() - plans.last().map_or(0, |p| p.oos_end);
    let aggregate = aggregate(&windows);
    info!(
        windows = aggregate.windows,
        mean_wfe = aggregate.mean_wfe,
        finite_mean_wfe = aggregate.finite_mean_wfe,
        bars_unused,
        "walk-forward finished"
    );

    Ok(WalkForwardReport {
        config: wf.clone(),
        base_seed: base.execution.seed,
        windows,
        aggregate,
        bars_unused,
    })
}

fn run_window(
    bars: &[Bar],
    base: &BacktestConfig,
    plan: &WindowPlan,
) -> Result<WindowResult, WalkForwardError> {
    let is_bars = &bars[plan.is_start..plan.is_end];
    let oos_bars = &bars[plan.oos_start..plan.oos_end];

    let in_sample = run_phase(is_bars, base, plan.index, Phase::InSample)?;
    let out_of_sample = run_phase(oos_bars, base, plan.index, Phase::OutOfSample)?;
    let wfe = walk_forward_efficiency(
        in_sample.metrics.profit_factor,
        out_of_sample.metrics.profit_factor,
    );

    info!(
        window = plan.index,
        is_trades = in_sample.metrics.trades,
        oos_trades = out_of_sample.metrics.trades,
        wfe,
        "window evaluated"
    );

    Ok(WindowResult {
        plan: *plan,
        start_ts: bars[plan.is_start].ts,
        end_ts: bars[plan.oos_end - 1].ts,
        in_sample,
        out_of_sample,
        wfe,
    })
}

fn run_phase(
    slice: &[Bar],
    base: &BacktestConfig,
    window: usize,
    phase: Phase,
) -> Result<PhaseResult, WalkForwardError> {
    let seed = derive_seed(base.execution.seed, window, phase);
    let mut cfg = base.clone();
    cfg.execution = cfg.execution.with_seed(seed);

    let wrap = |source| WalkForwardError::Backtest {
        window,
        phase,
        source,
    };
    let mut engine = BacktestEngine::new(cfg).map_err(wrap)?;
    let report = engine.run(slice, &mut NullSink).map_err(wrap)?;
    debug!(
        window,
        phase = phase.as_str(),
        seed,
        trades = report.trades.len(),
        "phase finished"
    );

    Ok(PhaseResult {
        seed,
        metrics: audit_trades(&report.trades, report.final_state.starting_equity),
        status: report.status,
        bars_processed: report.bars_processed,
        final_equity: report.final_state.equity,
        rejected: report.rejected.len(),
    })
}

fn aggregate(windows: &[WindowResult]) -> AggregateMetrics {
    if windows.is_empty() {
        return AggregateMetrics::default();
    }
    let n = windows.len() as f64;
    let mean = |f: fn(&WindowResult) -> f64| windows.iter().map(f).sum::<f64>() / n;
    let finite = |f: fn(&WindowResult) -> f64| finite_mean(windows.iter().map(f));
    let (finite_mean_wfe, finite_wfe_windows) = finite(|w| w.wfe);
    AggregateMetrics {
        windows: windows.len(),
        mean_is_profit_factor: mean(|w| w.in_sample.metrics.profit_factor),
        mean_oos_profit_factor: mean(|w| w.out_of_sample.metrics.profit_factor),
        mean_wfe: mean(|w| w.wfe),
        finite_mean_is_profit_factor: finite(|w| w.in_sample.metrics.profit_factor).0,
        finite_mean_oos_profit_factor: finite(|w| w.out_of_sample.metrics.profit_factor).0,
        finite_mean_wfe,
        finite_wfe_windows,
        mean_is_expectancy: mean(|w| w.in_sample.metrics.expectancy),
        mean_oos_expectancy: mean(|w| w.out_of_sample.metrics.expectancy),
        mean_oos_max_drawdown_pct: mean(|w| w.out_of_sample.metrics.max_drawdown_pct),
        mean_oos_win_rate: mean(|w| w.out_of_sample.metrics.win_rate),
        total_oos_trades: windows.iter().map(|w| w.out_of_sample.metrics.trades).sum(),
        terminated_phases: windows
            .iter()
            .map(|w| {
                usize::from(!w.in_sample.status.is_completed())
                    + usize::from(!w.out_of_sample.status.is_completed())
            })
            .sum(),
    }
}

/// Mean of the finite values and how many there were; `(0.0, 0)` if none.
fn finite_mean(values: impl Iterator<Item = f64>) -> (f64, usize) {
    let (sum, count) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        (0.0, 0)
    } else {
        (sum / count as f64, count)
    }
}
