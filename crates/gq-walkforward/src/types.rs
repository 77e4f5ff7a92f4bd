use gq_backtest::{BacktestError, RunStatus};
use gq_metrics::{float_repr, AuditMetrics};
use serde::{Deserialize, Serialize};

/// Window lengths in bars. All required.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WalkForwardConfig {
    pub is_window: usize,
    pub oos_window: usize,
    /// Evaluate windows on the rayon pool. Results are identical either way.
    pub parallel: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum WalkForwardError {
    /// A window length is zero.
    InvalidWindow { is_window: usize, oos_window: usize },
    /// A slice could not be backtested (bad input or config).
    Backtest {
        window: usize,
        phase: Phase,
        source: BacktestError,
    },
    /// Configuration failed before any window ran.
    Setup(BacktestError),
}

impl std::fmt::Display for WalkForwardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalkForwardError::InvalidWindow {
                is_window,
                oos_window,
            } => write!(
                f,
                "invalid walk-forward windows: is_window={} oos_window={} (both must be > 0)",
                is_window, oos_window
            ),
            WalkForwardError::Backtest {
                window,
                phase,
                source,
            } => write!(f, "window {} {}: {}", window, phase.as_str(), source),
            WalkForwardError::Setup(e) => write!(f, "walk-forward setup: {}", e),
        }
    }
}

impl std::error::Error for WalkForwardError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    InSample,
    OutOfSample,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::InSample => "in_sample",
            Phase::OutOfSample => "out_of_sample",
        }
    }
}

/// Half-open bar ranges `[start, end)` of one IS/OOS pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPlan {
    pub index: usize,
    pub is_start: usize,
    pub is_end: usize,
    pub oos_start: usize,
    pub oos_end: usize,
}

/// One backtest over one slice.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PhaseResult {
    pub seed: u64,
    pub status: RunStatus,
    pub bars_processed: usize,
    pub final_equity: f64,
    pub rejected: usize,
    pub metrics: AuditMetrics,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WindowResult {
    pub plan: WindowPlan,
    pub start_ts: i64,
    pub end_ts: i64,
    pub in_sample: PhaseResult,
    pub out_of_sample: PhaseResult,
    /// OOS profit factor / IS profit factor.
    #[serde(with = "float_repr")]
    pub wfe: f64,
}

/// Mean of each per-window metric. All zero when no window fits.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AggregateMetrics {
    pub windows: usize,
    #[serde(with = "float_repr")]
    pub mean_is_profit_factor: f64,
    #[serde(with = "float_repr")]
    pub mean_oos_profit_factor: f64,
    #[serde(with = "float_repr")]
    pub mean_wfe: f64,
    /// Means over finite values only, so one lossless window cannot push
    /// them to infinity. 0 when no window has a finite value.
    pub finite_mean_is_profit_factor: f64,
    pub finite_mean_oos_profit_factor: f64,
    pub finite_mean_wfe: f64,
    /// Windows whose WFE entered `finite_mean_wfe`.
    pub finite_wfe_windows: usize,
    pub mean_is_expectancy: f64,
    pub mean_oos_expectancy: f64,
    pub mean_oos_max_drawdown_pct: f64,
    pub mean_oos_win_rate: f64,
    pub total_oos_trades: usize,
    /// IS or OOS runs that ended on the kill switch.
    pub terminated_phases: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WalkForwardReport {
    pub config: WalkForwardConfig,
    pub base_seed: u64,
    pub windows: Vec<WindowResult>,
    pub aggregate: AggregateMetrics,
    /// Trailing bars no window reached.
    pub bars_unused: usize,
}
