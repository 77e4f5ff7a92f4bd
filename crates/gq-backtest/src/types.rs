use std::collections::BTreeMap;

use gq_execution::{OutcomeModel, SimulatorConfig, TradeRecord};
use gq_features::FeatureConfig;
use gq_risk::{EquityState, GateConfig, KillSwitchConfig, SizingConfig, TripReason};
use gq_strategy::SignalConfig;
use serde::{Deserialize, Serialize};

/// Everything one backtest run needs. No field has an implicit default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BacktestConfig {
    pub symbol: String,
    pub starting_equity: f64,
    pub features: FeatureConfig,
    pub signal: SignalConfig,
    pub gate: GateConfig,
    pub sizing: SizingConfig,
    pub kill_switch: KillSwitchConfig,
    pub execution: SimulatorConfig,
}

impl BacktestConfig {
    /// Reference profile for tests: 100k equity, 1% risk, 20% drawdown
    /// limit, forward-scan exits, no slippage.
    pub fn test_defaults() -> Self {
        Self {
            symbol: "XAUUSD".to_string(),
            starting_equity: 100_000.0,
            features: FeatureConfig::standard(),
            signal: SignalConfig {
                z_thresh: 1.0,
                mom_thresh: 0.0,
                flat_above_vol_pct: 0.95,
            },
            gate: GateConfig {
                vol_pct_ceiling: 0.90,
            },
            sizing: SizingConfig {
                risk_fraction: 0.01,
                sl_atr_mult: 1.0,
                tp_atr_mult: 2.0,
                min_position_units: 1.0,
            },
            kill_switch: KillSwitchConfig {
                max_drawdown_pct: 0.2,
                min_expectancy: -1.0,
                expectancy_min_trades: 20,
            },
            execution: SimulatorConfig {
                seed: 0,
                slippage_frac: 0.0,
                commission_per_trade: 0.0,
                outcome: OutcomeModel::ForwardScan { max_hold_bars: 20 },
            },
        }
    }
}

/// How a run ended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    /// Every bar was processed.
    Completed,
    /// Kill switch tripped; `bar_index` is the bar at which the loop stopped.
    Terminated {
        bar_index: usize,
        ts: i64,
        reason: TripReason,
    },
}

impl RunStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }
}

/// Backtest report produced after a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BacktestReport {
    pub status: RunStatus,
    /// Closed trades, in close order.
    pub trades: Vec<TradeRecord>,
    /// Requests the gateway refused.
    pub rejected: Vec<TradeRecord>,
    /// `(ts, equity)` per processed bar.
    pub equity_curve: Vec<(i64, f64)>,
    pub final_state: EquityState,
    pub bars_processed: usize,
    /// Non-flat intents refused by the gate or sizing, keyed by reason code.
    pub skipped_intents: BTreeMap<String, u64>,
}
