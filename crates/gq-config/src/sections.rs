use anyhow::{Context, Result};
use gq_backtest::BacktestConfig;
use gq_walkforward::WalkForwardConfig;
use serde::{Deserialize, Serialize};

use crate::LoadedConfig;

/// `run:` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    pub symbol: String,
    pub starting_equity: f64,
}

/// Assemble and validate the backtest config from its sections.
pub fn backtest_config(cfg: &LoadedConfig) -> Result<BacktestConfig> {
    let run: RunSection = cfg.section("/run")?;
    let out = BacktestConfig {
        symbol: run.symbol,
        starting_equity: run.starting_equity,
        features: cfg.section("/features")?,
        signal: cfg.section("/signal")?,
        gate: cfg.section("/gate")?,
        sizing: cfg.section("/sizing")?,
        kill_switch: cfg.section("/kill_switch")?,
        execution: cfg.section("/execution")?,
    };
    out.validate().context("CONFIG_INVALID_VALUE")?;
    Ok(out)
}

pub fn walk_forward_config(cfg: &LoadedConfig) -> Result<WalkForwardConfig> {
    cfg.section("/walk_forward")
}
