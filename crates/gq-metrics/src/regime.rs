//! Per-regime expectancy in R-multiples.
//!
//! `avg_win * win_rate + avg_loss * (1 - win_rate)`, where `avg_win` averages
//! R > 0 and `avg_loss` averages R < 0. Scratch trades (R == 0) sit in neither
//! average but still count in `1 - win_rate`.

use std::collections::BTreeMap;

use gq_execution::{TradeRecord, TradeStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegimeStats {
    pub trades: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub expectancy: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegimeBreakdown {
    /// Keyed by regime label at entry (`RANGE`, `TREND`, `CHAOS`).
    pub by_regime: BTreeMap<String, RegimeStats>,
    pub overall: RegimeStats,
}

pub fn regime_breakdown(trades: &[TradeRecord]) -> RegimeBreakdown {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut all = Vec::new();
    for t in trades.iter().filter(|t| t.status == TradeStatus::Closed) {
        groups
            .entry(t.regime.label().to_string())
            .or_default()
            .push(t.r_multiple);
        all.push(t.r_multiple);
    }

    RegimeBreakdown {
        by_regime: groups
            .into_iter()
            .map(|(label, rs)| (label, stats(&rs)))
            .collect(),
        overall: stats(&all),
    }
}

fn stats(rs: &[f64]) -> RegimeStats {
    if rs.is_empty() {
        return RegimeStats::default();
    }
    let wins: Vec<f64> = rs.iter().copied().filter(|r| *r > 0.0).collect();
    let losses: Vec<f64> = rs.iter().copied().filter(|r| *r < 0.0).collect();
    let win_rate = wins.len() as f64 / rs.len() as f64;
    let avg_win = mean(&wins);
    let avg_loss = mean(&losses);
    RegimeStats {
        trades: rs.len(),
        win_rate,
        avg_win,
        avg_loss,
        expectancy: avg_win * win_rate + avg_loss * (1.0 - win_rate),
    }
}

fn mean(v: &[f64]) -> f64 {
    if v.is_empty() {
        0.0
    } else {
        v.iter().sum::<f64>() / v.len() as f64
    }
}
