use gq_execution::{TradeRecord, TradeStatus};

use crate::types::AuditMetrics;

// ============================================================================
// Public API
// ============================================================================

/// Audit the closed trades in `trades`; open and rejected records are ignored.
pub fn audit_trades(trades: &[TradeRecord], starting_equity: f64) -> AuditMetrics {
    let closed: Vec<&TradeRecord> = closed(trades).collect();
    if closed.is_empty() {
        return AuditMetrics::empty();
    }

    let wins = closed.iter().filter(|t| t.pnl > 0.0).count();
    AuditMetrics {
        trades: closed.len(),
        profit_factor: profit_factor(trades),
        max_drawdown_pct: max_drawdown_pct(trades, starting_equity),
        expectancy: expectancy(trades),
        win_rate: wins as f64 / closed.len() as f64,
        net_pnl: closed.iter().map(|t| t.pnl).sum(),
    }
}

/// Sum of winning PnL over the absolute sum of losing PnL.
///
/// No losses and some gains => +INF. No gains and no losses => 0.
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    let mut gross_profit = 0.0_f64;
    let mut gross_loss = 0.0_f64;
    for t in closed(trades) {
        if t.pnl > 0.0 {
            gross_profit += t.pnl;
        } else if t.pnl < 0.0 {
            gross_loss += -t.pnl;
        }
    }

    if gross_loss == 0.0 {
        if gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        gross_profit / gross_loss
    }
}

/// Largest peak-to-trough fall, in percent, of the equity curve that starts
/// at `starting_equity` and moves once per closed trade.
pub fn max_drawdown_pct(trades: &[TradeRecord], starting_equity: f64) -> f64 {
    let mut equity = starting_equity;
    let mut peak = starting_equity;
    let mut max_dd = 0.0_f64;
    for t in closed(trades) {
        equity += t.pnl;
        if equity > peak {
            peak = equity;
        }
        if peak > 0.0 {
            let dd = (peak - equity) / peak * 100.0;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd.min(100.0)
}

/// Mean R-multiple of closed trades; 0 for an empty ledger.
pub fn expectancy(trades: &[TradeRecord]) -> f64 {
    let (n, sum) = closed(trades).fold((0usize, 0.0_f64), |(n, s), t| (n + 1, s + t.r_multiple));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// OOS profit factor over IS profit factor.
///
/// - IS = 0 => 0 (keeps aggregation finite)
/// - both infinite => 1
/// - IS finite, OOS infinite => +INF
pub fn walk_forward_efficiency(is_pf: f64, oos_pf: f64) -> f64 {
    if is_pf == 0.0 || is_pf.is_nan() || oos_pf.is_nan() {
        return 0.0;
    }
    if is_pf.is_infinite() && oos_pf.is_infinite() {
        return 1.0;
    }
    oos_pf / is_pf
}

// ============================================================================
// Helpers
// ============================================================================

fn closed(trades: &[TradeRecord]) -> impl Iterator<Item = &TradeRecord> {
    trades.iter().filter(|t| t.status == TradeStatus::Closed)
}
