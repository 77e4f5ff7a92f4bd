//! `gq walk-forward`: rolling IS/OOS windows over one bar file.

use anyhow::{Context, Result};
use gq_artifacts::{write_walk_forward_artifacts, RunIdentity};
use gq_config::ConfigMode;
use gq_metrics::float_repr::to_text;
use gq_walkforward::WalkForwardReport;
use std::path::Path;
use uuid::Uuid;

use super::{load_bars, load_config, AUDIT_JSONL};
use crate::RunArgs;

pub fn run_walk_forward(args: RunArgs, sequential: bool) -> Result<()> {
    let loaded = load_config(&args, ConfigMode::WalkForward)?;
    let mut cfg = gq_config::backtest_config(&loaded)?;
    let mut wf = gq_config::walk_forward_config(&loaded)?;
    if let Some(seed) = args.seed {
        cfg.execution = cfg.execution.with_seed(seed);
    }
    if sequential {
        wf.parallel = false;
    }
    let input = load_bars(&args.data)?;

    let report = gq_walkforward::run_walk_forward(&input.bars, &cfg, &wf)
        .context("walk-forward failed")?;

    let run_id = Uuid::new_v4();
    let exports_root = Path::new(&args.exports);
    let run_dir = gq_artifacts::run_dir(exports_root, run_id)?;
    let audited = !args.no_audit;
    if audited {
        write_window_audit(&run_dir, run_id, &report)?;
    }

    let extra: &[&str] = if audited { &[AUDIT_JSONL] } else { &[] };
    let written = write_walk_forward_artifacts(
        &RunIdentity {
            exports_root,
            run_id,
            symbol: &cfg.symbol,
            config_hash: &loaded.config_hash,
            data_hash: &input.data_hash,
            bars: input.bars.len(),
            extra_artifacts: extra,
        },
        &report,
    )?;

    let agg = &report.aggregate;
    println!("run_id={}", run_id);
    println!("mode=WALK_FORWARD");
    println!("symbol={}", cfg.symbol);
    println!("config_hash={}", loaded.config_hash);
    println!("data_hash={}", input.data_hash);
    println!("windows={}", agg.windows);
    println!("bars_unused={}", report.bars_unused);
    println!("mean_is_profit_factor={}", to_text(agg.mean_is_profit_factor));
    println!("mean_oos_profit_factor={}", to_text(agg.mean_oos_profit_factor));
    println!("mean_wfe={}", to_text(agg.mean_wfe));
    println!("finite_mean_oos_profit_factor={:.4}", agg.finite_mean_oos_profit_factor);
    println!(
        "finite_mean_wfe={:.4} finite_wfe_windows={}",
        agg.finite_mean_wfe, agg.finite_wfe_windows
    );
    println!("mean_oos_expectancy={:.4}", agg.mean_oos_expectancy);
    println!("total_oos_trades={}", agg.total_oos_trades);
    println!("terminated_phases={}", agg.terminated_phases);
    println!("run_dir={}", written.run_dir.display());

    Ok(())
}

/// One chained audit line per window; per-bar events stay in the window runs.
fn write_window_audit(run_dir: &Path, run_id: Uuid, report: &WalkForwardReport) -> Result<()> {
    let mut writer = gq_audit::AuditWriter::create(run_dir.join(AUDIT_JSONL), true)?;
    for w in &report.windows {
        let payload = serde_json::to_value(w).context("serialize window result failed")?;
        writer.append(run_id, "window_evaluated", Some(w.start_ts), payload)?;
    }
    let payload = serde_json::to_value(&report.aggregate).context("serialize aggregate failed")?;
    writer.append(run_id, "walk_forward_finished", None, payload)?;
    Ok(())
}
