//! `gq backtest`: one replay, one artifact directory.

use anyhow::{Context, Result};
use gq_artifacts::{write_backtest_artifacts, BacktestMetricsDoc, RunIdentity};
use gq_backtest::{BacktestEngine, RunEventSink, RunStatus, TeeSink, TracingSink};
use gq_config::ConfigMode;
use gq_metrics::float_repr::to_text;
use std::path::Path;
use uuid::Uuid;

use super::{load_bars, load_config, open_audit, AUDIT_JSONL};
use crate::RunArgs;

pub fn run_backtest(args: RunArgs) -> Result<()> {
    let loaded = load_config(&args, ConfigMode::Backtest)?;
    let mut cfg = gq_config::backtest_config(&loaded)?;
    if let Some(seed) = args.seed {
        cfg.execution = cfg.execution.with_seed(seed);
    }
    let input = load_bars(&args.data)?;

    let run_id = Uuid::new_v4();
    let exports_root = Path::new(&args.exports);
    let run_dir = gq_artifacts::run_dir(exports_root, run_id)?;
    let mut audit = open_audit(&args, &run_dir, run_id)?;

    let mut engine = BacktestEngine::new(cfg.clone()).context("engine setup failed")?;
    let mut tracing_sink = TracingSink;
    let report = match audit.as_mut() {
        Some(audit) => {
            let mut tee = TeeSink::new(&mut tracing_sink, audit as &mut dyn RunEventSink);
            engine.run(&input.bars, &mut tee)
        }
        None => engine.run(&input.bars, &mut tracing_sink),
    }
    .context("backtest failed")?;

    let extra: &[&str] = if audit.is_some() { &[AUDIT_JSONL] } else { &[] };
    let written = write_backtest_artifacts(
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

    let doc = BacktestMetricsDoc::from_report(&report);
    println!("run_id={}", run_id);
    println!("mode=BACKTEST");
    println!("symbol={}", cfg.symbol);
    println!("config_hash={}", loaded.config_hash);
    println!("data_hash={}", input.data_hash);
    match &report.status {
        RunStatus::Completed => println!("status=completed"),
        RunStatus::Terminated {
            bar_index, reason, ..
        } => {
            println!("status=terminated");
            println!("terminated_at_bar={}", bar_index);
            println!("trip_reason={}", reason);
        }
    }
    println!("bars_processed={}", report.bars_processed);
    println!("trades={}", report.trades.len());
    println!("rejected={}", report.rejected.len());
    println!("final_equity={:.2}", doc.final_equity);
    println!("profit_factor={}", to_text(doc.audit.profit_factor));
    println!("max_drawdown_pct={:.4}", doc.audit.max_drawdown_pct);
    println!("expectancy={:.4}", doc.audit.expectancy);
    println!("win_rate={:.4}", doc.audit.win_rate);
    println!("run_dir={}", written.run_dir.display());

    Ok(())
}
