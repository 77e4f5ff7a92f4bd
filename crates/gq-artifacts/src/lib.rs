//! gq-artifacts
//!
//! Run artifact writer. Every run gets `exports/<run_id>/` with a
//! `manifest.json` naming the files it produced.
//!
//! - Backtest: trades.csv, rejected_trades.csv, equity_curve.csv, metrics.json
//! - Walk-forward: walk_forward.json, windows.csv

mod rows;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use gq_backtest::{BacktestReport, RunStatus};
use gq_metrics::{audit_trades, regime_breakdown, AuditMetrics, RegimeBreakdown};
use gq_walkforward::WalkForwardReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub use rows::{CsvHeader, EquityRow, RejectedRow, TradeRow, WindowRow};

pub const SCHEMA_VERSION: i32 = 1;
pub const ENGINE_ID: &str = "gq-backtest";

pub const TRADES_CSV: &str = "trades.csv";
pub const REJECTED_CSV: &str = "rejected_trades.csv";
pub const EQUITY_CSV: &str = "equity_curve.csv";
pub const METRICS_JSON: &str = "metrics.json";
pub const WALK_FORWARD_JSON: &str = "walk_forward.json";
pub const WINDOWS_CSV: &str = "windows.csv";
pub const MANIFEST_JSON: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: i32,
    pub run_id: Uuid,
    pub engine_id: String,
    /// "BACKTEST" or "WALK_FORWARD".
    pub mode: String,
    pub symbol: String,
    pub config_hash: String,
    /// SHA-256 of the input bar file.
    pub data_hash: String,
    pub bars: usize,
    pub created_at_utc: DateTime<Utc>,
    /// File names relative to the run directory, sorted.
    pub artifacts: Vec<String>,
}

/// Identity of a run, shared by both writers.
pub struct RunIdentity<'a> {
    pub exports_root: &'a Path,
    pub run_id: Uuid,
    pub symbol: &'a str,
    pub config_hash: &'a str,
    pub data_hash: &'a str,
    pub bars: usize,
    /// Extra files already placed in the run dir (e.g. the audit trail).
    pub extra_artifacts: &'a [&'a str],
}

pub struct WrittenArtifacts {
    pub run_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub manifest: RunManifest,
}

/// `metrics.json` body for a backtest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestMetricsDoc {
    pub status: RunStatus,
    pub bars_processed: usize,
    pub starting_equity: f64,
    pub final_equity: f64,
    pub peak_equity: f64,
    pub rejected_trades: usize,
    pub skipped_intents: BTreeMap<String, u64>,
    pub audit: AuditMetrics,
    pub regimes: RegimeBreakdown,
}

impl BacktestMetricsDoc {
    pub fn from_report(report: &BacktestReport) -> Self {
        let state = &report.final_state;
        Self {
            status: report.status.clone(),
            bars_processed: report.bars_processed,
            starting_equity: state.starting_equity,
            final_equity: state.equity,
            peak_equity: state.peak_equity,
            rejected_trades: report.rejected.len(),
            skipped_intents: report.skipped_intents.clone(),
            audit: audit_trades(&report.trades, state.starting_equity),
            regimes: regime_breakdown(&report.trades),
        }
    }
}

/// `exports/<run_id>/`, created if missing.
pub fn run_dir(exports_root: &Path, run_id: Uuid) -> Result<PathBuf> {
    let dir = exports_root.join(run_id.to_string());
    fs::create_dir_all(&dir)
        .with_context(|| format!("create exports dir failed: {}", dir.display()))?;
    Ok(dir)
}

pub fn write_backtest_artifacts(
    id: &RunIdentity<'_>,
    report: &BacktestReport,
) -> Result<WrittenArtifacts> {
    let dir = run_dir(id.exports_root, id.run_id)?;

    write_csv(
        &dir.join(TRADES_CSV),
        report.trades.iter().map(TradeRow::from_record),
    )?;
    write_csv(
        &dir.join(REJECTED_CSV),
        report.rejected.iter().map(RejectedRow::from_record),
    )?;
    write_csv(
        &dir.join(EQUITY_CSV),
        report
            .equity_curve
            .iter()
            .map(|&(ts, equity)| EquityRow { ts, equity }),
    )?;
    write_json(&dir.join(METRICS_JSON), &BacktestMetricsDoc::from_report(report))?;

    let files = [TRADES_CSV, REJECTED_CSV, EQUITY_CSV, METRICS_JSON];
    write_manifest(id, &dir, "BACKTEST", &files)
}

pub fn write_walk_forward_artifacts(
    id: &RunIdentity<'_>,
    report: &WalkForwardReport,
) -> Result<WrittenArtifacts> {
    let dir = run_dir(id.exports_root, id.run_id)?;

    write_json(&dir.join(WALK_FORWARD_JSON), report)?;
    write_csv(
        &dir.join(WINDOWS_CSV),
        report.windows.iter().map(WindowRow::from_result),
    )?;

    write_manifest(id, &dir, "WALK_FORWARD", &[WALK_FORWARD_JSON, WINDOWS_CSV])
}

/// Read a manifest back (verification, tooling).
pub fn read_manifest(path: impl AsRef<Path>) -> Result<RunManifest> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read manifest failed: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse manifest failed: {}", path.display()))
}

fn write_manifest(
    id: &RunIdentity<'_>,
    dir: &Path,
    mode: &str,
    files: &[&str],
) -> Result<WrittenArtifacts> {
    let mut artifacts: Vec<String> = files
        .iter()
        .chain(id.extra_artifacts.iter())
        .map(|s| s.to_string())
        .collect();
    artifacts.push(MANIFEST_JSON.to_string());
    artifacts.sort();
    artifacts.dedup();

    let manifest = RunManifest {
        schema_version: SCHEMA_VERSION,
        run_id: id.run_id,
        engine_id: ENGINE_ID.to_string(),
        mode: mode.to_string(),
        symbol: id.symbol.to_string(),
        config_hash: id.config_hash.to_string(),
        data_hash: id.data_hash.to_string(),
        bars: id.bars,
        created_at_utc: Utc::now(),
        artifacts,
    };

    let manifest_path = dir.join(MANIFEST_JSON);
    write_json(&manifest_path, &manifest)?;
    Ok(WrittenArtifacts {
        run_dir: dir.to_path_buf(),
        manifest_path,
        manifest,
    })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize {} failed", path.display()))?;
    fs::write(path, format!("{json}\n"))
        .with_context(|| format!("write {} failed", path.display()))
}

/// Header is written even when there are no rows.
fn write_csv<R, I>(path: &Path, rows: I) -> Result<()>
where
    R: Serialize + rows::CsvHeader,
    I: IntoIterator<Item = R>,
{
    let mut w = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("create {} failed", path.display()))?;
    w.write_record(R::HEADER)
        .with_context(|| format!("write header to {} failed", path.display()))?;
    for row in rows {
        w.serialize(&row)
            .with_context(|| format!("write row to {} failed", path.display()))?;
    }
    w.flush()
        .with_context(|| format!("flush {} failed", path.display()))?;
    Ok(())
}
