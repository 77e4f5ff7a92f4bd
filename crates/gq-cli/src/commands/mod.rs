//! Command handler modules for gq-cli.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod backtest;
pub mod walk_forward;

use anyhow::{Context, Result};
use gq_audit::{AuditTrailSink, AuditWriter, VerifyResult};
use gq_config::{ConfigMode, LoadedConfig, UnusedKeyPolicy};
use gq_schemas::Bar;
use std::fs;
use std::path::Path;
use tracing::warn;
use uuid::Uuid;

use crate::{RunArgs, UnusedKeys};

pub const AUDIT_JSONL: &str = "audit.jsonl";

/// Bars plus the SHA-256 of the file they came from.
pub struct LoadedBars {
    pub bars: Vec<Bar>,
    pub data_hash: String,
}

pub fn load_bars(path: &str) -> Result<LoadedBars> {
    let bytes = fs::read(path).with_context(|| format!("read bar file failed: {}", path))?;
    let data_hash = gq_config::sha256_hex(&bytes);
    let text = String::from_utf8(bytes).context("bar file must be UTF-8 text")?;
    let bars = gq_backtest::parse_csv_bars(&text)
        .with_context(|| format!("parse bar file failed: {}", path))?;
    Ok(LoadedBars { bars, data_hash })
}

/// Load layered config and apply the unused-key policy for `mode`.
pub fn load_config(args: &RunArgs, mode: ConfigMode) -> Result<LoadedConfig> {
    let loaded = gq_config::load_layered_yaml(&args.config_paths)?;
    let policy = match args.unused_keys {
        UnusedKeys::Warn => UnusedKeyPolicy::Warn,
        UnusedKeys::Fail => UnusedKeyPolicy::Fail,
    };
    let report = gq_config::report_unused_keys(mode, &loaded.config_json, policy)?;
    if !report.is_clean() {
        warn!(
            mode = mode.as_str(),
            unused = ?report.unused_leaf_pointers,
            "config has keys this mode does not read"
        );
    }
    Ok(loaded)
}

/// Audit sink writing `<run_dir>/audit.jsonl`, unless disabled.
pub fn open_audit(args: &RunArgs, run_dir: &Path, run_id: Uuid) -> Result<Option<AuditTrailSink>> {
    if args.no_audit {
        return Ok(None);
    }
    let writer = AuditWriter::create(run_dir.join(AUDIT_JSONL), true)?;
    Ok(Some(AuditTrailSink::new(writer, run_id)))
}

/// Execute `gq audit-verify`.
pub fn audit_verify(path: &str) -> Result<()> {
    match gq_audit::verify_hash_chain(path)? {
        VerifyResult::Valid { lines } => {
            println!("audit_valid=true lines={}", lines);
            Ok(())
        }
        VerifyResult::Broken { line, reason } => {
            println!("audit_valid=false line={}", line);
            anyhow::bail!("AUDIT_CHAIN_BROKEN at line {}: {}", line, reason)
        }
    }
}

/// Execute `gq beta`: latest rolling beta over the shared timestamps.
pub fn beta(asset: &str, benchmark: &str, window: usize) -> Result<()> {
    let asset = load_bars(asset)?;
    let benchmark = load_bars(benchmark)?;
    let (a, b) = gq_features::aligned_close_returns(&asset.bars, &benchmark.bars);
    let series = gq_features::rolling_beta(&a, &b, window).context("rolling beta failed")?;
    if series.len() < window {
        warn!(returns = series.len(), window, "fewer shared returns than the window");
    }
    let latest = series.last().copied().unwrap_or(0.0);
    println!("beta={:.6} window={} returns={}", latest, window, series.len());
    Ok(())
}
