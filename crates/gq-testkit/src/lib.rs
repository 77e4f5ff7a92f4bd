//! gq-testkit
//!
//! Deterministic synthetic bar series for scenario tests. Every generator is
//! driven by a seeded ChaCha stream, so the same seed always yields the same
//! bars on every platform.

use std::path::Path;

use anyhow::{Context, Result};
use gq_schemas::Bar;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// First bar timestamp used by every generator (2023-11-14T22:13:20Z).
pub const START_TS: i64 = 1_700_000_000;
/// One-minute bars.
pub const STEP_SECS: i64 = 60;

/// One stretch of synthetic price behaviour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Segment {
    /// Steady drift of `drift` (fraction per bar) with small noise.
    Trend { bars: usize, drift: f64 },
    /// Oscillation around the segment's starting price.
    Range { bars: usize, amplitude: f64, period: usize },
    /// Large random shocks (`shock` = max fraction per bar).
    Chaos { bars: usize, shock: f64 },
}

impl Segment {
    pub fn len(&self) -> usize {
        match *self {
            Segment::Trend { bars, .. }
            | Segment::Range { bars, .. }
            | Segment::Chaos { bars, .. } => bars,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build a bar series by chaining segments, starting at `start_price`.
pub fn segmented(seed: u64, start_price: f64, segments: &[Segment]) -> Vec<Bar> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let total: usize = segments.iter().map(Segment::len).sum();
    let mut out = Vec::with_capacity(total);
    let mut prev_close = start_price;

    for seg in segments {
        let anchor = prev_close;
        for k in 0..seg.len() {
            let close = match *seg {
                Segment::Trend { drift, .. } => {
                    let noise = rng.gen_range(-0.25..0.25) * drift.abs();
                    prev_close * (1.0 + drift + noise)
                }
                Segment::Range {
                    amplitude, period, ..
                } => {
                    let phase = 2.0 * std::f64::consts::PI * k as f64 / period.max(1) as f64;
                    let noise = rng.gen_range(-0.1..0.1) * amplitude;
                    anchor * (1.0 + amplitude * phase.sin() + noise)
                }
                Segment::Chaos { shock, .. } => prev_close * (1.0 + rng.gen_range(-shock..shock)),
            };
            let close = close.max(0.01);
            out.push(make_bar(&mut rng, out.len(), prev_close, close));
            prev_close = close;
        }
    }
    out
}

/// Gaussian-free random walk with per-bar moves in `[-step, step)`.
pub fn random_walk(seed: u64, n: usize, start_price: f64, step: f64) -> Vec<Bar> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut out = Vec::with_capacity(n);
    let mut prev_close = start_price;
    for i in 0..n {
        let close = (prev_close * (1.0 + rng.gen_range(-step..step))).max(0.01);
        out.push(make_bar(&mut rng, i, prev_close, close));
        prev_close = close;
    }
    out
}

/// Trend, range, chaos, range: a series that visits every regime.
pub fn mixed_regimes(seed: u64, n_per_segment: usize) -> Vec<Bar> {
    segmented(
        seed,
        2000.0,
        &[
            Segment::Range {
                bars: n_per_segment,
                amplitude: 0.004,
                period: 24,
            },
            Segment::Trend {
                bars: n_per_segment,
                drift: 0.002,
            },
            Segment::Chaos {
                bars: n_per_segment,
                shock: 0.03,
            },
            Segment::Range {
                bars: n_per_segment,
                amplitude: 0.004,
                period: 24,
            },
        ],
    )
}

/// Bar with explicit OHLC on the standard timestamp grid.
pub fn bar_at(index: usize, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar::new(ts_at(index), open, high, low, close)
}

pub fn ts_at(index: usize) -> i64 {
    START_TS + STEP_SECS * index as i64
}

fn make_bar(rng: &mut ChaCha8Rng, index: usize, open: f64, close: f64) -> Bar {
    let body_hi = open.max(close);
    let body_lo = open.min(close);
    let wick = body_hi * 0.001;
    let high = body_hi + wick * rng.gen_range(0.0..1.0);
    let low = (body_lo - wick * rng.gen_range(0.0..1.0)).max(body_lo * 0.5);
    let volume = rng.gen_range(100.0..10_000.0_f64).round();
    Bar::new(ts_at(index), open, high, low, close).with_volume(volume)
}

/// Write bars in the loader's CSV layout (`ts,open,high,low,close,volume`).
pub fn write_bars_csv(path: impl AsRef<Path>, bars: &[Bar]) -> Result<()> {
    let path = path.as_ref();
    let mut w = csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    w.write_record(["ts", "open", "high", "low", "close", "volume"])?;
    for b in bars {
        let volume = b.volume.map(|v| v.to_string()).unwrap_or_default();
        w.write_record([
            b.ts.to_string(),
            b.open.to_string(),
            b.high.to_string(),
            b.low.to_string(),
            b.close.to_string(),
            volume,
        ])?;
    }
    w.flush().context("flush bars csv")?;
    Ok(())
}
