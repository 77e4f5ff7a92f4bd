//! Rolling beta of an asset against a benchmark: `cov(a, b) / var(b)`.

use gq_schemas::Bar;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BetaError {
    LengthMismatch { asset: usize, benchmark: usize },
    ZeroWindow,
}

impl std::fmt::Display for BetaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BetaError::LengthMismatch { asset, benchmark } => write!(
                f,
                "return series length mismatch: asset={} benchmark={}",
                asset, benchmark
            ),
            BetaError::ZeroWindow => write!(f, "beta window must be > 0"),
        }
    }
}

impl std::error::Error for BetaError {}

/// Rolling beta per index. Indices before the window fills, or whose
/// benchmark variance is zero, get `0.0`.
pub fn rolling_beta(
    asset: &[f64],
    benchmark: &[f64],
    window: usize,
) -> Result<Vec<f64>, BetaError> {
    if asset.len() != benchmark.len() {
        return Err(BetaError::LengthMismatch {
            asset: asset.len(),
            benchmark: benchmark.len(),
        });
    }
    if window == 0 {
        return Err(BetaError::ZeroWindow);
    }

    let mut out = vec![0.0; asset.len()];
    if window < 2 {
        return Ok(out);
    }

    let n = window as f64;
    let (mut sa, mut sb, mut sab, mut sbb) = (0.0, 0.0, 0.0, 0.0);
    for i in 0..asset.len() {
        let (a, b) = (asset[i], benchmark[i]);
        sa += a;
        sb += b;
        sab += a * b;
        sbb += b * b;
        if i >= window {
            let (a0, b0) = (asset[i - window], benchmark[i - window]);
            sa -= a0;
            sb -= b0;
            sab -= a0 * b0;
            sbb -= b0 * b0;
        }
        if i + 1 >= window {
            let cov = (sab - sa * sb / n) / (n - 1.0);
            let var = (sbb - sb * sb / n) / (n - 1.0);
            if var > f64::EPSILON {
                out[i] = cov / var;
            }
        }
    }
    Ok(out)
}

/// Close-to-close returns over the timestamps both series share.
///
/// Bars present in only one series are skipped; a return is taken between
/// consecutive shared timestamps. Both inputs must be sorted by `ts`.
pub fn aligned_close_returns(asset: &[Bar], benchmark: &[Bar]) -> (Vec<f64>, Vec<f64>) {
    let mut shared: Vec<(f64, f64)> = Vec::with_capacity(asset.len().min(benchmark.len()));
    let (mut i, mut j) = (0, 0);
    while i < asset.len() && j < benchmark.len() {
        match asset[i].ts.cmp(&benchmark[j].ts) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                shared.push((asset[i].close, benchmark[j].close));
                i += 1;
                j += 1;
            }
        }
    }

    shared
        .windows(2)
        .map(|w| (w[1].0 / w[0].0 - 1.0, w[1].1 / w[0].1 - 1.0))
        .unzip()
}
