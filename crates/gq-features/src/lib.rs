//! gq-features
//!
//! Market State Builder: enriches each bar with rolling statistics and a
//! regime tag.
//!
//! - Trailing windows only (state for bar `i` never reads bar `i + 1`)
//! - Incremental sliding sums, sample std (n - 1)
//! - Insufficient lookback fills with `0.0`; the builder is total
//! - Regime: Chaos when volatility rank is extreme, else Trend when the long
//!   SMA slope beats an adaptive threshold, else Range

mod beta;
mod builder;
mod rolling;

pub use beta::{aligned_close_returns, rolling_beta, BetaError};
pub use builder::{
    build_market_state, FeatureConfig, FeatureConfigError, MarketState, MarketStateBuilder,
};
pub use rolling::{percentile_rank_of_last, RollingWindow};
