//! Moving-average indicators.
//!
//! Indicators are pure functions: bar history in, numeric series out, one
//! value per bar. Values before the indicator has enough history are NaN.
//! No value at bar t depends on bars after t.

pub mod ema;
pub mod sma;

pub use ema::{ema_of_series, Ema};
pub use sma::{sma_of_series, Sma};

use crate::domain::PriceBar;

/// Trait for single-series indicators over a price series.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "ema_50").
    fn name(&self) -> &str;

    /// Number of bars before the first valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`, with the first
    /// `lookback()` values set to `f64::NAN`.
    fn compute(&self, bars: &[PriceBar]) -> Vec<f64>;
}

#[cfg(test)]
pub(crate) fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    crate::domain::bar::bars_from_closes(start, closes)
}

#[cfg(test)]
pub(crate) fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub(crate) const DEFAULT_EPSILON: f64 = 1e-10;
