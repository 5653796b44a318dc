//! Deterministic synthetic price series for offline runs and tests.
//!
//! A random walk from 100.0 seeded by BLAKE3 of the ticker, weekdays only.
//! The same ticker and range always produce the same bars.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, DataSource, FetchResult, PriceProvider};
use crate::domain::PriceBar;

/// Synthetic random-walk provider.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    start_price: f64,
    max_daily_move: f64,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self {
            start_price: 100.0,
            max_daily_move: 0.03,
        }
    }
}

impl SyntheticProvider {
    /// Generate bars for every weekday in `[start, end)`.
    pub fn generate(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
        let seed: [u8; 32] = *blake3::hash(ticker.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);
        let max_move = self.max_daily_move.abs().max(1e-6);

        let mut bars = Vec::new();
        let mut price = self.start_price;
        let mut current = start;

        while current < end {
            if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                current += chrono::Duration::days(1);
                continue;
            }

            let daily_return: f64 = rng.gen_range(-max_move..max_move);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64);

            bars.push(PriceBar {
                date: current,
                open,
                high,
                low,
                close,
                volume,
            });

            price = close;
            current += chrono::Duration::days(1);
        }

        bars
    }
}

impl PriceProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let raw = self.generate(ticker, start, end);
        FetchResult::from_raw(ticker, raw, start, end, DataSource::Synthetic)
    }
}
