//! Per-ticker price loading with failure isolation.
//!
//! Tickers are fetched one at a time. A ticker that fails (provider error
//! or no bars) is logged, recorded as a [`TickerFailure`], and skipped; the
//! remaining tickers are still loaded.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use backlab_core::data::{DataSource, PriceProvider};
use backlab_core::domain::PriceBar;

/// Pipeline stage at which a ticker was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Fetch,
    Backtest,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Fetch => f.write_str("fetch"),
            FailureStage::Backtest => f.write_str("backtest"),
        }
    }
}

/// A ticker that produced no result, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerFailure {
    pub ticker: String,
    pub stage: FailureStage,
    pub reason: String,
}

impl fmt::Display for TickerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.ticker, self.stage, self.reason)
    }
}

/// Canonical bars for one ticker.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub ticker: String,
    pub bars: Vec<PriceBar>,
    pub source: DataSource,
}

/// Everything `load_series` produced, in ticker order.
#[derive(Debug, Clone, Default)]
pub struct LoadedData {
    pub series: Vec<LoadedSeries>,
    pub failures: Vec<TickerFailure>,
}

/// Fetch each ticker over `[start, end)` sequentially.
pub fn load_series(
    tickers: &[String],
    provider: &dyn PriceProvider,
    start: NaiveDate,
    end: NaiveDate,
) -> LoadedData {
    let mut loaded = LoadedData::default();

    for (i, ticker) in tickers.iter().enumerate() {
        info!(
            ticker = %ticker,
            provider = provider.name(),
            "[{}/{}] fetching",
            i + 1,
            tickers.len()
        );
        match provider.fetch(ticker, start, end) {
            Ok(fetched) if fetched.bars.is_empty() => {
                warn!(ticker = %ticker, "no bars returned");
                loaded.failures.push(TickerFailure {
                    ticker: ticker.clone(),
                    stage: FailureStage::Fetch,
                    reason: format!("no bars in [{start}, {end})"),
                });
            }
            Ok(fetched) => {
                info!(
                    ticker = %ticker,
                    bars = fetched.bars.len(),
                    dropped = fetched.dropped,
                    first = ?fetched.first_date(),
                    last = ?fetched.last_date(),
                    source = %fetched.source,
                    "fetched"
                );
                loaded.series.push(LoadedSeries {
                    ticker: ticker.clone(),
                    bars: fetched.bars,
                    source: fetched.source,
                });
            }
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "fetch failed");
                loaded.failures.push(TickerFailure {
                    ticker: ticker.clone(),
                    stage: FailureStage::Fetch,
                    reason: e.to_string(),
                });
            }
        }
    }

    loaded
}

#[cfg(test)]
mod tests {
    use super::*;
    use backlab_core::data::{DataError, FetchResult, SyntheticProvider};

    /// Synthetic data, except for tickers starting with `BAD`.
    struct FlakyProvider(SyntheticProvider);

    impl PriceProvider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        fn fetch(
            &self,
            ticker: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<FetchResult, DataError> {
            if ticker.starts_with("BAD") {
                return Err(DataError::SymbolNotFound {
                    symbol: ticker.to_string(),
                });
            }
            self.0.fetch(ticker, start, end)
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn failures_do_not_stop_other_tickers() {
        let provider = FlakyProvider(SyntheticProvider::default());
        let tickers: Vec<String> = ["SPY", "BAD1", "QQQ"].iter().map(|s| s.to_string()).collect();
        let loaded = load_series(&tickers, &provider, d(2024, 1, 1), d(2024, 3, 1));

        let ok: Vec<&str> = loaded.series.iter().map(|s| s.ticker.as_str()).collect();
        assert_eq!(ok, vec!["SPY", "QQQ"]);
        assert_eq!(loaded.failures.len(), 1);
        assert_eq!(loaded.failures[0].ticker, "BAD1");
        assert_eq!(loaded.failures[0].stage, FailureStage::Fetch);
        assert!(loaded.failures[0].reason.contains("symbol not found"));
    }

    #[test]
    fn empty_range_is_a_fetch_failure() {
        let provider = SyntheticProvider::default();
        // a weekend only
        let loaded = load_series(&["SPY".to_string()], &provider, d(2024, 1, 6), d(2024, 1, 8));
        assert!(loaded.series.is_empty());
        assert_eq!(loaded.failures.len(), 1);
    }

    #[test]
    fn failure_display() {
        let f = TickerFailure {
            ticker: "XYZ".into(),
            stage: FailureStage::Backtest,
            reason: "boom".into(),
        };
        assert_eq!(f.to_string(), "XYZ (backtest): boom");
    }
}
