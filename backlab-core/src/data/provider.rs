//! Price provider trait and structured error types.
//!
//! The PriceProvider trait abstracts over data sources (Yahoo Finance, CSV
//! files, synthetic walks) so the runner can swap implementations and mock
//! them in tests. Every provider hands back canonical bars for the half-open
//! range `[start, end)`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::ingest::canonicalize;
use crate::domain::PriceBar;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no bars for {ticker} in [{start}, {end})")]
    EmptyRange {
        ticker: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("data error: {0}")]
    Other(String),
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Synthetic,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DataSource::YahooFinance => "yahoo",
            DataSource::CsvImport => "csv",
            DataSource::Synthetic => "synthetic",
        };
        f.write_str(s)
    }
}

/// Result of a successful fetch for a single ticker.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub ticker: String,
    /// Canonical bars: sorted, unique dates, tradable closes, inside the range.
    pub bars: Vec<PriceBar>,
    pub source: DataSource,
    /// Raw rows discarded during canonicalisation.
    pub dropped: usize,
}

impl FetchResult {
    /// Canonicalise raw provider rows into a fetch result.
    ///
    /// Fails with [`DataError::EmptyRange`] when nothing usable remains.
    pub fn from_raw(
        ticker: &str,
        raw: Vec<PriceBar>,
        start: NaiveDate,
        end: NaiveDate,
        source: DataSource,
    ) -> Result<Self, DataError> {
        let canon = canonicalize(raw, start, end);
        if canon.dropped > 0 {
            debug!(ticker, dropped = canon.dropped, "discarded raw rows");
        }
        let inconsistent = canon.bars.iter().filter(|b| !b.is_sane()).count();
        if inconsistent > 0 {
            debug!(ticker, inconsistent, "bars with inconsistent OHLC kept; only close is traded");
        }
        if canon.bars.is_empty() {
            return Err(DataError::EmptyRange {
                ticker: ticker.to_string(),
                start,
                end,
            });
        }
        Ok(Self {
            ticker: ticker.to_string(),
            bars: canon.bars,
            source,
            dropped: canon.dropped,
        })
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }
}

/// Trait for price providers (Yahoo Finance, CSV files, synthetic).
///
/// `fetch` covers the half-open date range `[start, end)`.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV bars for a ticker.
    fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;
}
