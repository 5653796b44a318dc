//! CSV price provider: one `<TICKER>.csv` file per ticker in a directory.
//!
//! Expects the common Yahoo export header
//! `Date,Open,High,Low,Close,[Adj Close,]Volume`. Unparseable cells (Yahoo
//! writes `null` on missing days) become NaN and are dropped during
//! canonicalisation.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use super::provider::{DataError, DataSource, FetchResult, PriceProvider};
use crate::domain::PriceBar;

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date", alias = "date")]
    date: NaiveDate,
    #[serde(rename = "Open", alias = "open", deserialize_with = "csv::invalid_option")]
    open: Option<f64>,
    #[serde(rename = "High", alias = "high", deserialize_with = "csv::invalid_option")]
    high: Option<f64>,
    #[serde(rename = "Low", alias = "low", deserialize_with = "csv::invalid_option")]
    low: Option<f64>,
    #[serde(rename = "Close", alias = "close", deserialize_with = "csv::invalid_option")]
    close: Option<f64>,
    #[serde(
        rename = "Volume",
        alias = "volume",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    volume: Option<f64>,
}

impl From<CsvRow> for PriceBar {
    fn from(row: CsvRow) -> Self {
        PriceBar {
            date: row.date,
            open: row.open.unwrap_or(f64::NAN),
            high: row.high.unwrap_or(f64::NAN),
            low: row.low.unwrap_or(f64::NAN),
            close: row.close.unwrap_or(f64::NAN),
            volume: row.volume.filter(|v| v.is_finite() && *v >= 0.0).map_or(0, |v| v as u64),
        }
    }
}

/// Reads price series from CSV files under a directory.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File path for a ticker: `<dir>/<TICKER>.csv`.
    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{ticker}.csv"))
    }

    /// Parse every row of a CSV file without filtering.
    pub fn read_file(path: &Path) -> Result<Vec<PriceBar>, DataError> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
        let mut bars = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            bars.push(row?.into());
        }
        Ok(bars)
    }
}

impl PriceProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let path = self.path_for(ticker);
        if !path.is_file() {
            return Err(DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            });
        }
        let raw = Self::read_file(&path)?;
        FetchResult::from_raw(ticker, raw, start, end, DataSource::CsvImport)
    }
}
