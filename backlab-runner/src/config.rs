//! Serializable backtest configuration (TOML).
//!
//! ```toml
//! [backtest]
//! tickers = ["AAPL", "MSFT"]
//! start_date = "2021-01-01"
//! end_date = "2024-12-31"
//! initial_capital = 10000.0
//! fee_pct = 0.5
//!
//! [strategy]
//! type = "ma_crossover"
//! ma_type = "sma"
//! short_window = 20
//! long_window = 50
//!
//! [provider]
//! source = "yahoo"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use backlab_core::data::{CsvProvider, PriceProvider, SyntheticProvider, YahooProvider};
use backlab_core::engine::BacktestParams;
use backlab_core::signals::{SignalError, StrategyConfig};

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid strategy: {0}")]
    Strategy(#[from] SignalError),

    #[error("provider setup failed: {0}")]
    Provider(String),
}

/// Top-level configuration: one run over one or more tickers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BacktestConfig {
    #[serde(default)]
    pub backtest: BacktestSection,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// `[backtest]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    #[serde(default = "default_tickers")]
    pub tickers: Vec<String>,
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
    /// Exclusive.
    #[serde(default = "default_end_date")]
    pub end_date: NaiveDate,
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    /// Fee per fill as a percentage of notional (0.5 = 0.5%).
    #[serde(default = "default_fee_pct")]
    pub fee_pct: f64,
    /// Run per-ticker backtests on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
}

fn default_tickers() -> Vec<String> {
    vec!["AAPL".to_string()]
}
fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, 1).unwrap_or_default()
}
fn default_end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default()
}
fn default_initial_capital() -> f64 {
    10_000.0
}
fn default_fee_pct() -> f64 {
    0.5
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            tickers: default_tickers(),
            start_date: default_start_date(),
            end_date: default_end_date(),
            initial_capital: default_initial_capital(),
            fee_pct: default_fee_pct(),
            parallel: false,
        }
    }
}

/// Which price provider to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderSource {
    #[default]
    Yahoo,
    Csv,
    Synthetic,
}

impl std::str::FromStr for ProviderSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yahoo" => Ok(ProviderSource::Yahoo),
            "csv" => Ok(ProviderSource::Csv),
            "synthetic" => Ok(ProviderSource::Synthetic),
            other => Err(ConfigError::Invalid(format!(
                "unknown provider source '{other}' (expected yahoo, csv or synthetic)"
            ))),
        }
    }
}

/// `[provider]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub source: ProviderSource,
    /// Directory of `<TICKER>.csv` files; required for `source = "csv"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_dir: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub max_retries: u32,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            source: ProviderSource::Yahoo,
            csv_dir: None,
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
        }
    }
}

impl ProviderConfig {
    /// Instantiate the configured provider.
    pub fn build(&self) -> Result<Box<dyn PriceProvider>, ConfigError> {
        match self.source {
            ProviderSource::Yahoo => {
                let provider =
                    YahooProvider::new(Duration::from_secs(self.timeout_secs), self.max_retries)
                        .map_err(|e| ConfigError::Provider(e.to_string()))?;
                Ok(Box::new(provider))
            }
            ProviderSource::Csv => {
                let dir = self.csv_dir.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("provider.csv_dir is required for source = \"csv\"".into())
                })?;
                Ok(Box::new(CsvProvider::new(dir)))
            }
            ProviderSource::Synthetic => Ok(Box::new(SyntheticProvider::default())),
        }
    }
}

impl BacktestConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Trim ticker names, drop blanks and duplicates (first occurrence wins).
    ///
    /// Returns the duplicates that were removed.
    pub fn dedup_tickers(&mut self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::with_capacity(self.backtest.tickers.len());
        let mut removed = Vec::new();
        for ticker in self.backtest.tickers.drain(..) {
            let ticker = ticker.trim().to_string();
            if ticker.is_empty() {
                continue;
            }
            if seen.contains(&ticker) {
                warn!(%ticker, "duplicate ticker ignored");
                removed.push(ticker);
            } else {
                seen.push(ticker);
            }
        }
        self.backtest.tickers = seen;
        removed
    }

    /// Check every parameter before any data is fetched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.backtest;
        if b.tickers.iter().all(|t| t.trim().is_empty()) {
            return Err(ConfigError::Invalid("at least one ticker is required".into()));
        }
        if b.start_date >= b.end_date {
            return Err(ConfigError::Invalid(format!(
                "start_date {} must be before end_date {}",
                b.start_date, b.end_date
            )));
        }
        if !b.initial_capital.is_finite() || b.initial_capital <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "initial_capital must be positive, got {}",
                b.initial_capital
            )));
        }
        if !(0.0..100.0).contains(&b.fee_pct) {
            return Err(ConfigError::Invalid(format!(
                "fee_pct must be in [0, 100), got {}",
                b.fee_pct
            )));
        }
        self.strategy.validate()?;
        if self.provider.source == ProviderSource::Csv && self.provider.csv_dir.is_none() {
            return Err(ConfigError::Invalid(
                "provider.csv_dir is required for source = \"csv\"".into(),
            ));
        }
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::Invalid("provider.timeout_secs must be > 0".into()));
        }
        Ok(())
    }

    /// Simulator parameters: fee percentage converted to a rate.
    pub fn params(&self) -> BacktestParams {
        BacktestParams {
            initial_capital: self.backtest.initial_capital,
            fee_rate: self.backtest.fee_pct / 100.0,
        }
    }

    /// Deterministic content hash of this configuration (BLAKE3 over JSON).
    pub fn run_id(&self) -> String {
        // Plain structs and string-keyed fields only; serialisation cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&json).to_hex().to_string()
    }
}
