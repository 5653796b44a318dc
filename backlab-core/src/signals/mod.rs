//! Signal generation: price series in, aligned entry/exit flags out.
//!
//! Strategies are variants of [`StrategyConfig`]. Each variant builds a
//! [`SignalGenerator`]; the portfolio simulator only ever sees the resulting
//! [`SignalSeries`], so adding a strategy never touches accounting.

pub mod ma_crossover;

pub use ma_crossover::{MaCrossover, MaType};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PriceBar;

/// Errors from signal generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("insufficient data: strategy needs {required} bars, series has {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("invalid window: {name} must be >= 1, got {value}")]
    InvalidWindow { name: &'static str, value: usize },
}

/// Entry and exit flags aligned bar-for-bar with a price series.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignalSeries {
    pub entries: Vec<bool>,
    pub exits: Vec<bool>,
}

impl SignalSeries {
    /// All-false series of length `n`.
    pub fn flat(n: usize) -> Self {
        Self {
            entries: vec![false; n],
            exits: vec![false; n],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.iter().filter(|&&e| e).count()
    }

    pub fn exit_count(&self) -> usize {
        self.exits.iter().filter(|&&e| e).count()
    }
}

/// Trait for strategies that turn a price series into entry/exit flags.
///
/// Signals see only price history, never portfolio state.
pub trait SignalGenerator: Send + Sync {
    /// Human-readable name (e.g., "ma_crossover").
    fn name(&self) -> &str;

    /// Number of leading bars on which no flag may be raised.
    fn warmup_bars(&self) -> usize;

    /// Generate flags for the whole series.
    fn generate(&self, bars: &[PriceBar]) -> Result<SignalSeries, SignalError>;
}

/// Serializable strategy selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// Dual moving-average crossover: long while the short MA is above the long MA.
    MaCrossover {
        ma_type: MaType,
        short_window: usize,
        long_window: usize,
    },
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig::MaCrossover {
            ma_type: MaType::Sma,
            short_window: 20,
            long_window: 50,
        }
    }
}

impl StrategyConfig {
    /// Check parameters without building the generator.
    pub fn validate(&self) -> Result<(), SignalError> {
        match *self {
            StrategyConfig::MaCrossover {
                short_window,
                long_window,
                ..
            } => {
                if short_window == 0 {
                    return Err(SignalError::InvalidWindow {
                        name: "short_window",
                        value: short_window,
                    });
                }
                if long_window == 0 {
                    return Err(SignalError::InvalidWindow {
                        name: "long_window",
                        value: long_window,
                    });
                }
                Ok(())
            }
        }
    }

    /// Build the signal generator for this strategy.
    pub fn build(&self) -> Result<Box<dyn SignalGenerator>, SignalError> {
        self.validate()?;
        match *self {
            StrategyConfig::MaCrossover {
                ma_type,
                short_window,
                long_window,
            } => Ok(Box::new(MaCrossover::new(
                short_window,
                long_window,
                ma_type,
            )?)),
        }
    }

    /// Short label for reports, e.g. `SMA(20/50)`.
    pub fn label(&self) -> String {
        match self {
            StrategyConfig::MaCrossover {
                ma_type,
                short_window,
                long_window,
            } => format!("{}({short_window}/{long_window})", ma_type.label()),
        }
    }
}

/// Generate entry/exit flags for `prices` under `cfg`.
pub fn generate(prices: &[PriceBar], cfg: &StrategyConfig) -> Result<SignalSeries, SignalError> {
    cfg.build()?.generate(prices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strategy_is_sma_20_50() {
        assert_eq!(
            StrategyConfig::default(),
            StrategyConfig::MaCrossover {
                ma_type: MaType::Sma,
                short_window: 20,
                long_window: 50,
            }
        );
        assert_eq!(StrategyConfig::default().label(), "SMA(20/50)");
    }

    #[test]
    fn zero_windows_are_rejected() {
        let cfg = StrategyConfig::MaCrossover {
            ma_type: MaType::Ema,
            short_window: 0,
            long_window: 5,
        };
        assert_eq!(
            cfg.validate(),
            Err(SignalError::InvalidWindow {
                name: "short_window",
                value: 0
            })
        );
        let cfg = StrategyConfig::MaCrossover {
            ma_type: MaType::Ema,
            short_window: 3,
            long_window: 0,
        };
        assert!(cfg.build().is_err());
    }

    #[test]
    fn strategy_config_serde_is_tagged() {
        let cfg = StrategyConfig::MaCrossover {
            ma_type: MaType::Ema,
            short_window: 12,
            long_window: 26,
        };
        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json["type"], "ma_crossover");
        assert_eq!(json["ma_type"], "ema");
        let back: StrategyConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn signal_series_counts() {
        let s = SignalSeries {
            entries: vec![false, true, true, false],
            exits: vec![true, false, false, false],
        };
        assert_eq!(s.len(), 4);
        assert_eq!(s.entry_count(), 2);
        assert_eq!(s.exit_count(), 1);
        assert!(SignalSeries::flat(0).is_empty());
    }
}
