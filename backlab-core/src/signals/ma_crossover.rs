//! Moving average crossover: long while the short MA sits above the long MA.
//!
//! Flags are level-based, not edge-based: `entries[t]` is true on every bar
//! where short > long and `exits[t]` on every bar where short < long. The
//! simulator's state machine turns repeated flags into a single transition.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{SignalError, SignalGenerator, SignalSeries};
use crate::domain::PriceBar;
use crate::indicators::{Ema, Indicator, Sma};

/// Moving average type selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaType {
    Sma,
    Ema,
}

impl MaType {
    pub fn label(&self) -> &'static str {
        match self {
            MaType::Sma => "SMA",
            MaType::Ema => "EMA",
        }
    }

    fn indicator(&self, period: usize) -> Box<dyn Indicator> {
        match self {
            MaType::Sma => Box::new(Sma::new(period)),
            MaType::Ema => Box::new(Ema::new(period)),
        }
    }
}

/// Dual moving average crossover signal generator.
#[derive(Debug, Clone)]
pub struct MaCrossover {
    pub short_window: usize,
    pub long_window: usize,
    pub ma_type: MaType,
}

impl MaCrossover {
    /// Both windows must be >= 1. A short window that is not below the long
    /// window is accepted but logged, since it rarely produces a useful signal.
    pub fn new(
        short_window: usize,
        long_window: usize,
        ma_type: MaType,
    ) -> Result<Self, SignalError> {
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
        if short_window >= long_window {
            warn!(
                short_window,
                long_window, "short window is not below long window; crossover signal may be degenerate"
            );
        }
        Ok(Self {
            short_window,
            long_window,
            ma_type,
        })
    }
}

impl SignalGenerator for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    /// The EMA is defined from index `long_window - 1`, but both kinds stay
    /// silent for the first `long_window` bars so SMA and EMA warm up alike.
    fn warmup_bars(&self) -> usize {
        self.long_window
    }

    fn generate(&self, bars: &[PriceBar]) -> Result<SignalSeries, SignalError> {
        if bars.len() < self.long_window {
            return Err(SignalError::InsufficientData {
                required: self.long_window,
                available: bars.len(),
            });
        }

        let short = self.ma_type.indicator(self.short_window).compute(bars);
        let long = self.ma_type.indicator(self.long_window).compute(bars);

        let mut signals = SignalSeries::flat(bars.len());
        for t in self.warmup_bars()..bars.len() {
            let (s, l) = (short[t], long[t]);
            // NaN compares false both ways, so undefined averages raise nothing.
            signals.entries[t] = s > l;
            signals.exits[t] = s < l;
        }

        Ok(signals)
    }
}
