//! Backlab Core: price bars, indicators, signal generation, portfolio simulation.
//!
//! This crate contains the backtesting pipeline for a single instrument:
//! - Domain types (price bars, position state, trade records)
//! - Moving-average indicators (SMA, EMA)
//! - Signal generation: price series to entry/exit flags
//! - Long/flat portfolio simulator with a flat fee
//! - Summary statistics over the simulated trajectory
//! - Price providers (Yahoo Finance, CSV, synthetic) and canonicalisation

pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod metrics;
pub mod signals;

pub use domain::{PriceBar, Ticker};
pub use engine::{simulate, BacktestParams, SimulationError, SimulationResult};
pub use metrics::SummaryStats;
pub use signals::{generate, SignalError, SignalSeries, StrategyConfig};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything that crosses the rayon boundary in the
    /// runner is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceBar>();
        require_sync::<domain::PriceBar>();
        require_send::<domain::TradeRecord>();
        require_sync::<domain::TradeRecord>();
        require_send::<domain::OpenPosition>();
        require_sync::<domain::OpenPosition>();

        require_send::<signals::StrategyConfig>();
        require_sync::<signals::StrategyConfig>();
        require_send::<signals::SignalSeries>();
        require_sync::<signals::SignalSeries>();
        require_send::<Box<dyn signals::SignalGenerator>>();
        require_sync::<Box<dyn signals::SignalGenerator>>();

        require_send::<engine::BacktestParams>();
        require_sync::<engine::BacktestParams>();
        require_send::<engine::SimulationResult>();
        require_sync::<engine::SimulationResult>();

        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::CsvProvider>();
        require_sync::<data::CsvProvider>();
        require_send::<data::SyntheticProvider>();
        require_sync::<data::SyntheticProvider>();
    }

    /// Architecture contract: the simulator sees only flags, never the strategy.
    #[test]
    fn simulator_is_strategy_agnostic() {
        fn _check(
            prices: &[PriceBar],
            signals: &SignalSeries,
            params: &BacktestParams,
        ) -> Result<SimulationResult, SimulationError> {
            simulate(prices, signals, params)
        }
    }
}
