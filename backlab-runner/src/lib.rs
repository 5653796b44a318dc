//! Backlab Runner: backtest orchestration and reporting.
//!
//! This crate builds on `backlab-core` to provide:
//! - TOML configuration with validation and a content-hash run id
//! - Sequential per-ticker loading with failure isolation
//! - Multi-ticker orchestration, sequential or on the rayon pool
//! - Text summaries, comparison tables, JSON/CSV artifacts

pub mod config;
pub mod data_loader;
pub mod reporting;
pub mod runner;

pub use config::{BacktestConfig, BacktestSection, ConfigError, ProviderConfig, ProviderSource};
pub use data_loader::{load_series, FailureStage, LoadedData, LoadedSeries, TickerFailure};
pub use runner::{run_backtest_from_data, run_backtests, BacktestResult, RunError, RunReport};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn backtest_result_is_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
    }

    #[test]
    fn run_error_is_send() {
        assert_send::<RunError>();
    }
}
