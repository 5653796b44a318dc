//! Backtest runner: wires together loading, signal generation, simulation.
//!
//! Two entry points:
//! - `run_backtests()`: validates the config, loads every ticker, runs each. Used by the CLI.
//! - `run_backtest_from_data()`: one ticker, pre-loaded bars, no I/O.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use backlab_core::data::{DataSource, PriceProvider};
use backlab_core::domain::{OpenPosition, PriceBar, TradeRecord};
use backlab_core::engine::{simulate, BacktestParams, PortfolioTrajectory, SimulationError};
use backlab_core::metrics::SummaryStats;
use backlab_core::signals::{SignalError, StrategyConfig};

use crate::config::{BacktestConfig, ConfigError};
use crate::data_loader::{load_series, FailureStage, LoadedSeries, TickerFailure};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("signal error: {0}")]
    Signal(#[from] SignalError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single-ticker backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub ticker: String,
    pub source: DataSource,
    pub strategy: StrategyConfig,
    pub params: BacktestParams,
    pub bar_count: usize,
    pub warmup_bars: usize,
    pub entry_signals: usize,
    pub exit_signals: usize,
    pub stats: SummaryStats,
    pub trades: Vec<TradeRecord>,
    pub open_position: Option<OpenPosition>,
    pub trajectory: PortfolioTrajectory,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Outcome of a multi-ticker run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: String,
    pub config: BacktestConfig,
    /// Successful tickers, in configured order.
    pub results: Vec<BacktestResult>,
    pub failures: Vec<TickerFailure>,
}

impl RunReport {
    /// True when no ticker produced a result.
    pub fn all_failed(&self) -> bool {
        self.results.is_empty()
    }

    pub fn result_for(&self, ticker: &str) -> Option<&BacktestResult> {
        self.results.iter().find(|r| r.ticker == ticker)
    }
}

/// Run a backtest with pre-loaded bars: no I/O.
pub fn run_backtest_from_data(
    ticker: &str,
    bars: &[PriceBar],
    source: DataSource,
    strategy: &StrategyConfig,
    params: &BacktestParams,
) -> Result<BacktestResult, RunError> {
    let generator = strategy.build()?;
    let signals = generator.generate(bars)?;
    let sim = simulate(bars, &signals, params)?;

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        ticker: ticker.to_string(),
        source,
        strategy: strategy.clone(),
        params: *params,
        bar_count: bars.len(),
        warmup_bars: generator.warmup_bars(),
        entry_signals: signals.entry_count(),
        exit_signals: signals.exit_count(),
        stats: sim.stats,
        trades: sim.trades,
        open_position: sim.open_position,
        trajectory: sim.trajectory,
    })
}

/// Validate, load every ticker, and backtest each one independently.
///
/// Only an invalid configuration is an error. Per-ticker fetch, signal, and
/// simulation failures land in [`RunReport::failures`].
pub fn run_backtests(
    config: &BacktestConfig,
    provider: &dyn PriceProvider,
) -> Result<RunReport, RunError> {
    let mut config = config.clone();
    config.dedup_tickers();
    config.validate()?;

    let run_id = config.run_id();
    let params = config.params();
    let b = &config.backtest;
    info!(
        run_id = &run_id[..12],
        tickers = b.tickers.len(),
        strategy = %config.strategy.label(),
        start = %b.start_date,
        end = %b.end_date,
        "starting run"
    );

    let loaded = load_series(&b.tickers, provider, b.start_date, b.end_date);
    let mut failures = loaded.failures;

    let run_one = |series: &LoadedSeries| {
        let outcome = run_backtest_from_data(
            &series.ticker,
            &series.bars,
            series.source,
            &config.strategy,
            &params,
        );
        (series.ticker.clone(), outcome)
    };

    // indexed collect keeps ticker order in both modes
    let outcomes: Vec<(String, Result<BacktestResult, RunError>)> = if b.parallel {
        loaded.series.par_iter().map(run_one).collect()
    } else {
        loaded.series.iter().map(run_one).collect()
    };

    let mut results = Vec::with_capacity(outcomes.len());
    for (ticker, outcome) in outcomes {
        match outcome {
            Ok(result) => {
                info!(
                    ticker = %ticker,
                    total_return = result.stats.total_return,
                    trades = result.stats.trade_count,
                    "backtest complete"
                );
                results.push(result);
            }
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "backtest failed");
                failures.push(TickerFailure {
                    ticker,
                    stage: FailureStage::Backtest,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(RunReport {
        schema_version: SCHEMA_VERSION,
        run_id,
        config,
        results,
        failures,
    })
}
