//! Backlab CLI: fetch, run, and config commands.
//!
//! Commands:
//! - `fetch`: download price series and print a per-ticker overview
//! - `run`: backtest a strategy over one or more tickers
//! - `config`: print the default configuration as TOML

mod logging;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use backlab_core::signals::{MaType, StrategyConfig};
use backlab_runner::config::{ProviderConfig, ProviderSource};
use backlab_runner::reporting::{
    export_bars_csv, export_json, render_comparison, render_failures, render_summary,
    save_artifacts,
};
use backlab_runner::{load_series, run_backtests, BacktestConfig, LoadedSeries};

#[derive(Parser)]
#[command(
    name = "backlab",
    version,
    about = "Backlab CLI: moving-average crossover backtests"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). RUST_LOG overrides.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum MaKind {
    Sma,
    Ema,
}

impl From<MaKind> for MaType {
    fn from(kind: MaKind) -> Self {
        match kind {
            MaKind::Sma => MaType::Sma,
            MaKind::Ema => MaType::Ema,
        }
    }
}

/// Provider flags shared by `fetch` and `run`.
#[derive(clap::Args)]
struct ProviderArgs {
    /// Data source: yahoo, csv, or synthetic.
    #[arg(long)]
    source: Option<ProviderSource>,

    /// Directory of <TICKER>.csv files (csv source).
    #[arg(long)]
    csv_dir: Option<PathBuf>,

    /// Per-request timeout in seconds (yahoo source).
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Retries after a failed request (yahoo source). Default 0.
    #[arg(long)]
    max_retries: Option<u32>,
}

impl ProviderArgs {
    fn apply(&self, provider: &mut ProviderConfig) {
        if let Some(source) = self.source {
            provider.source = source;
        }
        if let Some(dir) = &self.csv_dir {
            provider.csv_dir = Some(dir.clone());
        }
        if let Some(t) = self.timeout_secs {
            provider.timeout_secs = t;
        }
        if let Some(r) = self.max_retries {
            provider.max_retries = r;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch price series and print bar count, date span, first/last close.
    Fetch {
        /// Tickers to fetch (e.g., AAPL MSFT BTC-USD).
        #[arg(long = "ticker", required = true, num_args = 1..)]
        tickers: Vec<String>,

        /// Start date (YYYY-MM-DD), inclusive. Defaults to 2021-01-01.
        #[arg(long)]
        start: Option<NaiveDate>,

        /// End date (YYYY-MM-DD), exclusive. Defaults to 2024-12-31.
        #[arg(long)]
        end: Option<NaiveDate>,

        #[command(flatten)]
        provider: ProviderArgs,

        /// Write each series to <DIR>/<TICKER>.csv.
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },
    /// Run backtests from a TOML config file, with optional overrides.
    Run {
        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Tickers (replaces the config list).
        #[arg(long = "ticker", num_args = 1..)]
        tickers: Vec<String>,

        /// Start date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        start: Option<NaiveDate>,

        /// End date (YYYY-MM-DD), exclusive.
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Initial capital.
        #[arg(long)]
        capital: Option<f64>,

        /// Fee per fill as a percentage of notional (0.5 = 0.5%).
        #[arg(long)]
        fee_pct: Option<f64>,

        /// Moving average kind.
        #[arg(long, value_enum)]
        ma_type: Option<MaKind>,

        /// Short moving-average window.
        #[arg(long)]
        short_window: Option<usize>,

        /// Long moving-average window.
        #[arg(long)]
        long_window: Option<usize>,

        /// Run tickers in parallel.
        #[arg(long, default_value_t = false)]
        parallel: bool,

        #[command(flatten)]
        provider: ProviderArgs,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Skip writing artifacts.
        #[arg(long, default_value_t = false)]
        no_artifacts: bool,

        /// Print the full report as JSON instead of text tables.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the default configuration as TOML.
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Fetch {
            tickers,
            start,
            end,
            provider,
            export_dir,
        } => run_fetch(tickers, start, end, &provider, export_dir.as_deref()),
        Commands::Run {
            config,
            tickers,
            start,
            end,
            capital,
            fee_pct,
            ma_type,
            short_window,
            long_window,
            parallel,
            provider,
            output_dir,
            no_artifacts,
            json,
        } => {
            let mut cfg = match config {
                Some(path) => BacktestConfig::from_file(&path)?,
                None => BacktestConfig::default(),
            };
            let b = &mut cfg.backtest;
            if !tickers.is_empty() {
                b.tickers = tickers;
            }
            if let Some(d) = start {
                b.start_date = d;
            }
            if let Some(d) = end {
                b.end_date = d;
            }
            if let Some(c) = capital {
                b.initial_capital = c;
            }
            if let Some(f) = fee_pct {
                b.fee_pct = f;
            }
            b.parallel |= parallel;
            override_strategy(&mut cfg.strategy, ma_type, short_window, long_window);
            provider.apply(&mut cfg.provider);

            let output_dir = (!no_artifacts).then_some(output_dir);
            run_backtest_cmd(&cfg, output_dir.as_deref(), json)
        }
        Commands::Config => {
            print!("{}", BacktestConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn override_strategy(
    strategy: &mut StrategyConfig,
    ma: Option<MaKind>,
    short: Option<usize>,
    long: Option<usize>,
) {
    let StrategyConfig::MaCrossover {
        ma_type,
        short_window,
        long_window,
    } = strategy;
    if let Some(kind) = ma {
        *ma_type = kind.into();
    }
    if let Some(s) = short {
        *short_window = s;
    }
    if let Some(l) = long {
        *long_window = l;
    }
}

fn run_fetch(
    tickers: Vec<String>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    provider_args: &ProviderArgs,
    export_dir: Option<&Path>,
) -> Result<()> {
    let mut cfg = BacktestConfig::default();
    cfg.backtest.tickers = tickers;
    if let Some(d) = start {
        cfg.backtest.start_date = d;
    }
    if let Some(d) = end {
        cfg.backtest.end_date = d;
    }
    provider_args.apply(&mut cfg.provider);
    cfg.dedup_tickers();
    cfg.validate()?;

    let provider = cfg.provider.build()?;
    let (start, end) = (cfg.backtest.start_date, cfg.backtest.end_date);
    if let Some(dir) = export_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let loaded = load_series(&cfg.backtest.tickers, provider.as_ref(), start, end);
    for series in &loaded.series {
        println!("{}", describe_series(series));
        if let Some(dir) = export_dir {
            let path = dir.join(format!("{}.csv", series.ticker));
            std::fs::write(&path, export_bars_csv(&series.bars)?)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
    }
    eprint!("{}", render_failures(&loaded.failures));

    if loaded.series.is_empty() {
        bail!("every ticker failed to fetch");
    }
    Ok(())
}

/// One-line overview: bar count, date span, first/last close.
fn describe_series(series: &LoadedSeries) -> String {
    match (series.bars.first(), series.bars.last()) {
        (Some(first), Some(last)) => format!(
            "{}: {} bars, {} to {}, first close {:.2}, last close {:.2} ({})",
            series.ticker,
            series.bars.len(),
            first.date,
            last.date,
            first.close,
            last.close,
            series.source,
        ),
        _ => format!("{}: no bars ({})", series.ticker, series.source),
    }
}

fn run_backtest_cmd(cfg: &BacktestConfig, output_dir: Option<&Path>, json: bool) -> Result<()> {
    let provider = cfg.provider.build()?;
    let report = run_backtests(cfg, provider.as_ref())?;

    if json {
        println!("{}", export_json(&report)?);
    } else {
        for result in &report.results {
            println!("{}", render_summary(result));
        }
        if report.results.len() > 1 {
            println!("{}", render_comparison(&report.results));
        }
        eprint!("{}", render_failures(&report.failures));
    }

    if let Some(dir) = output_dir {
        if !report.all_failed() {
            let run_dir = save_artifacts(&report, dir)?;
            eprintln!("Artifacts saved to: {}", run_dir.display());
        }
    }

    if report.all_failed() {
        bail!("every ticker failed; no results");
    }
    Ok(())
}
