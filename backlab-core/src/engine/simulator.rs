//! Long/flat portfolio simulator.
//!
//! Single left-to-right pass over the bars. On each bar the position state
//! machine decides at most one transition from that bar's flags, fills it at
//! the close, then marks the portfolio to market.
//!
//! Sizing is all-in with fractional shares: an entry converts the whole cash
//! balance into shares plus the entry fee, so cash never goes negative. The
//! fee rate applies to notional on both entry and exit. A position still open
//! after the last bar is marked to market, never force-closed.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::trajectory::{PortfolioTrajectory, TrajectoryPoint};
use crate::domain::{OpenPosition, PositionState, PriceBar, TradeRecord, Transition};
use crate::metrics::SummaryStats;
use crate::signals::SignalSeries;

/// Errors from the simulator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("price series is empty")]
    EmptyPriceSeries,

    #[error("signals misaligned with prices: {prices} bars, {entries} entries, {exits} exits")]
    MisalignedSeries {
        prices: usize,
        entries: usize,
        exits: usize,
    },

    #[error("invalid backtest parameters: {0}")]
    InvalidParams(String),

    #[error("untradable close {price} at bar {index}")]
    InvalidPrice { index: usize, price: f64 },
}

/// Capital and cost assumptions for one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestParams {
    pub initial_capital: f64,
    /// Fraction of notional charged per fill, in [0, 1).
    pub fee_rate: f64,
}

impl Default for BacktestParams {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            fee_rate: 0.005,
        }
    }
}

impl BacktestParams {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(SimulationError::InvalidParams(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        if !(0.0..1.0).contains(&self.fee_rate) {
            return Err(SimulationError::InvalidParams(format!(
                "fee_rate must be in [0, 1), got {}",
                self.fee_rate
            )));
        }
        Ok(())
    }
}

/// Everything a single simulation produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub trajectory: PortfolioTrajectory,
    pub trades: Vec<TradeRecord>,
    pub open_position: Option<OpenPosition>,
    pub stats: SummaryStats,
}

/// Entry leg of the position currently held.
#[derive(Debug, Clone, Copy)]
struct EntryLeg {
    bar: usize,
    price: f64,
    shares: f64,
    fee: f64,
    cost: f64,
}

/// Mutable accounting state threaded through the pass.
#[derive(Debug)]
struct Book {
    state: PositionState,
    cash: f64,
    shares: f64,
    entry: Option<EntryLeg>,
    fees_paid: f64,
    entry_count: usize,
}

impl Book {
    fn new(initial_capital: f64) -> Self {
        Self {
            state: PositionState::Flat,
            cash: initial_capital,
            shares: 0.0,
            entry: None,
            fees_paid: 0.0,
            entry_count: 0,
        }
    }

    fn enter(&mut self, bar: usize, price: f64, fee_rate: f64) {
        let shares = self.cash / (price * (1.0 + fee_rate));
        let fee = shares * price * fee_rate;
        let cost = self.cash;
        self.entry = Some(EntryLeg {
            bar,
            price,
            shares,
            fee,
            cost,
        });
        self.shares = shares;
        // All-in: the whole balance became shares plus fee.
        self.cash = 0.0;
        self.fees_paid += fee;
        self.entry_count += 1;
        self.state = self.state.apply(Transition::Enter);
    }

    fn exit(
        &mut self,
        bar: usize,
        price: f64,
        fee_rate: f64,
        bars: &[PriceBar],
    ) -> Option<TradeRecord> {
        let entry = self.entry.take()?;
        let notional = self.shares * price;
        let fee = notional * fee_rate;
        let proceeds = notional - fee;
        self.cash += proceeds;
        self.fees_paid += fee;
        self.shares = 0.0;
        self.state = self.state.apply(Transition::Exit);

        Some(TradeRecord {
            entry_bar: entry.bar,
            entry_date: bars[entry.bar].date,
            entry_price: entry.price,
            exit_bar: bar,
            exit_date: bars[bar].date,
            exit_price: price,
            shares: entry.shares,
            entry_fee: entry.fee,
            exit_fee: fee,
            entry_cost: entry.cost,
            exit_proceeds: proceeds,
            net_pnl: proceeds - entry.cost,
            bars_held: bar - entry.bar,
        })
    }
}

/// Run the long/flat simulation.
///
/// `signals` must be aligned with `prices` (same length). Statistics are
/// computed once over the full trajectory.
pub fn simulate(
    prices: &[PriceBar],
    signals: &SignalSeries,
    params: &BacktestParams,
) -> Result<SimulationResult, SimulationError> {
    if prices.is_empty() {
        return Err(SimulationError::EmptyPriceSeries);
    }
    if signals.entries.len() != prices.len() || signals.exits.len() != prices.len() {
        return Err(SimulationError::MisalignedSeries {
            prices: prices.len(),
            entries: signals.entries.len(),
            exits: signals.exits.len(),
        });
    }
    params.validate()?;
    if let Some((index, bar)) = prices
        .iter()
        .enumerate()
        .find(|(_, b)| !b.has_tradable_close())
    {
        return Err(SimulationError::InvalidPrice {
            index,
            price: bar.close,
        });
    }

    let mut book = Book::new(params.initial_capital);
    let mut trades = Vec::new();
    let mut trajectory = PortfolioTrajectory::with_capacity(prices.len());
    let mut peak = f64::NEG_INFINITY;

    for (t, bar) in prices.iter().enumerate() {
        match book
            .state
            .transition(signals.entries[t], signals.exits[t])
        {
            Some(Transition::Enter) => {
                book.enter(t, bar.close, params.fee_rate);
                debug!(bar = t, date = %bar.date, price = bar.close, shares = book.shares, "enter long");
            }
            Some(Transition::Exit) => {
                if let Some(trade) = book.exit(t, bar.close, params.fee_rate, prices) {
                    debug!(bar = t, date = %bar.date, price = bar.close, net_pnl = trade.net_pnl, "exit long");
                    trades.push(trade);
                }
            }
            None => {}
        }

        let holdings_value = book.shares * bar.close;
        let equity = book.cash + holdings_value;
        peak = peak.max(equity);
        let drawdown = if peak > 0.0 {
            (equity / peak - 1.0).min(0.0)
        } else {
            0.0
        };

        trajectory.push(TrajectoryPoint {
            date: bar.date,
            close: bar.close,
            position: book.state,
            cash: book.cash,
            shares: book.shares,
            holdings_value,
            equity,
            drawdown,
        });
    }

    let open_position = book.entry.map(|entry| {
        let last_close = prices[prices.len() - 1].close;
        let market_value = entry.shares * last_close;
        OpenPosition {
            entry_bar: entry.bar,
            entry_date: prices[entry.bar].date,
            entry_price: entry.price,
            shares: entry.shares,
            entry_fee: entry.fee,
            entry_cost: entry.cost,
            market_value,
            unrealized_pnl: market_value - entry.cost,
        }
    });

    let stats = SummaryStats::compute(
        prices,
        &trajectory,
        &trades,
        open_position.as_ref(),
        book.entry_count,
        book.fees_paid,
        params.initial_capital,
    );

    Ok(SimulationResult {
        trajectory,
        trades,
        open_position,
        stats,
    })
}
