//! Summary statistics: pure functions over an equity curve and trade list.
//!
//! Per-bar returns are measured on the series `[initial_capital, equity...]`
//! so a fee paid on the very first bar still shows up. Annualisation assumes
//! daily bars: 252 periods per year.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{OpenPosition, PriceBar, TradeRecord};
use crate::engine::PortfolioTrajectory;

/// Trading periods per year for daily bars.
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// Aggregate statistics for a single simulated run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub bar_count: usize,
    pub start_value: f64,
    pub end_value: f64,
    pub total_return: f64,
    /// Buy-and-hold return of the instrument over the same bars.
    pub benchmark_return: f64,
    pub cagr: f64,
    pub max_drawdown: f64,
    /// Longest stretch of bars spent below a prior equity peak.
    pub max_drawdown_duration: usize,
    pub total_fees_paid: f64,
    /// Fraction of bars that closed with a long position.
    pub exposure: f64,
    /// Number of Flat → Long transitions, including one still open.
    pub trade_count: usize,
    pub closed_trades: usize,
    pub open_trades: usize,
    pub open_trade_pnl: f64,
    pub win_rate: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub avg_winning_trade: f64,
    pub avg_losing_trade: f64,
    pub profit_factor: f64,
    pub expectancy: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub calmar: f64,
}

impl SummaryStats {
    /// Compute all statistics once over a finished run.
    ///
    /// `prices` and `trajectory` must be non-empty and aligned.
    pub fn compute(
        prices: &[PriceBar],
        trajectory: &PortfolioTrajectory,
        trades: &[TradeRecord],
        open_position: Option<&OpenPosition>,
        entry_count: usize,
        total_fees_paid: f64,
        initial_capital: f64,
    ) -> Self {
        let equity = trajectory.equity_curve();
        let returns = period_returns(initial_capital, &equity);
        let end_value = equity.last().copied().unwrap_or(initial_capital);
        let bar_count = equity.len();
        let trade_returns: Vec<f64> = trades.iter().map(TradeRecord::return_pct).collect();
        let max_dd = max_drawdown(&trajectory.drawdown_curve());
        let growth = cagr(initial_capital, end_value, bar_count);

        Self {
            start: prices.first().map(|b| b.date).unwrap_or_default(),
            end: prices.last().map(|b| b.date).unwrap_or_default(),
            bar_count,
            start_value: initial_capital,
            end_value,
            total_return: total_return(initial_capital, end_value),
            benchmark_return: benchmark_return(prices),
            cagr: growth,
            max_drawdown: max_dd,
            max_drawdown_duration: max_drawdown_duration(&equity),
            total_fees_paid,
            exposure: if bar_count == 0 {
                0.0
            } else {
                trajectory.bars_long() as f64 / bar_count as f64
            },
            trade_count: entry_count,
            closed_trades: trades.len(),
            open_trades: usize::from(open_position.is_some()),
            open_trade_pnl: open_position.map(|p| p.unrealized_pnl).unwrap_or(0.0),
            win_rate: win_rate(trades),
            best_trade: extreme(&trade_returns, f64::max),
            worst_trade: extreme(&trade_returns, f64::min),
            avg_winning_trade: mean_f64_where(&trade_returns, |r| r > 0.0),
            avg_losing_trade: mean_f64_where(&trade_returns, |r| r <= 0.0),
            profit_factor: profit_factor(trades),
            expectancy: expectancy(trades),
            sharpe: sharpe_ratio(&returns),
            sortino: sortino_ratio(&returns),
            calmar: calmar_ratio(growth, max_dd),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction of initial capital.
pub fn total_return(initial_capital: f64, end_value: f64) -> f64 {
    if initial_capital <= 0.0 {
        return 0.0;
    }
    end_value / initial_capital - 1.0
}

/// Buy-and-hold return from the first to the last close.
pub fn benchmark_return(prices: &[PriceBar]) -> f64 {
    match (prices.first(), prices.last()) {
        (Some(first), Some(last)) if first.close > 0.0 => last.close / first.close - 1.0,
        _ => 0.0,
    }
}

/// Compound annual growth rate over `bars` daily periods.
///
/// Returns 0.0 for fewer than two bars or a non-positive end value.
pub fn cagr(initial_capital: f64, end_value: f64, bars: usize) -> f64 {
    if bars < 2 || initial_capital <= 0.0 || end_value <= 0.0 {
        return 0.0;
    }
    let years = bars as f64 / PERIODS_PER_YEAR;
    (end_value / initial_capital).powf(1.0 / years) - 1.0
}

/// Most negative value of a drawdown series (0.0 if never below a peak).
pub fn max_drawdown(drawdowns: &[f64]) -> f64 {
    drawdowns.iter().copied().fold(0.0_f64, f64::min)
}

/// Longest run of consecutive bars strictly below the running equity peak.
pub fn max_drawdown_duration(equity_curve: &[f64]) -> usize {
    let mut peak = f64::NEG_INFINITY;
    let mut current = 0usize;
    let mut longest = 0usize;
    for &eq in equity_curve {
        if eq >= peak {
            peak = eq;
            current = 0;
        } else {
            current += 1;
            longest = longest.max(current);
        }
    }
    longest
}

/// Annualised Sharpe ratio: mean / sample stdev of per-bar returns * sqrt(252).
///
/// Returns 0.0 with fewer than two returns or zero variance.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(returns) / std * PERIODS_PER_YEAR.sqrt()
}

/// Annualised Sortino ratio using downside deviation over all periods.
///
/// Returns 0.0 when there is no downside.
pub fn sortino_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let downside_sq: f64 = returns
        .iter()
        .filter(|&&r| r < 0.0)
        .map(|r| r * r)
        .sum();
    if downside_sq <= 0.0 {
        return 0.0;
    }
    let downside_std = (downside_sq / returns.len() as f64).sqrt();
    if downside_std < 1e-15 {
        return 0.0;
    }
    mean_f64(returns) / downside_std * PERIODS_PER_YEAR.sqrt()
}

/// Calmar ratio: CAGR / |max drawdown|. 0.0 without a drawdown or growth.
pub fn calmar_ratio(cagr: f64, max_drawdown: f64) -> f64 {
    if max_drawdown >= 0.0 || cagr <= 0.0 {
        return 0.0;
    }
    cagr / max_drawdown.abs()
}

/// Fraction of completed round trips that were winners (0.0 when none).
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Gross profit / gross loss over completed trades.
///
/// Capped at 100.0 when there are no losses.
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.net_pnl > 0.0)
        .map(|t| t.net_pnl)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.net_pnl < 0.0)
        .map(|t| t.net_pnl.abs())
        .sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

/// Mean net PnL per completed trade.
pub fn expectancy(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.net_pnl).sum::<f64>() / trades.len() as f64
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Per-bar simple returns of `[initial_capital, equity...]`.
pub fn period_returns(initial_capital: f64, equity_curve: &[f64]) -> Vec<f64> {
    let mut prev = initial_capital;
    equity_curve
        .iter()
        .map(|&eq| {
            let r = if prev > 0.0 { eq / prev - 1.0 } else { 0.0 };
            prev = eq;
            r
        })
        .collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean of the values passing `keep`; 0.0 when none do.
fn mean_f64_where(values: &[f64], keep: impl Fn(f64) -> bool) -> f64 {
    let kept: Vec<f64> = values.iter().copied().filter(|&v| keep(v)).collect();
    mean_f64(&kept)
}

/// Fold with `pick` (max/min); 0.0 for an empty slice.
fn extreme(values: &[f64], pick: fn(f64, f64) -> f64) -> f64 {
    values.iter().copied().reduce(pick).unwrap_or(0.0)
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_trade(net_pnl: f64) -> TradeRecord {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        TradeRecord {
            entry_bar: 0,
            entry_date: date,
            entry_price: 100.0,
            exit_bar: 5,
            exit_date: date,
            exit_price: 100.0 + net_pnl / 50.0,
            shares: 50.0,
            entry_fee: 0.0,
            exit_fee: 0.0,
            entry_cost: 5_000.0,
            exit_proceeds: 5_000.0 + net_pnl,
            net_pnl,
            bars_held: 5,
        }
    }

    // ── Returns ──

    #[test]
    fn total_return_against_initial_capital() {
        assert!((total_return(1_000.0, 1_100.0) - 0.1).abs() < 1e-12);
        assert!((total_return(1_000.0, 900.0) + 0.1).abs() < 1e-12);
        assert_eq!(total_return(0.0, 900.0), 0.0);
    }

    #[test]
    fn period_returns_start_from_capital() {
        let r = period_returns(100.0, &[110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.1).abs() < 1e-12);
        assert!((r[1] - (-0.1)).abs() < 1e-12);
    }

    #[test]
    fn cagr_one_year() {
        let c = cagr(100_000.0, 110_000.0, 252);
        assert!((c - 0.1).abs() < 1e-12, "CAGR should be 10%, got {c}");
    }

    #[test]
    fn cagr_degenerate_inputs() {
        assert_eq!(cagr(100.0, 120.0, 1), 0.0);
        assert_eq!(cagr(100.0, 0.0, 300), 0.0);
    }

    // ── Sharpe / Sortino ──

    #[test]
    fn sharpe_constant_returns_is_zero() {
        assert_eq!(sharpe_ratio(&[0.001; 50]), 0.0);
        assert_eq!(sharpe_ratio(&[0.0; 50]), 0.0);
    }

    #[test]
    fn sharpe_known_value() {
        // mean 0.0015, sample std of alternating 0.002/0.001 over 4 values
        let r = [0.002, 0.001, 0.002, 0.001];
        let std = (4.0 * 0.0005_f64.powi(2) / 3.0).sqrt();
        let expected = 0.0015 / std * 252.0_f64.sqrt();
        assert!((sharpe_ratio(&r) - expected).abs() < 1e-9);
    }

    #[test]
    fn sharpe_single_return() {
        assert_eq!(sharpe_ratio(&[0.05]), 0.0);
    }

    #[test]
    fn sortino_no_downside_is_zero() {
        assert_eq!(sortino_ratio(&[0.01, 0.02, 0.0]), 0.0);
    }

    #[test]
    fn sortino_positive_with_some_downside() {
        let mut r = vec![0.002; 50];
        r.extend([-0.005; 5]);
        assert!(sortino_ratio(&r) > 0.0);
    }

    // ── Drawdown ──

    #[test]
    fn max_drawdown_is_most_negative() {
        assert_eq!(max_drawdown(&[0.0, -0.1, -0.3, -0.05]), -0.3);
        assert_eq!(max_drawdown(&[0.0, 0.0]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn drawdown_duration_counts_bars_under_water() {
        let eq = [100.0, 110.0, 105.0, 104.0, 111.0, 109.0];
        assert_eq!(max_drawdown_duration(&eq), 2);
        assert_eq!(max_drawdown_duration(&[1.0, 2.0, 3.0]), 0);
    }

    #[test]
    fn calmar_needs_growth_and_drawdown() {
        assert!((calmar_ratio(0.2, -0.1) - 2.0).abs() < 1e-12);
        assert_eq!(calmar_ratio(0.2, 0.0), 0.0);
        assert_eq!(calmar_ratio(-0.1, -0.2), 0.0);
    }

    // ── Trades ──

    #[test]
    fn win_rate_mixed() {
        let trades = vec![
            make_trade(500.0),
            make_trade(-200.0),
            make_trade(300.0),
            make_trade(-100.0),
        ];
        assert!((win_rate(&trades) - 0.5).abs() < 1e-12);
        assert_eq!(win_rate(&[]), 0.0);
    }

    #[test]
    fn breakeven_trade_is_not_a_win() {
        assert_eq!(win_rate(&[make_trade(0.0)]), 0.0);
    }

    #[test]
    fn profit_factor_mixed_and_capped() {
        let trades = vec![make_trade(500.0), make_trade(-200.0), make_trade(300.0)];
        assert!((profit_factor(&trades) - 4.0).abs() < 1e-12);
        assert_eq!(profit_factor(&[make_trade(10.0)]), 100.0);
        assert_eq!(profit_factor(&[make_trade(-10.0)]), 0.0);
        assert_eq!(profit_factor(&[]), 0.0);
    }

    #[test]
    fn expectancy_is_mean_pnl() {
        let trades = vec![make_trade(300.0), make_trade(-100.0)];
        assert!((expectancy(&trades) - 100.0).abs() < 1e-12);
    }

    #[test]
    fn conditional_means_default_to_zero() {
        assert_eq!(mean_f64_where(&[0.1, 0.2], |r| r <= 0.0), 0.0);
        assert!((mean_f64_where(&[0.1, 0.3, -0.2], |r| r > 0.0) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn extreme_of_empty_is_zero() {
        assert_eq!(extreme(&[], f64::max), 0.0);
        assert_eq!(extreme(&[0.1, -0.4, 0.3], f64::min), -0.4);
    }
}
