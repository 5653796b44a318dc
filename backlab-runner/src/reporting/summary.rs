//! Plain-text summaries: one block per ticker and a side-by-side comparison.

use crate::data_loader::TickerFailure;
use crate::runner::BacktestResult;

fn pct(v: f64) -> String {
    format!("{:.2}%", v * 100.0)
}

fn money(v: f64) -> String {
    format!("{v:.2}")
}

fn ratio(v: f64) -> String {
    format!("{v:.3}")
}

/// Labelled, formatted statistics in display order.
///
/// Shared by the per-ticker summary and the comparison table, so both always
/// show the same rows.
pub fn metric_rows(r: &BacktestResult) -> Vec<(&'static str, String)> {
    let s = &r.stats;
    vec![
        ("Start", s.start.to_string()),
        ("End", s.end.to_string()),
        ("Bars", s.bar_count.to_string()),
        ("Start Value", money(s.start_value)),
        ("End Value", money(s.end_value)),
        ("Total Return", pct(s.total_return)),
        ("Benchmark Return", pct(s.benchmark_return)),
        ("CAGR", pct(s.cagr)),
        ("Max Drawdown", pct(s.max_drawdown)),
        ("Max DD Duration (bars)", s.max_drawdown_duration.to_string()),
        ("Total Fees Paid", money(s.total_fees_paid)),
        ("Exposure", pct(s.exposure)),
        ("Total Trades", s.trade_count.to_string()),
        ("Closed Trades", s.closed_trades.to_string()),
        ("Open Trades", s.open_trades.to_string()),
        ("Open Trade PnL", money(s.open_trade_pnl)),
        ("Win Rate", pct(s.win_rate)),
        ("Best Trade", pct(s.best_trade)),
        ("Worst Trade", pct(s.worst_trade)),
        ("Avg Winning Trade", pct(s.avg_winning_trade)),
        ("Avg Losing Trade", pct(s.avg_losing_trade)),
        ("Profit Factor", format!("{:.2}", s.profit_factor)),
        ("Expectancy", money(s.expectancy)),
        ("Sharpe", ratio(s.sharpe)),
        ("Sortino", ratio(s.sortino)),
        ("Calmar", ratio(s.calmar)),
    ]
}

fn label_width(rows: &[(&str, String)]) -> usize {
    rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0)
}

/// Text block with every statistic for one ticker.
pub fn render_summary(result: &BacktestResult) -> String {
    let rows = metric_rows(result);
    let width = label_width(&rows);
    let mut out = String::with_capacity(1024);
    out.push_str(&format!(
        "== {} | {} | source: {} ==\n",
        result.ticker,
        result.strategy.label(),
        result.source
    ));
    for (label, value) in &rows {
        out.push_str(&format!("{label:<width$}  {value}\n"));
    }
    out
}

/// Metric rows × ticker columns.
pub fn render_comparison(results: &[BacktestResult]) -> String {
    if results.is_empty() {
        return "no results\n".to_string();
    }

    let table: Vec<Vec<(&'static str, String)>> = results.iter().map(metric_rows).collect();
    let labels: Vec<&'static str> = table[0].iter().map(|(l, _)| *l).collect();
    let label_w = label_width(&table[0]);
    let cells: Vec<Vec<String>> = table
        .into_iter()
        .map(|rows| rows.into_iter().map(|(_, v)| v).collect())
        .collect();
    let col_w: Vec<usize> = results
        .iter()
        .zip(&cells)
        .map(|(r, col)| {
            col.iter()
                .map(String::len)
                .chain(std::iter::once(r.ticker.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::with_capacity(256 * (results.len() + 1));
    out.push_str(&format!("{:<label_w$}", "Metric"));
    for (r, &w) in results.iter().zip(&col_w) {
        out.push_str(&format!("  {:>w$}", r.ticker));
    }
    out.push('\n');
    let total = label_w + col_w.iter().map(|w| w + 2).sum::<usize>();
    out.push_str(&"-".repeat(total));
    out.push('\n');

    for (row, label) in labels.iter().enumerate() {
        out.push_str(&format!("{label:<label_w$}"));
        for (col, &w) in cells.iter().zip(&col_w) {
            out.push_str(&format!("  {:>w$}", col[row]));
        }
        out.push('\n');
    }
    out
}

/// One line per failed ticker.
pub fn render_failures(failures: &[TickerFailure]) -> String {
    failures.iter().map(|f| format!("WARN {f}\n")).collect()
}
