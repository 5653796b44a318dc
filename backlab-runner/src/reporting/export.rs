//! Export: JSON run reports, CSV trajectories and trade tapes.
//!
//! Persisted JSON carries a `schema_version`; newer versions are rejected
//! on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

use backlab_core::domain::{PriceBar, TradeRecord};
use backlab_core::engine::PortfolioTrajectory;

use super::summary::render_comparison;
use crate::runner::{RunReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `RunReport` to pretty JSON.
pub fn export_json(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize RunReport to JSON")
}

/// Deserialize a `RunReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunReport> {
    let report: RunReport =
        serde_json::from_str(json).context("failed to deserialize RunReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export a trajectory as CSV.
///
/// Columns: date, close, position, cash, holdings_value, equity, drawdown_pct
pub fn export_trajectory_csv(trajectory: &PortfolioTrajectory) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        "close",
        "position",
        "cash",
        "holdings_value",
        "equity",
        "drawdown_pct",
    ])?;
    for p in &trajectory.points {
        wtr.write_record([
            p.date.to_string(),
            format!("{:.6}", p.close),
            p.position.as_str().to_string(),
            format!("{:.2}", p.cash),
            format!("{:.2}", p.holdings_value),
            format!("{:.2}", p.equity),
            format!("{:.4}", p.drawdown * 100.0),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export completed trades as CSV.
///
/// Columns: entry_bar, entry_date, entry_price, exit_bar, exit_date,
/// exit_price, shares, entry_fee, exit_fee, net_pnl, return_pct, bars_held
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "entry_bar",
        "entry_date",
        "entry_price",
        "exit_bar",
        "exit_date",
        "exit_price",
        "shares",
        "entry_fee",
        "exit_fee",
        "net_pnl",
        "return_pct",
        "bars_held",
    ])?;
    for t in trades {
        wtr.write_record([
            &t.entry_bar.to_string(),
            &t.entry_date.to_string(),
            &format!("{:.6}", t.entry_price),
            &t.exit_bar.to_string(),
            &t.exit_date.to_string(),
            &format!("{:.6}", t.exit_price),
            &format!("{:.6}", t.shares),
            &format!("{:.2}", t.entry_fee),
            &format!("{:.2}", t.exit_fee),
            &format!("{:.2}", t.net_pnl),
            &format!("{:.4}", t.return_pct() * 100.0),
            &t.bars_held.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export raw bars in the same layout the CSV provider reads.
pub fn export_bars_csv(bars: &[PriceBar]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["Date", "Open", "High", "Low", "Close", "Volume"])?;
    for b in bars {
        wtr.write_record([
            &b.date.to_string(),
            &b.open.to_string(),
            &b.high.to_string(),
            &b.low.to_string(),
            &b.close.to_string(),
            &b.volume.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a run.
///
/// Creates `{output_dir}/{run_id prefix}/` containing:
/// - `summary.json`: the full `RunReport`
/// - `comparison.txt`: metric rows × ticker columns
/// - `{TICKER}_trajectory.csv` and `{TICKER}_trades.csv` per successful ticker
///
/// Returns the path to the created directory.
pub fn save_artifacts(report: &RunReport, output_dir: &Path) -> Result<PathBuf> {
    let prefix = report.run_id.get(..12).unwrap_or(&report.run_id);
    let run_dir = output_dir.join(prefix);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("summary.json"), export_json(report)?)?;
    std::fs::write(
        run_dir.join("comparison.txt"),
        render_comparison(&report.results),
    )?;

    for result in &report.results {
        let stem = sanitize_file_stem(&result.ticker);
        std::fs::write(
            run_dir.join(format!("{stem}_trajectory.csv")),
            export_trajectory_csv(&result.trajectory)?,
        )?;
        std::fs::write(
            run_dir.join(format!("{stem}_trades.csv")),
            export_trades_csv(&result.trades)?,
        )?;
    }

    info!(dir = %run_dir.display(), "artifacts written");
    Ok(run_dir)
}

/// Tickers like `^GSPC` or `BRK/B` become safe file names.
fn sanitize_file_stem(ticker: &str) -> String {
    ticker
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
