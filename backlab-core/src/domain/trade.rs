//! Round-trip trade records and the position left open at the end of a run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A completed round trip: Flat → Long → Flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Entry ──
    pub entry_bar: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_bar: usize,
    pub exit_date: NaiveDate,
    pub exit_price: f64,

    // ── Size ──
    pub shares: f64,

    // ── Costs ──
    pub entry_fee: f64,
    pub exit_fee: f64,
    /// Cash spent on entry: notional plus entry fee.
    pub entry_cost: f64,
    /// Cash received on exit: notional minus exit fee.
    pub exit_proceeds: f64,

    pub net_pnl: f64,
    pub bars_held: usize,
}

impl TradeRecord {
    /// Net return on the cash committed at entry.
    pub fn return_pct(&self) -> f64 {
        if self.entry_cost <= 0.0 {
            return 0.0;
        }
        self.net_pnl / self.entry_cost
    }

    /// A winner returns more cash on exit than it cost on entry.
    pub fn is_winner(&self) -> bool {
        self.exit_proceeds > self.entry_cost
    }

    pub fn fees(&self) -> f64 {
        self.entry_fee + self.exit_fee
    }
}

/// Position still held after the last bar, marked to market at the last close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub entry_bar: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub shares: f64,
    pub entry_fee: f64,
    pub entry_cost: f64,
    pub market_value: f64,
    pub unrealized_pnl: f64,
}
