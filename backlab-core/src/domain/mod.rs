//! Domain types for Backlab

pub mod bar;
pub mod position;
pub mod trade;

pub use bar::PriceBar;
pub use position::{PositionState, Transition};
pub use trade::{OpenPosition, TradeRecord};

/// Ticker symbol as understood by the price provider (e.g. `AAPL`, `BTC-USD`).
pub type Ticker = String;
