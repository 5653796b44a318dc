//! Canonicalisation of raw provider rows.

use chrono::NaiveDate;

use crate::domain::PriceBar;

/// Canonical bars plus the number of raw rows discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct Canonicalized {
    pub bars: Vec<PriceBar>,
    pub dropped: usize,
}

/// Drop rows outside `[start, end)` and rows whose close is not finite and
/// positive, sort by date, then drop duplicate dates (first tradable row wins).
pub fn canonicalize(mut bars: Vec<PriceBar>, start: NaiveDate, end: NaiveDate) -> Canonicalized {
    let raw_len = bars.len();
    // filter first so an untradable duplicate cannot shadow a good row
    bars.retain(|b| b.date >= start && b.date < end && b.has_tradable_close());
    // stable: among equal dates the provider's first row stays first
    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    Canonicalized {
        dropped: raw_len - bars.len(),
        bars,
    }
}
