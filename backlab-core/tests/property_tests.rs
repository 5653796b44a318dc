//! Property tests for signal and accounting invariants.
//!
//! Uses proptest to verify:
//! 1. Alignment: flags are as long as the series and silent during warm-up
//! 2. Cash never goes negative
//! 3. Continuity: a bar without a transition carries cash and shares over
//! 4. Determinism: identical inputs give identical outputs
//! 5. Fee sensitivity: a higher fee strictly lowers total return once a trade happens

use backlab_core::domain::bar::bars_from_closes;
use backlab_core::domain::PriceBar;
use backlab_core::engine::{simulate, BacktestParams};
use backlab_core::signals::{generate, MaType, StrategyConfig};
use chrono::NaiveDate;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

/// Random-walk closes, always positive.
fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    (
        1.0..500.0_f64,
        prop::collection::vec(-0.08..0.08_f64, 1..200),
    )
        .prop_map(|(start, moves)| {
            let mut price = start;
            moves
                .into_iter()
                .map(|m| {
                    price = (price * (1.0 + m)).max(0.01);
                    price
                })
                .collect()
        })
}

fn arb_strategy() -> impl Strategy<Value = StrategyConfig> {
    (prop_oneof![Just(MaType::Sma), Just(MaType::Ema)], 1..15usize, 1..40usize).prop_map(
        |(ma_type, short_window, long_window)| StrategyConfig::MaCrossover {
            ma_type,
            short_window,
            long_window,
        },
    )
}

fn long_window(cfg: &StrategyConfig) -> usize {
    match cfg {
        StrategyConfig::MaCrossover { long_window, .. } => *long_window,
    }
}

fn bars(closes: &[f64]) -> Vec<PriceBar> {
    bars_from_closes(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), closes)
}

fn params(fee_rate: f64) -> BacktestParams {
    BacktestParams {
        initial_capital: 10_000.0,
        fee_rate,
    }
}

proptest! {
    // ── 1. Alignment ─────────────────────────────────────────────────

    #[test]
    fn flags_aligned_and_silent_in_warmup(closes in arb_closes(), cfg in arb_strategy()) {
        let prices = bars(&closes);
        let lw = long_window(&cfg);
        match generate(&prices, &cfg) {
            Ok(signals) => {
                prop_assert_eq!(signals.entries.len(), prices.len());
                prop_assert_eq!(signals.exits.len(), prices.len());
                let warm = lw.min(prices.len());
                prop_assert!(signals.entries[..warm].iter().all(|&f| !f));
                prop_assert!(signals.exits[..warm].iter().all(|&f| !f));
            }
            Err(_) => prop_assert!(prices.len() < lw),
        }
    }

    // ── 2. Cash ──────────────────────────────────────────────────────

    #[test]
    fn cash_never_negative(
        closes in arb_closes(),
        cfg in arb_strategy(),
        fee in 0.0..0.2_f64,
    ) {
        let prices = bars(&closes);
        prop_assume!(prices.len() >= long_window(&cfg));
        let signals = generate(&prices, &cfg).unwrap();
        let result = simulate(&prices, &signals, &params(fee)).unwrap();
        prop_assert_eq!(result.trajectory.len(), prices.len());
        for p in &result.trajectory.points {
            prop_assert!(p.cash >= 0.0, "cash {} on {}", p.cash, p.date);
            prop_assert!(p.drawdown <= 0.0);
        }
    }

    // ── 3. Continuity ────────────────────────────────────────────────

    #[test]
    fn no_transition_carries_holdings(closes in arb_closes(), cfg in arb_strategy()) {
        let prices = bars(&closes);
        prop_assume!(prices.len() >= long_window(&cfg));
        let signals = generate(&prices, &cfg).unwrap();
        let result = simulate(&prices, &signals, &params(0.005)).unwrap();
        let points = &result.trajectory.points;

        for t in 1..points.len() {
            let (prev, cur) = (&points[t - 1], &points[t]);
            if prev.position == cur.position {
                prop_assert_eq!(prev.cash, cur.cash);
                prop_assert_eq!(prev.shares, cur.shares);
                let expected = cur.cash + cur.shares * prices[t].close;
                prop_assert!((cur.equity - expected).abs() <= 1e-9 * expected.abs().max(1.0));
            }
        }
    }

    // ── 4. Determinism ───────────────────────────────────────────────

    #[test]
    fn simulation_is_deterministic(
        closes in arb_closes(),
        cfg in arb_strategy(),
        fee in 0.0..0.05_f64,
    ) {
        let prices = bars(&closes);
        prop_assume!(prices.len() >= long_window(&cfg));
        let a = simulate(&prices, &generate(&prices, &cfg).unwrap(), &params(fee)).unwrap();
        let b = simulate(&prices, &generate(&prices, &cfg).unwrap(), &params(fee)).unwrap();
        prop_assert_eq!(a, b);
    }

    // ── 5. Fee sensitivity ───────────────────────────────────────────

    #[test]
    fn higher_fee_lowers_return(
        closes in arb_closes(),
        cfg in arb_strategy(),
        f1 in 0.0..0.05_f64,
        delta in 0.001..0.05_f64,
    ) {
        let prices = bars(&closes);
        prop_assume!(prices.len() >= long_window(&cfg));
        let signals = generate(&prices, &cfg).unwrap();
        let low = simulate(&prices, &signals, &params(f1)).unwrap();
        prop_assume!(!low.trades.is_empty());
        let high = simulate(&prices, &signals, &params(f1 + delta)).unwrap();
        prop_assert!(
            high.stats.total_return < low.stats.total_return,
            "fee {} -> {}, fee {} -> {}",
            f1, low.stats.total_return, f1 + delta, high.stats.total_return
        );
    }
}
