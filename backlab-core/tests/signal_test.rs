//! Integration tests for signal generation.
//!
//! 1. Output is aligned with input and silent during warm-up.
//! 2. Crossover flags on a hand-built series, SMA and EMA.
//! 3. Look-ahead: truncating the series never changes earlier flags.
//! 4. Error paths: short series, zero windows.

use backlab_core::domain::bar::bars_from_closes;
use backlab_core::domain::PriceBar;
use backlab_core::signals::{generate, MaType, SignalError, StrategyConfig};
use chrono::NaiveDate;

// ── Helpers ──────────────────────────────────────────────────────────

fn bars(closes: &[f64]) -> Vec<PriceBar> {
    bars_from_closes(NaiveDate::from_ymd_opt(2021, 1, 4).unwrap(), closes)
}

fn crossover(ma_type: MaType, short_window: usize, long_window: usize) -> StrategyConfig {
    StrategyConfig::MaCrossover {
        ma_type,
        short_window,
        long_window,
    }
}

/// Slow sine wave: several crossovers over 300 bars.
fn wave(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + (i as f64 * 0.05).sin() * 20.0 + i as f64 * 0.01)
        .collect()
}

// ── 1. Alignment and warm-up ─────────────────────────────────────────

#[test]
fn output_length_matches_input() {
    let prices = bars(&wave(300));
    for ma in [MaType::Sma, MaType::Ema] {
        let s = generate(&prices, &crossover(ma, 20, 50)).unwrap();
        assert_eq!(s.entries.len(), 300);
        assert_eq!(s.exits.len(), 300);
    }
}

#[test]
fn no_flags_during_warmup() {
    let prices = bars(&wave(300));
    for ma in [MaType::Sma, MaType::Ema] {
        let s = generate(&prices, &crossover(ma, 20, 50)).unwrap();
        assert!(s.entries[..50].iter().all(|&f| !f));
        assert!(s.exits[..50].iter().all(|&f| !f));
    }
}

#[test]
fn wave_produces_both_kinds_of_flags() {
    let s = generate(&bars(&wave(300)), &crossover(MaType::Sma, 10, 30)).unwrap();
    assert!(s.entry_count() > 0);
    assert!(s.exit_count() > 0);
}

#[test]
fn entry_and_exit_never_on_same_bar() {
    let s = generate(&bars(&wave(300)), &crossover(MaType::Ema, 5, 15)).unwrap();
    assert!(s
        .entries
        .iter()
        .zip(&s.exits)
        .all(|(&e, &x)| !(e && x)));
}

// ── 2. Crossover correctness ─────────────────────────────────────────

#[test]
fn sma_crossover_on_constructed_series() {
    let s = generate(
        &bars(&[10.0, 10.0, 12.0, 12.0, 8.0, 8.0]),
        &crossover(MaType::Sma, 1, 2),
    )
    .unwrap();
    assert_eq!(s.entries, vec![false, false, true, false, false, false]);
    assert_eq!(s.exits, vec![false, false, false, false, true, false]);
}

#[test]
fn uptrend_is_long_after_warmup() {
    let closes: Vec<f64> = (0..40).map(|i| 50.0 + i as f64).collect();
    for ma in [MaType::Sma, MaType::Ema] {
        let s = generate(&bars(&closes), &crossover(ma, 3, 10)).unwrap();
        assert!(s.entries[10..].iter().all(|&f| f), "{ma:?}");
        assert_eq!(s.exit_count(), 0);
    }
}

#[test]
fn downtrend_flags_exits_only() {
    let closes: Vec<f64> = (0..40).map(|i| 100.0 - i as f64).collect();
    let s = generate(&bars(&closes), &crossover(MaType::Ema, 3, 10)).unwrap();
    assert_eq!(s.entry_count(), 0);
    assert!(s.exits[10..].iter().all(|&f| f));
}

// ── 3. Look-ahead ────────────────────────────────────────────────────

#[test]
fn truncation_does_not_change_earlier_flags() {
    let full = bars(&wave(300));
    for ma in [MaType::Sma, MaType::Ema] {
        let cfg = crossover(ma, 10, 40);
        let all = generate(&full, &cfg).unwrap();
        let part = generate(&full[..180], &cfg).unwrap();
        assert_eq!(&all.entries[..180], &part.entries[..]);
        assert_eq!(&all.exits[..180], &part.exits[..]);
    }
}

// ── 4. Errors ────────────────────────────────────────────────────────

#[test]
fn short_series_is_insufficient_data() {
    let err = generate(&bars(&wave(49)), &crossover(MaType::Sma, 20, 50)).unwrap_err();
    assert_eq!(
        err,
        SignalError::InsufficientData {
            required: 50,
            available: 49
        }
    );
}

#[test]
fn zero_window_rejected() {
    let err = generate(&bars(&wave(60)), &crossover(MaType::Sma, 0, 50)).unwrap_err();
    assert!(matches!(err, SignalError::InvalidWindow { name: "short_window", .. }));
}

#[test]
fn inverted_windows_still_generate() {
    let s = generate(&bars(&wave(120)), &crossover(MaType::Sma, 50, 20)).unwrap();
    assert_eq!(s.len(), 120);
    // the 50-bar average is undefined before index 49
    assert!(s.entries[..49].iter().all(|&f| !f));
    assert!(s.exits[..49].iter().all(|&f| !f));
}

#[test]
fn strategy_config_toml_shape() {
    let cfg: StrategyConfig =
        serde_json::from_str(r#"{"type":"ma_crossover","ma_type":"ema","short_window":5,"long_window":15}"#)
            .unwrap();
    assert_eq!(cfg, crossover(MaType::Ema, 5, 15));
    assert_eq!(cfg.label(), "EMA(5/15)");
}
