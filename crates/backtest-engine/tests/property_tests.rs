//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Cash never goes negative and equity accounting closes every run
//! 2. The running peak dominates the equity curve
//! 3. The position cap holds and per-symbol trades never overlap
//! 4. Shuffling same-day signals does not change results
//! 5. Trailing stops only ratchet up

use std::collections::HashMap;

use chrono::NaiveDate;
use proptest::prelude::*;

use backtest_engine::{BacktestConfig, BacktestEngine};
use research_core::{Position, PricePanel, Signal};
use risk_manager::RiskManager;

fn d0() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn panel_from_closes(closes: &[f64]) -> PricePanel {
    let dates: Vec<NaiveDate> = (0..closes.len())
        .map(|i| d0() + chrono::Duration::days(i as i64))
        .collect();
    let open = closes.to_vec();
    let high: Vec<f64> = closes.iter().map(|c| c * 1.01).collect();
    let low: Vec<f64> = closes.iter().map(|c| c * 0.99).collect();
    let volume = vec![1_000_000.0; closes.len()];
    PricePanel::from_columns(dates, open, high, low, closes.to_vec(), volume, None).unwrap()
}

// ── Strategies (proptest) ────────────────────────────────────────────

/// A random daily price path: start price and multiplicative steps.
fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    (20.0..200.0_f64, prop::collection::vec(0.9..1.1_f64, 9..30)).prop_map(|(start, steps)| {
        let mut closes = vec![start];
        for step in steps {
            let next = closes.last().unwrap() * step;
            closes.push(next);
        }
        closes
    })
}

/// A universe of 1-3 symbols with random signal days and confidences.
#[allow(clippy::type_complexity)]
fn arb_universe() -> impl Strategy<Value = (Vec<Vec<f64>>, Vec<(usize, usize, f64)>)> {
    (
        prop::collection::vec(arb_closes(), 1..=3),
        prop::collection::vec((0usize..10, 0usize..3, 50.0..100.0_f64), 0..8),
    )
}

const SYMBOLS: [&str; 3] = ["AAA", "BBB", "CCC"];

fn build_inputs(
    paths: &[Vec<f64>],
    raw_signals: &[(usize, usize, f64)],
) -> (HashMap<String, PricePanel>, HashMap<String, Vec<Signal>>) {
    let mut price_data = HashMap::new();
    for (i, closes) in paths.iter().enumerate() {
        price_data.insert(SYMBOLS[i].to_string(), panel_from_closes(closes));
    }

    let mut signals: HashMap<String, Vec<Signal>> = HashMap::new();
    for (day, symbol_idx, confidence) in raw_signals {
        let symbol = SYMBOLS[symbol_idx % paths.len().max(1)];
        let date = d0() + chrono::Duration::days(*day as i64);
        signals
            .entry(date.format("%Y-%m-%d").to_string())
            .or_default()
            .push(Signal {
                date,
                symbol: symbol.to_string(),
                confidence: *confidence,
            });
    }
    (price_data, signals)
}

// ── 1-3. Portfolio invariants over random runs ───────────────────────

proptest! {
    #[test]
    fn portfolio_invariants_hold((paths, raw_signals) in arb_universe()) {
        let (price_data, signals) = build_inputs(&paths, &raw_signals);

        let config = BacktestConfig { max_positions: 2, ..BacktestConfig::default() };
        let mut engine = BacktestEngine::new(config.clone(), RiskManager::default());
        let report = engine.run_backtest(&price_data, Some(&signals), None, None).unwrap();

        // Cash non-negativity
        prop_assert!(engine.cash() >= 0.0);

        // Equity accounting on the final day
        if let Some(last_equity) = report.equity_curve.last() {
            let held: f64 = report.open_positions.iter().map(Position::current_value).sum();
            prop_assert!((last_equity - (engine.cash() + held)).abs() < 1e-6);
        }

        // Monotone peak: the tracked peak is the curve maximum
        let curve_max = report
            .equity_curve
            .iter()
            .copied()
            .fold(config.initial_capital, f64::max);
        prop_assert!((engine.peak_equity() - curve_max).abs() < 1e-9);

        // One equity observation per simulated day
        prop_assert_eq!(report.equity_curve.len(), report.equity_dates.len());

        // Position cap
        prop_assert!(report.open_positions.len() <= config.max_positions);

        // Per-symbol trades never overlap, and exits follow entries
        let mut by_symbol: HashMap<&str, Vec<(NaiveDate, NaiveDate)>> = HashMap::new();
        for trade in &report.trades {
            prop_assert!(trade.shares >= 1);
            prop_assert!(trade.holding_days() >= 0);
            by_symbol
                .entry(trade.symbol.as_str())
                .or_default()
                .push((trade.entry_date, trade.exit_date));
        }
        for spans in by_symbol.values_mut() {
            spans.sort();
            for pair in spans.windows(2) {
                // No same-day re-entry: the next entry is strictly later
                prop_assert!(pair[1].0 > pair[0].1);
            }
        }
    }
}

// ── 4. Signal-order determinism ──────────────────────────────────────

proptest! {
    #[test]
    fn shuffled_signals_do_not_change_results((paths, raw_signals) in arb_universe()) {
        let (price_data, signals) = build_inputs(&paths, &raw_signals);

        let mut reversed = signals.clone();
        for day_signals in reversed.values_mut() {
            day_signals.reverse();
        }

        let config = BacktestConfig { max_positions: 2, ..BacktestConfig::default() };
        let mut first_engine = BacktestEngine::new(config.clone(), RiskManager::default());
        let first = first_engine
            .run_backtest(&price_data, Some(&signals), None, None)
            .unwrap();
        let mut second_engine = BacktestEngine::new(config, RiskManager::default());
        let second = second_engine
            .run_backtest(&price_data, Some(&reversed), None, None)
            .unwrap();

        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

// ── 5. Ratchet monotonicity ──────────────────────────────────────────

proptest! {
    /// Across any price path, with or without ATR, the stop never drops.
    #[test]
    fn trailing_stop_never_decreases(
        entry in 50.0..150.0_f64,
        steps in prop::collection::vec((0.85..1.2_f64, prop::option::of(0.1..10.0_f64)), 1..40),
    ) {
        let risk = RiskManager::default();
        let mut position = Position::new(
            "AAA",
            10,
            entry,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            risk.initial_stop_loss(entry),
            risk.take_profit(entry),
        );

        let mut price = entry;
        for (i, (step, atr)) in steps.into_iter().enumerate() {
            price *= step;
            let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
                + chrono::Duration::days(i as i64);
            position.update_price(price, date);

            let previous_stop = position.stop_loss;
            let new_stop = risk.update_trailing_stop(&position, price, atr);
            prop_assert!(new_stop >= previous_stop);
            position.stop_loss = new_stop;
        }
    }
}
