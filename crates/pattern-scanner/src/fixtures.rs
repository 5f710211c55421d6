//! Synthetic panels shared by the detector tests.

use chrono::NaiveDate;

use research_core::PricePanel;

pub(crate) fn panel_with_volume(closes: &[f64], volume: Vec<f64>) -> PricePanel {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let dates: Vec<NaiveDate> = (0..closes.len())
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect();
    let open = closes.to_vec();
    let high: Vec<f64> = closes.iter().map(|c| c + 0.5).collect();
    let low: Vec<f64> = closes.iter().map(|c| c - 0.5).collect();
    PricePanel::from_columns(dates, open, high, low, closes.to_vec(), volume, None).unwrap()
}

pub(crate) fn panel_from_closes(closes: &[f64]) -> PricePanel {
    let volume = vec![1_000_000.0; closes.len()];
    panel_with_volume(closes, volume)
}

/// Append `steps` values moving linearly from the current last close to `to`.
fn ramp(closes: &mut Vec<f64>, to: f64, steps: usize) {
    let from = *closes.last().expect("ramp needs a seed value");
    for k in 1..=steps {
        closes.push(from + (to - from) * k as f64 / steps as f64);
    }
}

/// Steady climb: 100 + 0.5 per bar.
pub(crate) fn uptrend_panel(bars: usize) -> PricePanel {
    let closes: Vec<f64> = (0..bars).map(|i| 100.0 + 0.5 * i as f64).collect();
    panel_from_closes(&closes)
}

/// Steady decline: 300 - 0.5 per bar.
pub(crate) fn downtrend_panel(bars: usize) -> PricePanel {
    let closes: Vec<f64> = (0..bars).map(|i| 300.0 - 0.5 * i as f64).collect();
    panel_from_closes(&closes)
}

/// Dead flat at 100.
pub(crate) fn flat_panel(bars: usize) -> PricePanel {
    panel_from_closes(&vec![100.0; bars])
}

/// Long flat base with a late pop above a still-flat moving average.
pub(crate) fn flat_then_pop_panel() -> PricePanel {
    let mut closes = vec![100.0; 295];
    closes.extend(vec![106.0; 5]);
    panel_from_closes(&closes)
}

/// 300-bar climb qualifying for the trend template, optionally with a
/// positive relative-strength column attached.
pub(crate) fn trend_template_panel(with_rs: bool) -> PricePanel {
    let mut panel = uptrend_panel(300);
    if with_rs {
        panel.set_mansfield_rs(vec![1.5; 300]).unwrap();
    }
    panel
}

/// Long climb that rolls over for its last 80 bars, dragging the 50-day
/// moving average below the 150-day.
pub(crate) fn uptrend_stalled_panel() -> PricePanel {
    let mut closes = vec![100.0];
    ramp(&mut closes, 231.4, 219);
    ramp(&mut closes, 187.0, 80);
    panel_from_closes(&closes)
}

/// Base at 100 with three progressively tighter pullbacks:
/// 26%, then 15%, then 8%, ending in a quiet drift.
pub(crate) fn vcp_panel(dry_volume: bool) -> PricePanel {
    let mut closes = vec![50.0];
    ramp(&mut closes, 100.0, 59); // left side of the base, top at bar 59
    ramp(&mut closes, 75.0, 15);
    ramp(&mut closes, 98.0, 15);
    ramp(&mut closes, 84.0, 10);
    ramp(&mut closes, 97.0, 10);
    ramp(&mut closes, 90.0, 8);
    ramp(&mut closes, 96.0, 8);
    ramp(&mut closes, 93.0, 6);

    let n = closes.len();
    let volume = if dry_volume {
        let mut v = vec![1_000_000.0; n - 20];
        v.extend(vec![400_000.0; 20]);
        v
    } else {
        vec![1_000_000.0; n]
    };
    panel_with_volume(&closes, volume)
}

/// A 26%-deep cup between peaks at 100 and 98, followed by a shallow
/// handle that holds above the cup midpoint.
pub(crate) fn cup_panel() -> PricePanel {
    let mut closes = vec![90.0];
    ramp(&mut closes, 100.0, 19); // left peak at bar 19
    ramp(&mut closes, 75.0, 30); // cup bottom
    ramp(&mut closes, 98.0, 30); // right peak at bar 79
    ramp(&mut closes, 91.0, 6); // handle dip
    ramp(&mut closes, 93.0, 6);
    panel_from_closes(&closes)
}

/// Same cup, but the handle collapses below the cup midpoint.
pub(crate) fn deep_handle_cup_panel() -> PricePanel {
    let mut closes = vec![90.0];
    ramp(&mut closes, 100.0, 19);
    ramp(&mut closes, 75.0, 30);
    ramp(&mut closes, 98.0, 30);
    ramp(&mut closes, 80.0, 7); // handle undercuts the midpoint
    ramp(&mut closes, 86.0, 8);
    panel_from_closes(&closes)
}

/// A "W": lows near 80 thirty bars apart. With `undercut` the second low
/// shakes out slightly below the first.
pub(crate) fn double_bottom_panel(undercut: bool) -> PricePanel {
    let second_low = if undercut { 79.0 } else { 80.5 };
    let mut closes = vec![100.0];
    ramp(&mut closes, 80.0, 14); // first low at bar 14
    ramp(&mut closes, 92.0, 15); // middle peak at bar 29
    ramp(&mut closes, second_low, 15); // second low at bar 44
    ramp(&mut closes, 90.0, 15);
    panel_from_closes(&closes)
}

/// A 100%+ pole over seven weeks followed by a five-week sideways flag.
pub(crate) fn high_tight_flag_panel() -> PricePanel {
    let mut closes = vec![10.0; 10];
    ramp(&mut closes, 25.0, 35); // pole top at bar 44
    for i in 0..35 {
        closes.push(24.0 - 0.4 * (i % 3) as f64);
    }
    panel_from_closes(&closes)
}
