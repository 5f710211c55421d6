use research_core::{PatternDetector, PatternResult, PatternType, PricePanel, ResearchError};
use technical_analysis::{find_local_extrema, percentage_change, EXTREMA_ORDER};

/// Only look for the pattern within the last 100 bars.
const ANALYSIS_WINDOW: usize = 100;

/// Double Bottom ("W") detector.
///
/// Two local lows at roughly the same level, 10-50 bars apart. A second
/// low that undercuts the first (a shakeout) is the stronger variant.
#[derive(Debug, Clone, Copy)]
pub struct DoubleBottomDetector {
    pub max_low_diff_pct: f64,
    pub min_separation_days: usize,
    pub max_separation_days: usize,
}

impl Default for DoubleBottomDetector {
    fn default() -> Self {
        Self {
            max_low_diff_pct: 5.0,
            min_separation_days: 10,
            max_separation_days: 50,
        }
    }
}

impl DoubleBottomDetector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PatternDetector for DoubleBottomDetector {
    fn name(&self) -> &'static str {
        "Double Bottom"
    }

    fn detect(
        &self,
        symbol: &str,
        panel: &PricePanel,
    ) -> Result<Option<PatternResult>, ResearchError> {
        if panel.len() < self.min_separation_days * 2 {
            return Ok(None);
        }

        let lows = panel.low();
        let highs = panel.high();

        let (_, min_indices) = find_local_extrema(lows, EXTREMA_ORDER);

        let recent_cutoff = panel.len().saturating_sub(ANALYSIS_WINDOW);
        let min_indices: Vec<usize> =
            min_indices.into_iter().filter(|i| *i >= recent_cutoff).collect();
        if min_indices.len() < 2 {
            return Ok(None);
        }

        for i in 0..min_indices.len() - 1 {
            for j in i + 1..min_indices.len() {
                let first_idx = min_indices[i];
                let second_idx = min_indices[j];

                let separation = second_idx - first_idx;
                if separation < self.min_separation_days
                    || separation > self.max_separation_days
                {
                    continue;
                }

                let first_low = lows[first_idx];
                let second_low = lows[second_idx];
                if percentage_change(first_low, second_low).abs() > self.max_low_diff_pct {
                    continue;
                }

                // The highest point between the lows is the middle of the W
                let middle_peak = highs[first_idx..second_idx]
                    .iter()
                    .copied()
                    .fold(f64::NEG_INFINITY, f64::max);

                let is_undercut = second_low < first_low;

                let mut result = PatternResult::new(
                    PatternType::DoubleBottom,
                    symbol,
                    panel.dates()[panel.len() - 1],
                    if is_undercut { 85.0 } else { 75.0 },
                    true,
                );
                result.meta.insert("first_low".to_string(), first_low);
                result.meta.insert("second_low".to_string(), second_low);
                result.meta.insert("middle_peak".to_string(), middle_peak);
                result.meta.insert(
                    "depth_pct".to_string(),
                    percentage_change(middle_peak, first_low).abs(),
                );
                result
                    .meta
                    .insert("separation_days".to_string(), separation as f64);
                result.meta.insert(
                    "is_undercut".to_string(),
                    if is_undercut { 1.0 } else { 0.0 },
                );
                return Ok(Some(result));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{double_bottom_panel, uptrend_panel};

    #[test]
    fn detects_undercut_double_bottom() {
        let panel = double_bottom_panel(true);
        let result = DoubleBottomDetector::new()
            .detect("AAPL", &panel)
            .unwrap()
            .expect("double bottom should qualify");

        assert_eq!(result.pattern_type, PatternType::DoubleBottom);
        assert!(result.confirmed);
        assert!((result.confidence_score - 85.0).abs() < 1e-9);
        assert_eq!(result.meta["is_undercut"], 1.0);
        let sep = result.meta["separation_days"];
        assert!((10.0..=50.0).contains(&sep));
    }

    #[test]
    fn equal_lows_score_lower() {
        let panel = double_bottom_panel(false);
        let result = DoubleBottomDetector::new()
            .detect("AAPL", &panel)
            .unwrap()
            .expect("double bottom should qualify");
        assert!((result.confidence_score - 75.0).abs() < 1e-9);
        assert_eq!(result.meta["is_undercut"], 0.0);
    }

    #[test]
    fn rejects_plain_trend() {
        let panel = uptrend_panel(120);
        let result = DoubleBottomDetector::new().detect("AAPL", &panel).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn tolerates_short_panels() {
        let panel = uptrend_panel(15);
        let result = DoubleBottomDetector::new().detect("AAPL", &panel).unwrap();
        assert!(result.is_none());
    }
}
