use research_core::{PatternDetector, PatternResult, PatternType, PricePanel, ResearchError};
use technical_analysis::percentage_change;

/// Trading days per week, for the pole-length bounds.
const DAYS_PER_WEEK: usize = 5;

/// Minimum bars in the flag before it can be judged.
const MIN_FLAG_BARS: usize = 10;

/// High-Tight Flag detector.
///
/// The rarest setup in the book: a 100%+ pole in 4-8 weeks followed by a
/// tight consolidation of at most 25%. The search slides the pole end
/// between 10 and 35 bars before today.
#[derive(Debug, Clone, Copy)]
pub struct HighTightFlagDetector {
    pub min_prior_gain_pct: f64,
    pub min_prior_gain_weeks: usize,
    pub max_prior_gain_weeks: usize,
    pub max_consolidation_pct: f64,
}

impl Default for HighTightFlagDetector {
    fn default() -> Self {
        Self {
            min_prior_gain_pct: 100.0,
            min_prior_gain_weeks: 4,
            max_prior_gain_weeks: 8,
            max_consolidation_pct: 25.0,
        }
    }
}

impl HighTightFlagDetector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PatternDetector for HighTightFlagDetector {
    fn name(&self) -> &'static str {
        "High-Tight Flag"
    }

    fn detect(
        &self,
        symbol: &str,
        panel: &PricePanel,
    ) -> Result<Option<PatternResult>, ResearchError> {
        let min_days = self.min_prior_gain_weeks * DAYS_PER_WEEK;
        let max_days = self.max_prior_gain_weeks * DAYS_PER_WEEK;
        if panel.len() < max_days + 25 {
            return Ok(None);
        }

        let closes = panel.close();
        let highs = panel.high();
        let lows = panel.low();

        for lookback in (min_days..=max_days).step_by(5) {
            for pole_end_offset in (10..35).step_by(5) {
                if pole_end_offset >= panel.len() {
                    continue;
                }
                let recent_high_idx = panel.len() - pole_end_offset;
                if recent_high_idx < lookback {
                    continue;
                }
                let pole_start_idx = recent_high_idx - lookback;

                let pole_start_price = closes[pole_start_idx];
                if pole_start_price <= 0.0 {
                    continue;
                }

                // Highest high over the candidate pole
                let (pole_end_pos, pole_end_price) = highs
                    [pole_start_idx..=recent_high_idx]
                    .iter()
                    .copied()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(offset, value)| (pole_start_idx + offset, value))
                    .unwrap_or((pole_start_idx, highs[pole_start_idx]));

                let gain_pct = percentage_change(pole_start_price, pole_end_price);
                if gain_pct < self.min_prior_gain_pct {
                    continue;
                }

                // The flag runs from the pole top to today and must stay tight
                let flag_bars = panel.len() - pole_end_pos;
                if flag_bars < MIN_FLAG_BARS {
                    continue;
                }
                let flag_high = highs[pole_end_pos..]
                    .iter()
                    .copied()
                    .fold(f64::NEG_INFINITY, f64::max);
                let flag_low = lows[pole_end_pos..]
                    .iter()
                    .copied()
                    .fold(f64::INFINITY, f64::min);
                let consolidation_pct = percentage_change(flag_high, flag_low).abs();
                if consolidation_pct > self.max_consolidation_pct {
                    continue;
                }

                let mut result = PatternResult::new(
                    PatternType::HighTightFlag,
                    symbol,
                    panel.dates()[panel.len() - 1],
                    90.0,
                    true,
                );
                result.meta.insert("prior_gain_pct".to_string(), gain_pct);
                result
                    .meta
                    .insert("consolidation_pct".to_string(), consolidation_pct);
                result
                    .meta
                    .insert("pole_length_days".to_string(), lookback as f64);
                result
                    .meta
                    .insert("flag_length_days".to_string(), flag_bars as f64);
                return Ok(Some(result));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{high_tight_flag_panel, uptrend_panel};

    #[test]
    fn detects_doubling_pole_with_tight_flag() {
        let panel = high_tight_flag_panel();
        let result = HighTightFlagDetector::new()
            .detect("AAPL", &panel)
            .unwrap()
            .expect("flag should qualify");

        assert_eq!(result.pattern_type, PatternType::HighTightFlag);
        assert!(result.confirmed);
        assert!((result.confidence_score - 90.0).abs() < 1e-9);
        assert!(result.meta["prior_gain_pct"] >= 100.0);
        assert!(result.meta["consolidation_pct"] <= 25.0);
    }

    #[test]
    fn rejects_ordinary_uptrend() {
        // A steady climb never doubles inside an 8-week pole
        let panel = uptrend_panel(120);
        let result = HighTightFlagDetector::new().detect("AAPL", &panel).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn tolerates_short_panels() {
        let panel = uptrend_panel(50);
        let result = HighTightFlagDetector::new().detect("AAPL", &panel).unwrap();
        assert!(result.is_none());
    }
}
