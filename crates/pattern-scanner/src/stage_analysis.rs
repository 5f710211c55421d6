use research_core::{PatternDetector, PatternResult, PatternType, PricePanel, ResearchError};
use technical_analysis::sma;

/// Weinstein stage classifier.
///
/// Stage 1: Basing — price flat, below a flattening MA.
/// Stage 2: Advancing — price above a rising MA (the buy zone).
/// Stage 3: Topping — price above a flattening MA.
/// Stage 4: Declining — price below a falling MA.
///
/// Uses the 150-day (30-week) moving average; only Stage 2 is confirmed.
#[derive(Debug, Clone, Copy)]
pub struct WeinsteinStageAnalyzer {
    pub ma_period: usize,
    pub slope_window: usize,
}

impl Default for WeinsteinStageAnalyzer {
    fn default() -> Self {
        Self {
            ma_period: 150,
            slope_window: 20,
        }
    }
}

impl WeinsteinStageAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PatternDetector for WeinsteinStageAnalyzer {
    fn name(&self) -> &'static str {
        "Weinstein Stage Analysis"
    }

    fn detect(
        &self,
        symbol: &str,
        panel: &PricePanel,
    ) -> Result<Option<PatternResult>, ResearchError> {
        if panel.len() < self.ma_period + self.slope_window {
            return Ok(None);
        }

        let close_col = panel.close();
        let last = panel.len() - 1;
        let close = close_col[last];

        let ma = sma(close_col, self.ma_period);
        let sma_150 = ma[last];
        let past_ma = ma[panel.len() - self.slope_window];
        if !sma_150.is_finite() || !past_ma.is_finite() {
            return Ok(None);
        }

        let ma_change_pct = (sma_150 - past_ma) / past_ma * 100.0;

        let price_above_ma = close > sma_150;
        let ma_rising = ma_change_pct > 0.5;
        let ma_falling = ma_change_pct < -0.5;
        let ma_flat = !ma_rising && !ma_falling;

        let (stage, confidence) = if !price_above_ma && ma_falling {
            (4u8, 70.0)
        } else if !price_above_ma && ma_flat {
            (1, 60.0)
        } else if price_above_ma && ma_rising {
            (2, 85.0)
        } else if price_above_ma && ma_flat {
            (3, 65.0)
        } else {
            // Transitional or unclear
            (0, 40.0)
        };

        let mut result = PatternResult::new(
            PatternType::WeinsteinStage,
            symbol,
            panel.dates()[last],
            confidence,
            stage == 2,
        );
        result.weinstein_stage = Some(stage);
        result.meta.insert("stage".to_string(), stage as f64);
        result.meta.insert("price".to_string(), close);
        result.meta.insert("sma_150".to_string(), sma_150);
        result.meta.insert("ma_slope_pct".to_string(), ma_change_pct);
        Ok(Some(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{downtrend_panel, flat_panel, flat_then_pop_panel, uptrend_panel};

    #[test]
    fn classifies_advancing_uptrend_as_stage_2() {
        let panel = uptrend_panel(300);
        let result = WeinsteinStageAnalyzer::new()
            .detect("AAPL", &panel)
            .unwrap()
            .expect("long panel always classifies");

        assert_eq!(result.weinstein_stage, Some(2));
        assert!(result.confirmed);
        assert!((result.confidence_score - 85.0).abs() < 1e-9);
        assert!(result.meta["ma_slope_pct"] > 0.5);
    }

    #[test]
    fn classifies_decline_as_stage_4() {
        let panel = downtrend_panel(300);
        let result = WeinsteinStageAnalyzer::new()
            .detect("AAPL", &panel)
            .unwrap()
            .unwrap();

        assert_eq!(result.weinstein_stage, Some(4));
        assert!(!result.confirmed);
        assert!((result.confidence_score - 70.0).abs() < 1e-9);
    }

    #[test]
    fn classifies_flat_base_as_stage_1() {
        let panel = flat_panel(300);
        let result = WeinsteinStageAnalyzer::new()
            .detect("AAPL", &panel)
            .unwrap()
            .unwrap();

        // Flat price sits exactly on its MA, which counts as "not above"
        assert_eq!(result.weinstein_stage, Some(1));
        assert!((result.confidence_score - 60.0).abs() < 1e-9);
    }

    #[test]
    fn classifies_pop_above_flat_ma_as_stage_3() {
        let panel = flat_then_pop_panel();
        let result = WeinsteinStageAnalyzer::new()
            .detect("AAPL", &panel)
            .unwrap()
            .unwrap();

        assert_eq!(result.weinstein_stage, Some(3));
        assert!(!result.confirmed);
    }

    #[test]
    fn needs_full_warmup() {
        let panel = uptrend_panel(169);
        let result = WeinsteinStageAnalyzer::new().detect("AAPL", &panel).unwrap();
        assert!(result.is_none());
    }
}
