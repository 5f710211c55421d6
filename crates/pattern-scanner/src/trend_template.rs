use research_core::{PatternDetector, PatternResult, PatternType, PricePanel, ResearchError};
use technical_analysis::{sma, week_52_high, week_52_low};

/// Slope lookback for the 200-day moving average (about one month).
const MA_SLOPE_WINDOW: usize = 20;

/// Mark Minervini's Trend Template.
///
/// All eight criteria must hold on the last bar:
/// 1. Price above both the 150-day and 200-day moving averages.
/// 2. The 150-day MA above the 200-day MA.
/// 3. The 200-day MA trending up over the last month.
/// 4. The 50-day MA above both the 150-day and 200-day MAs.
/// 5. Price above the 50-day MA.
/// 6. Price at least 30% above its 52-week low.
/// 7. Price within 25% of its 52-week high.
/// 8. Relative strength vs the benchmark positive, when available.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendTemplateDetector;

impl TrendTemplateDetector {
    pub fn new() -> Self {
        Self
    }
}

impl PatternDetector for TrendTemplateDetector {
    fn name(&self) -> &'static str {
        "Trend Template"
    }

    fn detect(
        &self,
        symbol: &str,
        panel: &PricePanel,
    ) -> Result<Option<PatternResult>, ResearchError> {
        if panel.is_empty() {
            return Ok(None);
        }

        let close_col = panel.close();
        let last = panel.len() - 1;
        let close = close_col[last];

        let sma_50 = sma(close_col, 50);
        let sma_150 = sma(close_col, 150);
        let sma_200_col = sma(close_col, 200);
        let high_52 = week_52_high(panel.high());
        let low_52 = week_52_low(panel.low());

        let (sma_50, sma_150, sma_200) = (sma_50[last], sma_150[last], sma_200_col[last]);
        let (week_52_high, week_52_low) = (high_52[last], low_52[last]);
        // Crucial inputs still in warm-up: cannot evaluate
        if !(sma_50.is_finite()
            && sma_150.is_finite()
            && sma_200.is_finite()
            && week_52_high.is_finite()
            && week_52_low.is_finite())
        {
            return Ok(None);
        }

        let c1 = close > sma_150 && close > sma_200;
        let c2 = sma_150 > sma_200;

        // 200-day MA trending up for at least a month
        let mut c3 = false;
        if panel.len() >= MA_SLOPE_WINDOW {
            let past_sma_200 = sma_200_col[panel.len() - MA_SLOPE_WINDOW];
            if past_sma_200.is_finite() {
                c3 = sma_200 > past_sma_200;
            }
        }

        let c4 = sma_50 > sma_150 && sma_50 > sma_200;
        let c5 = close > sma_50;
        let c6 = close >= 1.30 * week_52_low;
        let c7 = close >= 0.75 * week_52_high;

        // Relative strength, when the derived column is attached
        let rs = panel
            .mansfield_rs()
            .and_then(|col| col.last().copied())
            .filter(|v| v.is_finite());
        let c8 = rs.map_or(true, |v| v > 0.0);

        if !(c1 && c2 && c3 && c4 && c5 && c6 && c7 && c8) {
            return Ok(None);
        }

        let mut result = PatternResult::new(
            PatternType::TrendTemplate,
            symbol,
            panel.dates()[last],
            if rs.is_some() { 90.0 } else { 70.0 },
            true,
        );
        result.meets_trend_template = true;
        result.meta.insert("sma_50".to_string(), sma_50);
        result.meta.insert("sma_200".to_string(), sma_200);
        result.meta.insert(
            "distance_from_high_pct".to_string(),
            (week_52_high - close) / week_52_high * 100.0,
        );
        result.meta.insert(
            "distance_from_low_pct".to_string(),
            (close - week_52_low) / week_52_low * 100.0,
        );
        Ok(Some(result))
    }
}
