use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use research_core::PricePanel;

use crate::indicators::{
    atr, ema, macd, mansfield_rs, rsi, sma, volume_avg, week_52_high, week_52_low, ATR_PERIOD,
    VOLUME_AVG_PERIOD, WEEK_52_WINDOW,
};

/// The standard derived-column bundle for one symbol.
///
/// Every column is index-aligned with the source panel, with NaN filling
/// warm-up regions. Consumers must treat NaN as "absent", never as zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub sma_50: Vec<f64>,
    pub sma_150: Vec<f64>,
    pub sma_200: Vec<f64>,
    pub ema_50: Vec<f64>,
    pub ema_150: Vec<f64>,
    pub ema_200: Vec<f64>,
    pub rsi_14: Vec<f64>,
    pub macd: Vec<f64>,
    pub macd_signal: Vec<f64>,
    pub macd_histogram: Vec<f64>,
    pub atr_14: Vec<f64>,
    pub week_52_high: Vec<f64>,
    pub week_52_low: Vec<f64>,
    pub volume_avg_50: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mansfield_rs: Option<Vec<f64>>,
}

impl IndicatorSet {
    /// Compute the full bundle for a panel. The benchmark panel is only
    /// needed for Mansfield RS; without it that column is left unset.
    pub fn compute(panel: &PricePanel, benchmark: Option<&PricePanel>) -> Self {
        let close = panel.close();
        let macd_result = macd(close, 12, 26, 9);

        Self {
            sma_50: sma(close, 50),
            sma_150: sma(close, 150),
            sma_200: sma(close, 200),
            ema_50: ema(close, 50),
            ema_150: ema(close, 150),
            ema_200: ema(close, 200),
            rsi_14: rsi(close, 14),
            macd: macd_result.macd_line,
            macd_signal: macd_result.signal_line,
            macd_histogram: macd_result.histogram,
            atr_14: atr(panel.high(), panel.low(), close, ATR_PERIOD),
            week_52_high: week_52_high(panel.high()),
            week_52_low: week_52_low(panel.low()),
            volume_avg_50: volume_avg(panel.volume(), VOLUME_AVG_PERIOD),
            mansfield_rs: benchmark.map(|b| mansfield_rs(panel, b, WEEK_52_WINDOW)),
        }
    }
}

/// Compute indicator bundles for a whole universe in parallel. Per-symbol
/// computation is independent, so this fans out with rayon.
pub fn compute_universe(
    panels: &HashMap<String, PricePanel>,
    benchmark: Option<&PricePanel>,
) -> HashMap<String, IndicatorSet> {
    panels
        .par_iter()
        .map(|(symbol, panel)| (symbol.clone(), IndicatorSet::compute(panel, benchmark)))
        .collect()
}

/// Attach the Mansfield RS derived column to every panel in the universe,
/// so detectors can read it through the uniform panel reference.
pub fn attach_mansfield_rs(panels: &mut HashMap<String, PricePanel>, benchmark: &PricePanel) {
    panels.par_iter_mut().for_each(|(_, panel)| {
        let column = mansfield_rs(panel, benchmark, WEEK_52_WINDOW);
        // Length is ours by construction, so this cannot fail.
        let _ = panel.set_mansfield_rs(column);
    });
}
