use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A dated OHLCV record. Prices are raw (unadjusted); `adj_close` carries
/// the split/dividend-adjusted close for indicators that compute returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub adj_close: Option<f64>,
}

/// A dated entry signal consumed by the backtest engine. The engine is
/// agnostic to which detector produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub date: NaiveDate,
    pub symbol: String,
    pub confidence: f64,
}

/// Tag identifying which detector produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternType {
    TrendTemplate,
    Vcp,
    CupForming,
    CupAndHandle,
    DoubleBottom,
    HighTightFlag,
    WeinsteinStage,
}

/// Standardized result from a pattern detection algorithm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternResult {
    pub pattern_type: PatternType,
    pub symbol: String,
    pub detection_date: NaiveDate,
    /// 0.0 to 100.0
    pub confidence_score: f64,
    pub confirmed: bool,
    #[serde(default)]
    pub meets_trend_template: bool,
    /// Weinstein stage 0-4, set only by the stage analyzer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weinstein_stage: Option<u8>,
    /// Pattern-specific numeric fields.
    #[serde(default)]
    pub meta: BTreeMap<String, f64>,
}

impl PatternResult {
    pub fn new(
        pattern_type: PatternType,
        symbol: &str,
        detection_date: NaiveDate,
        confidence_score: f64,
        confirmed: bool,
    ) -> Self {
        Self {
            pattern_type,
            symbol: symbol.to_string(),
            detection_date,
            confidence_score,
            confirmed,
            meets_trend_template: false,
            weinstein_stage: None,
            meta: BTreeMap::new(),
        }
    }
}
