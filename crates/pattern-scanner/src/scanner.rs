use std::collections::HashMap;

use rayon::prelude::*;
use tracing::warn;

use research_core::{PatternDetector, PatternResult, PricePanel, Signal};

use crate::cup_with_handle::CupWithHandleDetector;
use crate::double_bottom::DoubleBottomDetector;
use crate::high_tight_flag::HighTightFlagDetector;
use crate::stage_analysis::WeinsteinStageAnalyzer;
use crate::trend_template::TrendTemplateDetector;
use crate::vcp::VcpDetector;

/// Default confidence floor for actionable setups.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 70.0;

/// Orchestrates pattern scanning across a universe of symbols.
///
/// Holds a heterogeneous list of detectors and runs them in batch. A
/// failure in one detector never aborts the scan: the error is logged and
/// that detector simply contributes nothing for that symbol.
pub struct PatternScanner {
    detectors: Vec<Box<dyn PatternDetector>>,
}

impl Default for PatternScanner {
    fn default() -> Self {
        Self::new(Self::default_detectors())
    }
}

impl PatternScanner {
    pub fn new(detectors: Vec<Box<dyn PatternDetector>>) -> Self {
        Self { detectors }
    }

    /// All available detectors.
    pub fn default_detectors() -> Vec<Box<dyn PatternDetector>> {
        vec![
            Box::new(TrendTemplateDetector::new()),
            Box::new(VcpDetector::new()),
            Box::new(CupWithHandleDetector::new()),
            Box::new(DoubleBottomDetector::new()),
            Box::new(HighTightFlagDetector::new()),
            Box::new(WeinsteinStageAnalyzer::new()),
        ]
    }

    /// Run every detector against one symbol.
    pub fn scan_symbol(&self, symbol: &str, panel: &PricePanel) -> Vec<PatternResult> {
        let mut results = Vec::new();
        for detector in &self.detectors {
            match detector.detect(symbol, panel) {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(err) => {
                    warn!(detector = detector.name(), symbol, error = %err, "detector failed, skipping");
                }
            }
        }
        results
    }

    /// Scan the whole universe. Per-symbol scans are independent, so they
    /// fan out with rayon; symbols with no detections are omitted.
    pub fn scan_universe(
        &self,
        panels: &HashMap<String, PricePanel>,
    ) -> HashMap<String, Vec<PatternResult>> {
        panels
            .par_iter()
            .filter_map(|(symbol, panel)| {
                let patterns = self.scan_symbol(symbol, panel);
                if patterns.is_empty() {
                    None
                } else {
                    Some((symbol.clone(), patterns))
                }
            })
            .collect()
    }

    /// Setups worth acting on: confidence at or above the floor AND either
    /// confirmed or passing the trend template. Sorted by confidence
    /// descending with a stable symbol tie-break.
    pub fn get_actionable_setups(
        &self,
        panels: &HashMap<String, PricePanel>,
        min_confidence: f64,
    ) -> Vec<PatternResult> {
        let mut actionable: Vec<PatternResult> = self
            .scan_universe(panels)
            .into_values()
            .flatten()
            .filter(|p| {
                p.confidence_score >= min_confidence
                    && (p.confirmed || p.meets_trend_template)
            })
            .collect();
        actionable.sort_by(|a, b| {
            b.confidence_score
                .total_cmp(&a.confidence_score)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        actionable
    }
}

/// Group actionable setups into the engine's signal map, keyed by
/// `YYYY-MM-DD` detection date.
pub fn setups_to_signals(setups: &[PatternResult]) -> HashMap<String, Vec<Signal>> {
    let mut signals: HashMap<String, Vec<Signal>> = HashMap::new();
    for setup in setups {
        signals
            .entry(setup.detection_date.format("%Y-%m-%d").to_string())
            .or_default()
            .push(Signal {
                date: setup.detection_date,
                symbol: setup.symbol.clone(),
                confidence: setup.confidence_score,
            });
    }
    signals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{double_bottom_panel, trend_template_panel, uptrend_panel};
    use research_core::{PatternType, ResearchError};

    #[test]
    fn scan_symbol_is_pure() {
        let scanner = PatternScanner::default();
        let panel = double_bottom_panel(true);

        let first = scanner.scan_symbol("AAPL", &panel);
        let second = scanner.scan_symbol("AAPL", &panel);

        assert!(!first.is_empty());
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn empty_panel_yields_nothing() {
        let scanner = PatternScanner::default();
        let panel = PricePanel::default();
        assert!(scanner.scan_symbol("AAPL", &panel).is_empty());
    }

    #[test]
    fn failing_detector_does_not_abort_scan() {
        struct FailingDetector;
        impl PatternDetector for FailingDetector {
            fn name(&self) -> &'static str {
                "Failing"
            }
            fn detect(
                &self,
                _symbol: &str,
                _panel: &PricePanel,
            ) -> Result<Option<PatternResult>, ResearchError> {
                Err(ResearchError::Detector("boom".to_string()))
            }
        }

        let mut detectors = vec![Box::new(FailingDetector) as Box<dyn PatternDetector>];
        detectors.extend(PatternScanner::default_detectors());
        let scanner = PatternScanner::new(detectors);

        let results = scanner.scan_symbol("AAPL", &double_bottom_panel(true));
        assert!(results
            .iter()
            .any(|r| r.pattern_type == PatternType::DoubleBottom));
    }

    #[test]
    fn actionable_setups_are_gated_and_sorted() {
        let scanner = PatternScanner::default();
        let mut panels = HashMap::new();
        panels.insert("BBB".to_string(), double_bottom_panel(true));
        panels.insert("AAA".to_string(), double_bottom_panel(true));
        panels.insert("CCC".to_string(), trend_template_panel(false));

        let setups = scanner.get_actionable_setups(&panels, DEFAULT_MIN_CONFIDENCE);

        assert!(!setups.is_empty());
        // Confidence descending, ties broken by symbol
        for pair in setups.windows(2) {
            assert!(
                pair[0].confidence_score > pair[1].confidence_score
                    || (pair[0].confidence_score == pair[1].confidence_score
                        && pair[0].symbol <= pair[1].symbol)
            );
        }
        // The identical AAA/BBB panels tie at the top and sort by symbol
        assert_eq!(setups[0].symbol, "AAA");
        assert_eq!(setups[1].symbol, "BBB");
        // Every survivor passed the gate
        for setup in &setups {
            assert!(setup.confidence_score >= DEFAULT_MIN_CONFIDENCE);
            assert!(setup.confirmed || setup.meets_trend_template);
        }

        // A higher floor trims the tail
        let strict = scanner.get_actionable_setups(&panels, 80.0);
        assert!(strict.len() < setups.len());
        assert!(strict.iter().all(|s| s.confidence_score >= 80.0));
    }

    #[test]
    fn setups_group_into_signal_map() {
        let scanner = PatternScanner::default();
        let mut panels = HashMap::new();
        panels.insert("AAA".to_string(), double_bottom_panel(true));
        panels.insert("BBB".to_string(), uptrend_panel(300));

        let setups = scanner.get_actionable_setups(&panels, DEFAULT_MIN_CONFIDENCE);
        let signals = setups_to_signals(&setups);

        let total: usize = signals.values().map(Vec::len).sum();
        assert_eq!(total, setups.len());
        for (key, day_signals) in &signals {
            for signal in day_signals {
                assert_eq!(&signal.date.format("%Y-%m-%d").to_string(), key);
            }
        }
    }
}
