use research_core::{PatternDetector, PatternResult, PatternType, PricePanel, ResearchError};
use technical_analysis::{
    find_local_extrema, is_volume_drying_up, percentage_change, EXTREMA_ORDER,
};

/// Analysis window: the pattern must complete within the last year.
const ANALYSIS_WINDOW: usize = 250;

/// A later contraction may exceed the previous one by at most this factor.
const DEPTH_TOLERANCE: f64 = 1.2;

/// The final contraction must be tighter than this depth.
const MAX_LAST_DEPTH_PCT: f64 = 15.0;

/// Volatility Contraction Pattern detector.
///
/// Looks for a base starting at the dominant prior high, followed by a
/// series of pullbacks whose depths shrink, the last one tight. Volume
/// drying up on the right side of the base raises confidence. A VCP is a
/// setup, not a trigger, so results are never `confirmed`.
#[derive(Debug, Clone, Copy)]
pub struct VcpDetector {
    pub min_contractions: usize,
    pub max_contractions: usize,
}

impl Default for VcpDetector {
    fn default() -> Self {
        Self {
            min_contractions: 2,
            max_contractions: 5,
        }
    }
}

impl VcpDetector {
    pub fn new() -> Self {
        Self::default()
    }
}

struct Contraction {
    depth_pct: f64,
}

impl PatternDetector for VcpDetector {
    fn name(&self) -> &'static str {
        "VCP"
    }

    fn detect(
        &self,
        symbol: &str,
        panel: &PricePanel,
    ) -> Result<Option<PatternResult>, ResearchError> {
        if panel.len() < 50 {
            return Ok(None);
        }

        let highs = panel.high();
        let lows = panel.low();

        let (max_indices, min_indices) = find_local_extrema(highs, EXTREMA_ORDER);

        let recent_cutoff = panel.len().saturating_sub(ANALYSIS_WINDOW);
        let max_indices: Vec<usize> =
            max_indices.into_iter().filter(|i| *i >= recent_cutoff).collect();
        let min_indices: Vec<usize> =
            min_indices.into_iter().filter(|i| *i >= recent_cutoff).collect();

        if max_indices.len() < 2 {
            return Ok(None);
        }

        // The dominant high in the window marks the left side of the base
        let base_start_pos = max_indices
            .iter()
            .copied()
            .max_by(|a, b| highs[*a].total_cmp(&highs[*b]))
            .unwrap_or(max_indices[0]);

        let relevant_max: Vec<usize> =
            max_indices.iter().copied().filter(|i| *i >= base_start_pos).collect();
        let relevant_min: Vec<usize> =
            min_indices.iter().copied().filter(|i| *i > base_start_pos).collect();
        if relevant_max.len() < 2 || relevant_min.is_empty() {
            return Ok(None);
        }

        // Each (high, next high) pair with an intervening low is one
        // contraction; its depth is measured high-to-deepest-low.
        let mut contractions: Vec<Contraction> = Vec::new();
        for pair in relevant_max.windows(2) {
            let (h1, h2) = (pair[0], pair[1]);
            let deepest = relevant_min
                .iter()
                .copied()
                .filter(|m| *m > h1 && *m < h2)
                .min_by(|a, b| lows[*a].total_cmp(&lows[*b]));
            if let Some(low_pos) = deepest {
                contractions.push(Contraction {
                    depth_pct: percentage_change(highs[h1], lows[low_pos]).abs(),
                });
            }
        }

        if contractions.len() < self.min_contractions
            || contractions.len() > self.max_contractions
        {
            return Ok(None);
        }

        // Depths must shrink, within tolerance
        for pair in contractions.windows(2) {
            if pair[1].depth_pct > pair[0].depth_pct * DEPTH_TOLERANCE {
                return Ok(None);
            }
        }

        let last_depth = contractions.last().map(|c| c.depth_pct).unwrap_or(f64::MAX);
        if last_depth >= MAX_LAST_DEPTH_PCT {
            return Ok(None);
        }

        let volume_dry = is_volume_drying_up(panel.volume(), 20, 0.8);

        let mut result = PatternResult::new(
            PatternType::Vcp,
            symbol,
            panel.dates()[panel.len() - 1],
            if volume_dry { 85.0 } else { 70.0 },
            false,
        );
        result
            .meta
            .insert("contractions".to_string(), contractions.len() as f64);
        result.meta.insert("last_depth_pct".to_string(), last_depth);
        result.meta.insert(
            "volume_dry_up".to_string(),
            if volume_dry { 1.0 } else { 0.0 },
        );
        Ok(Some(result))
    }
}
