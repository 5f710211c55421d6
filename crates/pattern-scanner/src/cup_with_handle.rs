use research_core::{PatternDetector, PatternResult, PatternType, PricePanel, ResearchError};
use technical_analysis::{find_local_extrema, percentage_change, EXTREMA_ORDER};

/// Right peak must be within this percentage of the left peak.
const MAX_PEAK_DIFF_PCT: f64 = 10.0;

/// Bars after the right peak before a handle can be judged.
const MIN_HANDLE_BARS: usize = 5;

/// Cup & Handle detector.
///
/// A cup is two peaks of similar height, 35 to 325 bars apart, with a
/// 12-35% deep trough between them. With fewer than five bars after the
/// right peak the cup is still forming (unconfirmed, lower confidence);
/// otherwise the handle must hold above the cup midpoint.
#[derive(Debug, Clone, Copy)]
pub struct CupWithHandleDetector {
    pub min_cup_depth_pct: f64,
    pub max_cup_depth_pct: f64,
    pub min_cup_length_days: usize,
    pub max_cup_length_days: usize,
}

impl Default for CupWithHandleDetector {
    fn default() -> Self {
        Self {
            min_cup_depth_pct: 12.0,
            max_cup_depth_pct: 35.0,
            min_cup_length_days: 35,
            max_cup_length_days: 325,
        }
    }
}

impl CupWithHandleDetector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PatternDetector for CupWithHandleDetector {
    fn name(&self) -> &'static str {
        "Cup & Handle"
    }

    fn detect(
        &self,
        symbol: &str,
        panel: &PricePanel,
    ) -> Result<Option<PatternResult>, ResearchError> {
        if panel.len() < self.min_cup_length_days {
            return Ok(None);
        }

        let highs = panel.high();
        let lows = panel.low();

        let (max_indices, min_indices) = find_local_extrema(highs, EXTREMA_ORDER);

        let recent_cutoff = panel.len().saturating_sub(self.max_cup_length_days);
        let max_indices: Vec<usize> =
            max_indices.into_iter().filter(|i| *i >= recent_cutoff).collect();
        let min_indices: Vec<usize> =
            min_indices.into_iter().filter(|i| *i >= recent_cutoff).collect();

        if max_indices.len() < 2 || min_indices.is_empty() {
            return Ok(None);
        }

        // Rank peaks by height and try pairs, tallest first
        let mut peaks: Vec<(usize, f64)> =
            max_indices.iter().map(|i| (*i, highs[*i])).collect();
        peaks.sort_by(|a, b| b.1.total_cmp(&a.1));

        for i in 0..peaks.len() - 1 {
            for j in i + 1..peaks.len() {
                let (mut left_idx, mut left_val) = peaks[i];
                let (mut right_idx, mut right_val) = peaks[j];
                if left_idx > right_idx {
                    std::mem::swap(&mut left_idx, &mut right_idx);
                    std::mem::swap(&mut left_val, &mut right_val);
                }

                let cup_length = right_idx - left_idx;
                if cup_length < self.min_cup_length_days {
                    continue;
                }

                // Cup bottom: lowest local minimum between the peaks
                let bottom = min_indices
                    .iter()
                    .copied()
                    .filter(|m| *m > left_idx && *m < right_idx)
                    .min_by(|a, b| lows[*a].total_cmp(&lows[*b]));
                let bottom_idx = match bottom {
                    Some(idx) => idx,
                    None => continue,
                };
                let bottom_val = lows[bottom_idx];

                let cup_depth_pct = percentage_change(left_val, bottom_val).abs();
                if cup_depth_pct < self.min_cup_depth_pct
                    || cup_depth_pct > self.max_cup_depth_pct
                {
                    continue;
                }

                let peak_diff_pct = percentage_change(left_val, right_val).abs();
                if peak_diff_pct > MAX_PEAK_DIFF_PCT {
                    continue;
                }

                let handle_bars = panel.len() - right_idx;
                if handle_bars < MIN_HANDLE_BARS {
                    // No handle yet, but the cup is in place
                    let mut result = PatternResult::new(
                        PatternType::CupForming,
                        symbol,
                        panel.dates()[panel.len() - 1],
                        60.0,
                        false,
                    );
                    result.meta.insert("cup_depth_pct".to_string(), cup_depth_pct);
                    result
                        .meta
                        .insert("cup_length_days".to_string(), cup_length as f64);
                    result.meta.insert("left_peak".to_string(), left_val);
                    result.meta.insert("right_peak".to_string(), right_val);
                    return Ok(Some(result));
                }

                let handle_low = lows[right_idx..]
                    .iter()
                    .copied()
                    .fold(f64::INFINITY, f64::min);
                let cup_midpoint = (left_val + bottom_val) / 2.0;
                if handle_low < cup_midpoint {
                    // Handle too deep
                    continue;
                }

                let mut result = PatternResult::new(
                    PatternType::CupAndHandle,
                    symbol,
                    panel.dates()[panel.len() - 1],
                    80.0,
                    true,
                );
                result.meta.insert("cup_depth_pct".to_string(), cup_depth_pct);
                result
                    .meta
                    .insert("cup_length_days".to_string(), cup_length as f64);
                result.meta.insert(
                    "handle_depth_pct".to_string(),
                    percentage_change(right_val, handle_low).abs(),
                );
                return Ok(Some(result));
            }
        }

        Ok(None)
    }
}
