/// Default spacing for local-extrema detection.
pub const EXTREMA_ORDER: usize = 5;

/// Find local maxima and minima in a series.
///
/// Index `i` is a local max iff `series[i] > series[i-k]` and
/// `series[i] > series[i+k]` for all `k in 1..=order`; symmetric for
/// minima. Indices within `order` of either edge never qualify.
pub fn find_local_extrema(series: &[f64], order: usize) -> (Vec<usize>, Vec<usize>) {
    let mut maxima = Vec::new();
    let mut minima = Vec::new();
    let n = series.len();
    if order == 0 || n < 2 * order + 1 {
        return (maxima, minima);
    }

    for i in order..n - order {
        let mut is_max = true;
        let mut is_min = true;
        for k in 1..=order {
            if !(series[i] > series[i - k] && series[i] > series[i + k]) {
                is_max = false;
            }
            if !(series[i] < series[i - k] && series[i] < series[i + k]) {
                is_min = false;
            }
            if !is_max && !is_min {
                break;
            }
        }
        if is_max {
            maxima.push(i);
        }
        if is_min {
            minima.push(i);
        }
    }

    (maxima, minima)
}

/// Percentage change between two prices; 0 when the start price is 0.
pub fn percentage_change(start_price: f64, end_price: f64) -> f64 {
    if start_price == 0.0 {
        return 0.0;
    }
    (end_price - start_price) / start_price * 100.0
}

/// True when the recent average volume is significantly below the
/// preceding window's average (`current < past * threshold_ratio`).
pub fn is_volume_drying_up(volume: &[f64], window: usize, threshold_ratio: f64) -> bool {
    if window == 0 || volume.len() < window * 2 {
        return false;
    }
    let n = volume.len();
    let current: f64 = volume[n - window..].iter().sum::<f64>() / window as f64;
    let past: f64 = volume[n - 2 * window..n - window].iter().sum::<f64>() / window as f64;
    current < past * threshold_ratio
}
