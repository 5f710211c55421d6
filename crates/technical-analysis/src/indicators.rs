use research_core::PricePanel;

/// Default ATR lookback used by the trailing-stop logic.
pub const ATR_PERIOD: usize = 14;

/// Trading days in a 52-week window.
pub const WEEK_52_WINDOW: usize = 252;

/// Default rolling-volume lookback.
pub const VOLUME_AVG_PERIOD: usize = 50;

/// Simple Moving Average.
///
/// Output has the same length as the input; positions before the warm-up
/// (`period - 1` bars) are NaN.
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; data.len()];
    if period == 0 || data.len() < period {
        return result;
    }
    for i in period - 1..data.len() {
        let sum: f64 = data[i + 1 - period..=i].iter().sum();
        result[i] = sum / period as f64;
    }
    result
}

/// Exponential Moving Average, seeded with the first observation:
/// `y[0] = x[0]`, `y[i] = a*x[i] + (1-a)*y[i-1]` with `a = 2/(period+1)`.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.is_empty() {
        return vec![f64::NAN; data.len()];
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(data.len());
    result.push(data[0]);
    for i in 1..data.len() {
        let prev = result[i - 1];
        result.push(alpha * data[i] + (1.0 - alpha) * prev);
    }
    result
}

/// Relative Strength Index with Wilder smoothing. Undefined (NaN) for the
/// first `period` bars; bounded to [0, 100] thereafter.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; data.len()];
    if period == 0 || data.len() < period + 1 {
        return result;
    }

    let mut gains = Vec::with_capacity(data.len() - 1);
    let mut losses = Vec::with_capacity(data.len() - 1);
    for i in 1..data.len() {
        let change = data[i] - data[i - 1];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(change.abs());
        }
    }

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;
    result[period] = rsi_from_averages(avg_gain, avg_loss);

    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        result[i + 1] = rsi_from_averages(avg_gain, avg_loss);
    }

    result
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// MACD (Moving Average Convergence Divergence).
pub struct MacdResult {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// MACD line = EMA(fast) - EMA(slow), signal = EMA(macd, signal_period),
/// histogram = macd - signal. All columns are input-length.
pub fn macd(
    data: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> MacdResult {
    if fast_period == 0 || slow_period == 0 || signal_period == 0 || slow_period < fast_period {
        let nan = vec![f64::NAN; data.len()];
        return MacdResult {
            macd_line: nan.clone(),
            signal_line: nan.clone(),
            histogram: nan,
        };
    }

    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);
    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema(&macd_line, signal_period);
    let histogram: Vec<f64> = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| m - s)
        .collect();

    MacdResult {
        macd_line,
        signal_line,
        histogram,
    }
}

/// Average True Range: SMA of the true range, where
/// TR = max(H-L, |H-C_prev|, |L-C_prev|) and TR[0] = H[0]-L[0].
pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    let n = high.len().min(low.len()).min(close.len());
    if n == 0 {
        return vec![];
    }

    let mut true_ranges = Vec::with_capacity(n);
    true_ranges.push(high[0] - low[0]);
    for i in 1..n {
        let high_low = high[i] - low[i];
        let high_close = (high[i] - close[i - 1]).abs();
        let low_close = (low[i] - close[i - 1]).abs();
        true_ranges.push(high_low.max(high_close).max(low_close));
    }

    sma(&true_ranges, period)
}

/// Rolling maximum with partial leading windows (`min_periods = 1`).
pub fn rolling_max(data: &[f64], window: usize) -> Vec<f64> {
    let mut result = Vec::with_capacity(data.len());
    for i in 0..data.len() {
        let start = i.saturating_sub(window.saturating_sub(1));
        let max = data[start..=i].iter().copied().fold(f64::NAN, f64::max);
        result.push(max);
    }
    result
}

/// Rolling minimum with partial leading windows (`min_periods = 1`).
pub fn rolling_min(data: &[f64], window: usize) -> Vec<f64> {
    let mut result = Vec::with_capacity(data.len());
    for i in 0..data.len() {
        let start = i.saturating_sub(window.saturating_sub(1));
        let min = data[start..=i].iter().copied().fold(f64::NAN, f64::min);
        result.push(min);
    }
    result
}

/// 52-week rolling high of the high column.
pub fn week_52_high(high: &[f64]) -> Vec<f64> {
    rolling_max(high, WEEK_52_WINDOW)
}

/// 52-week rolling low of the low column.
pub fn week_52_low(low: &[f64]) -> Vec<f64> {
    rolling_min(low, WEEK_52_WINDOW)
}

/// Rolling average volume (SMA of the volume column).
pub fn volume_avg(volume: &[f64], period: usize) -> Vec<f64> {
    sma(volume, period)
}

/// Mansfield Relative Strength of a symbol against a benchmark.
///
/// On each date both panels share: RP = symbol close / benchmark close,
/// RS = (RP / SMA_252(RP) - 1) * 10. The result is aligned to the symbol
/// panel; dates absent from the benchmark and the SMA warm-up stay NaN.
pub fn mansfield_rs(symbol: &PricePanel, benchmark: &PricePanel, period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; symbol.len()];

    let mut symbol_pos = Vec::new();
    let mut rp = Vec::new();
    for (i, date) in symbol.dates().iter().enumerate() {
        if let Some(j) = benchmark.index_of(*date) {
            let bench_close = benchmark.close()[j];
            symbol_pos.push(i);
            if bench_close > 0.0 {
                rp.push(symbol.close()[i] / bench_close);
            } else {
                rp.push(f64::NAN);
            }
        }
    }
    if rp.is_empty() {
        return out;
    }

    let sma_rp = sma(&rp, period);
    for (k, &i) in symbol_pos.iter().enumerate() {
        let base = sma_rp[k];
        if base.is_finite() && base != 0.0 {
            out[i] = (rp[k] / base - 1.0) * 10.0;
        }
    }
    out
}
