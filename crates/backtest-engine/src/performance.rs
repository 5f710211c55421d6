use statrs::statistics::Statistics;

use research_core::Trade;

use crate::models::PerformanceMetrics;

/// Trading days in a calendar year.
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Calculates performance metrics from backtest results.
///
/// Covers total/annualized return and CAGR, Sharpe and Sortino ratios,
/// max drawdown, win rate and profit factor. Standard deviations are
/// sample deviations (n-1 denominator).
#[derive(Debug, Clone)]
pub struct PerformanceCalculator {
    risk_free_rate: f64,
}

impl Default for PerformanceCalculator {
    fn default() -> Self {
        Self::new(0.04)
    }
}

impl PerformanceCalculator {
    /// `risk_free_rate` is annual (0.04 = 4%).
    pub fn new(risk_free_rate: f64) -> Self {
        Self { risk_free_rate }
    }

    pub fn calculate_all_metrics(
        &self,
        trades: &[Trade],
        equity_curve: &[f64],
        initial_capital: f64,
    ) -> PerformanceMetrics {
        let (final_value, total_return, days) = if equity_curve.is_empty() {
            (initial_capital, 0.0, 0usize)
        } else {
            let final_value = equity_curve[equity_curve.len() - 1];
            (
                final_value,
                (final_value - initial_capital) / initial_capital,
                equity_curve.len(),
            )
        };

        let returns = Self::daily_returns(equity_curve);
        let winning_trades = trades.iter().filter(|t| t.is_winner()).count();

        PerformanceMetrics {
            total_return,
            annualized_return: self.annualized_return(total_return, days),
            cagr: self.cagr(initial_capital, final_value, days),
            sharpe_ratio: self.sharpe_ratio(&returns),
            sortino_ratio: self.sortino_ratio(&returns),
            max_drawdown: Self::max_drawdown(equity_curve),
            win_rate: Self::win_rate(trades),
            profit_factor: Self::profit_factor(trades),
            total_trades: trades.len(),
            winning_trades,
            losing_trades: trades.len() - winning_trades,
            final_value,
        }
    }

    fn daily_returns(equity_curve: &[f64]) -> Vec<f64> {
        equity_curve
            .windows(2)
            .map(|w| (w[1] - w[0]) / w[0])
            .collect()
    }

    /// Annualize a total return over `days` trading days.
    pub fn annualized_return(&self, total_return: f64, days: usize) -> f64 {
        if days == 0 {
            return 0.0;
        }
        let years = days as f64 / TRADING_DAYS_PER_YEAR;
        (1.0 + total_return).powf(1.0 / years) - 1.0
    }

    /// Compound Annual Growth Rate.
    pub fn cagr(&self, initial_value: f64, final_value: f64, days: usize) -> f64 {
        if days == 0 || initial_value <= 0.0 {
            return 0.0;
        }
        let years = days as f64 / TRADING_DAYS_PER_YEAR;
        (final_value / initial_value).powf(1.0 / years) - 1.0
    }

    /// Sharpe = mean(excess) / stdev(excess), annualized by sqrt(252).
    /// 0 when the series is empty or has no variance.
    pub fn sharpe_ratio(&self, returns: &[f64]) -> f64 {
        if returns.is_empty() {
            return 0.0;
        }
        let daily_rf = self.risk_free_rate / TRADING_DAYS_PER_YEAR;
        let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();
        let excess = excess.as_slice();
        let std_dev = excess.std_dev();
        if !std_dev.is_finite() || std_dev == 0.0 {
            return 0.0;
        }
        excess.mean() / std_dev * TRADING_DAYS_PER_YEAR.sqrt()
    }

    /// Like Sharpe, but deviation is taken over the negative excess
    /// returns only. 0 when the downside sample is too small.
    pub fn sortino_ratio(&self, returns: &[f64]) -> f64 {
        if returns.is_empty() {
            return 0.0;
        }
        let daily_rf = self.risk_free_rate / TRADING_DAYS_PER_YEAR;
        let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();
        let downside: Vec<f64> = excess.iter().copied().filter(|r| *r < 0.0).collect();
        if downside.len() < 2 {
            return 0.0;
        }
        let downside_std = downside.as_slice().std_dev();
        if !downside_std.is_finite() || downside_std == 0.0 {
            return 0.0;
        }
        excess.as_slice().mean() / downside_std * TRADING_DAYS_PER_YEAR.sqrt()
    }

    /// Largest peak-to-trough decline, as a positive fraction.
    pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
        let mut peak = f64::NEG_INFINITY;
        let mut max_dd = 0.0f64;
        for &value in equity_curve {
            peak = peak.max(value);
            if peak > 0.0 {
                max_dd = max_dd.max((peak - value) / peak);
            }
        }
        max_dd
    }

    /// Fraction of winning trades; 0 with no trades.
    pub fn win_rate(trades: &[Trade]) -> f64 {
        if trades.is_empty() {
            return 0.0;
        }
        let winners = trades.iter().filter(|t| t.is_winner()).count();
        winners as f64 / trades.len() as f64
    }

    /// Gross profit over absolute gross loss. Infinite with profits and no
    /// losses, 0 with no profits.
    pub fn profit_factor(trades: &[Trade]) -> f64 {
        let gross_profit: f64 = trades
            .iter()
            .map(|t| t.profit_loss)
            .filter(|p| *p > 0.0)
            .sum();
        let gross_loss: f64 = trades
            .iter()
            .map(|t| t.profit_loss)
            .filter(|p| *p < 0.0)
            .sum::<f64>()
            .abs();

        if gross_loss == 0.0 {
            if gross_profit > 0.0 {
                return f64::INFINITY;
            }
            return 0.0;
        }
        gross_profit / gross_loss
    }
}
