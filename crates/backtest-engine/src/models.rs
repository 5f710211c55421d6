use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use research_core::{Position, Trade};

/// Configuration for a backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Starting capital.
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    /// Maximum concurrent positions.
    #[serde(default = "default_max_positions")]
    pub max_positions: usize,
}

fn default_initial_capital() -> f64 {
    100_000.0
}
fn default_max_positions() -> usize {
    10
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: default_initial_capital(),
            max_positions: default_max_positions(),
        }
    }
}

/// Aggregate trade- and equity-level performance metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub cagr: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub final_value: f64,
}

/// Result of a completed backtest.
///
/// `equity_dates` is index-aligned with `equity_curve`, one entry per
/// simulated trading day. Positions still open at the end are returned
/// as-is; they do not produce synthetic exit trades.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub metrics: PerformanceMetrics,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<f64>,
    pub equity_dates: Vec<NaiveDate>,
    pub open_positions: Vec<Position>,
}
