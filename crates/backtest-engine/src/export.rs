//! CSV export of backtest results.
//!
//! One row per trade, one row per equity observation, one summary row.
//! Prices are written with two fractional digits, ratios with four.

use std::io::Write;

use chrono::NaiveDate;

use research_core::Trade;

use crate::models::PerformanceMetrics;

/// Write the trade log.
pub fn write_trades<W: Write>(writer: W, trades: &[Trade]) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "symbol",
        "entry_date",
        "entry_price",
        "exit_date",
        "exit_price",
        "shares",
        "profit_loss",
        "profit_loss_pct",
        "exit_reason",
    ])?;
    for trade in trades {
        csv_writer.write_record([
            trade.symbol.clone(),
            trade.entry_date.format("%Y-%m-%d").to_string(),
            format!("{:.2}", trade.entry_price),
            trade.exit_date.format("%Y-%m-%d").to_string(),
            format!("{:.2}", trade.exit_price),
            trade.shares.to_string(),
            format!("{:.2}", trade.profit_loss),
            format!("{:.4}", trade.profit_loss_pct),
            trade.exit_reason.as_str().to_string(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write the equity curve as `(date, value)` rows.
pub fn write_equity_curve<W: Write>(
    writer: W,
    dates: &[NaiveDate],
    values: &[f64],
) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["date", "value"])?;
    for (date, value) in dates.iter().zip(values) {
        csv_writer.write_record([
            date.format("%Y-%m-%d").to_string(),
            format!("{value:.2}"),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write the metrics summary as a single row.
pub fn write_summary<W: Write>(writer: W, metrics: &PerformanceMetrics) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "total_return",
        "annualized_return",
        "cagr",
        "sharpe_ratio",
        "sortino_ratio",
        "max_drawdown",
        "win_rate",
        "profit_factor",
        "total_trades",
        "winning_trades",
        "losing_trades",
        "final_value",
    ])?;
    csv_writer.write_record([
        format!("{:.4}", metrics.total_return),
        format!("{:.4}", metrics.annualized_return),
        format!("{:.4}", metrics.cagr),
        format!("{:.4}", metrics.sharpe_ratio),
        format!("{:.4}", metrics.sortino_ratio),
        format!("{:.4}", metrics.max_drawdown),
        format!("{:.4}", metrics.win_rate),
        format!("{:.4}", metrics.profit_factor),
        metrics.total_trades.to_string(),
        metrics.winning_trades.to_string(),
        metrics.losing_trades.to_string(),
        format!("{:.2}", metrics.final_value),
    ])?;
    csv_writer.flush()?;
    Ok(())
}
