use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An open position in the portfolio.
///
/// Created on entry, marked to market daily, removed on exit. The stop is
/// managed by the risk policy and only ever ratchets up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub shares: u64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub current_price: f64,
    pub current_date: NaiveDate,
}

impl Position {
    pub fn new(
        symbol: &str,
        shares: u64,
        entry_price: f64,
        entry_date: NaiveDate,
        stop_loss: f64,
        take_profit: f64,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            shares,
            entry_price,
            entry_date,
            stop_loss,
            take_profit,
            current_price: entry_price,
            current_date: entry_date,
        }
    }

    /// Current market value of the position.
    pub fn current_value(&self) -> f64 {
        self.shares as f64 * self.current_price
    }

    /// Original cost of the position.
    pub fn cost_basis(&self) -> f64 {
        self.shares as f64 * self.entry_price
    }

    /// Unrealized profit/loss in currency.
    pub fn unrealized_pnl(&self) -> f64 {
        self.current_value() - self.cost_basis()
    }

    /// Unrealized profit/loss as a fraction of cost.
    pub fn unrealized_pnl_pct(&self) -> f64 {
        let basis = self.cost_basis();
        if basis == 0.0 {
            return 0.0;
        }
        self.unrealized_pnl() / basis
    }

    /// Mark the position to the latest market price.
    pub fn update_price(&mut self, price: f64, date: NaiveDate) {
        self.current_price = price;
        self.current_date = date;
    }
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    TrailingStop,
    Signal,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "STOP_LOSS",
            ExitReason::TakeProfit => "TAKE_PROFIT",
            ExitReason::TrailingStop => "TRAILING_STOP",
            ExitReason::Signal => "SIGNAL",
        }
    }
}

/// A completed round trip (entry + exit), immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub shares: u64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
    pub exit_reason: ExitReason,
}

impl Trade {
    /// Calendar days the position was held.
    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }

    /// True if the trade was profitable.
    pub fn is_winner(&self) -> bool {
        self.profit_loss > 0.0
    }
}
