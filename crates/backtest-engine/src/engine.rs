use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use tracing::info;

use research_core::{ExitReason, Position, PricePanel, ResearchError, Signal, Trade};
use risk_manager::RiskManager;
use technical_analysis::{atr, ATR_PERIOD};

use crate::models::{BacktestConfig, BacktestReport};
use crate::performance::PerformanceCalculator;

/// Systematic backtesting engine with a positions-first daily loop.
///
/// Per-day order (load-bearing, do not reorder):
/// 1. Mark open positions to market and trail their stops
/// 2. Evaluate exit conditions for every position
/// 3. Snapshot portfolio equity
/// 4. Admit new entries from the day's signals
pub struct BacktestEngine {
    config: BacktestConfig,
    risk_manager: RiskManager,
    performance: PerformanceCalculator,
    cash: f64,
    /// Open positions in entry order; at most one per symbol.
    positions: Vec<Position>,
    trades: Vec<Trade>,
    equity_curve: Vec<f64>,
    equity_dates: Vec<NaiveDate>,
    peak_equity: f64,
    /// One ATR column per symbol, filled on first mark-to-market.
    atr_cache: HashMap<String, Vec<f64>>,
}

impl Default for BacktestEngine {
    fn default() -> Self {
        Self::new(BacktestConfig::default(), RiskManager::default())
    }
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig, risk_manager: RiskManager) -> Self {
        let cash = config.initial_capital;
        let peak_equity = config.initial_capital;
        Self {
            config,
            risk_manager,
            performance: PerformanceCalculator::default(),
            cash,
            positions: Vec::new(),
            trades: Vec::new(),
            equity_curve: Vec::new(),
            equity_dates: Vec::new(),
            peak_equity,
            atr_cache: HashMap::new(),
        }
    }

    /// Reset engine state for a new backtest.
    pub fn reset(&mut self) {
        self.cash = self.config.initial_capital;
        self.positions.clear();
        self.trades.clear();
        self.equity_curve.clear();
        self.equity_dates.clear();
        self.peak_equity = self.config.initial_capital;
        self.atr_cache.clear();
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn equity_curve(&self) -> &[f64] {
        &self.equity_curve
    }

    pub fn peak_equity(&self) -> f64 {
        self.peak_equity
    }

    /// Execute a backtest over the date range.
    ///
    /// The timeline is the union of dates across all panels, clipped to
    /// `[start_date, end_date]` (missing bounds default to the panel
    /// extremes). `signals` maps `YYYY-MM-DD` keys to that day's entry
    /// candidates; with no signals the engine only manages positions.
    pub fn run_backtest(
        &mut self,
        price_data: &HashMap<String, PricePanel>,
        signals: Option<&HashMap<String, Vec<Signal>>>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<BacktestReport, ResearchError> {
        self.reset();

        for (symbol, panel) in price_data {
            panel
                .validate()
                .map_err(|err| ResearchError::InputShape(format!("{symbol}: {err}")))?;
        }

        let all_dates: BTreeSet<NaiveDate> = price_data
            .values()
            .flat_map(|panel| panel.dates().iter().copied())
            .collect();
        if all_dates.is_empty() {
            return Ok(self.results());
        }

        let start = start_date.unwrap_or_else(|| *all_dates.iter().next().unwrap());
        let end = end_date.unwrap_or_else(|| *all_dates.iter().next_back().unwrap());

        for date in all_dates {
            if date < start || date > end {
                continue;
            }
            self.process_day(date, price_data, signals);
        }

        Ok(self.results())
    }

    /// One simulated trading day.
    fn process_day(
        &mut self,
        date: NaiveDate,
        price_data: &HashMap<String, PricePanel>,
        signals: Option<&HashMap<String, Vec<Signal>>>,
    ) {
        self.update_positions(date, price_data);
        let exited = self.check_exits(date);

        let portfolio_value = self.portfolio_value();
        self.equity_curve.push(portfolio_value);
        self.equity_dates.push(date);
        self.peak_equity = self.peak_equity.max(portfolio_value);

        if let Some(signals) = signals {
            let key = date.format("%Y-%m-%d").to_string();
            if let Some(day_signals) = signals.get(&key) {
                self.process_entries(date, day_signals, price_data, portfolio_value, &exited);
            }
        }
    }

    /// Step 1: mark to market and trail stops. Symbols with no bar today
    /// keep yesterday's price and stop untouched.
    fn update_positions(&mut self, date: NaiveDate, price_data: &HashMap<String, PricePanel>) {
        for position in &mut self.positions {
            let panel = match price_data.get(&position.symbol) {
                Some(panel) => panel,
                None => continue,
            };
            let idx = match panel.index_of(date) {
                Some(idx) => idx,
                None => continue,
            };
            position.update_price(panel.close()[idx], date);

            let atr_value = if panel.len() >= ATR_PERIOD {
                let column = self
                    .atr_cache
                    .entry(position.symbol.clone())
                    .or_insert_with(|| atr(panel.high(), panel.low(), panel.close(), ATR_PERIOD));
                Some(column[idx]).filter(|v| v.is_finite())
            } else {
                None
            };

            position.stop_loss =
                self.risk_manager
                    .update_trailing_stop(position, position.current_price, atr_value);
        }
    }

    /// Step 2: evaluate and execute exits. Stop-loss takes precedence over
    /// take-profit when both trigger on the same bar; each position can
    /// exit at most once per day. Returns the symbols that exited, which
    /// are barred from re-entry until the next day.
    fn check_exits(&mut self, date: NaiveDate) -> Vec<String> {
        let mut exits: Vec<(String, f64, ExitReason)> = Vec::new();
        for position in &self.positions {
            if position.current_price <= position.stop_loss {
                exits.push((
                    position.symbol.clone(),
                    position.current_price,
                    ExitReason::StopLoss,
                ));
            } else if position.current_price >= position.take_profit {
                exits.push((
                    position.symbol.clone(),
                    position.current_price,
                    ExitReason::TakeProfit,
                ));
            }
        }

        let mut exited = Vec::with_capacity(exits.len());
        for (symbol, exit_price, reason) in exits {
            self.execute_exit(&symbol, exit_price, date, reason);
            exited.push(symbol);
        }
        exited
    }

    /// Step 4: admit entries in confidence order (symbol breaks ties).
    fn process_entries(
        &mut self,
        date: NaiveDate,
        day_signals: &[Signal],
        price_data: &HashMap<String, PricePanel>,
        portfolio_value: f64,
        exited_today: &[String],
    ) {
        let mut sorted_signals: Vec<&Signal> = day_signals.iter().collect();
        sorted_signals.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });

        let current_drawdown = self.current_drawdown();

        for signal in sorted_signals {
            if self.positions.len() >= self.config.max_positions {
                break;
            }
            if self.risk_manager.check_drawdown_limit(current_drawdown) {
                break;
            }

            if self.position(&signal.symbol).is_some() {
                continue;
            }
            // No re-entry on the day a symbol exited
            if exited_today.iter().any(|s| *s == signal.symbol) {
                continue;
            }
            let panel = match price_data.get(&signal.symbol) {
                Some(panel) => panel,
                None => continue,
            };
            let entry_price = match panel.close_on(date) {
                Some(close) => close,
                None => continue,
            };

            let stop_loss = self.risk_manager.initial_stop_loss(entry_price);
            let take_profit = self.risk_manager.take_profit(entry_price);

            let mut shares = self
                .risk_manager
                .position_size(portfolio_value, entry_price, stop_loss);
            if shares == 0 {
                continue;
            }

            let mut cost = shares as f64 * entry_price;
            if cost > self.cash {
                // Reduce to affordable size
                shares = (self.cash / entry_price).floor() as u64;
                if shares == 0 {
                    continue;
                }
                cost = shares as f64 * entry_price;
            }

            self.positions.push(Position::new(
                &signal.symbol,
                shares,
                entry_price,
                date,
                stop_loss,
                take_profit,
            ));
            self.cash -= cost;

            info!(
                "ENTRY: {} {} shares @ ${:.2}",
                signal.symbol, shares, entry_price
            );
        }
    }

    fn execute_exit(&mut self, symbol: &str, exit_price: f64, exit_date: NaiveDate, reason: ExitReason) {
        let idx = match self.positions.iter().position(|p| p.symbol == symbol) {
            Some(idx) => idx,
            None => return,
        };
        let position = self.positions.remove(idx);

        let proceeds = position.shares as f64 * exit_price;
        let profit_loss = proceeds - position.cost_basis();
        let profit_loss_pct = profit_loss / position.cost_basis();

        self.cash += proceeds;

        info!(
            "EXIT: {} {} shares @ ${:.2} ({:?}) P&L: ${:.2} ({:.1}%)",
            symbol,
            position.shares,
            exit_price,
            reason,
            profit_loss,
            profit_loss_pct * 100.0
        );

        self.trades.push(Trade {
            symbol: symbol.to_string(),
            entry_date: position.entry_date,
            entry_price: position.entry_price,
            exit_date,
            exit_price,
            shares: position.shares,
            profit_loss,
            profit_loss_pct,
            exit_reason: reason,
        });
    }

    fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.symbol == symbol)
    }

    fn portfolio_value(&self) -> f64 {
        self.cash + self.positions.iter().map(Position::current_value).sum::<f64>()
    }

    fn current_drawdown(&self) -> f64 {
        if self.peak_equity <= 0.0 {
            return 0.0;
        }
        (self.peak_equity - self.portfolio_value()) / self.peak_equity
    }

    fn results(&self) -> BacktestReport {
        let metrics = self.performance.calculate_all_metrics(
            &self.trades,
            &self.equity_curve,
            self.config.initial_capital,
        );
        BacktestReport {
            metrics,
            trades: self.trades.clone(),
            equity_curve: self.equity_curve.clone(),
            equity_dates: self.equity_dates.clone(),
            open_positions: self.positions.clone(),
        }
    }
}
