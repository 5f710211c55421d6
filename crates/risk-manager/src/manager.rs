use serde::{Deserialize, Serialize};

use research_core::Position;

/// Risk-policy configuration. All percentages are fractions (0.10 = 10%).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Initial stop-loss distance below entry.
    #[serde(default = "default_initial_stop_loss_pct")]
    pub initial_stop_loss_pct: f64,
    /// Gain required before the trailing stop activates.
    #[serde(default = "default_trailing_trigger_pct")]
    pub trailing_trigger_pct: f64,
    /// ATR multiple used for the trailing distance.
    #[serde(default = "default_trailing_atr_multiplier")]
    pub trailing_atr_multiplier: f64,
    /// Maximum position as a fraction of portfolio value.
    #[serde(default = "default_max_position_size_pct")]
    pub max_position_size_pct: f64,
    /// Maximum risk per trade as a fraction of portfolio value.
    #[serde(default = "default_max_portfolio_risk_pct")]
    pub max_portfolio_risk_pct: f64,
    /// Halt new entries once drawdown reaches this fraction.
    #[serde(default = "default_max_drawdown_limit")]
    pub max_drawdown_limit: f64,
    /// Take-profit distance above entry.
    #[serde(default = "default_take_profit_pct")]
    pub take_profit_pct: f64,
}

fn default_initial_stop_loss_pct() -> f64 {
    0.10
}
fn default_trailing_trigger_pct() -> f64 {
    0.15
}
fn default_trailing_atr_multiplier() -> f64 {
    2.0
}
fn default_max_position_size_pct() -> f64 {
    0.10
}
fn default_max_portfolio_risk_pct() -> f64 {
    0.02
}
fn default_max_drawdown_limit() -> f64 {
    0.20
}
fn default_take_profit_pct() -> f64 {
    0.20
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            initial_stop_loss_pct: default_initial_stop_loss_pct(),
            trailing_trigger_pct: default_trailing_trigger_pct(),
            trailing_atr_multiplier: default_trailing_atr_multiplier(),
            max_position_size_pct: default_max_position_size_pct(),
            max_portfolio_risk_pct: default_max_portfolio_risk_pct(),
            max_drawdown_limit: default_max_drawdown_limit(),
            take_profit_pct: default_take_profit_pct(),
        }
    }
}

/// Stateless risk policy over portfolio snapshots.
///
/// Every operation is a pure function of its arguments and the config;
/// the policy holds no portfolio state of its own.
#[derive(Debug, Clone, Default)]
pub struct RiskManager {
    config: RiskConfig,
}

impl RiskManager {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Initial stop-loss price for a fresh entry.
    pub fn initial_stop_loss(&self, entry_price: f64) -> f64 {
        entry_price * (1.0 - self.config.initial_stop_loss_pct)
    }

    /// Take-profit price for a fresh entry.
    pub fn take_profit(&self, entry_price: f64) -> f64 {
        entry_price * (1.0 + self.config.take_profit_pct)
    }

    /// Trailing-stop update.
    ///
    /// Below the activation gain the initial stop is kept. Above it, the
    /// candidate is ATR-based when a positive ATR is available, otherwise
    /// the percentage fallback. The stop never ratchets down.
    pub fn update_trailing_stop(
        &self,
        position: &Position,
        current_price: f64,
        atr: Option<f64>,
    ) -> f64 {
        let gain_pct = (current_price - position.entry_price) / position.entry_price;
        if gain_pct < self.config.trailing_trigger_pct {
            return position.stop_loss;
        }

        let trailing_stop = match atr {
            Some(atr) if atr.is_finite() && atr > 0.0 => {
                current_price - self.config.trailing_atr_multiplier * atr
            }
            _ => current_price * (1.0 - self.config.initial_stop_loss_pct),
        };

        position.stop_loss.max(trailing_stop)
    }

    /// Whole-share position size: the smaller of the size-capped and the
    /// risk-capped share counts.
    pub fn position_size(
        &self,
        portfolio_value: f64,
        entry_price: f64,
        stop_loss_price: f64,
    ) -> u64 {
        if entry_price <= 0.0 || portfolio_value <= 0.0 {
            return 0;
        }

        let max_position_value = portfolio_value * self.config.max_position_size_pct;
        let shares_by_size = (max_position_value / entry_price).floor() as u64;

        let risk_per_share = entry_price - stop_loss_price;
        if risk_per_share <= 0.0 {
            return shares_by_size;
        }

        let max_risk_amount = portfolio_value * self.config.max_portfolio_risk_pct;
        let shares_by_risk = (max_risk_amount / risk_per_share).floor() as u64;

        shares_by_size.min(shares_by_risk)
    }

    /// True when the drawdown gate should halt new entries.
    pub fn check_drawdown_limit(&self, current_drawdown: f64) -> bool {
        current_drawdown >= self.config.max_drawdown_limit
    }
}
