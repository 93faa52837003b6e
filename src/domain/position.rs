//! Position lifecycle: open, held, closed.

use chrono::NaiveDate;
use serde::Serialize;

/// One simulated holding. Created when a BUY rule fires, closed when a SELL
/// rule fires (or by forced liquidation at the window end), then archived
/// and never mutated again.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub buy_price: f64,
    pub share_count: f64,
    pub sell_price: Option<f64>,
    pub buy_date: NaiveDate,
    pub sell_date: Option<NaiveDate>,
    /// Rule string that fired the entry, for later rule analytics.
    pub buy_rule: String,
    pub sell_rule: Option<String>,
}

impl Position {
    pub fn open(buy_price: f64, share_count: f64, buy_date: NaiveDate, buy_rule: String) -> Self {
        Self {
            buy_price,
            share_count,
            sell_price: None,
            buy_date,
            sell_date: None,
            buy_rule,
            sell_rule: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.sell_price.is_none()
    }

    pub fn close(&mut self, sell_price: f64, sell_date: NaiveDate, sell_rule: String) {
        self.sell_price = Some(sell_price);
        self.sell_date = Some(sell_date);
        self.sell_rule = Some(sell_rule);
    }

    /// Cash withdrawn from the account when this position was opened.
    pub fn entry_cost(&self) -> f64 {
        self.buy_price * self.share_count
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.share_count * price
    }

    /// Unrealized P/L at `price`, in dollars. Used by the stop triggers.
    pub fn running_profit_loss(&self, price: f64) -> f64 {
        (price - self.buy_price) * self.share_count
    }

    /// Unrealized P/L at `price`, in percent of the entry price.
    pub fn running_profit_loss_pct(&self, price: f64) -> f64 {
        if self.buy_price == 0.0 {
            return 0.0;
        }
        (price - self.buy_price) / self.buy_price * 100.0
    }

    /// Realized P/L in dollars; `None` while the position is still open.
    pub fn lifetime_profit_loss(&self) -> Option<f64> {
        self.sell_price
            .map(|sell| (sell - self.buy_price) * self.share_count)
    }

    /// Realized P/L in percent of the entry price; `None` while open.
    pub fn lifetime_profit_loss_pct(&self) -> Option<f64> {
        if self.buy_price == 0.0 {
            return self.sell_price.map(|_| 0.0);
        }
        self.sell_price
            .map(|sell| (sell - self.buy_price) / self.buy_price * 100.0)
    }
}
