//! Trade lifecycle types.
//!
//! A trade is either open or closed, never a bag of optional exit fields:
//! `OpenTrade` carries the fixed entry terms, `ClosedTrade` adds the exit
//! terms, and [`OpenTrade::close`] is the only way to get from one to the
//! other. The ledger stores them behind the [`Trade`] sum so the full
//! history stays in insertion order.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "BUY"),
            Side::Short => write!(f, "SELL"),
        }
    }
}

/// Why a trade left the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Signal,
    StopLoss,
    TakeProfit,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Signal => write!(f, "signal"),
            ExitReason::StopLoss => write!(f, "stop-loss"),
            ExitReason::TakeProfit => write!(f, "take-profit"),
        }
    }
}

/// Entry terms are fixed at open; only closing consumes the value.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenTrade {
    pub symbol: String,
    pub side: Side,
    pub entry_price: f64,
    pub shares: f64,
    pub amount_committed: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub entry_time: NaiveDateTime,
}

impl OpenTrade {
    pub fn is_long(&self) -> bool {
        self.side == Side::Long
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        match self.side {
            Side::Long => (price - self.entry_price) * self.shares,
            Side::Short => (self.entry_price - price) * self.shares,
        }
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares * price
    }

    pub fn stop_loss_hit(&self, price: f64) -> bool {
        match self.side {
            Side::Long => price <= self.stop_loss,
            Side::Short => price >= self.stop_loss,
        }
    }

    pub fn take_profit_hit(&self, price: f64) -> bool {
        match self.side {
            Side::Long => price >= self.take_profit,
            Side::Short => price <= self.take_profit,
        }
    }

    /// The one open → closed projection.
    pub fn close(self, exit_price: f64, exit_time: NaiveDateTime, reason: ExitReason) -> ClosedTrade {
        let realized_pnl = self.unrealized_pnl(exit_price);
        ClosedTrade {
            symbol: self.symbol,
            side: self.side,
            entry_price: self.entry_price,
            exit_price,
            shares: self.shares,
            amount_committed: self.amount_committed,
            entry_time: self.entry_time,
            exit_time,
            realized_pnl,
            exit_reason: reason,
        }
    }
}

/// Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub symbol: String,
    pub side: Side,
    pub entry_price: f64,
    pub exit_price: f64,
    pub shares: f64,
    pub amount_committed: f64,
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub realized_pnl: f64,
    pub exit_reason: ExitReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Trade {
    Open(OpenTrade),
    Closed(ClosedTrade),
}

impl Trade {
    pub fn symbol(&self) -> &str {
        match self {
            Trade::Open(t) => &t.symbol,
            Trade::Closed(t) => &t.symbol,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Trade::Open(_))
    }
}
