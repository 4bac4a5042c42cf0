//! Paper-trading ledger: cash balance, trade history, open/close logic.
//!
//! The ledger is the sole mutator of trade state. `apply` is atomic per
//! tick: every precondition for an action is checked before any mutation,
//! and a tick produces at most one trade event. Stop-loss / take-profit
//! triggers are evaluated first on every tick and preempt the signal.

use chrono::NaiveDateTime;
use std::collections::HashMap;

use crate::domain::error::PapertraderError;
use crate::domain::signal::Signal;
use crate::domain::trade::{ClosedTrade, ExitReason, OpenTrade, Side, Trade};

/// Externally configured sizing: fixed notional per trade plus percentage
/// stop/target distances.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeSizingPolicy {
    pub amount_per_trade: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub allow_shorting: bool,
}

impl Default for TradeSizingPolicy {
    fn default() -> Self {
        TradeSizingPolicy {
            amount_per_trade: 1000.0,
            stop_loss_pct: 0.02,
            take_profit_pct: 0.04,
            allow_shorting: false,
        }
    }
}

impl TradeSizingPolicy {
    pub fn validate(&self) -> Result<(), PapertraderError> {
        let invalid = |key: &str, reason: &str| PapertraderError::ConfigInvalid {
            section: "risk".to_string(),
            key: key.to_string(),
            reason: reason.to_string(),
        };

        if self.amount_per_trade <= 0.0 {
            return Err(invalid("amount_per_trade", "must be positive"));
        }
        if self.stop_loss_pct <= 0.0 || self.stop_loss_pct >= 1.0 {
            return Err(invalid("stop_loss_pct", "must be between 0 and 1 exclusive"));
        }
        if self.take_profit_pct <= 0.0 || self.take_profit_pct >= 1.0 {
            return Err(invalid(
                "take_profit_pct",
                "must be between 0 and 1 exclusive",
            ));
        }
        Ok(())
    }
}

/// Emitted by [`Ledger::apply`]; carries a full trade snapshot for the
/// presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeEvent {
    Opened(OpenTrade),
    Closed(ClosedTrade),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub cash_balance: f64,
    pub initial_balance: f64,
    trades: Vec<Trade>,
}

impl Ledger {
    pub fn new(initial_balance: f64) -> Self {
        Ledger {
            cash_balance: initial_balance,
            initial_balance,
            trades: Vec::new(),
        }
    }

    /// Full trade history, insertion order.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn open_trade(&self, symbol: &str) -> Option<&OpenTrade> {
        self.trades.iter().find_map(|t| match t {
            Trade::Open(open) if open.symbol == symbol => Some(open),
            _ => None,
        })
    }

    pub fn has_open_trade(&self, symbol: &str) -> bool {
        self.open_trade(symbol).is_some()
    }

    pub fn open_trades(&self) -> impl Iterator<Item = &OpenTrade> {
        self.trades.iter().filter_map(|t| match t {
            Trade::Open(open) => Some(open),
            _ => None,
        })
    }

    pub fn closed_trades(&self) -> impl Iterator<Item = &ClosedTrade> {
        self.trades.iter().filter_map(|t| match t {
            Trade::Closed(closed) => Some(closed),
            _ => None,
        })
    }

    pub fn open_trade_count(&self) -> usize {
        self.open_trades().count()
    }

    /// Sum of realized PnL over closed trades.
    pub fn realized_pnl(&self) -> f64 {
        self.closed_trades().map(|t| t.realized_pnl).sum()
    }

    pub fn unrealized_pnl(&self, symbol: &str, price: f64) -> f64 {
        self.open_trade(symbol)
            .map(|t| t.unrealized_pnl(price))
            .unwrap_or(0.0)
    }

    /// Cash plus the marked value of committed capital, per-symbol prices
    /// supplied by the caller. Open trades without a price are carried at
    /// their committed amount.
    pub fn equity(&self, price_map: &HashMap<String, f64>) -> f64 {
        let open_value: f64 = self
            .open_trades()
            .map(|t| match price_map.get(&t.symbol) {
                Some(&price) => t.amount_committed + t.unrealized_pnl(price),
                None => t.amount_committed,
            })
            .sum();
        self.cash_balance + open_value
    }

    /// The only destructive operation: reinitialize balance, drop history.
    pub fn reset(&mut self, balance: f64) {
        self.cash_balance = balance;
        self.initial_balance = balance;
        self.trades.clear();
    }

    /// One engine step. Trigger closes run first and consume the tick;
    /// otherwise the signal decides. Returns `None` when nothing changed.
    pub fn apply(
        &mut self,
        signal: Signal,
        symbol: &str,
        price: f64,
        now: NaiveDateTime,
        policy: &TradeSizingPolicy,
    ) -> Option<TradeEvent> {
        if let Some(closed) = self.check_triggers(symbol, price, now) {
            return Some(TradeEvent::Closed(closed));
        }

        match (signal, self.open_index(symbol)) {
            (Signal::Buy, Some(idx)) => {
                // A Buy against an open short closes it; against an open
                // long it is a no-op (no re-entry on an unchanged book).
                match &self.trades[idx] {
                    Trade::Open(open) if open.side == Side::Short => self
                        .close_index(idx, price, now, ExitReason::Signal)
                        .map(TradeEvent::Closed),
                    _ => None,
                }
            }
            (Signal::Buy, None) => self.open(symbol, Side::Long, price, now, policy),
            (Signal::Sell, Some(idx)) => match &self.trades[idx] {
                Trade::Open(open) if open.side == Side::Long => self
                    .close_index(idx, price, now, ExitReason::Signal)
                    .map(TradeEvent::Closed),
                _ => None,
            },
            (Signal::Sell, None) => {
                if policy.allow_shorting {
                    self.open(symbol, Side::Short, price, now, policy)
                } else {
                    None
                }
            }
            (Signal::Hold, _) => None,
        }
    }

    /// Force-close any open trade for `symbol` whose stop or target is
    /// breached by `price`. Stop-loss wins if both are breached.
    pub fn check_triggers(
        &mut self,
        symbol: &str,
        price: f64,
        now: NaiveDateTime,
    ) -> Option<ClosedTrade> {
        let idx = self.open_index(symbol)?;
        let reason = match &self.trades[idx] {
            Trade::Open(open) if open.stop_loss_hit(price) => ExitReason::StopLoss,
            Trade::Open(open) if open.take_profit_hit(price) => ExitReason::TakeProfit,
            _ => return None,
        };
        self.close_index(idx, price, now, reason)
    }

    fn open_index(&self, symbol: &str) -> Option<usize> {
        self.trades
            .iter()
            .position(|t| t.is_open() && t.symbol() == symbol)
    }

    fn open(
        &mut self,
        symbol: &str,
        side: Side,
        price: f64,
        now: NaiveDateTime,
        policy: &TradeSizingPolicy,
    ) -> Option<TradeEvent> {
        if price <= 0.0 {
            return None;
        }

        // Clamp to available balance; an empty ledger skips the entry
        // silently instead of failing.
        let amount = policy.amount_per_trade.min(self.cash_balance);
        if amount <= 0.0 {
            return None;
        }

        let (stop_loss, take_profit) = match side {
            Side::Long => (
                price * (1.0 - policy.stop_loss_pct),
                price * (1.0 + policy.take_profit_pct),
            ),
            Side::Short => (
                price * (1.0 + policy.stop_loss_pct),
                price * (1.0 - policy.take_profit_pct),
            ),
        };

        let trade = OpenTrade {
            symbol: symbol.to_string(),
            side,
            entry_price: price,
            shares: amount / price,
            amount_committed: amount,
            stop_loss,
            take_profit,
            entry_time: now,
        };

        self.cash_balance -= amount;
        self.trades.push(Trade::Open(trade.clone()));
        Some(TradeEvent::Opened(trade))
    }

    fn close_index(
        &mut self,
        idx: usize,
        price: f64,
        now: NaiveDateTime,
        reason: ExitReason,
    ) -> Option<ClosedTrade> {
        let open = match &self.trades[idx] {
            Trade::Open(open) => open.clone(),
            Trade::Closed(_) => return None,
        };

        let closed = open.close(price, now, reason);
        // A short's loss is capped at its escrowed notional; the credit
        // never drives cash below zero.
        let credit = (closed.amount_committed + closed.realized_pnl).max(0.0);
        self.cash_balance += credit;
        self.trades[idx] = Trade::Closed(closed.clone());
        Some(closed)
    }
}
