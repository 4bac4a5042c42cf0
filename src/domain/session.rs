//! Per-symbol paper-trading session.
//!
//! One session owns one symbol's signal pipeline and ledger and is driven
//! by an external refresh tick: the caller supplies the bar window and a
//! reference price, the session computes the latest signal and lets the
//! ledger act on signal transitions. Forced stop/target closes happen on
//! every tick regardless of the signal. Sessions share nothing; running
//! several symbols means running several sessions.

use chrono::NaiveDateTime;
use std::collections::HashMap;

use crate::domain::bar::Bar;
use crate::domain::error::PapertraderError;
use crate::domain::ledger::{Ledger, TradeEvent, TradeSizingPolicy};
use crate::domain::signal::{compute_signal, is_transition, Signal, SignalConfig};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub symbol: String,
    pub initial_balance: f64,
    pub signal: SignalConfig,
    pub sizing: TradeSizingPolicy,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), PapertraderError> {
        if self.symbol.trim().is_empty() {
            return Err(PapertraderError::ConfigMissing {
                section: "session".to_string(),
                key: "symbol".to_string(),
            });
        }
        if self.initial_balance < 0.0 {
            return Err(PapertraderError::ConfigInvalid {
                section: "session".to_string(),
                key: "initial_balance".to_string(),
                reason: "must be non-negative".to_string(),
            });
        }
        self.signal.validate()?;
        self.sizing.validate()
    }
}

/// Result of one tick: the bar's signal, whether it was a transition, and
/// the ledger event it produced, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub signal: Signal,
    pub transitioned: bool,
    pub event: Option<TradeEvent>,
}

#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    ledger: Ledger,
    last_signal: Option<Signal>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Result<Self, PapertraderError> {
        config.validate()?;
        let ledger = Ledger::new(config.initial_balance);
        Ok(Session {
            config,
            ledger,
            last_signal: None,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Minimum bar count a tick needs.
    pub fn min_bars(&self) -> usize {
        self.config.signal.min_bars()
    }

    /// One refresh tick. `bars` is the current window for this symbol,
    /// ordered ascending; `price` is the reference price for stop/target
    /// evaluation (usually the last close); `now` stamps any trade event.
    pub fn tick(
        &mut self,
        bars: &[Bar],
        price: f64,
        now: NaiveDateTime,
    ) -> Result<TickOutcome, PapertraderError> {
        let signal = compute_signal(bars, &self.config.signal)?;
        let transitioned = is_transition(self.last_signal, signal);

        let event = if transitioned {
            self.ledger
                .apply(signal, &self.config.symbol, price, now, &self.config.sizing)
        } else {
            // No transition: the signal is muted, but stops and targets
            // still fire on the new price.
            self.ledger
                .check_triggers(&self.config.symbol, price, now)
                .map(TradeEvent::Closed)
        };

        self.last_signal = Some(signal);
        Ok(TickOutcome {
            signal,
            transitioned,
            event,
        })
    }

    /// Reset balance and history; the next actionable signal acts again.
    pub fn reset(&mut self, balance: f64) {
        self.ledger.reset(balance);
        self.last_signal = None;
    }

    pub fn summary(&self, price: f64) -> SessionSummary {
        let mut prices = HashMap::new();
        prices.insert(self.config.symbol.clone(), price);
        SessionSummary {
            cash_balance: self.ledger.cash_balance,
            equity: self.ledger.equity(&prices),
            realized_pnl: self.ledger.realized_pnl(),
            unrealized_pnl: self.ledger.unrealized_pnl(&self.config.symbol, price),
            open_trades: self.ledger.open_trade_count(),
            closed_trades: self.ledger.closed_trades().count(),
        }
    }
}

/// Snapshot of session economics for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub cash_balance: f64,
    pub equity: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub open_trades: usize,
    pub closed_trades: usize,
}

/// Close-over-close change across the supplied window, in percent.
pub fn period_change_pct(bars: &[Bar]) -> Option<f64> {
    let first = bars.first()?;
    let last = bars.last()?;
    if first.open == 0.0 {
        return None;
    }
    Some((last.close - first.open) / first.open * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<Bar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                symbol: "BTCUSDT".into(),
                timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    + chrono::Duration::minutes(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    fn session_config() -> SessionConfig {
        SessionConfig {
            symbol: "BTCUSDT".into(),
            initial_balance: 1000.0,
            signal: SignalConfig {
                ema_fast: 3,
                ema_slow: 5,
                macd_fast: 3,
                macd_slow: 6,
                macd_signal: 3,
                atr_period: 3,
                atr_multiplier: 3.0,
                trend_filter: false,
            },
            sizing: TradeSizingPolicy {
                amount_per_trade: 100.0,
                stop_loss_pct: 0.5,
                take_profit_pct: 0.9,
                allow_shorting: false,
            },
        }
    }

    fn rising(count: usize) -> Vec<f64> {
        (0..count).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn first_buy_transition_opens_a_trade() {
        let mut session = Session::new(session_config()).unwrap();
        let bars = make_bars(&rising(30));
        let price = bars.last().unwrap().close;
        let now = bars.last().unwrap().timestamp;

        let outcome = session.tick(&bars, price, now).unwrap();
        assert_eq!(outcome.signal, Signal::Buy);
        assert!(outcome.transitioned);
        assert!(matches!(outcome.event, Some(TradeEvent::Opened(_))));
        assert_eq!(session.ledger().open_trade_count(), 1);
    }

    #[test]
    fn repeated_buy_signal_acts_once() {
        let mut session = Session::new(session_config()).unwrap();
        let mut prices = rising(30);

        let bars = make_bars(&prices);
        session
            .tick(&bars, prices[prices.len() - 1], bars.last().unwrap().timestamp)
            .unwrap();

        // Still rising, still Buy: no transition, no second open.
        prices.push(130.0);
        let bars = make_bars(&prices);
        let outcome = session
            .tick(&bars, 130.0, bars.last().unwrap().timestamp)
            .unwrap();

        assert_eq!(outcome.signal, Signal::Buy);
        assert!(!outcome.transitioned);
        assert!(outcome.event.is_none());
        assert_eq!(session.ledger().open_trade_count(), 1);
    }

    #[test]
    fn stop_fires_without_a_transition() {
        let mut session = Session::new(session_config()).unwrap();
        let mut prices = rising(30);
        let bars = make_bars(&prices);
        session
            .tick(&bars, 129.0, bars.last().unwrap().timestamp)
            .unwrap();

        // Entry at 129, stop at 64.5. Crash through it while the signal
        // pipeline still says Buy (one more rising close in the window).
        prices.push(130.0);
        let bars = make_bars(&prices);
        let outcome = session
            .tick(&bars, 60.0, bars.last().unwrap().timestamp)
            .unwrap();

        assert!(matches!(outcome.event, Some(TradeEvent::Closed(_))));
        assert_eq!(session.ledger().open_trade_count(), 0);
    }

    #[test]
    fn insufficient_bars_error_leaves_ledger_untouched() {
        let mut session = Session::new(session_config()).unwrap();
        let bars = make_bars(&[100.0, 101.0]);

        let err = session
            .tick(&bars, 101.0, bars.last().unwrap().timestamp)
            .unwrap_err();
        assert!(matches!(err, PapertraderError::InsufficientData { .. }));
        assert!(session.ledger().trades().is_empty());
        assert!((session.ledger().cash_balance - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_config_rejected_at_construction() {
        let mut config = session_config();
        config.signal.ema_fast = 10;
        config.signal.ema_slow = 5;
        assert!(Session::new(config).is_err());

        let mut config = session_config();
        config.initial_balance = -1.0;
        assert!(Session::new(config).is_err());

        let mut config = session_config();
        config.symbol = "  ".into();
        assert!(Session::new(config).is_err());
    }

    #[test]
    fn reset_rearms_the_signal_gate() {
        let mut session = Session::new(session_config()).unwrap();
        let bars = make_bars(&rising(30));
        let now = bars.last().unwrap().timestamp;

        session.tick(&bars, 129.0, now).unwrap();
        assert_eq!(session.ledger().open_trade_count(), 1);

        session.reset(2000.0);
        assert!(session.ledger().trades().is_empty());
        assert!((session.ledger().cash_balance - 2000.0).abs() < f64::EPSILON);

        // Same Buy signal acts again after the reset.
        let outcome = session.tick(&bars, 129.0, now).unwrap();
        assert!(outcome.transitioned);
        assert!(matches!(outcome.event, Some(TradeEvent::Opened(_))));
    }

    #[test]
    fn summary_reflects_ledger_state() {
        let mut session = Session::new(session_config()).unwrap();
        let bars = make_bars(&rising(30));
        let now = bars.last().unwrap().timestamp;
        session.tick(&bars, 100.0, now).unwrap();

        let summary = session.summary(105.0);
        assert!((summary.cash_balance - 900.0).abs() < f64::EPSILON);
        assert!((summary.unrealized_pnl - 5.0).abs() < 1e-9);
        assert!((summary.equity - 1005.0).abs() < 1e-9);
        assert_eq!(summary.open_trades, 1);
        assert_eq!(summary.closed_trades, 0);
        assert!((summary.realized_pnl - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn period_change_over_window() {
        let bars = make_bars(&[100.0, 105.0, 110.0]);
        let change = period_change_pct(&bars).unwrap();
        assert!((change - 10.0).abs() < 1e-9);

        assert!(period_change_pct(&[]).is_none());
    }
}
