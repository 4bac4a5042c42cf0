#![allow(dead_code)]

use chrono::NaiveDateTime;
use papertrader::domain::bar::Bar;
use papertrader::domain::error::PapertraderError;
use papertrader::domain::ledger::TradeSizingPolicy;
use papertrader::domain::session::SessionConfig;
use papertrader::domain::signal::SignalConfig;
use papertrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, PapertraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(PapertraderError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(bars) => Ok(bars.clone()),
            None => Err(PapertraderError::NoData {
                symbol: symbol.to_string(),
            }),
        }
    }

    fn list_symbols(&self) -> Result<Vec<String>, PapertraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, PapertraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(PapertraderError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.timestamp).min().unwrap();
                let max = bars.iter().map(|b| b.timestamp).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

pub fn make_bar(symbol: &str, timestamp: &str, close: f64) -> Bar {
    Bar {
        symbol: symbol.to_string(),
        timestamp: ts(timestamp),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000.0,
    }
}

/// Bars from an explicit close series, one minute apart.
pub fn bars_from_closes(symbol: &str, closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            symbol: symbol.to_string(),
            timestamp: ts("2024-01-15 00:00:00") + chrono::Duration::minutes(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0,
        })
        .collect()
}

pub fn rising_bars(symbol: &str, count: usize, start_price: f64) -> Vec<Bar> {
    let closes: Vec<f64> = (0..count).map(|i| start_price + i as f64).collect();
    bars_from_closes(symbol, &closes)
}

/// Short warmup windows so tests run on small bar sets.
pub fn small_signal_config() -> SignalConfig {
    SignalConfig {
        ema_fast: 3,
        ema_slow: 5,
        macd_fast: 3,
        macd_slow: 6,
        macd_signal: 3,
        atr_period: 3,
        atr_multiplier: 3.0,
        trend_filter: false,
    }
}

pub fn sample_policy() -> TradeSizingPolicy {
    TradeSizingPolicy {
        amount_per_trade: 100.0,
        stop_loss_pct: 0.05,
        take_profit_pct: 0.10,
        allow_shorting: false,
    }
}

pub fn sample_session_config(symbol: &str) -> SessionConfig {
    SessionConfig {
        symbol: symbol.to_string(),
        initial_balance: 1000.0,
        signal: small_signal_config(),
        sizing: sample_policy(),
    }
}
