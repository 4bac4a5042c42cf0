//! Signal pipeline: bars in, BUY/SELL/HOLD out.
//!
//! A bar earns Buy when the fast EMA sits above the slow EMA and the MACD
//! line sits above its signal line (and, with the trend filter on, the
//! ATR trailing-stop direction is up); Sell is the strict mirror. Anything
//! else, including exact ties, is Hold. Bars inside the indicator warmup
//! window are emitted as Hold explicitly rather than omitted, so the
//! output series always lines up one-to-one with the input bars.

use std::fmt;

use crate::domain::bar::Bar;
use crate::domain::error::PapertraderError;
use crate::domain::indicator::ema::ema_values;
use crate::domain::indicator::trailing::DEFAULT_MULTIPLIER;
use crate::domain::indicator::{
    calculate_macd, calculate_trailing_bands, trend_directions, IndicatorValue,
};
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

/// A transition is a change onto an actionable signal. Repeated Buy (or
/// Sell) bars act only once; the ledger is driven by transitions, never
/// by every actionable bar.
pub fn is_transition(prev: Option<Signal>, current: Signal) -> bool {
    current != Signal::Hold && prev != Some(current)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalConfig {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub atr_period: usize,
    pub atr_multiplier: f64,
    pub trend_filter: bool,
}

impl Default for SignalConfig {
    fn default() -> Self {
        SignalConfig {
            ema_fast: 9,
            ema_slow: 21,
            macd_fast: DEFAULT_FAST,
            macd_slow: DEFAULT_SLOW,
            macd_signal: DEFAULT_SIGNAL,
            atr_period: 14,
            atr_multiplier: DEFAULT_MULTIPLIER,
            trend_filter: false,
        }
    }
}

impl SignalConfig {
    pub fn validate(&self) -> Result<(), PapertraderError> {
        let invalid = |key: &str, reason: &str| PapertraderError::ConfigInvalid {
            section: "signal".to_string(),
            key: key.to_string(),
            reason: reason.to_string(),
        };

        if self.ema_fast == 0 {
            return Err(invalid("ema_fast", "must be positive"));
        }
        if self.ema_slow == 0 {
            return Err(invalid("ema_slow", "must be positive"));
        }
        if self.ema_fast >= self.ema_slow {
            return Err(invalid("ema_fast", "must be less than ema_slow"));
        }
        if self.macd_fast == 0 {
            return Err(invalid("macd_fast", "must be positive"));
        }
        if self.macd_slow == 0 {
            return Err(invalid("macd_slow", "must be positive"));
        }
        if self.macd_signal == 0 {
            return Err(invalid("macd_signal", "must be positive"));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(invalid("macd_fast", "must be less than macd_slow"));
        }
        if self.atr_period == 0 {
            return Err(invalid("atr_period", "must be positive"));
        }
        if self.atr_multiplier <= 0.0 {
            return Err(invalid("atr_multiplier", "must be positive"));
        }
        Ok(())
    }

    /// Bars required before the last bar's signal is defined.
    pub fn min_bars(&self) -> usize {
        let macd_warmup = self.macd_slow + self.macd_signal - 1;
        let atr_warmup = if self.trend_filter { self.atr_period } else { 0 };
        self.ema_slow.max(macd_warmup).max(atr_warmup)
    }
}

/// Signal for the last bar of the sequence.
pub fn compute_signal(bars: &[Bar], config: &SignalConfig) -> Result<Signal, PapertraderError> {
    compute_signal_series(bars, config).map(|signals| *signals.last().unwrap_or(&Signal::Hold))
}

/// One signal per input bar, warmup bars included as Hold.
pub fn compute_signal_series(
    bars: &[Bar],
    config: &SignalConfig,
) -> Result<Vec<Signal>, PapertraderError> {
    config.validate()?;

    let need = config.min_bars();
    if bars.len() < need {
        return Err(PapertraderError::InsufficientData {
            symbol: bars.first().map(|b| b.symbol.clone()).unwrap_or_default(),
            have: bars.len(),
            need,
        });
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema_fast = ema_values(&closes, config.ema_fast);
    let ema_slow = ema_values(&closes, config.ema_slow);
    let macd = calculate_macd(bars, config.macd_fast, config.macd_slow, config.macd_signal);

    let directions = if config.trend_filter {
        let bands = calculate_trailing_bands(bars, config.atr_period, config.atr_multiplier);
        Some(trend_directions(bars, &bands))
    } else {
        None
    };

    let ema_warmup = config.ema_slow - 1;
    let mut signals = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        let macd_point = &macd.values[i];
        if i < ema_warmup || !macd_point.valid {
            signals.push(Signal::Hold);
            continue;
        }

        let (line, signal_line) = match macd_point.value {
            IndicatorValue::Macd { line, signal, .. } => (line, signal),
            _ => {
                signals.push(Signal::Hold);
                continue;
            }
        };

        let direction = directions.as_ref().map(|d| d[i]);

        let bullish = ema_fast[i] > ema_slow[i]
            && line > signal_line
            && direction.is_none_or(|d| d == 1);
        let bearish = ema_fast[i] < ema_slow[i]
            && line < signal_line
            && direction.is_none_or(|d| d == -1);

        signals.push(if bullish {
            Signal::Buy
        } else if bearish {
            Signal::Sell
        } else {
            Signal::Hold
        });
    }

    Ok(signals)
}
