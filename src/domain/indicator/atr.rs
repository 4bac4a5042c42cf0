//! Average True Range indicator.
//!
//! ATR = EMA(true_range, period), with TR[0] = high - low (no prior close)
//! and TR[i] = max(high-low, |high-prev_close|, |low-prev_close|).
//! Warmup: first (period-1) bars are invalid.

use crate::domain::bar::Bar;
use crate::domain::indicator::ema::ema_values;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};

pub fn calculate_atr(bars: &[Bar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries {
            indicator_type: IndicatorType::Atr(period),
            values: Vec::new(),
        };
    }

    let tr = true_ranges(bars);
    let raw = ema_values(&tr, period);

    let values = bars
        .iter()
        .zip(raw)
        .enumerate()
        .map(|(i, (bar, atr))| IndicatorPoint {
            timestamp: bar.timestamp,
            valid: i >= period - 1,
            value: IndicatorValue::Simple(atr),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values,
    }
}

pub(crate) fn true_ranges(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}
