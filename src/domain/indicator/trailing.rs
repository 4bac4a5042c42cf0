//! ATR trailing stop bands and trend direction.
//!
//! long_stop  = hl2 - mult * ATR
//! short_stop = hl2 + mult * ATR
//!
//! Direction flips to +1 when close crosses above the prior bar's
//! short_stop, to -1 when close crosses below the prior bar's long_stop,
//! and otherwise carries the previous direction forward (initial +1).
//! The fold makes the forward-fill explicit instead of mutating a cached
//! column in place.

use crate::domain::bar::Bar;
use crate::domain::indicator::{
    calculate_atr, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};

pub const DEFAULT_MULTIPLIER: f64 = 3.0;

pub fn calculate_trailing_bands(bars: &[Bar], period: usize, multiplier: f64) -> IndicatorSeries {
    let indicator_type = IndicatorType::TrailingBands {
        period,
        mult_x100: (multiplier * 100.0).round() as u32,
    };

    if period == 0 || bars.is_empty() {
        return IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        };
    }

    let atr = calculate_atr(bars, period);

    let values = bars
        .iter()
        .zip(&atr.values)
        .map(|(bar, atr_point)| {
            let atr_value = match atr_point.value {
                IndicatorValue::Simple(v) => v,
                _ => 0.0,
            };
            let hl2 = bar.hl2();
            IndicatorPoint {
                timestamp: bar.timestamp,
                valid: atr_point.valid,
                value: IndicatorValue::Bands {
                    long_stop: hl2 - multiplier * atr_value,
                    short_stop: hl2 + multiplier * atr_value,
                },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

/// Per-bar trend direction (+1 or -1) from the trailing bands.
///
/// `bands` must be the series produced by [`calculate_trailing_bands`]
/// over the same bars.
pub fn trend_directions(bars: &[Bar], bands: &IndicatorSeries) -> Vec<i8> {
    let mut directions = Vec::with_capacity(bars.len());
    let mut direction: i8 = 1;

    for (i, bar) in bars.iter().enumerate() {
        if i > 0 {
            if let Some(prev) = bands.values.get(i - 1).filter(|p| p.valid) {
                if let IndicatorValue::Bands {
                    long_stop,
                    short_stop,
                } = prev.value
                {
                    if bar.close > short_stop {
                        direction = 1;
                    } else if bar.close < long_stop {
                        direction = -1;
                    }
                }
            }
        }
        directions.push(direction);
    }

    directions
}
