use super::{RingBuf, Series};
use crate::candle::CandleSeries;

/// RSI over a trailing window of close-to-close deltas (simple averages).
///
/// The first value appears once `window` deltas exist, i.e. at index
/// `window`. When the average loss is exactly zero the value is 100.
#[derive(Debug, Clone)]
pub struct Rsi {
    prev_close: Option<f64>,
    gains: RingBuf,
    losses: RingBuf,
}

impl Rsi {
    pub fn new(window: usize) -> Self {
        Self {
            prev_close: None,
            gains: RingBuf::new(window),
            losses: RingBuf::new(window),
        }
    }

    pub fn update(&mut self, close: f64) -> Option<f64> {
        let prev = self.prev_close.replace(close)?;

        let change = close - prev;
        self.gains.push(if change > 0.0 { change } else { 0.0 });
        self.losses.push(if change < 0.0 { -change } else { 0.0 });

        if !self.gains.full() {
            return None;
        }
        Some(relative_strength(self.gains.mean(), self.losses.mean()))
    }
}

/// `100 - 100/(1+up/down)`, or 100 when `down` is zero. Shared with MFI.
pub(crate) fn relative_strength(up: f64, down: f64) -> f64 {
    if down == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + up / down)
    }
}

pub fn rsi(candles: &CandleSeries, period: usize) -> Series {
    if period == 0 {
        return vec![None; candles.len()];
    }
    let mut rsi = Rsi::new(period);
    candles.iter().map(|c| rsi.update(c.close)).collect()
}
