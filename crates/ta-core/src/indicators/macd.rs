use serde::Serialize;

use super::ema::Ema;
use crate::candle::CandleSeries;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MacdPoint {
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub histogram: Option<f64>,
}

/// MACD line = EMA(fast) − EMA(slow); signal = EMA(signal) of the MACD line.
///
/// The signal EMA is fed only once the MACD line exists, so its warm-up
/// starts at the first defined MACD value.
#[derive(Debug, Clone)]
pub struct MacdIndicator {
    ema_fast: Ema,
    ema_slow: Ema,
    ema_signal: Ema,
}

impl MacdIndicator {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            ema_fast: Ema::new(fast),
            ema_slow: Ema::new(slow),
            ema_signal: Ema::new(signal),
        }
    }

    pub fn update(&mut self, close: f64) -> MacdPoint {
        let fast = self.ema_fast.update(close);
        let slow = self.ema_slow.update(close);
        let macd = match (fast, slow) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        };
        let signal = macd.and_then(|m| self.ema_signal.update(m));
        let histogram = match (macd, signal) {
            (Some(m), Some(s)) => Some(m - s),
            _ => None,
        };
        MacdPoint {
            macd,
            signal,
            histogram,
        }
    }
}

pub fn macd(candles: &CandleSeries, fast: usize, slow: usize, signal: usize) -> Vec<MacdPoint> {
    if fast == 0 || slow == 0 || signal == 0 {
        return vec![MacdPoint::default(); candles.len()];
    }
    let mut ind = MacdIndicator::new(fast, slow, signal);
    candles.iter().map(|c| ind.update(c.close)).collect()
}
