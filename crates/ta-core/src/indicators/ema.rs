use super::{RingBuf, Series};
use crate::candle::CandleSeries;

/// Simple moving average over a trailing window.
#[derive(Debug, Clone)]
pub struct Sma {
    ring: RingBuf,
}

impl Sma {
    pub fn new(window: usize) -> Self {
        Self {
            ring: RingBuf::new(window),
        }
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        self.ring.push(value);
        self.ring.full().then(|| self.ring.mean())
    }
}

/// Exponential moving average seeded with the SMA of the first `window` values.
///
/// Behaviour:
///   bars 0..window-2  → None
///   bar  window-1     → mean of the first `window` values
///   later bars        → α·price + (1−α)·prev   where α = 2/(window+1)
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f64,
    seed: RingBuf,
    value: Option<f64>,
}

impl Ema {
    pub fn new(window: usize) -> Self {
        Self {
            alpha: 2.0 / (window as f64 + 1.0),
            seed: RingBuf::new(window),
            value: None,
        }
    }

    /// Feed one price, return the current EMA value once seeded.
    pub fn update(&mut self, price: f64) -> Option<f64> {
        let next = match self.value {
            Some(prev) => price * self.alpha + prev * (1.0 - self.alpha),
            None => {
                self.seed.push(price);
                if !self.seed.full() {
                    return None;
                }
                self.seed.mean()
            }
        };
        self.value = Some(next);
        self.value
    }
}

/// SMA of arbitrary values (e.g. volume).
pub fn sma_values(values: &[f64], period: usize) -> Series {
    if period == 0 {
        return vec![None; values.len()];
    }
    let mut sma = Sma::new(period);
    values.iter().map(|&v| sma.update(v)).collect()
}

/// EMA of arbitrary values.
pub fn ema_values(values: &[f64], period: usize) -> Series {
    if period == 0 {
        return vec![None; values.len()];
    }
    let mut ema = Ema::new(period);
    values.iter().map(|&v| ema.update(v)).collect()
}

/// SMA of close.
pub fn sma(candles: &CandleSeries, period: usize) -> Series {
    sma_values(&candles.closes(), period)
}

/// EMA of close.
pub fn ema(candles: &CandleSeries, period: usize) -> Series {
    ema_values(&candles.closes(), period)
}
