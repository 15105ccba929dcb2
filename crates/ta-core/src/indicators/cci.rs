use super::{RingBuf, Series};
use crate::candle::{Candle, CandleSeries};

/// Relative size below which a mean deviation counts as zero. Summing N equal
/// floats and dividing by N does not always return the same float, so an
/// exact `== 0.0` test would misfire on flat windows.
const FLAT_TOLERANCE: f64 = 1e-12;

/// Commodity Channel Index over typical price.
///
/// `(tp − SMA(tp)) / (0.015 × mean |tp − SMA(tp)|)`; 0 when the window is flat.
#[derive(Debug, Clone)]
pub struct Cci {
    ring: RingBuf,
}

impl Cci {
    pub fn new(window: usize) -> Self {
        Self {
            ring: RingBuf::new(window),
        }
    }

    pub fn update(&mut self, bar: &Candle) -> Option<f64> {
        let tp = bar.typical_price();
        self.ring.push(tp);
        if !self.ring.full() {
            return None;
        }
        let mean = self.ring.mean();
        let mean_dev = self.ring.mean_abs_dev();
        if mean_dev <= mean.abs().max(1.0) * FLAT_TOLERANCE {
            return Some(0.0);
        }
        Some((tp - mean) / (0.015 * mean_dev))
    }
}

pub fn cci(candles: &CandleSeries, period: usize) -> Series {
    if period == 0 {
        return vec![None; candles.len()];
    }
    let mut cci = Cci::new(period);
    candles.iter().map(|c| cci.update(c)).collect()
}
