use super::rsi::relative_strength;
use super::{RingBuf, Series};
use crate::candle::{Candle, CandleSeries};

/// Money Flow Index: RSI-shaped ratio of positive to negative raw money flow
/// (typical price × volume, signed by the typical-price change).
///
/// 100 when the window has no negative flow.
#[derive(Debug, Clone)]
pub struct Mfi {
    prev_tp: Option<f64>,
    flows: RingBuf,
}

impl Mfi {
    pub fn new(window: usize) -> Self {
        Self {
            prev_tp: None,
            flows: RingBuf::new(window),
        }
    }

    pub fn update(&mut self, bar: &Candle) -> Option<f64> {
        let tp = bar.typical_price();
        let prev = self.prev_tp.replace(tp)?;

        let raw = tp * bar.volume;
        let flow = if tp > prev {
            raw
        } else if tp < prev {
            -raw
        } else {
            0.0
        };
        self.flows.push(flow);
        if !self.flows.full() {
            return None;
        }

        let positive: f64 = self.flows.iter().filter(|f| *f > 0.0).sum();
        let negative: f64 = self.flows.iter().filter(|f| *f < 0.0).map(f64::abs).sum();
        Some(relative_strength(positive, negative))
    }
}

pub fn mfi(candles: &CandleSeries, period: usize) -> Series {
    if period == 0 {
        return vec![None; candles.len()];
    }
    let mut mfi = Mfi::new(period);
    candles.iter().map(|c| mfi.update(c)).collect()
}
