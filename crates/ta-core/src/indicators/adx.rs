//! Directional movement index.
//!
//! Algorithm:
//! 1. +DM / −DM and true range from consecutive bars
//! 2. Simple average of each over the trailing `window` moves
//! 3. +DI = avg(+DM) / avg(TR) × 100,  −DI = avg(−DM) / avg(TR) × 100
//! 4. DX  = |+DI − −DI| / (+DI + −DI) × 100
//!
//! The value reported under the `adx` name is this per-window DX. There is no
//! second Wilder pass over DX, so it reacts faster and is noisier than a
//! textbook ADX.

use super::atr::true_range;
use super::{RingBuf, Series};
use crate::candle::CandleSeries;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DxOutput {
    pub plus_di: f64,
    pub minus_di: f64,
    pub dx: f64,
}

#[derive(Debug, Clone)]
pub struct Dx {
    prev: Option<(f64, f64, f64)>, // (high, low, close)
    plus_dm: RingBuf,
    minus_dm: RingBuf,
    tr: RingBuf,
}

impl Dx {
    pub fn new(window: usize) -> Self {
        Self {
            prev: None,
            plus_dm: RingBuf::new(window),
            minus_dm: RingBuf::new(window),
            tr: RingBuf::new(window),
        }
    }

    pub fn update(&mut self, high: f64, low: f64, close: f64) -> Option<DxOutput> {
        let (prev_high, prev_low, prev_close) = self.prev.replace((high, low, close))?;

        let up = high - prev_high;
        let down = prev_low - low;
        self.plus_dm.push(if up > down && up > 0.0 { up } else { 0.0 });
        self.minus_dm.push(if down > up && down > 0.0 { down } else { 0.0 });
        self.tr.push(true_range(high, low, prev_close));

        if !self.tr.full() {
            return None;
        }

        let avg_tr = self.tr.mean();
        if avg_tr <= 0.0 {
            return Some(DxOutput {
                plus_di: 0.0,
                minus_di: 0.0,
                dx: 0.0,
            });
        }
        let plus_di = self.plus_dm.mean() / avg_tr * 100.0;
        let minus_di = self.minus_dm.mean() / avg_tr * 100.0;
        let di_sum = plus_di + minus_di;
        let dx = if di_sum > 0.0 {
            (plus_di - minus_di).abs() / di_sum * 100.0
        } else {
            0.0
        };
        Some(DxOutput {
            plus_di,
            minus_di,
            dx,
        })
    }
}

/// DX series (see module docs).
pub fn adx(candles: &CandleSeries, period: usize) -> Series {
    if period == 0 {
        return vec![None; candles.len()];
    }
    let mut dx = Dx::new(period);
    candles
        .iter()
        .map(|c| dx.update(c.high, c.low, c.close).map(|o| o.dx))
        .collect()
}
