use super::Series;
use crate::candle::{Candle, CandleSeries};

/// On-Balance Volume, starting at 0 on the first bar.
#[derive(Debug, Clone, Default)]
pub struct Obv {
    prev_close: Option<f64>,
    value: f64,
}

impl Obv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, close: f64, volume: f64) -> f64 {
        if let Some(prev) = self.prev_close.replace(close) {
            if close > prev {
                self.value += volume;
            } else if close < prev {
                self.value -= volume;
            }
        }
        self.value
    }
}

/// Volume signed by the close-over-close direction; 0 on ties and on bar 0.
#[derive(Debug, Clone, Default)]
pub struct VolumeDelta {
    prev_close: Option<f64>,
}

impl VolumeDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, close: f64, volume: f64) -> f64 {
        match self.prev_close.replace(close) {
            Some(prev) if close > prev => volume,
            Some(prev) if close < prev => -volume,
            _ => 0.0,
        }
    }
}

/// Cumulative VWAP from the start of the series (no session reset).
///
/// Undefined while cumulative volume is still zero.
#[derive(Debug, Clone, Default)]
pub struct Vwap {
    cum_pv: f64,
    cum_volume: f64,
}

impl Vwap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bar: &Candle) -> Option<f64> {
        self.cum_pv += bar.typical_price() * bar.volume;
        self.cum_volume += bar.volume;
        (self.cum_volume > 0.0).then(|| self.cum_pv / self.cum_volume)
    }
}

pub fn obv(candles: &CandleSeries) -> Series {
    let mut obv = Obv::new();
    candles
        .iter()
        .map(|c| Some(obv.update(c.close, c.volume)))
        .collect()
}

pub fn volume_delta(candles: &CandleSeries) -> Series {
    let mut delta = VolumeDelta::new();
    candles
        .iter()
        .map(|c| Some(delta.update(c.close, c.volume)))
        .collect()
}

pub fn vwap(candles: &CandleSeries) -> Series {
    let mut vwap = Vwap::new();
    candles.iter().map(|c| vwap.update(c)).collect()
}
