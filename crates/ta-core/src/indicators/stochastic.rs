use serde::Serialize;

use super::ema::Sma;
use super::{RingBuf, Series};
use crate::candle::CandleSeries;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StochasticPoint {
    pub k: Option<f64>,
    pub d: Option<f64>,
}

/// Rolling highest-high / lowest-low window shared by %K and Williams %R.
#[derive(Debug, Clone)]
struct HighLowWindow {
    highs: RingBuf,
    lows: RingBuf,
}

impl HighLowWindow {
    fn new(window: usize) -> Self {
        Self {
            highs: RingBuf::new(window),
            lows: RingBuf::new(window),
        }
    }

    /// Returns `(highest_high, lowest_low)` once the window is full.
    fn push(&mut self, high: f64, low: f64) -> Option<(f64, f64)> {
        self.highs.push(high);
        self.lows.push(low);
        self.highs
            .full()
            .then(|| (self.highs.max(), self.lows.min()))
    }
}

/// Stochastic oscillator: %K over `window`, %D = SMA(`signal`) of %K.
///
/// A window with zero high-low range reports %K = 50.
#[derive(Debug, Clone)]
pub struct Stochastic {
    window: HighLowWindow,
    d: Sma,
}

impl Stochastic {
    pub fn new(window: usize, signal: usize) -> Self {
        Self {
            window: HighLowWindow::new(window),
            d: Sma::new(signal),
        }
    }

    pub fn update(&mut self, high: f64, low: f64, close: f64) -> StochasticPoint {
        let Some((hh, ll)) = self.window.push(high, low) else {
            return StochasticPoint::default();
        };
        let range = hh - ll;
        let k = if range > 0.0 {
            (close - ll) / range * 100.0
        } else {
            50.0
        };
        StochasticPoint {
            k: Some(k),
            d: self.d.update(k),
        }
    }
}

/// Williams %R: `(HH − close)/(HH − LL) × −100`; −50 on a zero range.
#[derive(Debug, Clone)]
pub struct WilliamsR {
    window: HighLowWindow,
}

impl WilliamsR {
    pub fn new(window: usize) -> Self {
        Self {
            window: HighLowWindow::new(window),
        }
    }

    pub fn update(&mut self, high: f64, low: f64, close: f64) -> Option<f64> {
        let (hh, ll) = self.window.push(high, low)?;
        let range = hh - ll;
        Some(if range > 0.0 {
            (hh - close) / range * -100.0
        } else {
            -50.0
        })
    }
}

pub fn stochastic(candles: &CandleSeries, period: usize, signal: usize) -> Vec<StochasticPoint> {
    if period == 0 || signal == 0 {
        return vec![StochasticPoint::default(); candles.len()];
    }
    let mut st = Stochastic::new(period, signal);
    candles
        .iter()
        .map(|c| st.update(c.high, c.low, c.close))
        .collect()
}

pub fn williams_r(candles: &CandleSeries, period: usize) -> Series {
    if period == 0 {
        return vec![None; candles.len()];
    }
    let mut wr = WilliamsR::new(period);
    candles
        .iter()
        .map(|c| wr.update(c.high, c.low, c.close))
        .collect()
}
