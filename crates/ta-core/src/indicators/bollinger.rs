use serde::Serialize;

use super::RingBuf;
use crate::candle::CandleSeries;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BollingerPoint {
    pub upper: Option<f64>,
    pub middle: Option<f64>,
    pub lower: Option<f64>,
}

/// Bollinger Bands: rolling SMA ± `num_std` × population std dev (ddof=0).
#[derive(Debug, Clone)]
pub struct BollingerBands {
    ring: RingBuf,
    num_std: f64,
}

impl BollingerBands {
    pub fn new(window: usize, num_std: f64) -> Self {
        Self {
            ring: RingBuf::new(window),
            num_std,
        }
    }

    pub fn update(&mut self, close: f64) -> BollingerPoint {
        self.ring.push(close);
        if !self.ring.full() {
            return BollingerPoint::default();
        }
        let middle = self.ring.mean();
        let band = self.num_std * self.ring.std_pop();
        BollingerPoint {
            upper: Some(middle + band),
            middle: Some(middle),
            lower: Some(middle - band),
        }
    }
}

pub fn bollinger(candles: &CandleSeries, period: usize, num_std: f64) -> Vec<BollingerPoint> {
    if period == 0 {
        return vec![BollingerPoint::default(); candles.len()];
    }
    let mut bb = BollingerBands::new(period, num_std);
    candles.iter().map(|c| bb.update(c.close)).collect()
}
