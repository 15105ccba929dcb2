use super::{RingBuf, Series};
use crate::candle::CandleSeries;

/// True range against the previous close.
#[inline]
pub fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    (high - low)
        .max((high - prev_close).abs())
        .max((low - prev_close).abs())
}

/// Average True Range: simple mean of the last `window` true ranges.
///
/// The first bar has no previous close and contributes no true range, so the
/// first value appears at index `window`.
#[derive(Debug, Clone)]
pub struct Atr {
    prev_close: Option<f64>,
    ring: RingBuf,
}

impl Atr {
    pub fn new(window: usize) -> Self {
        Self {
            prev_close: None,
            ring: RingBuf::new(window),
        }
    }

    pub fn update(&mut self, high: f64, low: f64, close: f64) -> Option<f64> {
        let prev = self.prev_close.replace(close)?;
        self.ring.push(true_range(high, low, prev));
        self.ring.full().then(|| self.ring.mean())
    }
}

pub fn atr(candles: &CandleSeries, period: usize) -> Series {
    if period == 0 {
        return vec![None; candles.len()];
    }
    let mut atr = Atr::new(period);
    candles
        .iter()
        .map(|c| atr.update(c.high, c.low, c.close))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Candle;

    fn bar(t: i64, h: f64, l: f64, c: f64) -> Candle {
        Candle {
            timestamp: t,
            open: c,
            high: h,
            low: l,
            close: c,
            volume: 1.0,
        }
    }

    #[test]
    fn true_range_uses_gap() {
        assert!((true_range(12.0, 11.0, 8.0) - 4.0).abs() < 1e-12);
        assert!((true_range(12.0, 10.0, 11.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn averages_trailing_true_ranges() {
        let s = CandleSeries::new(vec![
            bar(0, 10.0, 9.0, 9.5),
            bar(1, 11.0, 9.0, 10.0),  // TR 2
            bar(2, 10.5, 10.0, 10.2), // TR 0.5
            bar(3, 14.0, 10.0, 13.0), // TR 4
        ])
        .unwrap();
        let out = atr(&s, 2);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert!((out[2].unwrap() - 1.25).abs() < 1e-12);
        assert!((out[3].unwrap() - 2.25).abs() < 1e-12);
    }
}
