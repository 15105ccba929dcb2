use serde::Serialize;

use super::RingBuf;
use crate::candle::CandleSeries;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IchimokuPoint {
    pub conversion: Option<f64>,
    pub base: Option<f64>,
    pub span_a: Option<f64>,
    pub span_b: Option<f64>,
    /// Close from `base` bars ago.
    pub lagging: Option<f64>,
}

#[derive(Debug, Clone)]
struct Midpoint {
    highs: RingBuf,
    lows: RingBuf,
}

impl Midpoint {
    fn new(window: usize) -> Self {
        Self {
            highs: RingBuf::new(window),
            lows: RingBuf::new(window),
        }
    }

    fn push(&mut self, high: f64, low: f64) -> Option<f64> {
        self.highs.push(high);
        self.lows.push(low);
        self.highs
            .full()
            .then(|| (self.highs.max() + self.lows.min()) / 2.0)
    }
}

/// Ichimoku lines as trailing high-low midpoints, reported at the bar they are
/// computed on (no forward displacement). Nothing is defined until the
/// `span_b` window is full.
#[derive(Debug, Clone)]
pub struct Ichimoku {
    conversion: Midpoint,
    base: Midpoint,
    span_b: Midpoint,
    closes: RingBuf,
}

impl Ichimoku {
    pub fn new(conversion: usize, base: usize, span_b: usize) -> Self {
        Self {
            conversion: Midpoint::new(conversion),
            base: Midpoint::new(base),
            span_b: Midpoint::new(span_b),
            closes: RingBuf::new(base + 1),
        }
    }

    pub fn update(&mut self, high: f64, low: f64, close: f64) -> IchimokuPoint {
        let conversion = self.conversion.push(high, low);
        let base = self.base.push(high, low);
        let span_b = self.span_b.push(high, low);
        self.closes.push(close);

        let (Some(conversion), Some(base), Some(span_b)) = (conversion, base, span_b) else {
            return IchimokuPoint::default();
        };
        IchimokuPoint {
            conversion: Some(conversion),
            base: Some(base),
            span_a: Some((conversion + base) / 2.0),
            span_b: Some(span_b),
            lagging: self.closes.full().then(|| self.closes.oldest()).flatten(),
        }
    }
}

pub fn ichimoku(
    candles: &CandleSeries,
    conversion: usize,
    base: usize,
    span_b: usize,
) -> Vec<IchimokuPoint> {
    if conversion == 0 || base == 0 || span_b == 0 {
        return vec![IchimokuPoint::default(); candles.len()];
    }
    let mut ind = Ichimoku::new(conversion, base, span_b);
    candles
        .iter()
        .map(|c| ind.update(c.high, c.low, c.close))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candle::test_support::series_from_closes;

    #[test]
    fn needs_full_span_b_window() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let s = series_from_closes(&closes);
        let out = ichimoku(&s, 9, 26, 52);
        assert!(out[..51].iter().all(|p| *p == IchimokuPoint::default()));
        let p = out[51];
        assert!(p.conversion.is_some() && p.span_b.is_some());
        assert_eq!(p.lagging, Some(closes[51 - 26]));
    }

    #[test]
    fn lines_on_linear_trend() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let s = series_from_closes(&closes);
        let p = ichimoku(&s, 9, 26, 52)[59];
        // highs are close+1, lows are previous close-1: nine-bar window spans 149..160
        assert!((p.conversion.unwrap() - (160.0 + 149.0) / 2.0).abs() < 1e-9);
        assert!(p.span_a.unwrap() > p.span_b.unwrap());
    }

    #[test]
    fn lagging_tracks_close_from_base_bars_ago() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i * 7 % 11) as f64).collect();
        let s = series_from_closes(&closes);
        let out = ichimoku(&s, 9, 26, 52);
        for (i, p) in out.iter().enumerate().skip(51) {
            assert_eq!(p.lagging, Some(closes[i - 26]), "bar {i}");
        }
    }

    #[test]
    fn lagging_needs_one_more_bar_than_base() {
        let closes: Vec<f64> = (0..8).map(|i| 50.0 + i as f64).collect();
        let s = series_from_closes(&closes);
        let out = ichimoku(&s, 2, 5, 3);
        assert_eq!(out[3], IchimokuPoint::default());
        assert!(out[4].base.is_some());
        assert_eq!(out[4].lagging, None);
        assert_eq!(out[5].lagging, Some(closes[0]));
        assert_eq!(out[7].lagging, Some(closes[2]));
    }
}

