//! Indicator library.
//!
//! Every indicator is an incremental state machine fed one bar at a time
//! (`update`) plus a batch function that allocates a fresh state, walks the
//! whole series and returns an output aligned 1:1 with the input. Batch calls
//! share nothing, so calling them twice on the same input yields identical
//! output.
//!
//! Positions without enough history hold `None`. No indicator ever stores a
//! NaN: each division that can degenerate has a documented fallback.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod cci;
pub mod ema;
pub mod ichimoku;
pub mod macd;
pub mod mfi;
pub mod rsi;
pub mod sar;
pub mod stochastic;
pub mod volume;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::candle::{Candle, CandleSeries};
use crate::error::TaError;

pub use bollinger::BollingerPoint;
pub use ichimoku::IchimokuPoint;
pub use macd::MacdPoint;
pub use stochastic::StochasticPoint;

/// Indicator output aligned with the candle series; `None` = not computable yet.
pub type Series = Vec<Option<f64>>;

/// Most recent defined value of a series, with its index.
pub fn latest(series: &[Option<f64>]) -> Option<(usize, f64)> {
    series
        .iter()
        .enumerate()
        .rev()
        .find_map(|(i, v)| v.map(|v| (i, v)))
}

/// Ring buffer for rolling-window computations (SMA, BB, stochastic, CCI, ...).
#[derive(Debug, Clone)]
pub struct RingBuf {
    buf: Vec<f64>,
    pos: usize,
    len: usize,
    cap: usize,
}

impl RingBuf {
    /// `capacity` must be non-zero; batch functions short-circuit zero periods.
    pub fn new(capacity: usize) -> Self {
        let cap = capacity.max(1);
        Self {
            buf: vec![0.0; cap],
            pos: 0,
            len: 0,
            cap,
        }
    }

    pub fn push(&mut self, val: f64) {
        self.buf[self.pos] = val;
        self.pos = (self.pos + 1) % self.cap;
        if self.len < self.cap {
            self.len += 1;
        }
    }

    pub fn full(&self) -> bool {
        self.len == self.cap
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over values in insertion order (oldest first).
    pub fn iter(&self) -> RingBufIter<'_> {
        RingBufIter {
            buf: &self.buf,
            start: if self.len < self.cap { 0 } else { self.pos },
            count: 0,
            total: self.len,
            cap: self.cap,
        }
    }

    pub fn oldest(&self) -> Option<f64> {
        self.iter().next()
    }

    pub fn sum(&self) -> f64 {
        self.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        self.sum() / self.len as f64
    }

    /// Population standard deviation (ddof=0).
    pub fn std_pop(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        let mean = self.mean();
        let var = self.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / self.len as f64;
        var.sqrt()
    }

    /// Mean absolute deviation around the window mean.
    pub fn mean_abs_dev(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        let mean = self.mean();
        self.iter().map(|v| (v - mean).abs()).sum::<f64>() / self.len as f64
    }

    pub fn min(&self) -> f64 {
        self.iter().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.iter().fold(f64::NEG_INFINITY, f64::max)
    }
}

pub struct RingBufIter<'a> {
    buf: &'a [f64],
    start: usize,
    count: usize,
    total: usize,
    cap: usize,
}

impl<'a> Iterator for RingBufIter<'a> {
    type Item = f64;
    fn next(&mut self) -> Option<f64> {
        if self.count >= self.total {
            return None;
        }
        let idx = (self.start + self.count) % self.cap;
        self.count += 1;
        Some(self.buf[idx])
    }
}

/// Periods and multipliers for every indicator in the bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub sma_period: usize,
    pub ema_period: usize,
    pub rsi_period: usize,

    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,

    pub bb_period: usize,
    pub bb_num_std: f64,

    pub stoch_period: usize,
    pub stoch_signal: usize,

    pub atr_period: usize,
    pub williams_period: usize,
    pub cci_period: usize,
    pub mfi_period: usize,
    pub adx_period: usize,

    pub sar_step: f64,
    pub sar_max: f64,

    pub ichimoku_conversion: usize,
    pub ichimoku_base: usize,
    pub ichimoku_span_b: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            sma_period: 20,
            ema_period: 20,
            rsi_period: 14,

            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,

            bb_period: 20,
            bb_num_std: 2.0,

            stoch_period: 14,
            stoch_signal: 3,

            atr_period: 14,
            williams_period: 14,
            cci_period: 20,
            mfi_period: 14,
            adx_period: 14,

            sar_step: 0.02,
            sar_max: 0.2,

            ichimoku_conversion: 9,
            ichimoku_base: 26,
            ichimoku_span_b: 52,
        }
    }
}

impl IndicatorParams {
    /// Reject zero periods and non-positive multipliers before any computation.
    pub fn validate(&self) -> Result<(), TaError> {
        let periods = [
            ("sma_period", self.sma_period),
            ("ema_period", self.ema_period),
            ("rsi_period", self.rsi_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("bb_period", self.bb_period),
            ("stoch_period", self.stoch_period),
            ("stoch_signal", self.stoch_signal),
            ("atr_period", self.atr_period),
            ("williams_period", self.williams_period),
            ("cci_period", self.cci_period),
            ("mfi_period", self.mfi_period),
            ("adx_period", self.adx_period),
            ("ichimoku_conversion", self.ichimoku_conversion),
            ("ichimoku_base", self.ichimoku_base),
            ("ichimoku_span_b", self.ichimoku_span_b),
        ];
        for (name, period) in periods {
            if period == 0 {
                return Err(TaError::invalid_param(name, period));
            }
        }
        let multipliers = [
            ("bb_num_std", self.bb_num_std),
            ("sar_step", self.sar_step),
            ("sar_max", self.sar_max),
        ];
        for (name, value) in multipliers {
            if !value.is_finite() || value <= 0.0 {
                return Err(TaError::invalid_param(name, value));
            }
        }
        if self.sar_step > self.sar_max {
            return Err(TaError::invalid_param("sar_step", self.sar_step));
        }
        Ok(())
    }
}

/// Every indicator series for one candle series, aligned by index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorBundle {
    pub params: IndicatorParams,
    pub sma: Series,
    pub ema: Series,
    pub rsi: Series,
    pub macd: Vec<MacdPoint>,
    pub bollinger: Vec<BollingerPoint>,
    pub stochastic: Vec<StochasticPoint>,
    pub atr: Series,
    pub williams_r: Series,
    pub cci: Series,
    pub mfi: Series,
    pub obv: Series,
    /// DX per window (single smoothing pass), see [`adx`].
    pub adx: Series,
    pub parabolic_sar: Series,
    pub ichimoku: Vec<IchimokuPoint>,
    pub volume_delta: Series,
    pub vwap: Series,
}

/// Latest defined MACD triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdReading {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandReading {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StochasticReading {
    pub k: f64,
    pub d: f64,
}

/// Most recent defined value of each indicator in a bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatestReadings {
    pub sma: Option<f64>,
    pub ema: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<MacdReading>,
    pub bollinger: Option<BandReading>,
    pub stochastic: Option<StochasticReading>,
    pub atr: Option<f64>,
    pub williams_r: Option<f64>,
    pub cci: Option<f64>,
    pub mfi: Option<f64>,
    pub obv: Option<f64>,
    pub adx: Option<f64>,
    pub parabolic_sar: Option<f64>,
    pub volume_delta: Option<f64>,
    pub vwap: Option<f64>,
}

impl IndicatorBundle {
    pub fn len(&self) -> usize {
        self.sma.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sma.is_empty()
    }

    pub fn latest(&self) -> LatestReadings {
        let value = |s: &Series| latest(s).map(|(_, v)| v);
        LatestReadings {
            sma: value(&self.sma),
            ema: value(&self.ema),
            rsi: value(&self.rsi),
            macd: self.macd.iter().rev().find_map(|p| match (p.macd, p.signal, p.histogram) {
                (Some(macd), Some(signal), Some(histogram)) => Some(MacdReading {
                    macd,
                    signal,
                    histogram,
                }),
                _ => None,
            }),
            bollinger: self.bollinger.iter().rev().find_map(|p| match (p.upper, p.middle, p.lower) {
                (Some(upper), Some(middle), Some(lower)) => Some(BandReading {
                    upper,
                    middle,
                    lower,
                }),
                _ => None,
            }),
            stochastic: self.stochastic.iter().rev().find_map(|p| match (p.k, p.d) {
                (Some(k), Some(d)) => Some(StochasticReading { k, d }),
                _ => None,
            }),
            atr: value(&self.atr),
            williams_r: value(&self.williams_r),
            cci: value(&self.cci),
            mfi: value(&self.mfi),
            obv: value(&self.obv),
            adx: value(&self.adx),
            parabolic_sar: value(&self.parabolic_sar),
            volume_delta: value(&self.volume_delta),
            vwap: value(&self.vwap),
        }
    }
}

/// Aggregated incremental state for one candle series. Fed bar by bar.
struct IndicatorBank {
    sma: ema::Sma,
    ema: ema::Ema,
    rsi: rsi::Rsi,
    macd: macd::MacdIndicator,
    bb: bollinger::BollingerBands,
    stoch: stochastic::Stochastic,
    atr: atr::Atr,
    williams: stochastic::WilliamsR,
    cci: cci::Cci,
    mfi: mfi::Mfi,
    obv: volume::Obv,
    dx: adx::Dx,
    sar: sar::ParabolicSar,
    ichimoku: ichimoku::Ichimoku,
    delta: volume::VolumeDelta,
    vwap: volume::Vwap,
}

impl IndicatorBank {
    fn new(p: &IndicatorParams) -> Self {
        Self {
            sma: ema::Sma::new(p.sma_period),
            ema: ema::Ema::new(p.ema_period),
            rsi: rsi::Rsi::new(p.rsi_period),
            macd: macd::MacdIndicator::new(p.macd_fast, p.macd_slow, p.macd_signal),
            bb: bollinger::BollingerBands::new(p.bb_period, p.bb_num_std),
            stoch: stochastic::Stochastic::new(p.stoch_period, p.stoch_signal),
            atr: atr::Atr::new(p.atr_period),
            williams: stochastic::WilliamsR::new(p.williams_period),
            cci: cci::Cci::new(p.cci_period),
            mfi: mfi::Mfi::new(p.mfi_period),
            obv: volume::Obv::new(),
            dx: adx::Dx::new(p.adx_period),
            sar: sar::ParabolicSar::new(p.sar_step, p.sar_max),
            ichimoku: ichimoku::Ichimoku::new(
                p.ichimoku_conversion,
                p.ichimoku_base,
                p.ichimoku_span_b,
            ),
            delta: volume::VolumeDelta::new(),
            vwap: volume::Vwap::new(),
        }
    }

    fn update(&mut self, bar: &Candle, out: &mut IndicatorBundle) {
        out.sma.push(self.sma.update(bar.close));
        out.ema.push(self.ema.update(bar.close));
        out.rsi.push(self.rsi.update(bar.close));
        out.macd.push(self.macd.update(bar.close));
        out.bollinger.push(self.bb.update(bar.close));
        out.stochastic.push(self.stoch.update(bar.high, bar.low, bar.close));
        out.atr.push(self.atr.update(bar.high, bar.low, bar.close));
        out.williams_r.push(self.williams.update(bar.high, bar.low, bar.close));
        out.cci.push(self.cci.update(bar));
        out.mfi.push(self.mfi.update(bar));
        out.obv.push(Some(self.obv.update(bar.close, bar.volume)));
        out.adx.push(self.dx.update(bar.high, bar.low, bar.close).map(|o| o.dx));
        out.parabolic_sar.push(self.sar.update(bar.high, bar.low, bar.close));
        out.ichimoku.push(self.ichimoku.update(bar.high, bar.low, bar.close));
        out.volume_delta.push(Some(self.delta.update(bar.close, bar.volume)));
        out.vwap.push(self.vwap.update(bar));
    }
}

/// Compute every indicator for `candles` in a single pass.
pub fn compute_indicators(
    candles: &CandleSeries,
    params: &IndicatorParams,
) -> Result<IndicatorBundle, TaError> {
    params.validate()?;

    let n = candles.len();
    let mut out = IndicatorBundle {
        params: params.clone(),
        sma: Vec::with_capacity(n),
        ema: Vec::with_capacity(n),
        rsi: Vec::with_capacity(n),
        macd: Vec::with_capacity(n),
        bollinger: Vec::with_capacity(n),
        stochastic: Vec::with_capacity(n),
        atr: Vec::with_capacity(n),
        williams_r: Vec::with_capacity(n),
        cci: Vec::with_capacity(n),
        mfi: Vec::with_capacity(n),
        obv: Vec::with_capacity(n),
        adx: Vec::with_capacity(n),
        parabolic_sar: Vec::with_capacity(n),
        ichimoku: Vec::with_capacity(n),
        volume_delta: Vec::with_capacity(n),
        vwap: Vec::with_capacity(n),
    };

    let mut bank = IndicatorBank::new(params);
    for bar in candles.iter() {
        bank.update(bar, &mut out);
    }

    debug!(candles = n, "indicator bundle computed");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candle::test_support::series_from_closes;

    #[test]
    fn ring_buf_wraps_oldest_first() {
        let mut r = RingBuf::new(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            r.push(v);
        }
        assert!(r.full());
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
        assert_eq!(r.oldest(), Some(2.0));
        assert!((r.mean() - 3.0).abs() < 1e-12);
        assert!((r.mean_abs_dev() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(r.min(), 2.0);
        assert_eq!(r.max(), 4.0);
    }

    #[test]
    fn latest_skips_trailing_none() {
        let s = vec![None, Some(1.0), Some(2.0), None];
        assert_eq!(latest(&s), Some((2, 2.0)));
        assert_eq!(latest(&[None, None]), None);
    }

    #[test]
    fn validate_rejects_zero_period() {
        let p = IndicatorParams {
            rsi_period: 0,
            ..IndicatorParams::default()
        };
        assert!(matches!(
            p.validate(),
            Err(TaError::InvalidParameter { name: "rsi_period", .. })
        ));
    }

    #[test]
    fn validate_rejects_sar_step_above_max() {
        let p = IndicatorParams {
            sar_step: 0.5,
            sar_max: 0.2,
            ..IndicatorParams::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn bundle_series_are_aligned() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        let candles = series_from_closes(&closes);
        let b = compute_indicators(&candles, &IndicatorParams::default()).unwrap();
        for len in [
            b.sma.len(),
            b.ema.len(),
            b.rsi.len(),
            b.macd.len(),
            b.bollinger.len(),
            b.stochastic.len(),
            b.atr.len(),
            b.williams_r.len(),
            b.cci.len(),
            b.mfi.len(),
            b.obv.len(),
            b.adx.len(),
            b.parabolic_sar.len(),
            b.ichimoku.len(),
            b.volume_delta.len(),
            b.vwap.len(),
        ] {
            assert_eq!(len, 60);
        }
        let latest = b.latest();
        assert!(latest.rsi.is_some());
        assert!(latest.macd.is_some());
        assert!(latest.bollinger.is_some());
        assert!(latest.stochastic.is_some());
    }

    #[test]
    fn empty_series_gives_empty_bundle() {
        let candles = CandleSeries::new(Vec::new()).unwrap();
        let b = compute_indicators(&candles, &IndicatorParams::default()).unwrap();
        assert!(b.is_empty());
        assert_eq!(b.latest(), LatestReadings::default());
    }
}
