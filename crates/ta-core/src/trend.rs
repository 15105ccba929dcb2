//! Deterministic EMA-crossover price projection.
//!
//! This is a fixed formula, not a learned model; [`TrendHeuristic`] is a
//! closed enum so a caller always knows which rule produced an estimate.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::candle::CandleSeries;
use crate::indicators::ema::{ema_values, sma_values};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendParams {
    pub fast_period: usize,
    pub slow_period: usize,
    pub volume_period: usize,
    /// Below this many candles the last close is returned unchanged.
    pub min_candles: usize,
    pub damping: f64,
    pub volume_ratio_cap: f64,
    /// Percent move beyond which the label leaves neutral.
    pub neutral_band_pct: f64,
    pub strong_pct: f64,
    pub confidence_scale: f64,
    pub confidence_cap: f64,
}

impl Default for TrendParams {
    fn default() -> Self {
        Self {
            fast_period: 5,
            slow_period: 20,
            volume_period: 10,
            min_candles: 10,
            damping: 0.1,
            volume_ratio_cap: 2.0,
            neutral_band_pct: 2.0,
            strong_pct: 5.0,
            confidence_scale: 10.0,
            confidence_cap: 90.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendStrength {
    Weak,
    Medium,
    Strong,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendEstimate {
    pub predicted_price: f64,
    pub trend: TrendDirection,
    pub strength: TrendStrength,
    pub price_change_percent: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrendHeuristic {
    EmaCrossover(TrendParams),
}

impl Default for TrendHeuristic {
    fn default() -> Self {
        TrendHeuristic::EmaCrossover(TrendParams::default())
    }
}

impl TrendHeuristic {
    pub fn estimate(&self, candles: &CandleSeries) -> TrendEstimate {
        match self {
            TrendHeuristic::EmaCrossover(p) => {
                let last_close = candles.last().map_or(0.0, |c| c.close);
                let predicted = ema_crossover_projection(candles, p).unwrap_or(last_close);
                label(last_close, predicted, p)
            }
        }
    }
}

/// Estimate with the default EMA(5)/EMA(20) crossover rule.
pub fn estimate_trend(candles: &CandleSeries) -> TrendEstimate {
    TrendHeuristic::default().estimate(candles)
}

/// `last × (1 + factor × damping × direction × min(volume_ratio, cap))`.
///
/// `None` when the series is too short for the rule.
fn ema_crossover_projection(candles: &CandleSeries, p: &TrendParams) -> Option<f64> {
    let n = candles.len();
    if n < p.min_candles.max(1) {
        debug!(candles = n, "trend: short series, projecting last close");
        return None;
    }
    let closes = candles.closes();
    let volumes = candles.volumes();

    let fast = ema_values(&closes, p.fast_period.clamp(1, n));
    let slow = ema_values(&closes, p.slow_period.clamp(1, n));
    let vol_sma = sma_values(&volumes, p.volume_period.clamp(1, n));

    let last_close = *closes.last()?;
    let fast_last = (*fast.last()?)?;
    let slow_last = (*slow.last()?)?;
    let last_volume = *volumes.last()?;

    let direction = if fast_last > slow_last { 1.0 } else { -1.0 };
    let volume_ratio = match vol_sma.last().copied().flatten() {
        Some(avg) if avg > 0.0 => last_volume / avg,
        _ => {
            debug!("trend: zero average volume, volume ratio set to 0");
            0.0
        }
    };
    let factor = if slow_last != 0.0 {
        (fast_last - slow_last) / slow_last
    } else {
        0.0
    };

    Some(last_close * (1.0 + factor * p.damping * direction * volume_ratio.min(p.volume_ratio_cap)))
}

fn label(last_close: f64, predicted: f64, p: &TrendParams) -> TrendEstimate {
    let pct = if last_close != 0.0 {
        (predicted - last_close) / last_close * 100.0
    } else {
        0.0
    };
    let strength_for = |magnitude: f64| {
        if magnitude > p.strong_pct {
            TrendStrength::Strong
        } else {
            TrendStrength::Medium
        }
    };
    let (trend, strength) = if pct > p.neutral_band_pct {
        (TrendDirection::Bullish, strength_for(pct))
    } else if pct < -p.neutral_band_pct {
        (TrendDirection::Bearish, strength_for(-pct))
    } else {
        (TrendDirection::Neutral, TrendStrength::Weak)
    };
    TrendEstimate {
        predicted_price: predicted,
        trend,
        strength,
        price_change_percent: pct,
        confidence: (pct.abs() * p.confidence_scale).min(p.confidence_cap),
    }
}
