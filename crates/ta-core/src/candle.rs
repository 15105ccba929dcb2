use serde::{Deserialize, Serialize};

use crate::error::TaError;

/// One OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64, // open time (ms since epoch)
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    #[inline]
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    #[inline]
    pub fn upper_shadow(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    #[inline]
    pub fn lower_shadow(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    #[inline]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    #[inline]
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// (high + low + close) / 3
    #[inline]
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Midpoint of the real body.
    #[inline]
    pub fn midpoint(&self) -> f64 {
        (self.open + self.close) / 2.0
    }

    fn check(&self, index: usize) -> Result<(), TaError> {
        let fields = [self.open, self.high, self.low, self.close, self.volume];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(TaError::InvalidCandle {
                index,
                reason: "non-finite price or volume".to_string(),
            });
        }
        if self.volume < 0.0 {
            return Err(TaError::InvalidCandle {
                index,
                reason: format!("negative volume {}", self.volume),
            });
        }
        if self.low > self.open.min(self.close) {
            return Err(TaError::InvalidCandle {
                index,
                reason: format!("low {} above body {}", self.low, self.open.min(self.close)),
            });
        }
        if self.high < self.open.max(self.close) {
            return Err(TaError::InvalidCandle {
                index,
                reason: format!("high {} below body {}", self.high, self.open.max(self.close)),
            });
        }
        Ok(())
    }
}

/// Validated, immutable candle sequence. Index 0 is the oldest bar.
///
/// The only way to build one is [`CandleSeries::new`], so every series handed
/// to the indicator library already satisfies the OHLC shape rules and has
/// strictly increasing timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(candles: Vec<Candle>) -> Result<Self, TaError> {
        for (i, c) in candles.iter().enumerate() {
            c.check(i)?;
            if i > 0 {
                let previous = candles[i - 1].timestamp;
                if c.timestamp <= previous {
                    return Err(TaError::NonMonotonicTimestamp {
                        index: i,
                        previous,
                        current: c.timestamp,
                    });
                }
            }
        }
        Ok(Self { candles })
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }
}

impl TryFrom<Vec<Candle>> for CandleSeries {
    type Error = TaError;

    fn try_from(candles: Vec<Candle>) -> Result<Self, Self::Error> {
        Self::new(candles)
    }
}

impl<'de> Deserialize<'de> for CandleSeries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let candles = Vec::<Candle>::deserialize(deserializer)?;
        CandleSeries::new(candles).map_err(serde::de::Error::custom)
    }
}
