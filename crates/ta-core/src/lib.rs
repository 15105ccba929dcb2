//! Pure technical-analysis primitives over OHLCV candle series.
//!
//! Everything in this crate is synchronous and stateless between calls: the
//! caller hands in an immutable [`candle::CandleSeries`] and gets freshly
//! allocated output back.

pub mod candle;
pub mod config;
pub mod error;
pub mod indicators;
pub mod patterns;
pub mod trend;

pub use candle::{Candle, CandleSeries};
pub use config::{load_config, try_load_config, AnalysisConfig, FundingParams, SignalThresholds};
pub use error::TaError;
pub use indicators::{compute_indicators, IndicatorBundle, IndicatorParams, LatestReadings, Series};
pub use patterns::{detect_patterns, Bias, PatternEvent, PatternKind, PatternStrength};
pub use trend::{
    estimate_trend, TrendDirection, TrendEstimate, TrendHeuristic, TrendParams, TrendStrength,
};
