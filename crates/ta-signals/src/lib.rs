//! Decision layer on top of `ta-core`: indicator votes, the funding-rate
//! entry heuristic, and the combined assessment report.

use serde::Serialize;
use std::fmt;

pub mod aggregate;
pub mod assessment;
pub mod funding;
pub mod levels;
pub mod recommend;

pub use aggregate::{aggregate_signals, Consensus, SignalTally};
pub use assessment::{assess, Assessment, MarketSnapshot};
pub use funding::{
    evaluate_funding_strategy, evaluate_funding_strategy_at, BookLevel, FundingInputs,
    FundingSignal, FundingStrategyResult, OrderBook, SignalStrength,
};
pub use levels::{support_resistance, Level, LevelStrength, Levels};
pub use recommend::{recommendations, Recommendation, RecommendationKind};

/// Vote cast by a single indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    Neutral,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "buy"),
            Signal::Sell => write!(f, "sell"),
            Signal::Neutral => write!(f, "neutral"),
        }
    }
}
