//! One-call technical assessment of a single instrument.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ta_core::config::AnalysisConfig;
use ta_core::indicators::LatestReadings;
use ta_core::{
    compute_indicators, detect_patterns, CandleSeries, PatternEvent, TaError, TrendEstimate,
    TrendHeuristic,
};

use crate::aggregate::{aggregate_readings, SignalTally};
use crate::funding::{evaluate_funding_strategy_at, FundingInputs, FundingStrategyResult, OrderBook};
use crate::levels::{support_resistance, Levels};
use crate::recommend::{recommendations, Recommendation};

/// Derivatives-market facts for the instrument, as supplied by the data
/// source. The price comes from the assessment itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub funding_rate: f64,
    /// Epoch milliseconds.
    pub next_funding_timestamp: i64,
    #[serde(default)]
    pub order_book: Option<OrderBook>,
    #[serde(default)]
    pub open_interest: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub candles: usize,
    pub price: f64,
    pub indicators: LatestReadings,
    pub patterns: Vec<PatternEvent>,
    pub signals: SignalTally,
    pub trend: TrendEstimate,
    pub funding: Option<FundingStrategyResult>,
    pub recommendations: Vec<Recommendation>,
    pub levels: Levels,
}

/// Run every analysis over `candles`.
///
/// `price` defaults to the last close. `now_ms` is only used to time the
/// funding window when `market` is present.
pub fn assess(
    candles: &CandleSeries,
    price: Option<f64>,
    market: Option<&MarketSnapshot>,
    cfg: &AnalysisConfig,
    now_ms: i64,
) -> Result<Assessment, TaError> {
    let price = match price.or_else(|| candles.last().map(|c| c.close)) {
        Some(p) if p.is_finite() && p > 0.0 => p,
        other => {
            return Err(TaError::InvalidParameter {
                name: "price",
                value: other.map_or_else(|| "missing".to_string(), |p| p.to_string()),
            })
        }
    };

    let bundle = compute_indicators(candles, &cfg.indicators)?;
    let latest = bundle.latest();
    let patterns = detect_patterns(candles);
    let signals = aggregate_readings(&latest, price, &cfg.signals);
    let trend = TrendHeuristic::EmaCrossover(cfg.trend.clone()).estimate(candles);

    let funding = match market {
        Some(m) => {
            let inputs = FundingInputs {
                funding_rate: m.funding_rate,
                next_funding_timestamp: m.next_funding_timestamp,
                current_price: price,
                order_book: m.order_book.clone(),
                open_interest: m.open_interest,
            };
            Some(evaluate_funding_strategy_at(&inputs, now_ms, &cfg.funding)?)
        }
        None => {
            debug!("no market snapshot, funding strategy skipped");
            None
        }
    };

    let recommendations = recommendations(&signals, &trend, &latest, price, &cfg.signals);
    let levels = support_resistance(&latest, &cfg.indicators, price);

    info!(
        candles = candles.len(),
        patterns = patterns.len(),
        buy = signals.buy,
        sell = signals.sell,
        "assessment complete"
    );

    Ok(Assessment {
        candles: candles.len(),
        price,
        indicators: latest,
        patterns,
        signals,
        trend,
        funding,
        recommendations,
        levels,
    })
}
