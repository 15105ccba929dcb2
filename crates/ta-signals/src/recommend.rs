use serde::Serialize;

use ta_core::config::SignalThresholds;
use ta_core::indicators::LatestReadings;
use ta_core::{TrendDirection, TrendEstimate};

use crate::aggregate::{Consensus, SignalTally};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Consensus,
    Trend,
    Rsi,
    Macd,
    Bollinger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub text: String,
}

impl Recommendation {
    fn new(kind: RecommendationKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Plain-language reading of a tally, a trend estimate and the latest
/// indicator values. The consensus and trend lines are always present; the
/// indicator lines only when the reading is at an extreme.
pub fn recommendations(
    tally: &SignalTally,
    trend: &TrendEstimate,
    latest: &LatestReadings,
    price: f64,
    th: &SignalThresholds,
) -> Vec<Recommendation> {
    use RecommendationKind as K;

    let mut out = vec![Recommendation::new(
        K::Consensus,
        match tally.consensus() {
            Consensus::Buy => "Buy signals dominate",
            Consensus::Sell => "Sell signals dominate",
            Consensus::Mixed => "Mixed signals: caution advised",
        },
    )];

    let strength = strength_label(trend);
    out.push(Recommendation::new(
        K::Trend,
        match trend.trend {
            TrendDirection::Bullish => format!("Trend heuristic projects an uptrend ({strength})"),
            TrendDirection::Bearish => format!("Trend heuristic projects a downtrend ({strength})"),
            TrendDirection::Neutral => "Trend heuristic projects sideways movement".to_string(),
        },
    ));

    if let Some(rsi) = latest.rsi {
        if rsi < th.rsi_oversold {
            out.push(Recommendation::new(K::Rsi, "RSI oversold: a bounce is possible"));
        } else if rsi > th.rsi_overbought {
            out.push(Recommendation::new(K::Rsi, "RSI overbought: a pullback is possible"));
        }
    }

    if let Some(m) = latest.macd {
        if m.macd > m.signal && m.histogram > 0.0 {
            out.push(Recommendation::new(K::Macd, "MACD shows bullish momentum"));
        } else if m.macd < m.signal && m.histogram < 0.0 {
            out.push(Recommendation::new(K::Macd, "MACD shows bearish momentum"));
        }
    }

    if let Some(bb) = latest.bollinger {
        if price < bb.lower {
            out.push(Recommendation::new(
                K::Bollinger,
                "Price below the lower Bollinger band: a bounce is possible",
            ));
        } else if price > bb.upper {
            out.push(Recommendation::new(
                K::Bollinger,
                "Price above the upper Bollinger band: a pullback is possible",
            ));
        }
    }

    out
}

fn strength_label(trend: &TrendEstimate) -> &'static str {
    match trend.strength {
        ta_core::TrendStrength::Weak => "weak",
        ta_core::TrendStrength::Medium => "medium",
        ta_core::TrendStrength::Strong => "strong",
    }
}
