//! Unweighted indicator voting.
//!
//! Four indicators vote from their latest defined reading: RSI, MACD,
//! Bollinger Bands and Stochastic. An indicator with no defined reading does
//! not vote, so `buy + sell + neutral` always equals the number evaluated.

use serde::Serialize;

use ta_core::config::SignalThresholds;
use ta_core::indicators::LatestReadings;
use ta_core::IndicatorBundle;

use crate::Signal;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignalTally {
    pub buy: u32,
    pub sell: u32,
    pub neutral: u32,
    /// One line per evaluated indicator, in evaluation order.
    pub rationale: Vec<String>,
}

/// Direction of a tally; ties are `Mixed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Consensus {
    Buy,
    Sell,
    Mixed,
}

impl SignalTally {
    pub fn evaluated(&self) -> u32 {
        self.buy + self.sell + self.neutral
    }

    pub fn consensus(&self) -> Consensus {
        use std::cmp::Ordering;
        match self.buy.cmp(&self.sell) {
            Ordering::Greater => Consensus::Buy,
            Ordering::Less => Consensus::Sell,
            Ordering::Equal => Consensus::Mixed,
        }
    }

    fn vote(&mut self, signal: Signal, why: String) {
        match signal {
            Signal::Buy => self.buy += 1,
            Signal::Sell => self.sell += 1,
            Signal::Neutral => self.neutral += 1,
        }
        self.rationale.push(why);
    }
}

pub fn aggregate_signals(
    bundle: &IndicatorBundle,
    price: f64,
    thresholds: &SignalThresholds,
) -> SignalTally {
    aggregate_readings(&bundle.latest(), price, thresholds)
}

pub fn aggregate_readings(
    latest: &LatestReadings,
    price: f64,
    th: &SignalThresholds,
) -> SignalTally {
    let mut tally = SignalTally::default();

    if let Some(rsi) = latest.rsi {
        if rsi < th.rsi_oversold {
            tally.vote(Signal::Buy, format!("RSI {rsi:.2}: oversold (buy)"));
        } else if rsi > th.rsi_overbought {
            tally.vote(Signal::Sell, format!("RSI {rsi:.2}: overbought (sell)"));
        } else {
            tally.vote(Signal::Neutral, format!("RSI {rsi:.2}: neutral"));
        }
    }

    if let Some(m) = latest.macd {
        if m.macd > m.signal {
            tally.vote(Signal::Buy, "MACD: line above signal (bullish crossover)".to_string());
        } else {
            tally.vote(Signal::Sell, "MACD: line at or below signal (bearish crossover)".to_string());
        }
    }

    if let Some(bb) = latest.bollinger {
        if price < bb.lower {
            tally.vote(Signal::Buy, "BB: price below lower band (buy)".to_string());
        } else if price > bb.upper {
            tally.vote(Signal::Sell, "BB: price above upper band (sell)".to_string());
        } else {
            tally.vote(Signal::Neutral, "BB: price inside bands".to_string());
        }
    }

    if let Some(st) = latest.stochastic {
        if st.k < th.stoch_oversold && st.d < th.stoch_oversold {
            tally.vote(Signal::Buy, "Stochastic: oversold".to_string());
        } else if st.k > th.stoch_overbought && st.d > th.stoch_overbought {
            tally.vote(Signal::Sell, "Stochastic: overbought".to_string());
        } else {
            tally.vote(Signal::Neutral, "Stochastic: neutral".to_string());
        }
    }

    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use ta_core::indicators::{BandReading, MacdReading, StochasticReading};

    fn readings() -> LatestReadings {
        LatestReadings {
            rsi: Some(25.0),
            macd: Some(MacdReading {
                macd: 1.0,
                signal: 0.5,
                histogram: 0.5,
            }),
            bollinger: Some(BandReading {
                upper: 110.0,
                middle: 100.0,
                lower: 90.0,
            }),
            stochastic: Some(StochasticReading { k: 85.0, d: 82.0 }),
            ..LatestReadings::default()
        }
    }

    #[test]
    fn votes_per_indicator() {
        let t = aggregate_readings(&readings(), 100.0, &SignalThresholds::default());
        assert_eq!((t.buy, t.sell, t.neutral), (2, 1, 1));
        assert_eq!(t.rationale.len(), 4);
        assert!(t.rationale[0].starts_with("RSI"));
        assert_eq!(t.consensus(), Consensus::Buy);
    }

    #[test]
    fn undefined_readings_do_not_vote() {
        let latest = LatestReadings {
            rsi: Some(50.0),
            ..LatestReadings::default()
        };
        let t = aggregate_readings(&latest, 1.0, &SignalThresholds::default());
        assert_eq!(t.evaluated(), 1);
        assert_eq!(t.rationale.len(), 1);

        let none = aggregate_readings(&LatestReadings::default(), 1.0, &SignalThresholds::default());
        assert_eq!(none, SignalTally::default());
        assert_eq!(none.consensus(), Consensus::Mixed);
    }

    #[test]
    fn macd_equal_to_signal_is_a_sell() {
        let latest = LatestReadings {
            macd: Some(MacdReading {
                macd: 0.3,
                signal: 0.3,
                histogram: 0.0,
            }),
            ..LatestReadings::default()
        };
        let t = aggregate_readings(&latest, 1.0, &SignalThresholds::default());
        assert_eq!(t.sell, 1);
    }

    #[test]
    fn price_outside_bands() {
        let th = SignalThresholds::default();
        let low = aggregate_readings(&readings(), 80.0, &th);
        let high = aggregate_readings(&readings(), 120.0, &th);
        // rsi buy, macd buy, bb buy, stoch sell
        assert_eq!((low.buy, low.sell), (3, 1));
        assert_eq!((high.buy, high.sell), (2, 2));
        assert_eq!(high.consensus(), Consensus::Mixed);
    }

    #[test]
    fn stochastic_needs_both_lines() {
        let latest = LatestReadings {
            stochastic: Some(StochasticReading { k: 10.0, d: 30.0 }),
            ..LatestReadings::default()
        };
        let t = aggregate_readings(&latest, 1.0, &SignalThresholds::default());
        assert_eq!(t.neutral, 1);
    }
}
