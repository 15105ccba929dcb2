//! Funding-rate entry heuristic ("enter ahead of funding").
//!
//! The evaluator is pure: the current time is an argument. Use
//! [`evaluate_funding_strategy`] to read it from the wall clock instead.
//!
//! Rates are raw fractions throughout, so 0.0008 means 0.08 % per interval.

use serde::{Deserialize, Serialize};
use tracing::debug;

use ta_core::config::FundingParams;
use ta_core::TaError;

const HOUR_MS: i64 = 3_600_000;
const MINUTE_MS: i64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub size: f64,
}

/// Order-book snapshot; only the summed sizes per side are used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    #[serde(default)]
    pub bids: Vec<BookLevel>,
    #[serde(default)]
    pub asks: Vec<BookLevel>,
}

impl OrderBook {
    pub fn bid_volume(&self) -> f64 {
        self.bids.iter().map(|l| l.size).sum()
    }

    pub fn ask_volume(&self) -> f64 {
        self.asks.iter().map(|l| l.size).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    fn validate(&self) -> Result<(), TaError> {
        for level in self.bids.iter().chain(self.asks.iter()) {
            if !level.price.is_finite() || !level.size.is_finite() || level.size < 0.0 {
                return Err(TaError::InvalidParameter {
                    name: "order_book",
                    value: format!("{} @ {}", level.size, level.price),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingInputs {
    pub funding_rate: f64,
    /// Epoch milliseconds.
    pub next_funding_timestamp: i64,
    pub current_price: f64,
    #[serde(default)]
    pub order_book: Option<OrderBook>,
    #[serde(default)]
    pub open_interest: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FundingSignal {
    Long,
    Short,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalStrength {
    Weak,
    Medium,
    Strong,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingStrategyResult {
    pub signal: FundingSignal,
    pub strength: SignalStrength,
    /// 0..=100.
    pub confidence: f64,
    pub entry_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    /// Never below 1.
    pub leverage: f64,
    /// Percent of capital, 0..=10.
    pub position_size: f64,
    pub details: Vec<String>,
}

/// Evaluate against the current wall-clock time.
pub fn evaluate_funding_strategy(
    inputs: &FundingInputs,
    params: &FundingParams,
) -> Result<FundingStrategyResult, TaError> {
    evaluate_funding_strategy_at(inputs, chrono::Utc::now().timestamp_millis(), params)
}

pub fn evaluate_funding_strategy_at(
    inputs: &FundingInputs,
    now_ms: i64,
    p: &FundingParams,
) -> Result<FundingStrategyResult, TaError> {
    let rate = inputs.funding_rate;
    let price = inputs.current_price;
    if !rate.is_finite() {
        return Err(TaError::InvalidParameter {
            name: "funding_rate",
            value: rate.to_string(),
        });
    }
    if !price.is_finite() || price <= 0.0 {
        return Err(TaError::InvalidParameter {
            name: "current_price",
            value: price.to_string(),
        });
    }
    if let Some(book) = &inputs.order_book {
        book.validate()?;
    }

    let mut details = vec![
        format!("Funding rate: {:.4}%", rate * 100.0),
        format!(
            "Time to funding: {}",
            time_to_funding_label(inputs.next_funding_timestamp, now_ms)
        ),
    ];

    let signal = if rate > p.neutral_band {
        FundingSignal::Long
    } else if rate < -p.neutral_band {
        FundingSignal::Short
    } else {
        FundingSignal::Neutral
    };

    let magnitude = rate.abs();
    let (strength, mut confidence) = match signal {
        FundingSignal::Neutral => {
            details.push("Neutral funding: no clear direction".to_string());
            (SignalStrength::Weak, 0.0)
        }
        FundingSignal::Long | FundingSignal::Short => {
            details.push(match signal {
                FundingSignal::Long => "Positive funding: LONG bias".to_string(),
                _ => "Negative funding: SHORT bias".to_string(),
            });
            let strength = if magnitude > p.strong_threshold {
                SignalStrength::Strong
            } else {
                SignalStrength::Medium
            };
            (
                strength,
                (magnitude * p.confidence_scale).min(p.base_confidence_cap),
            )
        }
    };

    let until = inputs.next_funding_timestamp.saturating_sub(now_ms);
    if (0..p.near_funding_window_ms).contains(&until) {
        confidence += p.near_funding_bonus;
        details.push("Funding is close: confidence raised".to_string());
    }

    match &inputs.order_book {
        Some(book) if !book.is_empty() => {
            let bids = book.bid_volume();
            let asks = book.ask_volume();
            match signal {
                FundingSignal::Long if bids > asks * p.book_dominance_ratio => {
                    confidence += p.book_bonus;
                    details.push("Order book dominated by bids".to_string());
                }
                FundingSignal::Short if asks > bids * p.book_dominance_ratio => {
                    confidence += p.book_bonus;
                    details.push("Order book dominated by asks".to_string());
                }
                _ => {}
            }
        }
        _ => debug!("funding: no order book, skipping depth check"),
    }

    if let Some(oi) = inputs.open_interest.filter(|oi| *oi > 0.0) {
        details.push(format!("Open interest: {}", format_compact(oi)));
    }

    let confidence = confidence.min(p.confidence_ceiling);

    let mut out = FundingStrategyResult {
        signal,
        strength,
        confidence,
        entry_price: None,
        stop_loss: None,
        take_profit: None,
        leverage: 1.0,
        position_size: 0.0,
        details,
    };

    let side = match signal {
        FundingSignal::Long => 1.0,
        FundingSignal::Short => -1.0,
        FundingSignal::Neutral => return Ok(out),
    };
    out.entry_price = Some(price * (1.0 + side * p.entry_offset));
    out.stop_loss = Some(price * (1.0 - side * p.stop_offset));
    out.take_profit = Some(price * (1.0 + side * magnitude * p.target_multiplier));
    out.leverage = (magnitude * p.leverage_scale).min(p.leverage_cap).max(1.0);
    out.position_size = (confidence / p.position_size_divisor).min(p.position_size_cap);
    Ok(out)
}

/// Human label for the time left until funding.
pub fn time_to_funding_label(next_funding_ms: i64, now_ms: i64) -> String {
    let diff = next_funding_ms.saturating_sub(now_ms);
    if diff < 0 {
        return "funding already passed".to_string();
    }
    let hours = diff / HOUR_MS;
    let minutes = (diff % HOUR_MS) / MINUTE_MS;
    if hours == 0 {
        format!("less than 1 hour ({minutes} min)")
    } else if hours < 24 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{}d {}h", hours / 24, hours % 24)
    }
}

/// Two decimals with a K/M/B suffix.
pub fn format_compact(num: f64) -> String {
    if num >= 1e9 {
        format!("{:.2}B", num / 1e9)
    } else if num >= 1e6 {
        format!("{:.2}M", num / 1e6)
    } else if num >= 1e3 {
        format!("{:.2}K", num / 1e3)
    } else {
        format!("{num:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    fn inputs(rate: f64, minutes_to_funding: i64) -> FundingInputs {
        FundingInputs {
            funding_rate: rate,
            next_funding_timestamp: NOW + minutes_to_funding * MINUTE_MS,
            current_price: 100.0,
            order_book: None,
            open_interest: None,
        }
    }

    #[test]
    fn near_funding_long() {
        let r = evaluate_funding_strategy_at(&inputs(0.0008, 30), NOW, &FundingParams::default())
            .unwrap();
        assert_eq!(r.signal, FundingSignal::Long);
        assert_eq!(r.strength, SignalStrength::Strong);
        assert!((r.confidence - 90.0).abs() < 1e-9);
        assert!((r.entry_price.unwrap() - 100.1).abs() < 1e-9);
        assert!((r.stop_loss.unwrap() - 99.5).abs() < 1e-9);
        assert!((r.take_profit.unwrap() - 100.8).abs() < 1e-9);
        assert_eq!(r.leverage, 20.0);
        assert!((r.position_size - 9.0).abs() < 1e-9);
        assert!(r.details.iter().any(|d| d.contains("less than 1 hour (30 min)")));
    }

    #[test]
    fn short_side_mirrors_levels() {
        let r = evaluate_funding_strategy_at(&inputs(-0.0003, 120), NOW, &FundingParams::default())
            .unwrap();
        assert_eq!(r.signal, FundingSignal::Short);
        assert_eq!(r.strength, SignalStrength::Medium);
        assert!((r.confidence - 30.0).abs() < 1e-9);
        assert!(r.entry_price.unwrap() < 100.0);
        assert!(r.stop_loss.unwrap() > 100.0);
        assert!((r.take_profit.unwrap() - 99.7).abs() < 1e-9);
        assert!((r.leverage - 15.0).abs() < 1e-9);
    }

    #[test]
    fn neutral_band_is_inclusive() {
        let p = FundingParams::default();
        for rate in [0.0001, -0.0001, 0.0, 0.00005] {
            let r = evaluate_funding_strategy_at(&inputs(rate, 300), NOW, &p).unwrap();
            assert_eq!(r.signal, FundingSignal::Neutral);
            assert!(r.entry_price.is_none() && r.stop_loss.is_none() && r.take_profit.is_none());
            assert_eq!(r.leverage, 1.0);
            assert_eq!(r.position_size, 0.0);
        }
    }

    #[test]
    fn small_rate_leverage_floors_at_one() {
        let p = FundingParams {
            leverage_scale: 5_000.0,
            ..FundingParams::default()
        };
        let r = evaluate_funding_strategy_at(&inputs(0.00011, 300), NOW, &p).unwrap();
        assert_eq!(r.signal, FundingSignal::Long);
        assert_eq!(r.leverage, 1.0);
    }

    #[test]
    fn order_book_bonus_and_ceiling() {
        let mut i = inputs(0.002, 10);
        i.order_book = Some(OrderBook {
            bids: vec![BookLevel { price: 99.9, size: 30.0 }],
            asks: vec![BookLevel { price: 100.1, size: 10.0 }],
        });
        let r = evaluate_funding_strategy_at(&i, NOW, &FundingParams::default()).unwrap();
        // 90 + 10 + 15 capped
        assert_eq!(r.confidence, 100.0);
        assert_eq!(r.position_size, 10.0);
        assert!(r.details.iter().any(|d| d.contains("bids")));
    }

    #[test]
    fn book_against_signal_adds_nothing() {
        let mut i = inputs(0.0003, 600);
        i.order_book = Some(OrderBook {
            bids: vec![BookLevel { price: 99.9, size: 1.0 }],
            asks: vec![BookLevel { price: 100.1, size: 10.0 }],
        });
        let r = evaluate_funding_strategy_at(&i, NOW, &FundingParams::default()).unwrap();
        assert!((r.confidence - 30.0).abs() < 1e-9);
    }

    #[test]
    fn passed_funding_gets_no_bonus() {
        let r = evaluate_funding_strategy_at(&inputs(0.0003, -5), NOW, &FundingParams::default())
            .unwrap();
        assert!((r.confidence - 30.0).abs() < 1e-9);
        assert!(r.details.iter().any(|d| d.contains("funding already passed")));
    }

    #[test]
    fn rejects_bad_price() {
        let mut i = inputs(0.0003, 5);
        i.current_price = f64::NAN;
        assert!(evaluate_funding_strategy_at(&i, NOW, &FundingParams::default()).is_err());
    }

    #[test]
    fn extreme_funding_timestamps_saturate() {
        let p = FundingParams::default();
        let mut i = inputs(0.0003, 0);
        i.next_funding_timestamp = i64::MIN;
        let r = evaluate_funding_strategy_at(&i, NOW, &p).unwrap();
        assert!((r.confidence - 30.0).abs() < 1e-9);
        assert!(r.details.iter().any(|d| d.contains("funding already passed")));

        i.next_funding_timestamp = i64::MAX;
        let r = evaluate_funding_strategy_at(&i, -NOW, &p).unwrap();
        assert!((r.confidence - 30.0).abs() < 1e-9);
        assert_eq!(time_to_funding_label(i64::MIN, i64::MAX), "funding already passed");
    }

    #[test]
    fn labels() {
        assert_eq!(time_to_funding_label(NOW + 90 * MINUTE_MS, NOW), "1h 30m");
        assert_eq!(time_to_funding_label(NOW + 50 * HOUR_MS, NOW), "2d 2h");
        assert_eq!(time_to_funding_label(NOW - 1, NOW), "funding already passed");
        assert_eq!(format_compact(1_234_567.0), "1.23M");
        assert_eq!(format_compact(2_500_000_000.0), "2.50B");
        assert_eq!(format_compact(999.0), "999.00");
        assert_eq!(format_compact(12_346.0), "12.35K");
    }
}
