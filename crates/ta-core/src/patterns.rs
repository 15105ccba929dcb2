//! Candlestick pattern classifier.
//!
//! Every index from 2 onward is tested against each predicate independently;
//! several patterns can fire on the same bar. Events come out ordered by
//! index, then by the declaration order of [`PatternKind`].

use serde::{Deserialize, Serialize};

use crate::candle::{Candle, CandleSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternKind {
    Hammer,
    ShootingStar,
    Doji,
    BullishEngulfing,
    BearishEngulfing,
    MorningStar,
    EveningStar,
    ThreeWhiteSoldiers,
    ThreeBlackCrows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternStrength {
    Weak,
    Strong,
    VeryStrong,
}

impl PatternKind {
    pub const ALL: [PatternKind; 9] = [
        PatternKind::Hammer,
        PatternKind::ShootingStar,
        PatternKind::Doji,
        PatternKind::BullishEngulfing,
        PatternKind::BearishEngulfing,
        PatternKind::MorningStar,
        PatternKind::EveningStar,
        PatternKind::ThreeWhiteSoldiers,
        PatternKind::ThreeBlackCrows,
    ];

    pub fn bias(self) -> Bias {
        match self {
            PatternKind::Hammer
            | PatternKind::BullishEngulfing
            | PatternKind::MorningStar
            | PatternKind::ThreeWhiteSoldiers => Bias::Bullish,
            PatternKind::ShootingStar
            | PatternKind::BearishEngulfing
            | PatternKind::EveningStar
            | PatternKind::ThreeBlackCrows => Bias::Bearish,
            PatternKind::Doji => Bias::Neutral,
        }
    }

    pub fn strength(self) -> PatternStrength {
        match self {
            PatternKind::Doji => PatternStrength::Weak,
            PatternKind::Hammer
            | PatternKind::ShootingStar
            | PatternKind::BullishEngulfing
            | PatternKind::BearishEngulfing => PatternStrength::Strong,
            PatternKind::MorningStar
            | PatternKind::EveningStar
            | PatternKind::ThreeWhiteSoldiers
            | PatternKind::ThreeBlackCrows => PatternStrength::VeryStrong,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PatternKind::Hammer => "Hammer",
            PatternKind::ShootingStar => "Shooting Star",
            PatternKind::Doji => "Doji",
            PatternKind::BullishEngulfing => "Bullish Engulfing",
            PatternKind::BearishEngulfing => "Bearish Engulfing",
            PatternKind::MorningStar => "Morning Star",
            PatternKind::EveningStar => "Evening Star",
            PatternKind::ThreeWhiteSoldiers => "Three White Soldiers",
            PatternKind::ThreeBlackCrows => "Three Black Crows",
        }
    }

    /// `window` is `[prev2, prev, current]`.
    fn matches(self, window: &[Candle; 3]) -> bool {
        let [first, middle, current] = window;
        match self {
            PatternKind::Hammer => is_hammer(current),
            PatternKind::ShootingStar => is_shooting_star(current),
            PatternKind::Doji => is_doji(current),
            PatternKind::BullishEngulfing => is_bullish_engulfing(middle, current),
            PatternKind::BearishEngulfing => is_bearish_engulfing(middle, current),
            PatternKind::MorningStar => is_morning_star(first, middle, current),
            PatternKind::EveningStar => is_evening_star(first, middle, current),
            PatternKind::ThreeWhiteSoldiers => is_three_white_soldiers(window),
            PatternKind::ThreeBlackCrows => is_three_black_crows(window),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternEvent {
    pub index: usize,
    pub kind: PatternKind,
    pub bias: Bias,
    pub strength: PatternStrength,
}

impl PatternEvent {
    fn new(index: usize, kind: PatternKind) -> Self {
        Self {
            index,
            kind,
            bias: kind.bias(),
            strength: kind.strength(),
        }
    }
}

pub fn detect_patterns(candles: &CandleSeries) -> Vec<PatternEvent> {
    let bars = candles.as_slice();
    let mut events = Vec::new();
    for (offset, window) in bars.windows(3).enumerate() {
        let Ok(window) = <&[Candle; 3]>::try_from(window) else {
            continue;
        };
        let index = offset + 2;
        events.extend(
            PatternKind::ALL
                .iter()
                .filter(|kind| kind.matches(window))
                .map(|&kind| PatternEvent::new(index, kind)),
        );
    }
    events
}

fn is_hammer(c: &Candle) -> bool {
    let body = c.body();
    c.lower_shadow() > 2.0 * body && c.upper_shadow() < body
}

fn is_shooting_star(c: &Candle) -> bool {
    let body = c.body();
    c.upper_shadow() > 2.0 * body && c.lower_shadow() < body
}

fn is_doji(c: &Candle) -> bool {
    c.body() <= c.range() * 0.1
}

fn is_bullish_engulfing(prev: &Candle, cur: &Candle) -> bool {
    prev.is_bearish() && cur.is_bullish() && cur.open < prev.close && cur.close > prev.open
}

fn is_bearish_engulfing(prev: &Candle, cur: &Candle) -> bool {
    prev.is_bullish() && cur.is_bearish() && cur.open > prev.close && cur.close < prev.open
}

fn is_morning_star(first: &Candle, middle: &Candle, third: &Candle) -> bool {
    first.is_bearish()
        && middle.body() < first.body() * 0.3
        && third.is_bullish()
        && third.close > first.midpoint()
}

fn is_evening_star(first: &Candle, middle: &Candle, third: &Candle) -> bool {
    first.is_bullish()
        && middle.body() < first.body() * 0.3
        && third.is_bearish()
        && third.close < first.midpoint()
}

/// Share of the range between the low and the close; `None` on a zero range.
fn close_location(c: &Candle) -> Option<f64> {
    let range = c.range();
    (range > 0.0).then(|| (c.close - c.low) / range)
}

fn is_three_white_soldiers(w: &[Candle; 3]) -> bool {
    w.iter()
        .all(|c| c.is_bullish() && close_location(c).is_some_and(|loc| loc >= 0.6))
        && w[1].open > w[0].open
        && w[2].open > w[1].open
}

fn is_three_black_crows(w: &[Candle; 3]) -> bool {
    w.iter()
        .all(|c| c.is_bearish() && close_location(c).is_some_and(|loc| loc <= 0.4))
        && w[1].open < w[0].open
        && w[2].open < w[1].open
}
