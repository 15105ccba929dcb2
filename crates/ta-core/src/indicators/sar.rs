use super::Series;
use crate::candle::CandleSeries;

#[derive(Debug, Clone, Copy)]
enum SarState {
    Empty,
    Seeded {
        high: f64,
        low: f64,
        close: f64,
    },
    Running {
        long: bool,
        sar: f64,
        ep: f64, // extreme point of the current regime
        af: f64,
        prev_high: f64,
        prev_low: f64,
        prev2_high: f64,
        prev2_low: f64,
    },
}

/// Parabolic SAR with acceleration `step` capped at `max`.
///
/// Bar 0 only seeds state. Bar 1 opens a long regime when its close is not
/// below bar 0's close (SAR = low[0], EP = high[1]), otherwise a short one
/// (SAR = high[0], EP = low[1]).
#[derive(Debug, Clone)]
pub struct ParabolicSar {
    step: f64,
    max: f64,
    state: SarState,
}

impl ParabolicSar {
    pub fn new(step: f64, max: f64) -> Self {
        Self {
            step,
            max,
            state: SarState::Empty,
        }
    }

    pub fn update(&mut self, high: f64, low: f64, close: f64) -> Option<f64> {
        match self.state {
            SarState::Empty => {
                self.state = SarState::Seeded { high, low, close };
                None
            }
            SarState::Seeded {
                high: h0,
                low: l0,
                close: c0,
            } => {
                let long = close >= c0;
                let sar = if long { l0 } else { h0 };
                self.state = SarState::Running {
                    long,
                    sar,
                    ep: if long { high } else { low },
                    af: self.step,
                    prev_high: high,
                    prev_low: low,
                    prev2_high: h0,
                    prev2_low: l0,
                };
                Some(sar)
            }
            SarState::Running {
                mut long,
                sar,
                mut ep,
                mut af,
                prev_high,
                prev_low,
                prev2_high,
                prev2_low,
            } => {
                let mut next = sar + af * (ep - sar);
                if long {
                    next = next.min(prev_low).min(prev2_low);
                    if low < next {
                        long = false;
                        next = ep;
                        ep = low;
                        af = self.step;
                    } else if high > ep {
                        ep = high;
                        af = (af + self.step).min(self.max);
                    }
                } else {
                    next = next.max(prev_high).max(prev2_high);
                    if high > next {
                        long = true;
                        next = ep;
                        ep = high;
                        af = self.step;
                    } else if low < ep {
                        ep = low;
                        af = (af + self.step).min(self.max);
                    }
                }
                self.state = SarState::Running {
                    long,
                    sar: next,
                    ep,
                    af,
                    prev_high: high,
                    prev_low: low,
                    prev2_high: prev_high,
                    prev2_low: prev_low,
                };
                Some(next)
            }
        }
    }
}

pub fn parabolic_sar(candles: &CandleSeries, step: f64, max: f64) -> Series {
    let mut sar = ParabolicSar::new(step, max);
    candles
        .iter()
        .map(|c| sar.update(c.high, c.low, c.close))
        .collect()
}
