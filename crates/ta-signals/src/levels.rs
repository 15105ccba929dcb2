use serde::Serialize;

use ta_core::indicators::LatestReadings;
use ta_core::IndicatorParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelStrength {
    Medium,
    Strong,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Level {
    pub price: f64,
    pub source: String,
    pub strength: LevelStrength,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Levels {
    pub support: Vec<Level>,
    pub resistance: Vec<Level>,
}

/// Bollinger bands bound the price from both sides; the moving averages
/// count as support when price is above them and resistance otherwise.
pub fn support_resistance(latest: &LatestReadings, params: &IndicatorParams, price: f64) -> Levels {
    let mut levels = Levels::default();

    if let Some(bb) = latest.bollinger {
        levels.support.push(Level {
            price: bb.lower,
            source: "Bollinger lower band".to_string(),
            strength: LevelStrength::Strong,
        });
        levels.resistance.push(Level {
            price: bb.upper,
            source: "Bollinger upper band".to_string(),
            strength: LevelStrength::Strong,
        });
    }

    let averages = [
        (latest.sma, format!("SMA {}", params.sma_period)),
        (latest.ema, format!("EMA {}", params.ema_period)),
    ];
    for (value, source) in averages {
        let Some(avg) = value else { continue };
        let level = Level {
            price: avg,
            source,
            strength: LevelStrength::Medium,
        };
        if price > avg {
            levels.support.push(level);
        } else {
            levels.resistance.push(level);
        }
    }

    levels
}
