//! YAML configuration with layered overrides.
//!
//! ```yaml
//! global:
//!   indicators: { rsi_period: 21 }
//!   funding: { leverage_cap: 10.0 }
//! symbols:
//!   BTCUSDT:
//!     signals: { rsi_oversold: 25.0 }
//! ```
//!
//! Resolution order: built-in defaults <- `global` <- `symbols.<SYMBOL>`.
//! Keys absent from a layer keep the value from the layer below.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::TaError;
use crate::indicators::IndicatorParams;
use crate::trend::TrendParams;

/// Vote thresholds used by the signal aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalThresholds {
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub stoch_oversold: f64,
    pub stoch_overbought: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            stoch_oversold: 20.0,
            stoch_overbought: 80.0,
        }
    }
}

/// Constants of the funding-rate entry heuristic. Rates are raw fractions
/// (0.0001 = 0.01 % per funding interval).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundingParams {
    /// |rate| at or below this is NEUTRAL.
    pub neutral_band: f64,
    /// |rate| above this is STRONG.
    pub strong_threshold: f64,

    pub confidence_scale: f64,
    pub base_confidence_cap: f64,
    pub near_funding_window_ms: i64,
    pub near_funding_bonus: f64,
    /// One book side must exceed the other by this ratio to add `book_bonus`.
    pub book_dominance_ratio: f64,
    pub book_bonus: f64,
    pub confidence_ceiling: f64,

    pub entry_offset: f64,
    pub stop_offset: f64,
    pub target_multiplier: f64,

    pub leverage_scale: f64,
    pub leverage_cap: f64,
    pub position_size_divisor: f64,
    pub position_size_cap: f64,
}

impl Default for FundingParams {
    fn default() -> Self {
        Self {
            neutral_band: 0.0001,
            strong_threshold: 0.0005,

            confidence_scale: 100_000.0,
            base_confidence_cap: 90.0,
            near_funding_window_ms: 3_600_000,
            near_funding_bonus: 10.0,
            book_dominance_ratio: 1.2,
            book_bonus: 15.0,
            confidence_ceiling: 100.0,

            entry_offset: 0.001,
            stop_offset: 0.005,
            target_multiplier: 10.0,

            leverage_scale: 50_000.0,
            leverage_cap: 20.0,
            position_size_divisor: 10.0,
            position_size_cap: 10.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub indicators: IndicatorParams,
    pub signals: SignalThresholds,
    pub funding: FundingParams,
    pub trend: TrendParams,
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), TaError> {
        self.indicators.validate()?;
        if self.funding.neutral_band < 0.0 || !self.funding.neutral_band.is_finite() {
            return Err(TaError::invalid_param(
                "funding.neutral_band",
                self.funding.neutral_band,
            ));
        }
        if self.funding.position_size_divisor <= 0.0 {
            return Err(TaError::invalid_param(
                "funding.position_size_divisor",
                self.funding.position_size_divisor,
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct YamlRoot {
    global: serde_yaml::Value,
    symbols: serde_yaml::Value,
}

/// Recursively overlay `overlay` onto `base`. Null overlay values are skipped.
fn deep_merge(base: &mut serde_yaml::Value, overlay: &serde_yaml::Value) {
    match (base, overlay) {
        (serde_yaml::Value::Mapping(ref mut base_map), serde_yaml::Value::Mapping(overlay_map)) => {
            for (key, overlay_val) in overlay_map.iter() {
                if let Some(base_val) = base_map.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_map.insert(key.clone(), overlay_val.clone());
                }
            }
        }
        (base, overlay) => {
            if !overlay.is_null() {
                *base = overlay.clone();
            }
        }
    }
}

/// Merge the layers of a YAML document held in memory.
pub fn resolve_config(raw: &str, symbol: Option<&str>) -> Result<AnalysisConfig, TaError> {
    let root: YamlRoot = if raw.trim().is_empty() {
        YamlRoot::default()
    } else {
        serde_yaml::from_str(raw)?
    };
    let mut merged = serde_yaml::to_value(AnalysisConfig::default())?;

    if !root.global.is_null() {
        deep_merge(&mut merged, &root.global);
    }

    if let (Some(sym), serde_yaml::Value::Mapping(symbols)) = (symbol, &root.symbols) {
        // exact key first, then upper-cased
        let overrides = symbols
            .get(serde_yaml::Value::String(sym.to_string()))
            .or_else(|| symbols.get(serde_yaml::Value::String(sym.to_uppercase())));
        if let Some(overrides) = overrides {
            deep_merge(&mut merged, overrides);
        }
    }

    let cfg: AnalysisConfig = serde_yaml::from_value(merged)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Fallible loader: missing file, bad YAML or invalid values are errors.
pub fn try_load_config(path: impl AsRef<Path>, symbol: Option<&str>) -> Result<AnalysisConfig, TaError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| TaError::Config(format!("failed to read {}: {e}", path.display())))?;
    resolve_config(&raw, symbol)
}

/// Like [`try_load_config`] but never fails: any problem is logged and the
/// built-in defaults are returned.
pub fn load_config(path: impl AsRef<Path>, symbol: Option<&str>) -> AnalysisConfig {
    let path = path.as_ref();
    if !path.exists() {
        warn!(path = %path.display(), "config file does not exist, using defaults");
        return AnalysisConfig::default();
    }
    match try_load_config(path, symbol) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "config rejected, using defaults");
            AnalysisConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_yaml(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("analysis.yaml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn deep_merge_overlays_nested_keys() {
        let mut base =
            serde_yaml::from_str::<serde_yaml::Value>("a: 1\nnested:\n  x: 1\n  y: 2").unwrap();
        let overlay = serde_yaml::from_str::<serde_yaml::Value>("nested:\n  y: 9\nb: ~").unwrap();
        deep_merge(&mut base, &overlay);
        assert_eq!(base["a"].as_i64(), Some(1));
        assert_eq!(base["nested"]["x"].as_i64(), Some(1));
        assert_eq!(base["nested"]["y"].as_i64(), Some(9));
    }

    #[test]
    fn symbol_layer_wins_over_global() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_yaml(
            &dir,
            "global:\n  indicators:\n    rsi_period: 21\n  signals:\n    rsi_oversold: 25.0\nsymbols:\n  BTCUSDT:\n    indicators:\n      rsi_period: 7\n",
        );
        let btc = try_load_config(&path, Some("btcusdt")).unwrap();
        assert_eq!(btc.indicators.rsi_period, 7);
        assert_eq!(btc.signals.rsi_oversold, 25.0);
        assert_eq!(btc.indicators.macd_slow, 26);

        let eth = try_load_config(&path, Some("ETHUSDT")).unwrap();
        assert_eq!(eth.indicators.rsi_period, 21);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(dir.path().join("nope.yaml"), None);
        assert_eq!(cfg, AnalysisConfig::default());
        assert!(try_load_config(dir.path().join("nope.yaml"), None).is_err());
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_yaml(&dir, "global:\n  indicators:\n    bb_period: 0\n");
        assert!(matches!(
            try_load_config(&path, None),
            Err(TaError::InvalidParameter { name: "bb_period", .. })
        ));
        assert_eq!(load_config(&path, None), AnalysisConfig::default());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(matches!(
            resolve_config("global: [unclosed", None),
            Err(TaError::Yaml(_))
        ));
    }

    #[test]
    fn empty_document_is_defaults() {
        assert_eq!(resolve_config("", None).unwrap(), AnalysisConfig::default());
    }
}
