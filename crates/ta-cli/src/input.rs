//! JSON inputs: candle arrays and market snapshots.

use std::path::Path;

use ta_core::{CandleSeries, TaError};
use ta_signals::MarketSnapshot;

/// Read a JSON array of `{timestamp, open, high, low, close, volume}`.
/// The series is validated while it is parsed.
pub fn read_candles(path: &Path) -> Result<CandleSeries, TaError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| TaError::Config(format!("cannot read {}: {e}", path.display())))?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn read_market(path: &Path) -> Result<MarketSnapshot, TaError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| TaError::Config(format!("cannot read {}: {e}", path.display())))?;
    Ok(serde_json::from_str(&raw)?)
}

/// `data/btcusdt_1h.json` -> `BTCUSDT_1H`.
pub fn symbol_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_uppercase)
        .unwrap_or_else(|| "UNKNOWN".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn reads_valid_candles() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "eth.json",
            r#"[
                {"timestamp": 1, "open": 10, "high": 11, "low": 9, "close": 10.5, "volume": 3},
                {"timestamp": 2, "open": 10.5, "high": 12, "low": 10, "close": 11.5, "volume": 4}
            ]"#,
        );
        let series = read_candles(&path).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(symbol_from_path(&path), "ETH");
    }

    #[test]
    fn rejects_out_of_order_candles() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "bad.json",
            r#"[
                {"timestamp": 5, "open": 10, "high": 11, "low": 9, "close": 10, "volume": 1},
                {"timestamp": 5, "open": 10, "high": 11, "low": 9, "close": 10, "volume": 1}
            ]"#,
        );
        let err = read_candles(&path).unwrap_err();
        assert!(err.to_string().contains("strictly increase"));
    }

    #[test]
    fn reads_market_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "m.json",
            r#"{"funding_rate": 0.0002, "next_funding_timestamp": 1700000000000,
                "order_book": {"bids": [{"price": 1.0, "size": 2.0}], "asks": []}}"#,
        );
        let m = read_market(&path).unwrap();
        assert_eq!(m.funding_rate, 0.0002);
        assert_eq!(m.order_book.unwrap().bids.len(), 1);
        assert!(m.open_interest.is_none());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_candles(Path::new("/nonexistent/candles.json")).is_err());
    }
}
