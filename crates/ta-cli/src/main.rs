//! `ta`: technical assessment of OHLCV candle files.
//!
//! Subcommands:
//!   - `analyze`          full assessment (indicators, patterns, votes, trend, funding)
//!   - `dump-indicators`  every indicator value per candle as CSV
//!   - `patterns`         candlestick pattern events as JSON lines

mod cache;
mod input;

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use ta_core::config::{load_config, AnalysisConfig};
use ta_core::{compute_indicators, detect_patterns, CandleSeries, IndicatorBundle, PatternEvent, TaError};
use ta_signals::{assess, Assessment};

use cache::AssessmentCache;

#[derive(Parser)]
#[command(
    name = "ta",
    version,
    about = "Technical indicators, candlestick patterns and funding-rate signals for OHLCV data",
    propagate_version = true
)]
struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess one or more candle files
    Analyze(AnalyzeArgs),
    /// Dump every indicator series as CSV
    DumpIndicators(DumpArgs),
    /// List candlestick pattern events as JSON lines
    Patterns(PatternsArgs),
}

#[derive(Args)]
struct AnalyzeArgs {
    /// JSON candle file; repeat to assess several instruments in parallel
    #[arg(long = "candles", required = true)]
    candles: Vec<PathBuf>,

    /// Market snapshot JSON (funding rate, next funding time, order book,
    /// open interest); give one per --candles, in the same order
    #[arg(long = "market")]
    market: Vec<PathBuf>,

    /// Symbol for per-symbol config overrides (single input only; otherwise
    /// derived from each file name)
    #[arg(long)]
    symbol: Option<String>,

    /// YAML analysis config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Current price; defaults to the last close
    #[arg(long)]
    price: Option<f64>,

    /// Evaluation time in epoch ms; defaults to now
    #[arg(long)]
    now_ms: Option<i64>,

    /// Seconds an assessment stays cached per symbol
    #[arg(long, default_value_t = 300)]
    cache_ttl_secs: u64,

    /// Override rayon's thread count (defaults to num CPUs)
    #[arg(long)]
    threads: Option<usize>,

    /// Write JSON to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct DumpArgs {
    #[arg(long)]
    candles: PathBuf,

    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    symbol: Option<String>,

    /// Write CSV to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct PatternsArgs {
    #[arg(long)]
    candles: PathBuf,

    #[arg(long)]
    output: Option<PathBuf>,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(p) => Box::new(std::io::BufWriter::new(std::fs::File::create(p)?)),
        None => Box::new(std::io::BufWriter::new(std::io::stdout().lock())),
    })
}

fn resolve_config(path: Option<&Path>, symbol: &str) -> AnalysisConfig {
    match path {
        Some(p) => load_config(p, Some(symbol)),
        None => AnalysisConfig::default(),
    }
}

// ---------------------------------------------------------------------------
// analyze
// ---------------------------------------------------------------------------

struct Job {
    symbol: String,
    candles: PathBuf,
    market: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Outcome {
    Ok(Box<Assessment>),
    Failed { error: String },
}

fn run_job(
    job: &Job,
    args: &AnalyzeArgs,
    now_ms: i64,
    cache: &Mutex<AssessmentCache<Assessment>>,
) -> Result<Assessment, TaError> {
    if let Ok(mut guard) = cache.lock() {
        if !guard.is_empty() {
            let dropped = guard.purge_expired();
            if dropped > 0 {
                debug!(dropped, "expired cache entries purged");
            }
        }
        if let Some(hit) = guard.get(&job.symbol) {
            info!(symbol = %job.symbol, "cache hit");
            return Ok(hit.clone());
        }
    }

    let candles = input::read_candles(&job.candles)?;
    let market = job.market.as_deref().map(input::read_market).transpose()?;
    let cfg = resolve_config(args.config.as_deref(), &job.symbol);
    let assessment = assess(&candles, args.price, market.as_ref(), &cfg, now_ms)?;

    if let Ok(mut guard) = cache.lock() {
        guard.insert(&job.symbol, assessment.clone());
    }
    Ok(assessment)
}

/// One job per `--candles` input. Symbols key both the cache and the
/// report, so two inputs resolving to the same symbol are rejected.
fn build_jobs(args: &AnalyzeArgs) -> Result<Vec<Job>, String> {
    let single = args.candles.len() == 1;
    let mut seen: BTreeMap<String, &Path> = BTreeMap::new();
    let mut jobs = Vec::with_capacity(args.candles.len());
    for (i, path) in args.candles.iter().enumerate() {
        let symbol = match (&args.symbol, single) {
            (Some(sym), true) => sym.to_ascii_uppercase(),
            _ => input::symbol_from_path(path),
        };
        if let Some(first) = seen.insert(symbol.clone(), path) {
            return Err(format!(
                "{} and {} both resolve to symbol {symbol}; rename one input",
                first.display(),
                path.display()
            ));
        }
        jobs.push(Job {
            symbol,
            candles: path.clone(),
            market: args.market.get(i).cloned(),
        });
    }
    Ok(jobs)
}

fn cmd_analyze(args: AnalyzeArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.market.is_empty() && args.market.len() != args.candles.len() {
        return Err(format!(
            "--market given {} times for {} --candles inputs",
            args.market.len(),
            args.candles.len()
        )
        .into());
    }
    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new().num_threads(n).build_global()?;
    }

    let single = args.candles.len() == 1;
    let jobs = build_jobs(&args)?;

    let now_ms = args
        .now_ms
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
    let cache = Mutex::new(AssessmentCache::new(Duration::from_secs(args.cache_ttl_secs)));
    let start = Instant::now();

    let results: Vec<(String, Result<Assessment, TaError>)> = jobs
        .par_iter()
        .map(|job| (job.symbol.clone(), run_job(job, &args, now_ms, &cache)))
        .collect();

    info!(
        inputs = results.len(),
        cached = cache.lock().map(|c| c.len()).unwrap_or(0),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "analysis finished"
    );

    let mut writer = open_output(args.output.as_deref())?;
    if single {
        let (symbol, result) = results
            .into_iter()
            .next()
            .ok_or("no input produced a result")?;
        let assessment = result.map_err(|e| format!("{symbol}: {e}"))?;
        serde_json::to_writer_pretty(&mut writer, &assessment)?;
    } else {
        let mut report = BTreeMap::new();
        for (symbol, result) in results {
            let outcome = match result {
                Ok(a) => Outcome::Ok(Box::new(a)),
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "assessment failed");
                    Outcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            report.insert(symbol, outcome);
        }
        serde_json::to_writer_pretty(&mut writer, &report)?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// dump-indicators
// ---------------------------------------------------------------------------

const CSV_HEADER: &str = "timestamp,close,sma,ema,rsi,macd,macd_signal,macd_hist,\
bb_upper,bb_middle,bb_lower,stoch_k,stoch_d,atr,williams_r,cci,mfi,obv,adx,sar,\
ichimoku_conversion,ichimoku_base,ichimoku_span_a,ichimoku_span_b,ichimoku_lagging,\
volume_delta,vwap";

/// Empty cell for an undefined value.
fn cell(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.8}")).unwrap_or_default()
}

fn value_at(series: &[Option<f64>], i: usize) -> Option<f64> {
    series.get(i).copied().flatten()
}

fn csv_row(candles: &CandleSeries, b: &IndicatorBundle, i: usize) -> Option<String> {
    let bar = candles.as_slice().get(i)?;
    let macd = b.macd.get(i)?;
    let bb = b.bollinger.get(i)?;
    let st = b.stochastic.get(i)?;
    let ichi = b.ichimoku.get(i)?;

    let cells = [
        Some(bar.close),
        value_at(&b.sma, i),
        value_at(&b.ema, i),
        value_at(&b.rsi, i),
        macd.macd,
        macd.signal,
        macd.histogram,
        bb.upper,
        bb.middle,
        bb.lower,
        st.k,
        st.d,
        value_at(&b.atr, i),
        value_at(&b.williams_r, i),
        value_at(&b.cci, i),
        value_at(&b.mfi, i),
        value_at(&b.obv, i),
        value_at(&b.adx, i),
        value_at(&b.parabolic_sar, i),
        ichi.conversion,
        ichi.base,
        ichi.span_a,
        ichi.span_b,
        ichi.lagging,
        value_at(&b.volume_delta, i),
        value_at(&b.vwap, i),
    ];
    let mut row = bar.timestamp.to_string();
    for c in cells {
        row.push(',');
        row.push_str(&cell(c));
    }
    Some(row)
}

fn cmd_dump_indicators(args: DumpArgs) -> Result<(), Box<dyn std::error::Error>> {
    let candles = input::read_candles(&args.candles)?;
    let symbol = args
        .symbol
        .clone()
        .unwrap_or_else(|| input::symbol_from_path(&args.candles));
    let cfg = resolve_config(args.config.as_deref(), &symbol);

    let start = Instant::now();
    let bundle = compute_indicators(&candles, &cfg.indicators)?;

    let mut writer = open_output(args.output.as_deref())?;
    writeln!(writer, "{CSV_HEADER}")?;
    for i in 0..candles.len() {
        if let Some(row) = csv_row(&candles, &bundle, i) {
            writeln!(writer, "{row}")?;
        }
    }
    writer.flush()?;

    info!(
        symbol = %symbol,
        bars = candles.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "indicators dumped"
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// patterns
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PatternLine<'a> {
    timestamp: i64,
    label: &'static str,
    #[serde(flatten)]
    event: &'a PatternEvent,
}

fn cmd_patterns(args: PatternsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let candles = input::read_candles(&args.candles)?;
    let events = detect_patterns(&candles);

    let mut writer = open_output(args.output.as_deref())?;
    for event in &events {
        let Some(bar) = candles.as_slice().get(event.index) else {
            continue;
        };
        let line = PatternLine {
            timestamp: bar.timestamp,
            label: event.kind.label(),
            event,
        };
        serde_json::to_writer(&mut writer, &line)?;
        writeln!(writer)?;
    }
    writer.flush()?;

    info!(events = events.len(), bars = candles.len(), "patterns listed");
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let result = match cli.command {
        Commands::Analyze(args) => cmd_analyze(args),
        Commands::DumpIndicators(args) => cmd_dump_indicators(args),
        Commands::Patterns(args) => cmd_patterns(args),
    };

    if let Err(e) = result {
        eprintln!("[error] {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use ta_core::{Candle, IndicatorParams};

    fn series(n: usize) -> CandleSeries {
        let candles = (0..n)
            .map(|i| Candle {
                timestamp: i as i64 * 60_000,
                open: 10.0 + i as f64,
                high: 11.5 + i as f64,
                low: 9.5 + i as f64,
                close: 11.0 + i as f64,
                volume: 5.0,
            })
            .collect();
        CandleSeries::new(candles).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn csv_rows_match_header_width() {
        let s = series(30);
        let b = compute_indicators(&s, &IndicatorParams::default()).unwrap();
        let columns = CSV_HEADER.split(',').count();
        for i in 0..s.len() {
            let row = csv_row(&s, &b, i).unwrap();
            assert_eq!(row.split(',').count(), columns);
        }
        // undefined RSI on the first bar is an empty cell
        let first = csv_row(&s, &b, 0).unwrap();
        assert_eq!(first.split(',').nth(4), Some(""));
        assert!(csv_row(&s, &b, 30).is_none());
    }

    #[test]
    fn analyze_args_parse() {
        let cli = Cli::try_parse_from([
            "ta", "analyze", "--candles", "a.json", "--candles", "b.json", "--price", "10.5",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze(a) => {
                assert_eq!(a.candles.len(), 2);
                assert_eq!(a.price, Some(10.5));
                assert_eq!(a.cache_ttl_secs, 300);
            }
            _ => panic!("expected analyze"),
        }
    }

    fn analyze_args(candles: Vec<PathBuf>) -> AnalyzeArgs {
        AnalyzeArgs {
            candles,
            market: Vec::new(),
            symbol: None,
            config: None,
            price: None,
            now_ms: Some(0),
            cache_ttl_secs: 300,
            threads: None,
            output: None,
        }
    }

    #[test]
    fn same_stem_inputs_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for (sub, n) in [("a", 30), ("b", 40)] {
            let sub_dir = dir.path().join(sub);
            std::fs::create_dir(&sub_dir).unwrap();
            let path = sub_dir.join("btcusdt.json");
            std::fs::write(&path, serde_json::to_string(&series(n)).unwrap()).unwrap();
            paths.push(path);
        }
        let err = build_jobs(&analyze_args(paths.clone())).err().unwrap();
        assert!(err.contains("BTCUSDT"), "{err}");

        let out = dir.path().join("report.json");
        let mut args = analyze_args(paths);
        args.output = Some(out.clone());
        assert!(cmd_analyze(args).is_err());
        assert!(!out.exists());
    }

    #[test]
    fn distinct_stems_get_one_job_each() {
        let args = analyze_args(vec![
            PathBuf::from("a/btcusdt.json"),
            PathBuf::from("a/ethusdt.json"),
        ]);
        let jobs = build_jobs(&args).unwrap();
        let symbols: Vec<_> = jobs.iter().map(|j| j.symbol.as_str()).collect();
        assert_eq!(symbols, ["BTCUSDT", "ETHUSDT"]);
    }

    #[test]
    fn pattern_lines_carry_a_readable_label() {
        let event = PatternEvent {
            index: 2,
            kind: ta_core::PatternKind::ThreeWhiteSoldiers,
            bias: ta_core::Bias::Bullish,
            strength: ta_core::PatternStrength::VeryStrong,
        };
        let line = PatternLine {
            timestamp: 120_000,
            label: event.kind.label(),
            event: &event,
        };
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["label"], "Three White Soldiers");
        assert_eq!(json["kind"], "THREE_WHITE_SOLDIERS");
        assert_eq!(json["index"], 2);
    }

    #[test]
    fn failed_jobs_are_reported_per_input() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        std::fs::write(&good, serde_json::to_string(&series(40)).unwrap()).unwrap();
        let args = analyze_args(vec![good.clone(), dir.path().join("missing.json")]);
        let cache = Mutex::new(AssessmentCache::new(Duration::from_secs(300)));
        let ok = Job {
            symbol: "GOOD".to_string(),
            candles: good,
            market: None,
        };
        let bad = Job {
            symbol: "MISSING".to_string(),
            candles: dir.path().join("missing.json"),
            market: None,
        };
        assert!(run_job(&ok, &args, 0, &cache).is_ok());
        assert!(run_job(&bad, &args, 0, &cache).is_err());
        // second call for the same symbol is served from the cache
        assert_eq!(cache.lock().unwrap().len(), 1);
        assert!(run_job(&ok, &args, 0, &cache).is_ok());
    }
}
