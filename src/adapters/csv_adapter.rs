//! CSV file adapters: candle source, precomputed signal column, labeled output.
//!
//! Candle files use the exchange kline cache layout: a header row with at
//! least `open_time` (epoch milliseconds), `open`, `high`, `low`, `close` and
//! `volume`. Numbers may be written as float text. Other columns are ignored.

use crate::domain::barrier::ExitKind;
use crate::domain::candle::{Candle, timestamp_from_ms};
use crate::domain::error::LabError;
use crate::domain::labeling::{LabeledBar, LabeledRun};
use crate::domain::labeling_config::LabelingConfig;
use crate::domain::metrics::LabelMetrics;
use crate::domain::signal::{Signal, SignalPoint};
use crate::ports::candle_port::CandlePort;
use crate::ports::report_port::ReportPort;
use crate::ports::signal_port::SignalPort;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CandleRecord {
    open_time: f64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

#[derive(Debug, Deserialize)]
struct SignalRecord {
    open_time: f64,
    strat_signal: f64,
}

fn read_file(path: &Path) -> Result<String, LabError> {
    fs::read_to_string(path).map_err(|e| LabError::DataSource {
        reason: format!("failed to read {}: {}", path.display(), e),
    })
}

fn whole_millis(ms: f64) -> Result<i64, LabError> {
    if !ms.is_finite() || ms.fract() != 0.0 {
        return Err(LabError::MalformedInput {
            reason: format!("open_time must be whole milliseconds, got {}", ms),
        });
    }
    Ok(ms as i64)
}

/// Parse candle rows, sort by time and keep the first row of each open time.
pub fn parse_candles(content: &str) -> Result<Vec<Candle>, LabError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut candles = Vec::new();

    for (line, result) in rdr.deserialize::<CandleRecord>().enumerate() {
        let record = result.map_err(|e| LabError::MalformedInput {
            reason: format!("candle row {}: {}", line + 1, e),
        })?;
        candles.push(Candle::from_open_time_ms(
            whole_millis(record.open_time)?,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        )?);
    }

    candles.sort_by_key(|c| c.timestamp);
    let before = candles.len();
    candles.dedup_by_key(|c| c.timestamp);
    let dropped = before - candles.len();
    if dropped > 0 {
        log::warn!("dropped {} candles with duplicate open_time", dropped);
    }
    Ok(candles)
}

pub struct CsvCandleSource {
    path: PathBuf,
}

impl CsvCandleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CandlePort for CsvCandleSource {
    fn fetch_candles(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Candle>, LabError> {
        let content = read_file(&self.path)?;
        let mut candles = parse_candles(&content)?;
        candles.retain(|c| start.is_none_or(|s| c.timestamp >= s) && end.is_none_or(|e| c.timestamp <= e));
        log::info!(
            "loaded {} candles from {}",
            candles.len(),
            self.path.display()
        );
        Ok(candles)
    }
}

/// Reads a precomputed `strat_signal` column from a candle-style CSV.
pub struct CsvSignalSource {
    path: PathBuf,
}

impl CsvSignalSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Parse `open_time`/`strat_signal` rows into a sorted, de-duplicated series.
pub fn parse_signals(content: &str) -> Result<Vec<SignalPoint>, LabError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut points = Vec::new();

    for (line, result) in rdr.deserialize::<SignalRecord>().enumerate() {
        let record = result.map_err(|e| LabError::MalformedInput {
            reason: format!("signal row {}: {}", line + 1, e),
        })?;
        points.push(SignalPoint {
            timestamp: timestamp_from_ms(whole_millis(record.open_time)?)?,
            signal: Signal::from_value(record.strat_signal)?,
        });
    }

    points.sort_by_key(|p| p.timestamp);
    points.dedup_by_key(|p| p.timestamp);
    Ok(points)
}

impl SignalPort for CsvSignalSource {
    fn generate(&self, candles: &[Candle]) -> Result<Vec<SignalPoint>, LabError> {
        let content = read_file(&self.path)?;
        let points = parse_signals(&content)?;

        candles
            .iter()
            .map(|candle| {
                points
                    .binary_search_by_key(&candle.timestamp, |p| p.timestamp)
                    .map(|i| points[i])
                    .map_err(|_| LabError::MisalignedInput {
                        reason: format!("no strat_signal for candle at {}", candle.timestamp),
                    })
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct LabeledRecord {
    timestamp: String,
    open_time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    signal: i8,
    target: f64,
    tp_level: Option<f64>,
    sl_level: Option<f64>,
    tp_pct: Option<f64>,
    sl_pct: Option<f64>,
    time_limit: Option<String>,
    exit_timestamp: Option<String>,
    exit_kind: Option<&'static str>,
    ret: Option<f64>,
    ret_sign: Option<i8>,
    ret_over_target: Option<f64>,
    active_order: bool,
    amount: Option<f64>,
    margin: Option<f64>,
    ret_usd: Option<f64>,
    cumulative_pnl: Option<f64>,
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl From<&LabeledBar> for LabeledRecord {
    fn from(bar: &LabeledBar) -> Self {
        LabeledRecord {
            timestamp: format_ts(bar.timestamp),
            open_time: bar.timestamp.timestamp_millis(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            signal: bar.signal.as_i8(),
            target: bar.target,
            tp_level: bar.tp_level,
            sl_level: bar.sl_level,
            tp_pct: bar.tp_pct,
            sl_pct: bar.sl_pct,
            time_limit: bar.time_limit.map(format_ts),
            exit_timestamp: bar.exit_timestamp.map(format_ts),
            exit_kind: bar.exit_kind.map(ExitKind::label),
            ret: bar.ret,
            ret_sign: bar.ret_sign,
            ret_over_target: bar.ret_over_target,
            active_order: bar.active_order,
            amount: bar.amount,
            margin: bar.margin,
            ret_usd: bar.ret_usd,
            cumulative_pnl: bar.cumulative_pnl,
        }
    }
}

/// Write one CSV row per labeled bar. Undefined fields are left empty.
pub fn write_labeled<W: Write>(writer: W, run: &LabeledRun) -> Result<(), LabError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for bar in &run.bars {
        wtr.serialize(LabeledRecord::from(bar))
            .map_err(|e| LabError::Io(std::io::Error::other(e)))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the labeled bar table as CSV.
pub struct CsvLabeledWriter;

impl ReportPort for CsvLabeledWriter {
    fn write(
        &self,
        run: &LabeledRun,
        _metrics: &LabelMetrics,
        _config: &LabelingConfig,
        output_path: &str,
    ) -> Result<(), LabError> {
        let file = fs::File::create(output_path)?;
        write_labeled(std::io::BufWriter::new(file), run)?;
        log::info!("wrote {} labeled bars to {}", run.bars.len(), output_path);
        Ok(())
    }
}
