#![allow(dead_code)]

use barrierlab::domain::candle::Candle;
use barrierlab::domain::labeling_config::LabelingConfig;
use barrierlab::domain::signal::Signal;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::fs;
use std::path::{Path, PathBuf};

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// One-minute bars starting at [`base_time`], flat within each bar.
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            timestamp: base_time() + Duration::minutes(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000.0,
        })
        .collect()
}

pub fn signals_from(values: &[i8]) -> Vec<Signal> {
    values
        .iter()
        .map(|&v| Signal::try_from(v as i64).unwrap())
        .collect()
}

/// Barrier parameters of the worked examples: tp 1.5, sl 0.75, no trade cost.
pub fn fixture_config(time_limit_minutes: i64) -> LabelingConfig {
    LabelingConfig {
        tp_multiplier: 1.5,
        sl_multiplier: 0.75,
        time_limit: Duration::minutes(time_limit_minutes),
        trade_cost: 0.0,
        ..LabelingConfig::default()
    }
}

/// Candle CSV in the kline cache layout, optionally with a `strat_signal`
/// column.
pub fn candle_csv(closes: &[f64], signals: Option<&[i8]>) -> String {
    let mut out = String::from("open_time,open,high,low,close,volume");
    if signals.is_some() {
        out.push_str(",strat_signal");
    }
    out.push('\n');

    for (i, candle) in make_candles(closes).iter().enumerate() {
        out.push_str(&format!(
            "{},{},{},{},{},{}",
            candle.timestamp.timestamp_millis(),
            candle.open,
            candle.high,
            candle.low,
            candle.close,
            candle.volume
        ));
        if let Some(signals) = signals {
            out.push_str(&format!(",{}", signals[i]));
        }
        out.push('\n');
    }
    out
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// A gently oscillating close series long enough for small indicator windows.
pub fn wave(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64;
            100.0 + 3.0 * (t / 7.0).sin() + 1.5 * (t / 3.0).cos()
        })
        .collect()
}
