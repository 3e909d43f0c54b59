//! CLI integration tests for command orchestration.
//!
//! Tests cover:
//! - Config parsing (build_labeling_config, build_signal_source)
//! - `validate` with real INI files on disk
//! - `label` end to end: candle CSV in, labeled CSV and Typst report out
//! - `info` over a candle file
//! - Exit codes for config, data source and data errors

mod common;

use barrierlab::adapters::file_config_adapter::FileConfigAdapter;
use barrierlab::cli::{self, Cli};
use barrierlab::domain::error::LabError;
use clap::Parser;
use common::*;
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use tempfile::TempDir;

// ExitCode has no PartialEq on every toolchain, so compare via Debug.
fn code(c: ExitCode) -> String {
    format!("{:?}", c)
}

fn expect(c: u8) -> String {
    code(ExitCode::from(c))
}

fn run(args: &[&str]) -> ExitCode {
    let mut argv = vec!["barrierlab"];
    argv.extend_from_slice(args);
    cli::run(Cli::try_parse_from(argv).unwrap())
}

fn alternating_signals(n: usize) -> Vec<i8> {
    (0..n).map(|i| [1, 0, 0, -1, 0, 0][i % 6]).collect()
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    /// Temp dir holding a 60-bar candle file with a `strat_signal` column.
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let closes = wave(60);
        let signals = alternating_signals(60);
        write_file(
            dir.path(),
            "candles.csv",
            &candle_csv(&closes, Some(signals.as_slice())),
        );
        Fixture { dir }
    }

    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).display().to_string()
    }

    /// INI pointing at the fixture candles, with `extra` appended verbatim.
    fn config(&self, extra: &str) -> String {
        let content = format!(
            "[data]\ncandles = {}\n\n[labeling]\nvolatility_window = 10\ntime_limit_minutes = 5\n\n\
             [strategy]\nname = column\n\n[report]\noutput = {}\n{}",
            self.path("candles.csv"),
            self.path("labeled.csv"),
            extra
        );
        write_file(self.dir.path(), "run.ini", &content)
            .display()
            .to_string()
    }
}

mod config_loading {
    use super::*;

    #[test]
    fn build_labeling_config_full() {
        let adapter = FileConfigAdapter::from_string(
            "[labeling]\nvolatility_window = 50\ntp_multiplier = 2.0\nsl_multiplier = 1.0\n\
             time_limit_minutes = 120\ntrade_cost = 0.001\n\
             [account]\ninitial_capital = 30\nleverage = 10\nportfolio_value = 300\n",
        )
        .unwrap();
        let config = cli::build_labeling_config(&adapter).unwrap();

        assert_eq!(config.volatility_window, 50);
        assert!((config.tp_multiplier - 2.0).abs() < f64::EPSILON);
        assert!((config.sl_multiplier - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.time_limit.num_minutes(), 120);
        assert!((config.trade_cost - 0.001).abs() < f64::EPSILON);
        assert!((config.initial_capital - 30.0).abs() < f64::EPSILON);
        assert!((config.leverage - 10.0).abs() < f64::EPSILON);
        assert!((config.portfolio_value - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn build_labeling_config_rejects_small_window() {
        let adapter =
            FileConfigAdapter::from_string("[labeling]\nvolatility_window = 1\n").unwrap();
        let err = cli::build_labeling_config(&adapter).unwrap_err();
        assert!(
            matches!(err, LabError::ConfigInvalid { ref key, .. } if key == "volatility_window")
        );
    }

    #[test]
    fn build_labeling_config_rejects_zero_time_limit() {
        let adapter =
            FileConfigAdapter::from_string("[labeling]\ntime_limit_minutes = 0\n").unwrap();
        assert!(cli::build_labeling_config(&adapter).is_err());
    }

    #[test]
    fn column_source_reads_candle_file() {
        let adapter = FileConfigAdapter::from_string("[strategy]\nname = column\n").unwrap();
        let (_, name) = cli::build_signal_source(&adapter, "candles.csv").unwrap();
        assert_eq!(name, "strat_signal column");
    }

    #[test]
    fn bad_strategy_period_rejected() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nmacd_fast = 50\nmacd_slow = 10\n")
                .unwrap();
        assert!(cli::build_strategy(&adapter).is_err());
    }
}

mod validate_command {
    use super::*;

    #[test]
    fn valid_config_succeeds() {
        let fx = Fixture::new();
        let ini = fx.config("");
        assert_eq!(code(run(&["validate", "-c", &ini])), code(ExitCode::SUCCESS));
    }

    #[test]
    fn zero_leverage_is_config_error() {
        let fx = Fixture::new();
        let ini = fx.config("\n[account]\nleverage = 0\n");
        assert_eq!(code(run(&["validate", "-c", &ini])), expect(2));
    }

    #[test]
    fn missing_candles_key_is_config_error() {
        let dir = TempDir::new().unwrap();
        let ini = write_file(dir.path(), "run.ini", "[labeling]\nvolatility_window = 10\n");
        assert_eq!(
            code(run(&["validate", "-c", ini.to_str().unwrap()])),
            expect(2)
        );
    }

    #[test]
    fn unknown_strategy_is_config_error() {
        let dir = TempDir::new().unwrap();
        let ini = write_file(
            dir.path(),
            "run.ini",
            "[data]\ncandles = c.csv\n[strategy]\nname = rsi\n",
        );
        assert_eq!(
            code(run(&["validate", "-c", ini.to_str().unwrap()])),
            expect(2)
        );
    }

    #[test]
    fn missing_config_file_is_config_error() {
        assert_eq!(
            code(run(&["validate", "-c", "/nonexistent/run.ini"])),
            expect(2)
        );
    }

    #[test]
    fn validate_reads_no_data() {
        let dir = TempDir::new().unwrap();
        let ini = write_file(
            dir.path(),
            "run.ini",
            "[data]\ncandles = /nonexistent/candles.csv\n",
        );
        assert_eq!(
            code(run(&["validate", "-c", ini.to_str().unwrap()])),
            code(ExitCode::SUCCESS)
        );
    }
}

mod label_command {
    use super::*;

    fn csv_rows(path: &str) -> Vec<csv::StringRecord> {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        rdr.records().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn writes_labeled_csv() {
        let fx = Fixture::new();
        let ini = fx.config("");
        assert_eq!(code(run(&["label", "-c", &ini])), code(ExitCode::SUCCESS));

        let rows = csv_rows(&fx.path("labeled.csv"));
        // window 10 drops nine warm-up bars
        assert_eq!(rows.len(), 51);
        assert!(!Path::new(&fx.path("report.typ")).exists());
    }

    #[test]
    fn output_flag_overrides_config() {
        let fx = Fixture::new();
        let ini = fx.config("");
        let out = fx.path("override.csv");
        assert_eq!(
            code(run(&["label", "-c", &ini, "--output", &out])),
            code(ExitCode::SUCCESS)
        );
        assert!(Path::new(&out).exists());
        assert!(!Path::new(&fx.path("labeled.csv")).exists());
    }

    #[test]
    fn writes_typst_report() {
        let fx = Fixture::new();
        let ini = fx.config(&format!("report = {}\n", fx.path("report.typ")));
        assert_eq!(code(run(&["label", "-c", &ini])), code(ExitCode::SUCCESS));

        let report = fs::read_to_string(fx.path("report.typ")).unwrap();
        assert!(report.contains("= Triple-Barrier Labeling Report"));
        assert!(report.contains("strat\\_signal column"));
        assert!(report.contains("== Trade Log"));
        assert!(!report.contains("{{"));
    }

    #[test]
    fn custom_template_is_used() {
        let fx = Fixture::new();
        let template = write_file(fx.dir.path(), "t.typ", "= Custom\n{{METRICS_TABLE}}\n");
        let ini = fx.config(&format!("template_path = {}\n", template.display()));
        let report = fx.path("custom.typ");
        assert_eq!(
            code(run(&["label", "-c", &ini, "--report", &report])),
            code(ExitCode::SUCCESS)
        );

        let text = fs::read_to_string(&report).unwrap();
        assert!(text.starts_with("= Custom"));
        assert!(text.contains("[Executed signals]"));
    }

    #[test]
    fn bounds_restrict_the_series() {
        let fx = Fixture::new();
        let content = fs::read_to_string(fx.config("")).unwrap().replacen(
            "[labeling]",
            "start = 2024-01-01T00:10:00Z\nend = 2024-01-01T00:39:00Z\n\n[labeling]",
            1,
        );
        let ini = write_file(fx.dir.path(), "bounded.ini", &content);
        assert_eq!(
            code(run(&["label", "-c", ini.to_str().unwrap()])),
            code(ExitCode::SUCCESS)
        );

        // 30 bars in range, nine lost to warm-up
        assert_eq!(csv_rows(&fx.path("labeled.csv")).len(), 21);
    }

    #[test]
    fn built_in_strategy_runs() {
        let fx = Fixture::new();
        let content = fs::read_to_string(fx.config("")).unwrap().replace(
            "name = column",
            "name = bollinger_macd\nbollinger_period = 10\nmacd_fast = 3\nmacd_slow = 8\nmacd_signal = 3",
        );
        let ini = write_file(fx.dir.path(), "bb.ini", &content);
        assert_eq!(
            code(run(&["label", "-c", ini.to_str().unwrap()])),
            code(ExitCode::SUCCESS)
        );
        assert_eq!(csv_rows(&fx.path("labeled.csv")).len(), 51);
    }

    #[test]
    fn missing_candle_file_is_data_source_error() {
        let dir = TempDir::new().unwrap();
        let ini = write_file(
            dir.path(),
            "run.ini",
            "[data]\ncandles = /nonexistent/candles.csv\n[strategy]\nname = column\n",
        );
        assert_eq!(
            code(run(&["label", "-c", ini.to_str().unwrap()])),
            expect(3)
        );
    }

    #[test]
    fn too_few_bars_is_data_error() {
        let fx = Fixture::new();
        let content = fs::read_to_string(fx.config(""))
            .unwrap()
            .replace("volatility_window = 10", "volatility_window = 100");
        let ini = write_file(fx.dir.path(), "long_window.ini", &content);
        assert_eq!(
            code(run(&["label", "-c", ini.to_str().unwrap()])),
            expect(5)
        );
        assert!(!Path::new(&fx.path("labeled.csv")).exists());
    }
}

mod info_command {
    use super::*;

    #[test]
    fn info_reports_range() {
        let fx = Fixture::new();
        let ini = fx.config("");
        assert_eq!(code(run(&["info", "-c", &ini])), code(ExitCode::SUCCESS));
    }

    #[test]
    fn info_missing_file() {
        let dir = TempDir::new().unwrap();
        let ini = write_file(
            dir.path(),
            "run.ini",
            "[data]\ncandles = /nonexistent/candles.csv\n",
        );
        assert_eq!(
            code(run(&["info", "-c", ini.to_str().unwrap()])),
            expect(3)
        );
    }
}
