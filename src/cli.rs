//! CLI definition and dispatch.

use chrono::Duration;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{CsvCandleSource, CsvLabeledWriter, CsvSignalSource};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::typst_report::TypstReportAdapter;
use crate::domain::config_validation::{
    read_bound, validate_data_config, validate_labeling_config, validate_strategy_config,
};
use crate::domain::error::LabError;
use crate::domain::labeling::{self, LabeledRun};
use crate::domain::labeling_config::LabelingConfig;
use crate::domain::metrics::LabelMetrics;
use crate::domain::strategy::BollingerMacdStrategy;
use crate::ports::candle_port::CandlePort;
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;
use crate::ports::signal_port::SignalPort;

#[derive(Parser, Debug)]
#[command(name = "barrierlab", about = "Triple-barrier labeling of trading signals")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Label a candle series and write the results
    Label {
        #[arg(short, long)]
        config: PathBuf,
        /// Labeled CSV output, overrides [report] output
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Typst report output, overrides [report] report
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
    /// Validate a configuration file without reading data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the time range and bar count of the configured candle file
    Info {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Label {
            config,
            output,
            report,
        } => run_label(&config, output.as_deref(), report.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config } => run_info(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn validate_all(config: &dyn ConfigPort) -> Result<(), LabError> {
    validate_data_config(config)?;
    validate_labeling_config(config)?;
    validate_strategy_config(config)
}

/// Build run parameters from `[labeling]` and `[account]`, falling back to
/// the defaults for absent keys.
pub fn build_labeling_config(config: &dyn ConfigPort) -> Result<LabelingConfig, LabError> {
    let defaults = LabelingConfig::default();

    let window = config.get_int(
        "labeling",
        "volatility_window",
        defaults.volatility_window as i64,
    );
    let minutes = config.get_int(
        "labeling",
        "time_limit_minutes",
        defaults.time_limit.num_minutes(),
    );
    if window < 2 {
        return Err(LabError::invalid(
            "labeling",
            "volatility_window",
            "volatility_window must be at least 2",
        ));
    }
    let time_limit = Duration::try_minutes(minutes).ok_or_else(|| {
        LabError::invalid(
            "labeling",
            "time_limit_minutes",
            format!("time_limit_minutes {minutes} is out of range"),
        )
    })?;

    let labeling = LabelingConfig {
        volatility_window: window as usize,
        tp_multiplier: config.get_double("labeling", "tp_multiplier", defaults.tp_multiplier),
        sl_multiplier: config.get_double("labeling", "sl_multiplier", defaults.sl_multiplier),
        time_limit,
        trade_cost: config.get_double("labeling", "trade_cost", defaults.trade_cost),
        initial_capital: config.get_double(
            "account",
            "initial_capital",
            defaults.initial_capital,
        ),
        leverage: config.get_double("account", "leverage", defaults.leverage),
        portfolio_value: config.get_double(
            "account",
            "portfolio_value",
            defaults.portfolio_value,
        ),
    };
    labeling.validate()?;
    Ok(labeling)
}

/// Build the Bollinger/MACD strategy from `[strategy]`, falling back to the
/// defaults for absent keys.
pub fn build_strategy(config: &dyn ConfigPort) -> Result<BollingerMacdStrategy, LabError> {
    let defaults = BollingerMacdStrategy::default();
    let period = |key: &str, default: usize| {
        let v = config.get_int("strategy", key, default as i64);
        if v < 1 {
            Err(LabError::invalid(
                "strategy",
                key,
                format!("{key} must be at least 1"),
            ))
        } else {
            Ok(v as usize)
        }
    };

    let strategy = BollingerMacdStrategy {
        bollinger_period: period("bollinger_period", defaults.bollinger_period)?,
        bollinger_stddev: config.get_double(
            "strategy",
            "bollinger_stddev",
            defaults.bollinger_stddev,
        ),
        macd_fast: period("macd_fast", defaults.macd_fast)?,
        macd_slow: period("macd_slow", defaults.macd_slow)?,
        macd_signal: period("macd_signal", defaults.macd_signal)?,
        lower_band: config.get_double("strategy", "lower_band", defaults.lower_band),
        upper_band: config.get_double("strategy", "upper_band", defaults.upper_band),
    };
    strategy.validate()?;
    Ok(strategy)
}

/// Pick the signal source named by `[strategy] name`, returning it with a
/// display name for summaries and reports.
pub fn build_signal_source(
    config: &dyn ConfigPort,
    candles_path: &str,
) -> Result<(Box<dyn SignalPort>, String), LabError> {
    let name = config
        .get_string("strategy", "name")
        .unwrap_or_else(|| "bollinger_macd".to_string());
    match name.trim() {
        "column" => Ok((
            Box::new(CsvSignalSource::new(candles_path)),
            "strat_signal column".to_string(),
        )),
        "bollinger_macd" => {
            let strategy = build_strategy(config)?;
            let display = strategy.name();
            Ok((Box::new(strategy), display))
        }
        other => Err(LabError::invalid(
            "strategy",
            "name",
            format!("unknown strategy '{other}', expected bollinger_macd or column"),
        )),
    }
}

fn print_summary(run: &LabeledRun, metrics: &LabelMetrics) {
    let pct = |v: f64| {
        if v.is_nan() {
            "n/a".to_string()
        } else {
            format!("{:.2}%", v)
        }
    };

    eprintln!("\n=== Labeling Results ===");
    eprintln!("Bars labeled:       {}", metrics.total_bars);
    eprintln!("Warm-up dropped:    {}", run.dropped_warmup);
    eprintln!("Signals:            {}", metrics.total_signals);
    eprintln!("Accuracy:           {}", pct(metrics.accuracy));
    eprintln!("Executed signals:   {}", metrics.executed_signals);
    eprintln!("Execution accuracy: {}", pct(metrics.execution_accuracy));
    eprintln!("Global PnL:         {:.4}", metrics.global_pnl);
    eprintln!("Return:             {}", pct(metrics.return_pct));
    eprintln!("Max drawdown:       {:.4}", metrics.max_drawdown);

    if metrics.executed_exits.resolved() + metrics.executed_exits.unresolved > 0 {
        eprintln!("\n=== Executed Exits ===");
        for (kind, signal, count) in metrics.executed_exits.iter() {
            eprintln!("  {} {}: {}", signal, kind, count);
        }
        if metrics.executed_exits.unresolved > 0 {
            eprintln!("  still open: {}", metrics.executed_exits.unresolved);
        }
    }
}

fn write_output(
    port: &dyn ReportPort,
    run: &LabeledRun,
    metrics: &LabelMetrics,
    config: &LabelingConfig,
    path: &str,
    what: &str,
) -> Result<(), ExitCode> {
    match port.write(run, metrics, config, path) {
        Ok(()) => {
            eprintln!("{} written to: {}", what, path);
            Ok(())
        }
        Err(e) => {
            eprintln!("error: failed to write {}: {e}", what.to_lowercase());
            Err((&e).into())
        }
    }
}

fn run_label(config_path: &Path, output: Option<&Path>, report: Option<&Path>) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_all(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let labeling_config = match build_labeling_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 2: Resolve the signal source
    let candles_path = adapter.get_string("data", "candles").unwrap_or_default();
    let (signal_source, strategy_name) = match build_signal_source(&adapter, &candles_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Signal source: {}", strategy_name);

    // Stage 3: Fetch candles
    let (start, end) = match (read_bound(&adapter, "start"), read_bound(&adapter, "end")) {
        (Ok(start), Ok(end)) => (start, end),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let candles = match CsvCandleSource::new(&candles_path).fetch_candles(start, end) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Loaded {} candles from {}", candles.len(), candles_path);

    // Stage 4: Generate signals and label
    let signals = match signal_source.generate(&candles) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "Labeling: window {}, tp x{}, sl x{}, time limit {} min",
        labeling_config.volatility_window,
        labeling_config.tp_multiplier,
        labeling_config.sl_multiplier,
        labeling_config.time_limit.num_minutes(),
    );
    let run = match labeling::label(&candles, &signals, &labeling_config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 5: Metrics and console summary
    let metrics = LabelMetrics::compute(&run, labeling_config.portfolio_value);
    print_summary(&run, &metrics);

    // Stage 6: Outputs
    eprintln!();
    let output_path = output
        .map(|p| p.display().to_string())
        .or_else(|| adapter.get_string("report", "output"))
        .unwrap_or_else(|| "labeled.csv".to_string());
    if let Err(code) = write_output(
        &CsvLabeledWriter,
        &run,
        &metrics,
        &labeling_config,
        &output_path,
        "Labeled bars",
    ) {
        return code;
    }

    let report_path = report
        .map(|p| p.display().to_string())
        .or_else(|| adapter.get_string("report", "report"));
    if let Some(report_path) = report_path {
        let template_path = adapter
            .get_string("report", "template_path")
            .filter(|s| !s.trim().is_empty());
        let typst = TypstReportAdapter::new(template_path, strategy_name);
        if let Err(code) = write_output(
            &typst,
            &run,
            &metrics,
            &labeling_config,
            &report_path,
            "Report",
        ) {
            return code;
        }
    }

    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_all(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    let labeling_config = match build_labeling_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let candles_path = adapter.get_string("data", "candles").unwrap_or_default();
    let strategy_name = match build_signal_source(&adapter, &candles_path) {
        Ok((_, name)) => name,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let multiplier = |m: Option<f64>| m.map_or_else(|| "disabled".to_string(), |m| m.to_string());
    eprintln!("\nCandles:          {}", candles_path);
    eprintln!("Signal source:    {}", strategy_name);
    eprintln!("Volatility:       {} bars", labeling_config.volatility_window);
    eprintln!("Take profit:      {}", multiplier(labeling_config.take_profit()));
    eprintln!("Stop loss:        {}", multiplier(labeling_config.stop_loss()));
    eprintln!(
        "Time limit:       {} min",
        labeling_config.time_limit.num_minutes()
    );
    eprintln!("Trade cost:       {}", labeling_config.trade_cost);
    eprintln!(
        "Account:          {} per trade at {}x, portfolio {}",
        labeling_config.initial_capital, labeling_config.leverage, labeling_config.portfolio_value
    );

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_data_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let candles_path = adapter.get_string("data", "candles").unwrap_or_default();
    match CsvCandleSource::new(&candles_path).get_data_range() {
        Ok(Some((first, last, count))) => {
            println!("{}: {} bars, {} to {}", candles_path, count, first, last);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("{}: no data found", candles_path);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
