//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvSeriesAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::svg_chart_adapter::SvgChartAdapter;
use crate::domain::engine::AnalysisEngine;
use crate::domain::error::AnalysisError;
use crate::domain::instrument::{Instrument, InstrumentKind};
use crate::domain::params::{EngineConfig, KindParams};
use crate::domain::report::AnalysisResult;
use crate::domain::series::TimeSeries;
use crate::ports::chart_port::ChartPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::series_port::SeriesPort;

const KNOWN_SECTIONS: [&str; 3] = ["engine", "equity", "mutual_fund"];

#[derive(Parser, Debug)]
#[command(
    name = "navpredictor",
    about = "Trend, risk and recommendation analysis for stocks and mutual funds"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze one or more instruments and print a JSON record per instrument
    Analyze {
        /// Directory holding <SYMBOL>.csv files
        #[arg(short, long)]
        data_dir: PathBuf,
        /// Symbol to analyze; repeat for several. Defaults to every CSV in the directory
        #[arg(short, long)]
        symbol: Vec<String>,
        /// equity | fund
        #[arg(short, long, default_value = "equity")]
        kind: InstrumentKind,
        #[arg(long, default_value = "INR")]
        currency: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the forecast horizon, in observations
        #[arg(long)]
        horizon: Option<usize>,
        /// Write an SVG chart per instrument into this directory
        #[arg(long)]
        chart_dir: Option<PathBuf>,
        /// Print a performance and signal summary to stderr
        #[arg(long)]
        summary: bool,
    },
    /// Validate a configuration file
    CheckConfig {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze {
            data_dir,
            symbol,
            kind,
            currency,
            config,
            horizon,
            chart_dir,
            summary,
        } => run_analyze(
            &data_dir,
            &symbol,
            kind,
            &currency,
            config.as_deref(),
            horizon,
            chart_dir,
            summary,
        ),
        Command::CheckConfig { config } => run_check_config(&config),
    }
}

/// Loads the engine configuration, applying a horizon override to both
/// instrument kinds. Without a file every kind uses its defaults.
pub fn build_engine_config(
    config_path: Option<&Path>,
    horizon: Option<usize>,
) -> Result<EngineConfig, AnalysisError> {
    let mut config = match config_path {
        Some(path) => EngineConfig::from_config(&FileConfigAdapter::from_file(path)?)?,
        None => EngineConfig::default(),
    };

    if let Some(h) = horizon {
        config.equity.trend.horizon = h;
        config.mutual_fund.trend.horizon = h;
        config.validate()?;
    }
    Ok(config)
}

/// Successful records in input order plus every per-symbol failure.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub results: Vec<AnalysisResult>,
    pub failures: Vec<(String, AnalysisError)>,
}

pub fn analyze_symbols(
    engine: &AnalysisEngine,
    source: &dyn SeriesPort,
    symbols: &[String],
    kind: InstrumentKind,
    currency: &str,
    chart: Option<&dyn ChartPort>,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    let mut series: Vec<TimeSeries> = Vec::with_capacity(symbols.len());

    for symbol in symbols {
        let instrument = Instrument::new(symbol, kind, currency);
        match source.fetch_series(&instrument) {
            Ok(s) => series.push(s),
            Err(e) => outcome.failures.push((instrument.symbol, e)),
        }
    }

    for (s, result) in series.iter().zip(engine.analyze_batch(&series, chart)) {
        match result {
            Ok(r) => outcome.results.push(r),
            Err(e) => outcome.failures.push((s.instrument.symbol.clone(), e)),
        }
    }
    outcome
}

#[allow(clippy::too_many_arguments)]
fn run_analyze(
    data_dir: &Path,
    symbols: &[String],
    kind: InstrumentKind,
    currency: &str,
    config_path: Option<&Path>,
    horizon: Option<usize>,
    chart_dir: Option<PathBuf>,
    summary: bool,
) -> ExitCode {
    let config = match build_engine_config(config_path, horizon) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let source = CsvSeriesAdapter::new(data_dir.to_path_buf());
    let symbols = if symbols.is_empty() {
        match source.list_symbols() {
            Ok(found) => found,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        }
    } else {
        symbols.to_vec()
    };
    if symbols.is_empty() {
        eprintln!("error: no symbols found in {}", data_dir.display());
        return ExitCode::from(3);
    }

    let engine = AnalysisEngine::new(config);
    let chart = chart_dir.map(SvgChartAdapter::new);
    let outcome = analyze_symbols(
        &engine,
        &source,
        &symbols,
        kind,
        currency,
        chart.as_ref().map(|c| c as &dyn ChartPort),
    );

    for result in &outcome.results {
        if summary {
            print_summary(result);
        }
        match serde_json::to_string(&result.to_record()) {
            Ok(line) => println!("{line}"),
            Err(e) => {
                eprintln!("error: failed to serialize {}: {e}", result.instrument.symbol);
                return ExitCode::from(1);
            }
        }
    }

    for (symbol, e) in &outcome.failures {
        eprintln!("error: {symbol}: {e}");
    }

    match outcome.failures.first() {
        Some((_, e)) => e.into(),
        None => ExitCode::SUCCESS,
    }
}

fn print_summary(result: &AnalysisResult) {
    let f = &result.forecast;
    eprintln!("\n=== {} ({}) ===", result.instrument.symbol, result.instrument.kind);
    eprintln!(
        "Forecast:         {:.2} [{:.2}, {:.2}] in {} periods (degree {}, n = {})",
        f.point, f.lower, f.upper, f.horizon, f.degree, f.effective_sample_size
    );
    for estimate in &f.path {
        eprintln!("  +{:<4}           {:.2}", estimate.horizon, estimate.value);
    }
    eprintln!(
        "Risk:             {} (max drawdown {:.1}%)",
        result.risk.class,
        result.risk.max_drawdown * 100.0
    );
    if let Some(p) = &result.performance {
        eprintln!("Trend:            {} ({:+.2}%)", p.trend, p.period_change_pct);
        eprintln!("Total Return:     {:.2}%", p.total_return * 100.0);
        eprintln!("Annual Return:    {:.2}%", p.annualized_return * 100.0);
        eprintln!("Sharpe Ratio:     {:.2}", p.sharpe_ratio);
        eprintln!("Sortino Ratio:    {:.2}", p.sortino_ratio);
        eprintln!("Consistency:      {:.1}/10", p.consistency_score);
        for r in &p.trailing_returns {
            eprintln!("  {:>3}-period return  {:+.2}%", r.periods, r.return_pct);
        }
        if let Some(sip) = p.sip_suitability {
            eprintln!("SIP:              {}", sip);
        }
    }
    if let Some(s) = &result.signals {
        eprintln!(
            "Signals:          {} ({} buy / {} sell)",
            s.verdict, s.buy_signals, s.sell_signals
        );
    }
    eprintln!(
        "Recommendation:   {} (confidence {:.2})",
        result.recommendation.action, result.recommendation.confidence
    );
}

/// Parses and validates a config file, returning the resolved settings and
/// any sections the engine does not read.
pub fn check_config(path: &Path) -> Result<(EngineConfig, Vec<String>), AnalysisError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    let config = EngineConfig::from_config(&adapter)?;
    let unknown = adapter
        .sections()
        .into_iter()
        .filter(|s| !KNOWN_SECTIONS.contains(&s.as_str()))
        .collect();
    Ok((config, unknown))
}

pub fn run_check_config(path: &Path) -> ExitCode {
    eprintln!("Loading config from {}", path.display());
    let (config, unknown) = match check_config(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    for section in &unknown {
        eprintln!("warning: unknown section [{section}] ignored");
    }
    eprintln!("Config validated successfully");
    eprintln!("  parallel:       {}", config.parallel);
    eprintln!("  risk_free_rate: {}", config.risk_free_rate);
    for kind in [InstrumentKind::Equity, InstrumentKind::MutualFund] {
        describe_kind(kind, config.for_kind(kind));
    }
    ExitCode::SUCCESS
}

fn describe_kind(kind: InstrumentKind, params: &KindParams) {
    eprintln!("\n[{}]", kind.config_section());
    eprintln!("  minimum_observations: {}", params.minimum_observations);
    eprintln!(
        "  windows:              {}",
        params
            .windows
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    eprintln!(
        "  horizon:              {} (max degree {})",
        params.trend.horizon, params.trend.max_degree
    );
    eprintln!(
        "  volatility bands:     {} / {}",
        params.risk.low_volatility, params.risk.high_volatility
    );
    eprintln!(
        "  drawdown bands:       {} / {}",
        params.risk.low_drawdown, params.risk.high_drawdown
    );
}
