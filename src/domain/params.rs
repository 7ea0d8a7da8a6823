//! Per-kind analysis parameters and their configuration loading.
//!
//! Every threshold the pipeline uses lives here, keyed by
//! [`InstrumentKind`] and resolved once at the start of an analysis.
//! INI layout:
//!
//! ```ini
//! [engine]
//! parallel = true
//! risk_free_rate = 0.04
//!
//! [equity]
//! minimum_observations = 20
//! windows = 5,20,50
//! horizon = 30
//!
//! [mutual_fund]
//! low_volatility = 0.12
//! ```
//!
//! Keys missing from a section fall back to that kind's defaults.

use crate::domain::error::AnalysisError;
use crate::domain::features::DEFAULT_WINDOWS;
use crate::domain::instrument::InstrumentKind;
use crate::ports::config_port::ConfigPort;

pub const MAX_POLY_DEGREE: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendParams {
    pub min_fit_rows: usize,
    pub max_degree: usize,
    pub horizon: usize,
    /// Extra horizons reported as point estimates alongside the main one.
    pub waypoints: Vec<usize>,
    pub confidence_level: f64,
    /// Fit ln(value) instead of value.
    pub log_basis: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskThresholds {
    pub min_return_observations: usize,
    pub periods_per_year: f64,
    pub low_volatility: f64,
    pub low_drawdown: f64,
    pub high_volatility: f64,
    pub high_drawdown: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionThresholds {
    /// Minimum expected change for Buy / ContinueSip.
    pub buy_threshold: f64,
    /// Minimum expected fall for Sell / PauseSip.
    pub sell_threshold: f64,
    /// Upside a High-risk instrument needs before Buy / ContinueSip.
    pub high_risk_buy_threshold: f64,
    pub max_relative_half_width: f64,
    pub min_signal_to_noise: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KindParams {
    pub minimum_observations: usize,
    pub windows: Vec<usize>,
    pub trend: TrendParams,
    pub risk: RiskThresholds,
    pub decision: DecisionThresholds,
}

impl KindParams {
    pub fn defaults_for(kind: InstrumentKind) -> Self {
        match kind {
            InstrumentKind::Equity => KindParams {
                minimum_observations: 20,
                windows: DEFAULT_WINDOWS.to_vec(),
                trend: TrendParams {
                    min_fit_rows: 10,
                    max_degree: MAX_POLY_DEGREE,
                    horizon: 30,
                    waypoints: vec![1, 7, 30],
                    confidence_level: 0.95,
                    log_basis: false,
                },
                risk: RiskThresholds {
                    min_return_observations: 5,
                    periods_per_year: 252.0,
                    low_volatility: 0.25,
                    low_drawdown: 0.15,
                    high_volatility: 0.45,
                    high_drawdown: 0.35,
                },
                decision: DecisionThresholds {
                    buy_threshold: 0.02,
                    sell_threshold: 0.02,
                    high_risk_buy_threshold: 0.10,
                    max_relative_half_width: 0.25,
                    min_signal_to_noise: 0.25,
                },
            },
            InstrumentKind::MutualFund => KindParams {
                minimum_observations: 10,
                windows: DEFAULT_WINDOWS.to_vec(),
                trend: TrendParams {
                    min_fit_rows: 10,
                    max_degree: MAX_POLY_DEGREE,
                    horizon: 30,
                    waypoints: vec![1, 7, 30],
                    confidence_level: 0.95,
                    log_basis: false,
                },
                risk: RiskThresholds {
                    min_return_observations: 5,
                    periods_per_year: 252.0,
                    low_volatility: 0.12,
                    low_drawdown: 0.08,
                    high_volatility: 0.25,
                    high_drawdown: 0.20,
                },
                decision: DecisionThresholds {
                    buy_threshold: 0.0,
                    sell_threshold: 0.05,
                    high_risk_buy_threshold: 0.08,
                    max_relative_half_width: 0.15,
                    min_signal_to_noise: 0.25,
                },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Run the trend model and risk assessment on separate rayon workers.
    pub parallel: bool,
    /// Annual rate used for Sharpe/Sortino ratios.
    pub risk_free_rate: f64,
    pub equity: KindParams,
    pub mutual_fund: KindParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            risk_free_rate: 0.04,
            equity: KindParams::defaults_for(InstrumentKind::Equity),
            mutual_fund: KindParams::defaults_for(InstrumentKind::MutualFund),
        }
    }
}

impl EngineConfig {
    pub fn for_kind(&self, kind: InstrumentKind) -> &KindParams {
        match kind {
            InstrumentKind::Equity => &self.equity,
            InstrumentKind::MutualFund => &self.mutual_fund,
        }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, AnalysisError> {
        let defaults = EngineConfig::default();
        let parsed = EngineConfig {
            parallel: config.get_bool("engine", "parallel", defaults.parallel)?,
            risk_free_rate: read_f64(config, "engine", "risk_free_rate", defaults.risk_free_rate)?,
            equity: load_kind(config, InstrumentKind::Equity)?,
            mutual_fund: load_kind(config, InstrumentKind::MutualFund)?,
        };
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(0.0..1.0).contains(&self.risk_free_rate) {
            return Err(AnalysisError::config_invalid(
                "engine",
                "risk_free_rate",
                "risk_free_rate must be between 0 and 1",
            ));
        }
        validate_kind(InstrumentKind::Equity.config_section(), &self.equity)?;
        validate_kind(InstrumentKind::MutualFund.config_section(), &self.mutual_fund)?;
        Ok(())
    }
}

fn load_kind(config: &dyn ConfigPort, kind: InstrumentKind) -> Result<KindParams, AnalysisError> {
    let s = kind.config_section();
    let d = KindParams::defaults_for(kind);

    Ok(KindParams {
        minimum_observations: read_usize(
            config,
            s,
            "minimum_observations",
            d.minimum_observations,
        )?,
        windows: read_usize_list(config, s, "windows", &d.windows)?,
        trend: TrendParams {
            min_fit_rows: read_usize(config, s, "min_fit_rows", d.trend.min_fit_rows)?,
            max_degree: read_usize(config, s, "max_degree", d.trend.max_degree)?,
            horizon: read_usize(config, s, "horizon", d.trend.horizon)?,
            waypoints: read_usize_list(config, s, "waypoints", &d.trend.waypoints)?,
            confidence_level: read_f64(config, s, "confidence_level", d.trend.confidence_level)?,
            log_basis: config.get_bool(s, "log_basis", d.trend.log_basis)?,
        },
        risk: RiskThresholds {
            min_return_observations: read_usize(
                config,
                s,
                "min_return_observations",
                d.risk.min_return_observations,
            )?,
            periods_per_year: read_f64(config, s, "periods_per_year", d.risk.periods_per_year)?,
            low_volatility: read_f64(config, s, "low_volatility", d.risk.low_volatility)?,
            low_drawdown: read_f64(config, s, "low_drawdown", d.risk.low_drawdown)?,
            high_volatility: read_f64(config, s, "high_volatility", d.risk.high_volatility)?,
            high_drawdown: read_f64(config, s, "high_drawdown", d.risk.high_drawdown)?,
        },
        decision: DecisionThresholds {
            buy_threshold: read_f64(config, s, "buy_threshold", d.decision.buy_threshold)?,
            sell_threshold: read_f64(config, s, "sell_threshold", d.decision.sell_threshold)?,
            high_risk_buy_threshold: read_f64(
                config,
                s,
                "high_risk_buy_threshold",
                d.decision.high_risk_buy_threshold,
            )?,
            max_relative_half_width: read_f64(
                config,
                s,
                "max_relative_half_width",
                d.decision.max_relative_half_width,
            )?,
            min_signal_to_noise: read_f64(
                config,
                s,
                "min_signal_to_noise",
                d.decision.min_signal_to_noise,
            )?,
        },
    })
}

fn read_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, AnalysisError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
            AnalysisError::config_invalid(
                section,
                key,
                format!("expected a non-negative integer, got '{raw}'"),
            )
        }),
    }
}

fn read_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, AnalysisError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(AnalysisError::config_invalid(
                section,
                key,
                format!("expected a number, got '{raw}'"),
            )),
        },
    }
}

fn read_usize_list(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: &[usize],
) -> Result<Vec<usize>, AnalysisError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(default.to_vec());
    };

    raw.split(',')
        .map(|token| {
            token.trim().parse::<usize>().map_err(|_| {
                AnalysisError::config_invalid(
                    section,
                    key,
                    format!("expected a comma separated list of integers, got '{raw}'"),
                )
            })
        })
        .collect()
}

fn validate_kind(section: &str, params: &KindParams) -> Result<(), AnalysisError> {
    let invalid =
        |key: &str, reason: &str| Err(AnalysisError::config_invalid(section, key, reason));

    if params.minimum_observations < 2 {
        return invalid("minimum_observations", "minimum_observations must be at least 2");
    }
    if params.windows.is_empty() || params.windows.iter().any(|&w| w < 2) {
        return invalid("windows", "windows must be non-empty and each at least 2");
    }

    let trend = &params.trend;
    if trend.min_fit_rows < 3 {
        return invalid("min_fit_rows", "min_fit_rows must be at least 3");
    }
    if !(1..=MAX_POLY_DEGREE).contains(&trend.max_degree) {
        return invalid("max_degree", "max_degree must be between 1 and 3");
    }
    if trend.horizon == 0 {
        return invalid("horizon", "horizon must be positive");
    }
    if trend.waypoints.contains(&0) {
        return invalid("waypoints", "waypoints must be positive");
    }
    if !(trend.confidence_level > 0.0 && trend.confidence_level < 1.0) {
        return invalid("confidence_level", "confidence_level must be between 0 and 1");
    }

    let risk = &params.risk;
    if risk.periods_per_year <= 0.0 {
        return invalid("periods_per_year", "periods_per_year must be positive");
    }
    if risk.low_volatility <= 0.0 || risk.high_volatility < risk.low_volatility {
        return invalid(
            "high_volatility",
            "volatility thresholds must be positive and high_volatility >= low_volatility",
        );
    }
    if risk.low_drawdown <= 0.0
        || risk.high_drawdown < risk.low_drawdown
        || risk.high_drawdown > 1.0
    {
        return invalid(
            "high_drawdown",
            "drawdown thresholds must be in (0, 1] and high_drawdown >= low_drawdown",
        );
    }

    let decision = &params.decision;
    if decision.buy_threshold < 0.0 || decision.sell_threshold < 0.0 {
        return invalid("buy_threshold", "buy_threshold and sell_threshold must be non-negative");
    }
    if decision.high_risk_buy_threshold < decision.buy_threshold {
        return invalid(
            "high_risk_buy_threshold",
            "high_risk_buy_threshold must be at least buy_threshold",
        );
    }
    if decision.max_relative_half_width <= 0.0 {
        return invalid("max_relative_half_width", "max_relative_half_width must be positive");
    }
    if decision.min_signal_to_noise < 0.0 {
        return invalid("min_signal_to_noise", "min_signal_to_noise must be non-negative");
    }

    Ok(())
}
