//! Volatility and drawdown risk classification.

use serde::Serialize;
use statrs::statistics::Statistics;
use std::fmt;

use crate::domain::features::FeatureFrame;
use crate::domain::params::RiskThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RiskClass {
    Low,
    Moderate,
    High,
    /// Too few returns to estimate volatility.
    Indeterminate,
}

impl fmt::Display for RiskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskClass::Low => "Low",
            RiskClass::Moderate => "Moderate",
            RiskClass::High => "High",
            RiskClass::Indeterminate => "Indeterminate",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskProfile {
    pub class: RiskClass,
    /// Annualized standard deviation of simple returns.
    pub volatility: Option<f64>,
    /// Deepest decline from a running maximum, as a positive fraction.
    pub max_drawdown: f64,
    pub return_observations: usize,
}

#[derive(Debug, Clone)]
pub struct RiskAssessor {
    thresholds: RiskThresholds,
}

impl RiskAssessor {
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    pub fn assess(&self, frame: &FeatureFrame) -> RiskProfile {
        let returns = frame.simple_returns();
        let max_drawdown = frame.max_drawdown();
        let required = self.thresholds.min_return_observations.max(2);

        if returns.len() < required {
            return RiskProfile {
                class: RiskClass::Indeterminate,
                volatility: None,
                max_drawdown,
                return_observations: returns.len(),
            };
        }

        let volatility = returns.iter().std_dev() * self.thresholds.periods_per_year.sqrt();

        RiskProfile {
            class: self.classify(volatility, max_drawdown),
            volatility: Some(volatility),
            max_drawdown,
            return_observations: returns.len(),
        }
    }

    fn classify(&self, volatility: f64, drawdown: f64) -> RiskClass {
        let t = &self.thresholds;
        if volatility > t.high_volatility || drawdown > t.high_drawdown {
            RiskClass::High
        } else if volatility <= t.low_volatility && drawdown <= t.low_drawdown {
            RiskClass::Low
        } else {
            RiskClass::Moderate
        }
    }
}
