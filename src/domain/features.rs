//! Preprocessing: cleaning a raw series and deriving the feature frame.
//!
//! Steps, in order: drop duplicate dates keeping the latest value, sort
//! ascending, exclude non-positive observations (flagged, not fatal unless
//! every value is non-positive), then compute returns, rolling statistics,
//! technical indicators, running maximum and drawdown.
//!
//! Gaps between dates are kept as they are. Rolling windows count
//! observations, not calendar days.

use chrono::NaiveDate;

use crate::domain::error::AnalysisError;
use crate::domain::indicator::{
    bollinger, calculate_bollinger, calculate_ema, calculate_macd, calculate_rsi, macd,
    rolling_mean, rolling_std, BollingerPoint, MacdPoint,
};
use crate::domain::instrument::Instrument;
use crate::domain::series::{Observation, TimeSeries};

pub const DEFAULT_WINDOWS: [usize; 3] = [5, 20, 50];
pub const EMA_SHORT: usize = 5;
pub const EMA_LONG: usize = 20;
pub const RSI_PERIOD: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollingStats {
    pub window: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub value: f64,
    pub simple_return: Option<f64>,
    pub log_return: Option<f64>,
    pub rolling: Vec<RollingStats>,
    pub running_max: f64,
    /// value / running_max - 1, always <= 0.
    pub drawdown: f64,
    pub ema_short: Option<f64>,
    pub ema_long: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<MacdPoint>,
    pub bollinger: Option<BollingerPoint>,
}

impl FeatureRow {
    pub fn rolling_for(&self, window: usize) -> Option<&RollingStats> {
        self.rolling.iter().find(|r| r.window == window)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameWarnings {
    /// Observations dropped because their value was zero or negative.
    pub excluded_non_positive: usize,
}

impl FrameWarnings {
    pub fn any(&self) -> bool {
        self.excluded_non_positive > 0
    }
}

#[derive(Debug, Clone)]
pub struct FeatureFrame {
    pub instrument: Instrument,
    pub windows: Vec<usize>,
    pub rows: Vec<FeatureRow>,
    pub warnings: FrameWarnings,
    /// Length of the series the frame was derived from.
    pub source_len: usize,
}

impl FeatureFrame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.value).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    /// Defined simple returns in date order.
    pub fn simple_returns(&self) -> Vec<f64> {
        self.rows.iter().filter_map(|r| r.simple_return).collect()
    }

    pub fn log_returns(&self) -> Vec<f64> {
        self.rows.iter().filter_map(|r| r.log_return).collect()
    }

    pub fn rolling_mean(&self, window: usize) -> Vec<Option<f64>> {
        self.rows
            .iter()
            .map(|r| r.rolling_for(window).and_then(|s| s.mean))
            .collect()
    }

    pub fn rolling_std(&self, window: usize) -> Vec<Option<f64>> {
        self.rows
            .iter()
            .map(|r| r.rolling_for(window).and_then(|s| s.std))
            .collect()
    }

    pub fn drawdowns(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.drawdown).collect()
    }

    /// Deepest drawdown as a positive fraction.
    pub fn max_drawdown(&self) -> f64 {
        self.rows
            .iter()
            .map(|r| -r.drawdown)
            .fold(0.0_f64, f64::max)
    }

    pub fn last(&self) -> Option<&FeatureRow> {
        self.rows.last()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.rows.last().map(|r| r.value)
    }
}

/// Derives a [`FeatureFrame`] from a raw series.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    windows: Vec<usize>,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOWS.to_vec())
    }
}

impl Preprocessor {
    pub fn new(mut windows: Vec<usize>) -> Self {
        windows.retain(|&w| w > 0);
        windows.sort_unstable();
        windows.dedup();
        Self { windows }
    }

    pub fn windows(&self) -> &[usize] {
        &self.windows
    }

    pub fn prepare(
        &self,
        series: &TimeSeries,
        minimum_observations: usize,
    ) -> Result<FeatureFrame, AnalysisError> {
        let observations = series.normalized();

        if observations.len() < minimum_observations {
            return Err(AnalysisError::InsufficientData {
                observations: observations.len(),
                minimum: minimum_observations,
            });
        }

        if let Some(bad) = observations.iter().find(|o| !o.value.is_finite()) {
            return Err(AnalysisError::InvalidValue {
                reason: format!("non-finite value {} on {}", bad.value, bad.date),
            });
        }

        let retained: Vec<Observation> = observations
            .iter()
            .copied()
            .filter(|o| o.value > 0.0)
            .collect();
        let excluded = observations.len() - retained.len();

        if retained.is_empty() {
            return Err(AnalysisError::InvalidValue {
                reason: format!("all {} values are non-positive", observations.len()),
            });
        }

        if retained.len() < minimum_observations {
            return Err(AnalysisError::InsufficientData {
                observations: retained.len(),
                minimum: minimum_observations,
            });
        }

        let rows = self.build_rows(&retained);

        Ok(FeatureFrame {
            instrument: series.instrument.clone(),
            windows: self.windows.clone(),
            rows,
            warnings: FrameWarnings {
                excluded_non_positive: excluded,
            },
            source_len: series.len(),
        })
    }

    fn build_rows(&self, observations: &[Observation]) -> Vec<FeatureRow> {
        let values: Vec<f64> = observations.iter().map(|o| o.value).collect();

        let rolling: Vec<(usize, Vec<Option<f64>>, Vec<Option<f64>>)> = self
            .windows
            .iter()
            .map(|&w| (w, rolling_mean(&values, w), rolling_std(&values, w)))
            .collect();

        let ema_short = calculate_ema(&values, EMA_SHORT);
        let ema_long = calculate_ema(&values, EMA_LONG);
        let rsi = calculate_rsi(&values, RSI_PERIOD);
        let macd = calculate_macd(
            &values,
            macd::DEFAULT_FAST,
            macd::DEFAULT_SLOW,
            macd::DEFAULT_SIGNAL,
        );
        let bands =
            calculate_bollinger(&values, bollinger::DEFAULT_PERIOD, bollinger::DEFAULT_MULT);

        let mut running_max = f64::NEG_INFINITY;
        let mut rows = Vec::with_capacity(observations.len());

        for (i, obs) in observations.iter().enumerate() {
            let (simple_return, log_return) = if i == 0 {
                (None, None)
            } else {
                let prev = values[i - 1];
                (Some((obs.value - prev) / prev), Some((obs.value / prev).ln()))
            };

            running_max = running_max.max(obs.value);

            rows.push(FeatureRow {
                date: obs.date,
                value: obs.value,
                simple_return,
                log_return,
                rolling: rolling
                    .iter()
                    .map(|(window, means, stds)| RollingStats {
                        window: *window,
                        mean: means[i],
                        std: stds[i],
                    })
                    .collect(),
                running_max,
                drawdown: obs.value / running_max - 1.0,
                ema_short: ema_short[i],
                ema_long: ema_long[i],
                rsi: rsi[i],
                macd: macd[i],
                bollinger: bands[i],
            });
        }

        rows
    }
}
