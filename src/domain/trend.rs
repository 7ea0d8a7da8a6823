//! Trend model: polynomial least squares over the observation index with a
//! horizon-scaled prediction interval.
//!
//! Candidate degrees run from 1 up to `min(max_degree, n / 10)` and the one
//! with the lowest BIC wins. The interval half width is
//! `q · s · sqrt(horizon)` where `s` is the residual standard error of the
//! fitted target and `q` the two-sided Student-t quantile. On the level basis
//! the lower bound is floored at zero; on the log basis both bounds are mapped
//! back through `exp`, so they are positive and skewed upwards.
//!
//! Reported widths are the running maximum over horizons `1..=h`, so the
//! interval never narrows as the horizon grows, even when a falling trend
//! shrinks the level-space spread.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};
use statrs::statistics::Statistics;

use crate::domain::error::AnalysisError;
use crate::domain::features::FeatureFrame;
use crate::domain::ols::{fit_polynomial, PolyFit};
use crate::domain::params::TrendParams;

const FLAT_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitBasis {
    Level,
    Log,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HorizonEstimate {
    pub horizon: usize,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
    pub horizon: usize,
    pub effective_sample_size: usize,
    pub last_value: f64,
    pub degree: usize,
    pub basis: FitBasis,
    pub residual_std_error: f64,
    /// 1 - s / sd(values), clamped to [0, 1].
    pub fit_quality: f64,
    /// Set for zero-variance input; point equals the last value and the
    /// interval has zero width.
    pub degenerate: bool,
    pub path: Vec<HorizonEstimate>,
}

impl Forecast {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn half_width(&self) -> f64 {
        self.width() / 2.0
    }

    /// (point - last) / last.
    pub fn expected_change(&self) -> f64 {
        if self.last_value == 0.0 {
            0.0
        } else {
            (self.point - self.last_value) / self.last_value
        }
    }

    /// Half width relative to the magnitude of the point estimate.
    pub fn relative_half_width(&self) -> f64 {
        if self.point == 0.0 {
            if self.half_width() == 0.0 { 0.0 } else { f64::INFINITY }
        } else {
            self.half_width() / self.point.abs()
        }
    }

    fn flat(last_value: f64, horizon: usize, n: usize, waypoints: &[usize]) -> Self {
        Forecast {
            point: last_value,
            lower: last_value,
            upper: last_value,
            horizon,
            effective_sample_size: n,
            last_value,
            degree: 0,
            basis: FitBasis::Level,
            residual_std_error: 0.0,
            fit_quality: 0.0,
            degenerate: true,
            path: waypoints
                .iter()
                .map(|&h| HorizonEstimate {
                    horizon: h,
                    value: last_value,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrendModel {
    params: TrendParams,
}

impl TrendModel {
    pub fn new(params: TrendParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TrendParams {
        &self.params
    }

    pub fn fit_and_forecast(
        &self,
        frame: &FeatureFrame,
        horizon: usize,
    ) -> Result<Forecast, AnalysisError> {
        let n = frame.len();
        let min_rows = self.params.min_fit_rows.max(3);
        if n < min_rows {
            return Err(AnalysisError::InsufficientData {
                observations: n,
                minimum: min_rows,
            });
        }
        if horizon == 0 {
            return Err(AnalysisError::InvalidValue {
                reason: "forecast horizon must be positive".into(),
            });
        }

        let values = frame.values();
        let last_value = values[n - 1];

        if is_flat(&values) {
            return Ok(Forecast::flat(last_value, horizon, n, &self.params.waypoints));
        }

        let basis = if self.params.log_basis {
            FitBasis::Log
        } else {
            FitBasis::Level
        };
        let target: Vec<f64> = match basis {
            FitBasis::Level => values.clone(),
            FitBasis::Log => values.iter().map(|v| v.ln()).collect(),
        };

        let scale = (n - 1) as f64;
        let t: Vec<f64> = (0..n).map(|i| i as f64 / scale).collect();

        let fit = select_fit(&t, &target, degree_cap(n, self.params.max_degree)).ok_or_else(|| {
            AnalysisError::InvalidValue {
                reason: "least squares system is singular".into(),
            }
        })?;

        let to_level = |fitted: f64| match basis {
            FitBasis::Level => fitted,
            FitBasis::Log => fitted.exp(),
        };

        let sse_level: f64 = t
            .iter()
            .zip(&values)
            .map(|(&ti, &v)| {
                let r = v - to_level(fit.predict(ti));
                r * r
            })
            .sum();
        let dof = n - fit.params();
        let s = (sse_level / dof as f64).sqrt();
        let s_target = match basis {
            FitBasis::Level => s,
            FitBasis::Log => fit.residual_std_error(),
        };

        let spread = values.iter().std_dev();
        let fit_quality = if spread > 0.0 {
            (1.0 - s / spread).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let predict_at = |h: usize| to_level(fit.predict((scale + h as f64) / scale));

        let q = critical_value(self.params.confidence_level, dof);
        let bounds_at = |h: usize| {
            let fitted = fit.predict((scale + h as f64) / scale);
            let half_width = q * s_target * (h as f64).sqrt();
            match basis {
                FitBasis::Level => {
                    // floored at zero unless the fit itself extrapolates below it
                    ((fitted - half_width).max(fitted.min(0.0)), fitted + half_width)
                }
                FitBasis::Log => ((fitted - half_width).exp(), (fitted + half_width).exp()),
            }
        };

        let point = predict_at(horizon);
        let (lower, upper) = widen_to_running_max(horizon, bounds_at);

        Ok(Forecast {
            point,
            lower,
            upper,
            horizon,
            effective_sample_size: n,
            last_value,
            degree: fit.degree(),
            basis,
            residual_std_error: s,
            fit_quality,
            degenerate: false,
            path: self
                .params
                .waypoints
                .iter()
                .map(|&h| HorizonEstimate {
                    horizon: h,
                    value: predict_at(h),
                })
                .collect(),
        })
    }
}

/// Highest degree allowed for `n` rows: `min(max_degree, n / 10)`, never
/// below a straight line.
pub fn degree_cap(n: usize, max_degree: usize) -> usize {
    max_degree.min(n / 10).max(1)
}

fn select_fit(t: &[f64], y: &[f64], max_degree: usize) -> Option<PolyFit> {
    (1..=max_degree)
        .filter_map(|d| fit_polynomial(t, y, d))
        .min_by(|a, b| a.bic().total_cmp(&b.bic()))
}

/// Bounds at `horizon`, with the upper bound raised so the width is at least
/// the widest interval seen at any shorter horizon.
fn widen_to_running_max(horizon: usize, bounds_at: impl Fn(usize) -> (f64, f64)) -> (f64, f64) {
    let widest = (1..=horizon)
        .map(|h| {
            let (lower, upper) = bounds_at(h);
            upper - lower
        })
        .fold(0.0, f64::max);
    let (lower, upper) = bounds_at(horizon);
    if upper - lower >= widest {
        (lower, upper)
    } else {
        (lower, lower + widest)
    }
}

fn is_flat(values: &[f64]) -> bool {
    let first = values[0];
    let tolerance = FLAT_TOLERANCE * first.abs().max(1.0);
    values.iter().all(|v| (v - first).abs() <= tolerance)
}

fn critical_value(confidence_level: f64, dof: usize) -> f64 {
    let p = 0.5 + confidence_level / 2.0;
    match StudentsT::new(0.0, 1.0, dof.max(1) as f64) {
        Ok(dist) => dist.inverse_cdf(p),
        Err(_) => Normal::new(0.0, 1.0)
            .map(|dist| dist.inverse_cdf(p))
            .unwrap_or(1.96),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::features::Preprocessor;
    use crate::domain::instrument::{Instrument, InstrumentKind};
    use crate::domain::params::KindParams;
    use crate::domain::series::{Observation, TimeSeries};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn frame(values: &[f64]) -> FeatureFrame {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let series = TimeSeries::new(
            Instrument::equity("TEST", "INR"),
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| Observation::new(start + chrono::Duration::days(i as i64), v))
                .collect(),
        );
        Preprocessor::default().prepare(&series, 2).unwrap()
    }

    fn model() -> TrendModel {
        TrendModel::new(KindParams::defaults_for(InstrumentKind::Equity).trend)
    }

    fn noisy_line(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + 0.5 * i as f64 + (i as f64 * 1.7).sin())
            .collect()
    }

    #[test]
    fn flat_series_is_degenerate() {
        let forecast = model().fit_and_forecast(&frame(&[42.0; 100]), 30).unwrap();
        assert!(forecast.degenerate);
        assert_eq!(forecast.point, 42.0);
        assert_eq!(forecast.lower, 42.0);
        assert_eq!(forecast.upper, 42.0);
        assert_eq!(forecast.width(), 0.0);
        assert_eq!(forecast.fit_quality, 0.0);
        assert!(forecast.path.iter().all(|p| p.value == 42.0));
    }

    #[test]
    fn too_few_rows() {
        let err = model().fit_and_forecast(&frame(&[1.0, 2.0, 3.0, 4.0]), 5).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { observations: 4, minimum: 10 }));
    }

    #[test]
    fn zero_horizon_rejected() {
        let err = model().fit_and_forecast(&frame(&noisy_line(40)), 0).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidValue { .. }));
    }

    #[test]
    fn exact_line_extrapolates() {
        let values: Vec<f64> = (0..50).map(|i| 10.0 + i as f64).collect();
        let forecast = model().fit_and_forecast(&frame(&values), 10).unwrap();
        assert_relative_eq!(forecast.point, 69.0, epsilon = 1e-6);
        assert!(forecast.width() < 1e-6);
        assert_eq!(forecast.effective_sample_size, 50);
        assert!(!forecast.degenerate);
    }

    #[test]
    fn interval_widens_with_horizon() {
        let f = frame(&noisy_line(120));
        let m = model();
        let widths: Vec<f64> = [1, 5, 10, 30, 90]
            .iter()
            .map(|&h| m.fit_and_forecast(&f, h).unwrap().width())
            .collect();
        assert!(widths.windows(2).all(|w| w[1] >= w[0]));
        assert!(widths[0] > 0.0);
    }

    #[test]
    fn interval_contains_point() {
        let forecast = model().fit_and_forecast(&frame(&noisy_line(80)), 7).unwrap();
        assert!(forecast.lower < forecast.point && forecast.point < forecast.upper);
        assert!(forecast.fit_quality > 0.5);
    }

    #[test]
    fn degree_cap_follows_sample_size() {
        assert_eq!(degree_cap(12, 3), 1);
        assert_eq!(degree_cap(25, 3), 2);
        assert_eq!(degree_cap(300, 3), 3);
        assert_eq!(degree_cap(300, 1), 1);
        assert_eq!(degree_cap(5, 3), 1);
    }

    #[test]
    fn quadratic_growth_selects_higher_degree() {
        let values: Vec<f64> = (0..60).map(|i| 50.0 + 0.05 * (i * i) as f64).collect();
        let forecast = model().fit_and_forecast(&frame(&values), 5).unwrap();
        assert!(forecast.degree >= 2);
        // 50 + 0.05 * 64^2
        assert_relative_eq!(forecast.point, 254.8, epsilon = 1e-3);
    }

    #[test]
    fn log_basis_fits_exponential_growth() {
        let values: Vec<f64> = (0..60).map(|i| 100.0 * 1.01_f64.powi(i)).collect();
        let mut params = KindParams::defaults_for(InstrumentKind::MutualFund).trend;
        params.log_basis = true;
        let forecast = TrendModel::new(params).fit_and_forecast(&frame(&values), 10).unwrap();
        assert_eq!(forecast.basis, FitBasis::Log);
        assert_relative_eq!(forecast.point, 100.0 * 1.01_f64.powi(69), epsilon = 1e-6);
    }

    #[test]
    fn log_basis_interval_is_skewed_upwards() {
        let values: Vec<f64> = (0..120)
            .map(|i| 100.0 * 1.01_f64.powi(i) * (1.0 + 0.03 * (i as f64 * 1.7).sin()))
            .collect();
        let mut params = KindParams::defaults_for(InstrumentKind::MutualFund).trend;
        params.log_basis = true;
        let forecast = TrendModel::new(params).fit_and_forecast(&frame(&values), 30).unwrap();

        let above = forecast.upper - forecast.point;
        let below = forecast.point - forecast.lower;
        assert!(above > below, "above {above} below {below}");
        assert!(below > 0.0);
        assert!(forecast.lower > 0.0);
    }

    #[test]
    fn level_lower_bound_floored_at_zero() {
        // small values with heavy noise, so q·s·sqrt(h) exceeds the point
        let values: Vec<f64> = (0..40)
            .map(|i| 8.0 + 6.0 * (i as f64 * 2.3).sin())
            .collect();
        let forecast = model().fit_and_forecast(&frame(&values), 30).unwrap();
        assert!(forecast.point > 0.0);
        assert_eq!(forecast.lower, 0.0);
        assert!(forecast.upper > forecast.point);
    }

    #[test]
    fn width_holds_while_trend_falls_towards_zero() {
        let values: Vec<f64> = (0..60)
            .map(|i| 60.0 - 0.9 * i as f64 + 3.0 * (i as f64 * 1.3).sin())
            .collect();
        let f = frame(&values);
        let m = model();
        let widths: Vec<f64> = (1..=40)
            .map(|h| m.fit_and_forecast(&f, h).unwrap().width())
            .collect();
        assert!(widths.windows(2).all(|w| w[1] >= w[0] - 1e-9));
    }

    #[test]
    fn path_reports_waypoints() {
        let forecast = model().fit_and_forecast(&frame(&noisy_line(60)), 30).unwrap();
        let horizons: Vec<usize> = forecast.path.iter().map(|p| p.horizon).collect();
        assert_eq!(horizons, vec![1, 7, 30]);
        assert_relative_eq!(forecast.path[2].value, forecast.point);
    }

    #[test]
    fn critical_value_near_normal_for_large_samples() {
        let q = critical_value(0.95, 10_000);
        assert!((q - 1.96).abs() < 0.01);
        assert!(critical_value(0.95, 5) > q);
    }
}
