//! Historical performance statistics reported next to the forecast.
//!
//! These figures describe the past and are informational only; the
//! recommendation never reads them.

use serde::Serialize;
use std::fmt;

use crate::domain::features::FeatureFrame;
use crate::domain::instrument::InstrumentKind;

/// Observations used for the recent period change and trend label.
pub const TREND_LOOKBACK: usize = 30;

/// Lookbacks, in observations, for the trailing return table.
pub const TRAILING_PERIODS: [usize; 6] = [1, 7, 30, 90, 180, 365];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendLabel {
    StrongUpward,
    Upward,
    Sideways,
    Downward,
    StrongDownward,
}

impl TrendLabel {
    /// Classifies a percentage change over the lookback period.
    pub fn from_change_pct(change_pct: f64) -> Self {
        if change_pct > 5.0 {
            TrendLabel::StrongUpward
        } else if change_pct > 2.0 {
            TrendLabel::Upward
        } else if change_pct > -2.0 {
            TrendLabel::Sideways
        } else if change_pct > -5.0 {
            TrendLabel::Downward
        } else {
            TrendLabel::StrongDownward
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrendLabel::StrongUpward => "Strong Upward",
            TrendLabel::Upward => "Upward",
            TrendLabel::Sideways => "Sideways",
            TrendLabel::Downward => "Downward",
            TrendLabel::StrongDownward => "Strong Downward",
        };
        f.write_str(name)
    }
}

/// Whether a fund suits a systematic investment plan, judged from its
/// recent trend and consistency score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SipSuitability {
    Recommended,
    SuitableWithMonitoring,
    CostAveragingOnly,
    ResearchFurther,
}

impl SipSuitability {
    pub fn assess(trend: TrendLabel, consistency_score: f64) -> Self {
        match trend {
            TrendLabel::StrongUpward | TrendLabel::Upward if consistency_score > 6.0 => {
                SipSuitability::Recommended
            }
            TrendLabel::Sideways if consistency_score > 5.0 => {
                SipSuitability::SuitableWithMonitoring
            }
            TrendLabel::Downward | TrendLabel::StrongDownward if consistency_score > 7.0 => {
                SipSuitability::CostAveragingOnly
            }
            _ => SipSuitability::ResearchFurther,
        }
    }
}

impl fmt::Display for SipSuitability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SipSuitability::Recommended => "recommended for SIP investments",
            SipSuitability::SuitableWithMonitoring => "suitable for SIP with regular monitoring",
            SipSuitability::CostAveragingOnly => {
                "SIP for cost averaging only; review fund fundamentals"
            }
            SipSuitability::ResearchFurther => "research further before starting a SIP",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrailingReturn {
    pub periods: usize,
    /// Percent change from `periods` observations back to the last one.
    pub return_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    /// Change over the last [`TREND_LOOKBACK`] observations, in percent.
    pub period_change_pct: f64,
    pub trend: TrendLabel,
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Share of positive lookback-period returns, scaled to 0..=10.
    pub consistency_score: f64,
    /// Longest run of observations spent below a previous peak.
    pub max_drawdown_duration: usize,
    /// One entry per [`TRAILING_PERIODS`] lookback the history covers.
    pub trailing_returns: Vec<TrailingReturn>,
    /// Funds only.
    pub sip_suitability: Option<SipSuitability>,
}

impl PerformanceSummary {
    pub fn compute(frame: &FeatureFrame, risk_free_rate: f64, periods_per_year: f64) -> Self {
        let values = frame.values();
        let returns = frame.simple_returns();

        let period_change_pct = period_change_pct(&values, TREND_LOOKBACK);

        let total_return = match (values.first(), values.last()) {
            (Some(&first), Some(&last)) if first > 0.0 => (last - first) / first,
            _ => 0.0,
        };

        let years = returns.len() as f64 / periods_per_year;
        let annualized_return = if years > 0.0 && total_return.is_finite() {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let per_period_rf = risk_free_rate / periods_per_year;
        let (sharpe_ratio, sortino_ratio) =
            compute_risk_adjusted(&returns, per_period_rf, periods_per_year);

        let trend = TrendLabel::from_change_pct(period_change_pct);
        let consistency_score = consistency_score(&values, TREND_LOOKBACK);
        let sip_suitability = match frame.instrument.kind {
            InstrumentKind::MutualFund => Some(SipSuitability::assess(trend, consistency_score)),
            InstrumentKind::Equity => None,
        };

        PerformanceSummary {
            period_change_pct,
            trend,
            total_return,
            annualized_return,
            sharpe_ratio,
            sortino_ratio,
            consistency_score,
            max_drawdown_duration: drawdown_duration(frame),
            trailing_returns: trailing_returns(&values, &TRAILING_PERIODS),
            sip_suitability,
        }
    }
}

fn period_change_pct(values: &[f64], lookback: usize) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let start = values[values.len().saturating_sub(lookback + 1)];
    let last = values[values.len() - 1];
    if start > 0.0 {
        (last - start) / start * 100.0
    } else {
        0.0
    }
}

fn trailing_returns(values: &[f64], periods: &[usize]) -> Vec<TrailingReturn> {
    let Some(&last) = values.last() else {
        return Vec::new();
    };
    periods
        .iter()
        .filter(|&&p| p > 0 && p < values.len())
        .filter_map(|&p| {
            let start = values[values.len() - 1 - p];
            (start > 0.0).then(|| TrailingReturn {
                periods: p,
                return_pct: (last - start) / start * 100.0,
            })
        })
        .collect()
}

fn consistency_score(values: &[f64], lookback: usize) -> f64 {
    if values.len() <= lookback {
        return 0.0;
    }
    let period_returns: Vec<f64> = values
        .windows(lookback + 1)
        .map(|w| w[lookback] / w[0] - 1.0)
        .collect();
    let positive = period_returns.iter().filter(|&&r| r > 0.0).count();
    positive as f64 / period_returns.len() as f64 * 10.0
}

fn drawdown_duration(frame: &FeatureFrame) -> usize {
    let mut longest = 0usize;
    let mut current = 0usize;
    for row in &frame.rows {
        if row.drawdown < 0.0 {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn compute_risk_adjusted(returns: &[f64], per_period_rf: f64, periods_per_year: f64) -> (f64, f64) {
    if returns.len() < 2 {
        return (0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;

    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let excess_return = mean - per_period_rf;

    let sharpe = if stddev > 0.0 {
        (excess_return / stddev) * periods_per_year.sqrt()
    } else {
        0.0
    };

    let downside_sq_sum: f64 = returns
        .iter()
        .filter(|&&r| r < per_period_rf)
        .map(|&r| (r - per_period_rf).powi(2))
        .sum();
    let downside_stddev = (downside_sq_sum / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        (excess_return / downside_stddev) * periods_per_year.sqrt()
    } else {
        0.0
    };

    (sharpe, sortino)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::features::Preprocessor;
    use crate::domain::instrument::Instrument;
    use crate::domain::series::{Observation, TimeSeries};
    use chrono::NaiveDate;

    fn frame(values: &[f64]) -> FeatureFrame {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series = TimeSeries::new(
            Instrument::mutual_fund("118550", "INR"),
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| Observation::new(start + chrono::Duration::days(i as i64), v))
                .collect(),
        );
        Preprocessor::default().prepare(&series, 2).unwrap()
    }

    #[test]
    fn trend_label_bands() {
        assert_eq!(TrendLabel::from_change_pct(6.0), TrendLabel::StrongUpward);
        assert_eq!(TrendLabel::from_change_pct(3.0), TrendLabel::Upward);
        assert_eq!(TrendLabel::from_change_pct(0.0), TrendLabel::Sideways);
        assert_eq!(TrendLabel::from_change_pct(-3.0), TrendLabel::Downward);
        assert_eq!(TrendLabel::from_change_pct(-5.0), TrendLabel::StrongDownward);
        assert_eq!(TrendLabel::StrongUpward.to_string(), "Strong Upward");
    }

    #[test]
    fn period_change_uses_lookback() {
        let values: Vec<f64> = (0..=40).map(|i| 100.0 + i as f64).collect();
        // last 31 values: 110 -> 140
        let pct = period_change_pct(&values, 30);
        assert!((pct - (140.0 / 110.0 - 1.0) * 100.0).abs() < 1e-9);
    }

    #[test]
    fn period_change_short_series_uses_all() {
        let pct = period_change_pct(&[100.0, 104.0], 30);
        assert!((pct - 4.0).abs() < 1e-9);
    }

    #[test]
    fn rising_series_summary() {
        let values: Vec<f64> = (0..253).map(|i| 100.0 * (1.0 + 0.001 * i as f64)).collect();
        let summary = PerformanceSummary::compute(&frame(&values), 0.0, 252.0);
        assert!((summary.total_return - 0.252).abs() < 1e-9);
        assert!((summary.annualized_return - 0.252).abs() < 1e-9);
        assert!(summary.sharpe_ratio > 0.0);
        assert_eq!(summary.sortino_ratio, 0.0);
        assert!((summary.consistency_score - 10.0).abs() < 1e-9);
        assert_eq!(summary.max_drawdown_duration, 0);
    }

    #[test]
    fn drawdown_duration_counts_longest_run() {
        let values = [100.0, 110.0, 100.0, 90.0, 85.0, 120.0, 119.0];
        let summary = PerformanceSummary::compute(&frame(&values), 0.0, 252.0);
        assert_eq!(summary.max_drawdown_duration, 3);
    }

    #[test]
    fn sortino_finite_with_mixed_returns() {
        let (sharpe, sortino) =
            compute_risk_adjusted(&[0.01, -0.005, 0.01, -0.015, 0.02], 0.0, 252.0);
        assert!(sharpe.is_finite());
        assert!(sortino.is_finite());
    }

    #[test]
    fn trailing_returns_cover_available_history() {
        let values: Vec<f64> = (0..=100).map(|i| 100.0 + i as f64).collect();
        let summary = PerformanceSummary::compute(&frame(&values), 0.0, 252.0);
        let periods: Vec<usize> = summary.trailing_returns.iter().map(|r| r.periods).collect();
        assert_eq!(periods, vec![1, 7, 30, 90]);
        // last value 200: 200 / 199 and 200 / 110
        let one = summary.trailing_returns[0].return_pct;
        let ninety = summary.trailing_returns[3].return_pct;
        assert!((one - (200.0 / 199.0 - 1.0) * 100.0).abs() < 1e-9);
        assert!((ninety - (200.0 / 110.0 - 1.0) * 100.0).abs() < 1e-9);
    }

    #[test]
    fn trailing_returns_empty_for_single_value() {
        assert!(trailing_returns(&[100.0], &TRAILING_PERIODS).is_empty());
    }

    #[test]
    fn sip_suitability_bands() {
        assert_eq!(SipSuitability::assess(TrendLabel::Upward, 8.0), SipSuitability::Recommended);
        assert_eq!(
            SipSuitability::assess(TrendLabel::StrongUpward, 6.0),
            SipSuitability::ResearchFurther
        );
        assert_eq!(
            SipSuitability::assess(TrendLabel::Sideways, 5.5),
            SipSuitability::SuitableWithMonitoring
        );
        assert_eq!(
            SipSuitability::assess(TrendLabel::Downward, 7.5),
            SipSuitability::CostAveragingOnly
        );
        assert_eq!(
            SipSuitability::assess(TrendLabel::StrongDownward, 7.0),
            SipSuitability::ResearchFurther
        );
    }

    #[test]
    fn sip_suitability_only_for_funds() {
        let values: Vec<f64> = (0..80).map(|i| 100.0 + 0.5 * i as f64).collect();
        let fund = PerformanceSummary::compute(&frame(&values), 0.0, 252.0);
        assert_eq!(fund.sip_suitability, Some(SipSuitability::Recommended));

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series = TimeSeries::new(
            Instrument::equity("INFY", "INR"),
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| Observation::new(start + chrono::Duration::days(i as i64), v))
                .collect(),
        );
        let equity_frame = Preprocessor::default().prepare(&series, 2).unwrap();
        let equity = PerformanceSummary::compute(&equity_frame, 0.0, 252.0);
        assert_eq!(equity.sip_suitability, None);
    }

    #[test]
    fn consistency_needs_full_period() {
        assert_eq!(consistency_score(&[1.0, 2.0, 3.0], 30), 0.0);
    }
}
