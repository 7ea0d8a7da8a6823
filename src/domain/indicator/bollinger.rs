//! Bollinger Bands.
//!
//! Middle = rolling mean over n values; Upper/Lower = Middle ± mult × sample
//! standard deviation over the same window.
//! Default parameters: period=20, multiplier=2.0.

use crate::domain::indicator::{rolling_mean, rolling_std};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULT: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerPoint {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

pub fn calculate_bollinger(
    values: &[f64],
    period: usize,
    mult: f64,
) -> Vec<Option<BollingerPoint>> {
    let means = rolling_mean(values, period);
    let stds = rolling_std(values, period);

    means
        .iter()
        .zip(&stds)
        .map(|(m, s)| match (m, s) {
            (Some(middle), Some(std)) => Some(BollingerPoint {
                upper: middle + mult * std,
                middle: *middle,
                lower: middle - mult * std,
            }),
            _ => None,
        })
        .collect()
}
