//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line, seeded once the slow EMA exists
//! Histogram = MACD Line - Signal Line
//!
//! Defined from index (slow - 1) + (signal - 1) onwards.

use crate::domain::indicator::calculate_ema;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

pub fn calculate_macd(
    values: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Vec<Option<MacdPoint>> {
    if values.is_empty() || fast == 0 || slow == 0 || signal_period == 0 || fast >= slow {
        return vec![None; values.len()];
    }

    let ema_fast = calculate_ema(values, fast);
    let ema_slow = calculate_ema(values, slow);

    let macd_line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let macd_warmup = slow - 1;
    let mut out = vec![None; values.len()];
    if values.len() < macd_warmup + signal_period {
        return out;
    }

    let defined: Vec<f64> = macd_line[macd_warmup..].iter().flatten().copied().collect();
    let signal_line = calculate_ema(&defined, signal_period);

    for (offset, signal) in signal_line.iter().enumerate() {
        let idx = macd_warmup + offset;
        if let (Some(signal), Some(line)) = (signal, macd_line[idx]) {
            out[idx] = Some(MacdPoint {
                line,
                signal: *signal,
                histogram: line - signal,
            });
        }
    }

    out
}
