//! Technical signal tally read off the latest feature row.
//!
//! Each indicator votes buy, sell or abstains: RSI outside 30..70, MACD
//! against its signal line, price outside the Bollinger band, and the
//! short/medium/long moving-average ordering. The EMA crossover is reported
//! but does not vote. The tally and its verdict are reported with the
//! analysis but do not drive the recommendation.

use serde::Serialize;
use std::fmt;

use crate::domain::features::FeatureFrame;

const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

/// Label for the net vote `buy - sell`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignalVerdict {
    StrongBuy,
    Buy,
    WeakBuy,
    Hold,
    WeakSell,
    Sell,
    StrongSell,
}

impl SignalVerdict {
    pub fn from_score(score: i32) -> Self {
        match score {
            i32::MIN..=-3 => SignalVerdict::StrongSell,
            -2 => SignalVerdict::Sell,
            -1 => SignalVerdict::WeakSell,
            0 => SignalVerdict::Hold,
            1 => SignalVerdict::WeakBuy,
            2 => SignalVerdict::Buy,
            _ => SignalVerdict::StrongBuy,
        }
    }
}

impl fmt::Display for SignalVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalVerdict::StrongBuy => "Strong Buy",
            SignalVerdict::Buy => "Buy",
            SignalVerdict::WeakBuy => "Weak Buy",
            SignalVerdict::Hold => "Hold",
            SignalVerdict::WeakSell => "Weak Sell",
            SignalVerdict::Sell => "Sell",
            SignalVerdict::StrongSell => "Strong Sell",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicalSignals {
    pub rsi: Option<f64>,
    pub rsi_zone: Option<RsiZone>,
    pub macd_bullish: Option<bool>,
    /// Short EMA above the long one. Not counted as a vote.
    pub ema_bullish: Option<bool>,
    pub buy_signals: u32,
    pub sell_signals: u32,
    pub verdict: SignalVerdict,
}

impl TechnicalSignals {
    /// buy_signals - sell_signals.
    pub fn score(&self) -> i32 {
        self.buy_signals as i32 - self.sell_signals as i32
    }

    pub fn from_frame(frame: &FeatureFrame) -> Self {
        let Some(last) = frame.last() else {
            return TechnicalSignals {
                rsi: None,
                rsi_zone: None,
                macd_bullish: None,
                ema_bullish: None,
                buy_signals: 0,
                sell_signals: 0,
                verdict: SignalVerdict::Hold,
            };
        };

        let mut buy = 0u32;
        let mut sell = 0u32;

        let rsi_zone = last.rsi.map(|rsi| {
            if rsi > RSI_OVERBOUGHT {
                sell += 1;
                RsiZone::Overbought
            } else if rsi < RSI_OVERSOLD {
                buy += 1;
                RsiZone::Oversold
            } else {
                RsiZone::Neutral
            }
        });

        let macd_bullish = last.macd.map(|m| m.line > m.signal);
        match macd_bullish {
            Some(true) => buy += 1,
            Some(false) => sell += 1,
            None => {}
        }

        if let Some(band) = last.bollinger {
            if last.value < band.lower {
                buy += 1;
            } else if last.value > band.upper {
                sell += 1;
            }
        }

        let ema_bullish = match (last.ema_short, last.ema_long) {
            (Some(short), Some(long)) if short != long => Some(short > long),
            _ => None,
        };

        let means: Vec<Option<f64>> = frame
            .windows
            .iter()
            .map(|&w| last.rolling_for(w).and_then(|s| s.mean))
            .collect();
        for pair in means.windows(2) {
            if let (Some(shorter), Some(longer)) = (pair[0], pair[1]) {
                if shorter > longer {
                    buy += 1;
                } else if shorter < longer {
                    sell += 1;
                }
            }
        }

        TechnicalSignals {
            rsi: last.rsi,
            rsi_zone,
            macd_bullish,
            ema_bullish,
            buy_signals: buy,
            sell_signals: sell,
            verdict: SignalVerdict::from_score(buy as i32 - sell as i32),
        }
    }
}
