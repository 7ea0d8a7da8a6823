//! Windowed indicators over a value slice.
//!
//! Every calculation returns one `Option<f64>` (or option of a composite
//! point) per input index. `None` marks an index whose window is not yet
//! filled; undefined values are never replaced by zero.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rolling;
pub mod rsi;

pub use bollinger::{calculate_bollinger, BollingerPoint};
pub use ema::calculate_ema;
pub use macd::{calculate_macd, MacdPoint};
pub use rolling::{rolling_mean, rolling_std};
pub use rsi::calculate_rsi;
