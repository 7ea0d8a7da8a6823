//! Traits the engine uses to reach the outside world.

pub mod chart_port;
pub mod config_port;
pub mod series_port;
