//! Core domain types and the analysis pipeline.

pub mod engine;
pub mod error;
pub mod features;
pub mod indicator;
pub mod instrument;
pub mod ols;
pub mod params;
pub mod performance;
pub mod recommendation;
pub mod report;
pub mod risk;
pub mod series;
pub mod signals;
pub mod trend;
