//! navpredictor: trend, risk and recommendation analysis for equity and
//! mutual-fund value series.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`]. [`domain::engine::AnalysisEngine`]
//! is the entry point.

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
