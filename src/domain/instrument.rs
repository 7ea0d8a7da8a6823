//! Instrument identity.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentKind {
    Equity,
    MutualFund,
}

impl InstrumentKind {
    /// Section name used for per-kind configuration.
    pub fn config_section(&self) -> &'static str {
        match self {
            InstrumentKind::Equity => "equity",
            InstrumentKind::MutualFund => "mutual_fund",
        }
    }
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_section())
    }
}

impl FromStr for InstrumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "equity" | "stock" => Ok(InstrumentKind::Equity),
            "fund" | "mutual_fund" | "mutualfund" | "mf" => Ok(InstrumentKind::MutualFund),
            other => Err(format!("unknown instrument kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    pub symbol: String,
    pub kind: InstrumentKind,
    pub currency: String,
}

impl Instrument {
    pub fn new(symbol: &str, kind: InstrumentKind, currency: &str) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            kind,
            currency: currency.trim().to_uppercase(),
        }
    }

    pub fn equity(symbol: &str, currency: &str) -> Self {
        Self::new(symbol, InstrumentKind::Equity, currency)
    }

    pub fn mutual_fund(symbol: &str, currency: &str) -> Self {
        Self::new(symbol, InstrumentKind::MutualFund, currency)
    }
}
