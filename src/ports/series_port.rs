//! Source of already-retrieved instrument histories.

use crate::domain::error::AnalysisError;
use crate::domain::instrument::Instrument;
use crate::domain::series::TimeSeries;

pub trait SeriesPort {
    fn fetch_series(&self, instrument: &Instrument) -> Result<TimeSeries, AnalysisError>;
}
