//! Chart rendering collaborator.

use crate::domain::error::AnalysisError;
use crate::domain::features::FeatureFrame;
use crate::domain::trend::Forecast;

/// Renders a history plus forecast and returns a reference to the output
/// (a path, URL or key). Calls are serialized by the engine, so
/// implementations need not be reentrant.
pub trait ChartPort: Send + Sync {
    fn render(&self, frame: &FeatureFrame, forecast: &Forecast) -> Result<String, AnalysisError>;
}
