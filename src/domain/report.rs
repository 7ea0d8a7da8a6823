//! Result assembly and the best-effort chart phase.

use serde::Serialize;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::error::Stage;
use crate::domain::features::FeatureFrame;
use crate::domain::instrument::{Instrument, InstrumentKind};
use crate::domain::performance::PerformanceSummary;
use crate::domain::recommendation::Recommendation;
use crate::domain::risk::RiskProfile;
use crate::domain::signals::TechnicalSignals;
use crate::domain::trend::Forecast;
use crate::ports::chart_port::ChartPort;

/// One chart render at a time per process.
static RENDER_LOCK: Mutex<()> = Mutex::new(());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartRef {
    Rendered(String),
    Unavailable,
}

impl ChartRef {
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            ChartRef::Rendered(reference) => Some(reference),
            ChartRef::Unavailable => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub instrument: Instrument,
    pub forecast: Forecast,
    pub risk: RiskProfile,
    pub recommendation: Recommendation,
    pub chart: ChartRef,
    pub performance: Option<PerformanceSummary>,
    pub signals: Option<TechnicalSignals>,
}

/// Flat output record handed to presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRecord {
    pub symbol: String,
    pub kind: InstrumentKind,
    pub predicted_value: f64,
    pub interval_low: f64,
    pub interval_high: f64,
    pub risk_class: String,
    pub recommendation: String,
    pub confidence: f64,
    pub rationale: String,
    pub chart_ref: Option<String>,
}

impl AnalysisResult {
    pub fn with_history(
        mut self,
        performance: PerformanceSummary,
        signals: TechnicalSignals,
    ) -> Self {
        self.performance = Some(performance);
        self.signals = Some(signals);
        self
    }

    pub fn to_record(&self) -> FlatRecord {
        FlatRecord {
            symbol: self.instrument.symbol.clone(),
            kind: self.instrument.kind,
            predicted_value: self.forecast.point,
            interval_low: self.forecast.lower,
            interval_high: self.forecast.upper,
            risk_class: self.risk.class.to_string(),
            recommendation: self.recommendation.action.to_string(),
            confidence: self.recommendation.confidence,
            rationale: self.recommendation.rationale.clone(),
            chart_ref: self.chart.as_deref().map(str::to_owned),
        }
    }
}

pub struct ReportAssembler;

impl ReportAssembler {
    /// Packages the numeric results; the chart starts out unavailable.
    pub fn assemble(
        instrument: &Instrument,
        forecast: Forecast,
        risk: RiskProfile,
        recommendation: Recommendation,
    ) -> AnalysisResult {
        AnalysisResult {
            instrument: instrument.clone(),
            forecast,
            risk,
            recommendation,
            chart: ChartRef::Unavailable,
            performance: None,
            signals: None,
        }
    }

    /// Runs the render phase. A failing renderer is logged and leaves the
    /// chart unavailable; it never discards the numeric result.
    pub fn attach_chart(
        mut result: AnalysisResult,
        frame: &FeatureFrame,
        chart: &dyn ChartPort,
    ) -> AnalysisResult {
        let rendered = {
            let _guard = RENDER_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            chart.render(frame, &result.forecast)
        };

        result.chart = match rendered {
            Ok(reference) => {
                debug!(symbol = %result.instrument.symbol, chart = %reference, "chart rendered");
                ChartRef::Rendered(reference)
            }
            Err(err) => {
                warn!(
                    symbol = %result.instrument.symbol,
                    stage = %Stage::Render,
                    error = %err,
                    "chart unavailable"
                );
                ChartRef::Unavailable
            }
        };
        result
    }
}
