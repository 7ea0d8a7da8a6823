//! The analysis pipeline.
//!
//! ```text
//! series -> Preprocessor -> { TrendModel, RiskAssessor } -> RecommendationEngine
//!        -> ReportAssembler -> (render phase) -> AnalysisResult
//! ```
//!
//! Trend fitting and risk assessment read the same frame and do not depend
//! on each other, so they run on separate rayon workers when
//! `EngineConfig::parallel` is set. Rendering happens last and cannot fail
//! the analysis.

use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::domain::error::{AnalysisError, Stage};
use crate::domain::features::{FeatureFrame, Preprocessor};
use crate::domain::params::{EngineConfig, KindParams};
use crate::domain::performance::PerformanceSummary;
use crate::domain::recommendation::RecommendationEngine;
use crate::domain::report::{AnalysisResult, ReportAssembler};
use crate::domain::risk::{RiskAssessor, RiskProfile};
use crate::domain::series::TimeSeries;
use crate::domain::signals::TechnicalSignals;
use crate::domain::trend::{Forecast, TrendModel};
use crate::ports::chart_port::ChartPort;

#[derive(Debug, Clone, Default)]
pub struct AnalysisEngine {
    config: EngineConfig,
}

impl AnalysisEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs the full pipeline for one series. With no chart collaborator the
    /// result carries `ChartRef::Unavailable`.
    pub fn analyze(
        &self,
        series: &TimeSeries,
        chart: Option<&dyn ChartPort>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let instrument = &series.instrument;
        let symbol = instrument.symbol.as_str();
        let params = self.config.for_kind(instrument.kind);

        info!(symbol, kind = %instrument.kind, observations = series.len(), "analysis started");

        let frame = Preprocessor::new(params.windows.clone())
            .prepare(series, params.minimum_observations)
            .inspect_err(|e| log_failure(symbol, Stage::Preprocess, e))?;

        if frame.warnings.any() {
            warn!(
                symbol,
                stage = %Stage::Preprocess,
                excluded = frame.warnings.excluded_non_positive,
                "non-positive observations excluded"
            );
        }

        let (forecast, risk) = self.trend_and_risk(&frame, params);
        let forecast = forecast.inspect_err(|e| log_failure(symbol, Stage::Trend, e))?;
        debug!(
            symbol,
            stage = %Stage::Risk,
            class = %risk.class,
            volatility = ?risk.volatility,
            max_drawdown = risk.max_drawdown,
            "risk assessed"
        );

        let recommendation = RecommendationEngine::new(params.decision.clone())
            .recommend(instrument, &forecast, &risk);
        debug!(
            symbol,
            stage = %Stage::Recommend,
            action = %recommendation.action,
            confidence = recommendation.confidence,
            "recommendation made"
        );

        let performance = PerformanceSummary::compute(
            &frame,
            self.config.risk_free_rate,
            params.risk.periods_per_year,
        );
        let signals = TechnicalSignals::from_frame(&frame);

        let mut result = ReportAssembler::assemble(instrument, forecast, risk, recommendation)
            .with_history(performance, signals);
        if let Some(chart) = chart {
            result = ReportAssembler::attach_chart(result, &frame, chart);
        }

        info!(
            symbol,
            action = %result.recommendation.action,
            predicted = result.forecast.point,
            risk = %result.risk.class,
            "analysis finished"
        );
        Ok(result)
    }

    /// Analyzes independent series on the rayon pool. Results keep the input
    /// order and one failure does not affect the others.
    pub fn analyze_batch(
        &self,
        series: &[TimeSeries],
        chart: Option<&dyn ChartPort>,
    ) -> Vec<Result<AnalysisResult, AnalysisError>> {
        series.par_iter().map(|s| self.analyze(s, chart)).collect()
    }

    fn trend_and_risk(
        &self,
        frame: &FeatureFrame,
        params: &KindParams,
    ) -> (Result<Forecast, AnalysisError>, RiskProfile) {
        let trend = TrendModel::new(params.trend.clone());
        let assessor = RiskAssessor::new(params.risk.clone());
        let horizon = params.trend.horizon;

        if self.config.parallel {
            rayon::join(
                || trend.fit_and_forecast(frame, horizon),
                || assessor.assess(frame),
            )
        } else {
            (trend.fit_and_forecast(frame, horizon), assessor.assess(frame))
        }
    }
}

fn log_failure(symbol: &str, stage: Stage, err: &AnalysisError) {
    error!(symbol, stage = %stage, error = %err, "analysis failed");
}
