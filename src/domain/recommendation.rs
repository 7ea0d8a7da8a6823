//! Decision table mapping a forecast and risk profile to an action.
//!
//! `recommend` is a pure function of its inputs: the same forecast, risk
//! profile and thresholds always give the same action, confidence and
//! rationale text.

use serde::Serialize;
use std::fmt;

use crate::domain::instrument::{Instrument, InstrumentKind};
use crate::domain::params::DecisionThresholds;
use crate::domain::risk::{RiskClass, RiskProfile};
use crate::domain::trend::Forecast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Action {
    Buy,
    Sell,
    Hold,
    #[serde(rename = "ContinueSIP")]
    ContinueSip,
    #[serde(rename = "PauseSIP")]
    PauseSip,
    Review,
}

impl Action {
    /// The action taken when no directional call can be made.
    pub fn neutral(kind: InstrumentKind) -> Self {
        match kind {
            InstrumentKind::Equity => Action::Hold,
            InstrumentKind::MutualFund => Action::Review,
        }
    }

    fn positive(kind: InstrumentKind) -> Self {
        match kind {
            InstrumentKind::Equity => Action::Buy,
            InstrumentKind::MutualFund => Action::ContinueSip,
        }
    }

    fn negative(kind: InstrumentKind) -> Self {
        match kind {
            InstrumentKind::Equity => Action::Sell,
            InstrumentKind::MutualFund => Action::PauseSip,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Buy => "Buy",
            Action::Sell => "Sell",
            Action::Hold => "Hold",
            Action::ContinueSip => "ContinueSIP",
            Action::PauseSip => "PauseSIP",
            Action::Review => "Review",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub action: Action,
    pub confidence: f64,
    pub rationale: String,
}

/// Why the table landed where it did; rendered into the rationale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Basis {
    Flat,
    NoRiskEstimate,
    WideInterval,
    WeakSignal,
    RiskCapsUpside,
    Upside,
    Downside,
    WithinThresholds,
}

impl Basis {
    fn describe(self) -> &'static str {
        match self {
            Basis::Flat => "series shows no variation",
            Basis::NoRiskEstimate => "too few returns to estimate risk",
            Basis::WideInterval => "prediction interval too wide",
            Basis::WeakSignal => "expected move small relative to the interval",
            Basis::RiskCapsUpside => "upside insufficient for high risk",
            Basis::Upside => "expected rise clears the threshold",
            Basis::Downside => "expected fall clears the threshold",
            Basis::WithinThresholds => "expected move within thresholds",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    thresholds: DecisionThresholds,
}

impl RecommendationEngine {
    pub fn new(thresholds: DecisionThresholds) -> Self {
        Self { thresholds }
    }

    pub fn recommend(
        &self,
        instrument: &Instrument,
        forecast: &Forecast,
        risk: &RiskProfile,
    ) -> Recommendation {
        let kind = instrument.kind;
        let change = forecast.expected_change();
        let (action, basis) = self.decide(kind, forecast, risk, change);

        Recommendation {
            action,
            confidence: self.confidence(forecast, risk),
            rationale: rationale(instrument, forecast, risk, change, action, basis),
        }
    }

    fn decide(
        &self,
        kind: InstrumentKind,
        forecast: &Forecast,
        risk: &RiskProfile,
        change: f64,
    ) -> (Action, Basis) {
        let t = &self.thresholds;
        let neutral = Action::neutral(kind);

        if forecast.degenerate {
            return (neutral, Basis::Flat);
        }
        if risk.class == RiskClass::Indeterminate {
            return (neutral, Basis::NoRiskEstimate);
        }
        if forecast.relative_half_width() > t.max_relative_half_width {
            return (neutral, Basis::WideInterval);
        }
        if signal_to_noise(forecast) < t.min_signal_to_noise {
            return (neutral, Basis::WeakSignal);
        }

        if change >= t.buy_threshold {
            if risk.class == RiskClass::High && change < t.high_risk_buy_threshold {
                (neutral, Basis::RiskCapsUpside)
            } else {
                (Action::positive(kind), Basis::Upside)
            }
        } else if change <= -t.sell_threshold {
            (Action::negative(kind), Basis::Downside)
        } else {
            (neutral, Basis::WithinThresholds)
        }
    }

    fn confidence(&self, forecast: &Forecast, risk: &RiskProfile) -> f64 {
        let tightness =
            (1.0 - forecast.relative_half_width() / self.thresholds.max_relative_half_width)
                .clamp(0.0, 1.0);
        let base = 0.5 * tightness + 0.5 * forecast.fit_quality;
        (base * risk_factor(risk.class)).clamp(0.0, 1.0)
    }
}

fn risk_factor(class: RiskClass) -> f64 {
    match class {
        RiskClass::Low => 1.0,
        RiskClass::Moderate => 0.85,
        RiskClass::High => 0.7,
        RiskClass::Indeterminate => 0.5,
    }
}

/// |point - last| / half_width; unbounded for a zero-width interval.
fn signal_to_noise(forecast: &Forecast) -> f64 {
    let half_width = forecast.half_width();
    let moved = (forecast.point - forecast.last_value).abs();
    if half_width > 0.0 {
        moved / half_width
    } else if moved > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

fn rationale(
    instrument: &Instrument,
    forecast: &Forecast,
    risk: &RiskProfile,
    change: f64,
    action: Action,
    basis: Basis,
) -> String {
    let volatility = match risk.volatility {
        Some(v) => format!("{:.1}%", v * 100.0),
        None => "n/a".to_string(),
    };
    format!(
        "{symbol}: forecast {point:.2} in {horizon} periods ({change:+.2}% from {last:.2}), \
         interval {lower:.2} to {upper:.2}; risk {class} (volatility {volatility}, \
         max drawdown {drawdown:.1}%); {action}: {reason}.",
        symbol = instrument.symbol,
        point = forecast.point,
        horizon = forecast.horizon,
        change = change * 100.0,
        last = forecast.last_value,
        lower = forecast.lower,
        upper = forecast.upper,
        class = risk.class,
        drawdown = risk.max_drawdown * 100.0,
        reason = basis.describe(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::params::KindParams;
    use crate::domain::trend::FitBasis;
    use approx::assert_relative_eq;

    fn forecast(last: f64, point: f64, half_width: f64) -> Forecast {
        Forecast {
            point,
            lower: point - half_width,
            upper: point + half_width,
            horizon: 30,
            effective_sample_size: 252,
            last_value: last,
            degree: 1,
            basis: FitBasis::Level,
            residual_std_error: half_width / 10.0,
            fit_quality: 0.9,
            degenerate: false,
            path: Vec::new(),
        }
    }

    fn risk(class: RiskClass) -> RiskProfile {
        RiskProfile {
            class,
            volatility: if class == RiskClass::Indeterminate { None } else { Some(0.15) },
            max_drawdown: 0.05,
            return_observations: 251,
        }
    }

    fn engine(kind: InstrumentKind) -> RecommendationEngine {
        RecommendationEngine::new(KindParams::defaults_for(kind).decision)
    }

    fn equity() -> Instrument {
        Instrument::equity("INFY", "INR")
    }

    fn fund() -> Instrument {
        Instrument::mutual_fund("118550", "INR")
    }

    #[test]
    fn rising_forecast_buys() {
        let rec = engine(InstrumentKind::Equity).recommend(
            &equity(),
            &forecast(150.0, 165.0, 10.0),
            &risk(RiskClass::Low),
        );
        assert_eq!(rec.action, Action::Buy);
        assert!(rec.confidence > 0.5 && rec.confidence <= 1.0);
    }

    #[test]
    fn falling_forecast_sells() {
        let rec = engine(InstrumentKind::Equity).recommend(
            &equity(),
            &forecast(150.0, 135.0, 10.0),
            &risk(RiskClass::Moderate),
        );
        assert_eq!(rec.action, Action::Sell);
    }

    #[test]
    fn small_move_holds() {
        let rec = engine(InstrumentKind::Equity).recommend(
            &equity(),
            &forecast(150.0, 151.0, 2.0),
            &risk(RiskClass::Low),
        );
        assert_eq!(rec.action, Action::Hold);
        assert!(rec.rationale.contains("within thresholds"));
    }

    #[test]
    fn wide_interval_holds() {
        let rec = engine(InstrumentKind::Equity).recommend(
            &equity(),
            &forecast(150.0, 180.0, 60.0),
            &risk(RiskClass::Low),
        );
        assert_eq!(rec.action, Action::Hold);
        assert_eq!(rec.confidence, 0.45);
    }

    #[test]
    fn weak_signal_holds() {
        // 4% rise but the interval is ten times the move
        let rec = engine(InstrumentKind::Equity).recommend(
            &equity(),
            &forecast(100.0, 104.0, 20.0),
            &risk(RiskClass::Low),
        );
        assert_eq!(rec.action, Action::Hold);
    }

    #[test]
    fn high_risk_needs_larger_upside() {
        let e = engine(InstrumentKind::Equity);
        let modest = e.recommend(&equity(), &forecast(100.0, 105.0, 5.0), &risk(RiskClass::High));
        assert_eq!(modest.action, Action::Hold);
        let strong = e.recommend(&equity(), &forecast(100.0, 115.0, 5.0), &risk(RiskClass::High));
        assert_eq!(strong.action, Action::Buy);
    }

    #[test]
    fn indeterminate_risk_is_neutral() {
        let rec = engine(InstrumentKind::MutualFund).recommend(
            &fund(),
            &forecast(100.0, 110.0, 5.0),
            &risk(RiskClass::Indeterminate),
        );
        assert_eq!(rec.action, Action::Review);
        assert!(rec.rationale.contains("volatility n/a"));
    }

    #[test]
    fn degenerate_forecast_is_neutral() {
        let mut flat = forecast(42.0, 42.0, 0.0);
        flat.degenerate = true;
        flat.fit_quality = 0.0;
        let e = engine(InstrumentKind::Equity);
        let rec = e.recommend(&equity(), &flat, &risk(RiskClass::Low));
        assert_eq!(rec.action, Action::Hold);
        assert_relative_eq!(rec.confidence, 0.5);
        let f = engine(InstrumentKind::MutualFund);
        assert_eq!(f.recommend(&fund(), &flat, &risk(RiskClass::Low)).action, Action::Review);
    }

    #[test]
    fn fund_actions() {
        let e = engine(InstrumentKind::MutualFund);
        let up = e.recommend(&fund(), &forecast(100.0, 104.0, 2.0), &risk(RiskClass::Low));
        assert_eq!(up.action, Action::ContinueSip);
        let down = e.recommend(&fund(), &forecast(100.0, 90.0, 2.0), &risk(RiskClass::Low));
        assert_eq!(down.action, Action::PauseSip);
        let dip = e.recommend(&fund(), &forecast(100.0, 98.0, 1.0), &risk(RiskClass::Low));
        assert_eq!(dip.action, Action::Review);
    }

    #[test]
    fn confidence_penalized_by_risk() {
        let e = engine(InstrumentKind::Equity);
        let f = forecast(150.0, 165.0, 10.0);
        let low = e.recommend(&equity(), &f, &risk(RiskClass::Low)).confidence;
        let moderate = e.recommend(&equity(), &f, &risk(RiskClass::Moderate)).confidence;
        let high = e.recommend(&equity(), &f, &risk(RiskClass::High)).confidence;
        assert!(low > moderate && moderate > high);
    }

    #[test]
    fn identical_inputs_identical_output() {
        let e = engine(InstrumentKind::Equity);
        let f = forecast(150.0, 158.0, 6.0);
        let r = risk(RiskClass::Moderate);
        assert_eq!(e.recommend(&equity(), &f, &r), e.recommend(&equity(), &f, &r));
    }

    #[test]
    fn rationale_template() {
        let rec = engine(InstrumentKind::Equity).recommend(
            &equity(),
            &forecast(150.0, 165.0, 10.0),
            &risk(RiskClass::Low),
        );
        assert_eq!(
            rec.rationale,
            "INFY: forecast 165.00 in 30 periods (+10.00% from 150.00), interval 155.00 to 175.00; \
             risk Low (volatility 15.0%, max drawdown 5.0%); \
             Buy: expected rise clears the threshold."
        );
    }

    #[test]
    fn sip_actions_serialize_with_acronym() {
        assert_eq!(serde_json::to_string(&Action::ContinueSip).unwrap(), "\"ContinueSIP\"");
        assert_eq!(Action::PauseSip.to_string(), "PauseSIP");
    }
}
