//! Narrative Composer
//!
//! Final, language-bound stage. Everything here reads the stage outputs and renders
//! prose through a [`Localizer`]; numbers are never localized.

mod metrics;

pub use metrics::project_metrics;

use assessment_core::format;
use assessment_core::{Localizer, RatioSet};
use benchmark_engine::BenchmarkOutcome;
use credit_scoring::Scorecard;
use forecast_engine::Forecast;
use risk_alerts::{FiredAlert, RiskAlertEngine};

/// Borrowed view of everything the earlier stages produced for one assessment.
#[derive(Debug, Clone, Copy)]
pub struct StageOutputs<'a> {
    pub ratios: &'a RatioSet,
    pub scorecard: &'a Scorecard,
    pub risk_score: f64,
    /// In rule declaration order.
    pub alerts: &'a [FiredAlert],
    pub benchmark: &'a BenchmarkOutcome,
    pub forecast: &'a Forecast,
}

pub struct NarrativeComposer<'a> {
    loc: Localizer<'a>,
}

impl<'a> NarrativeComposer<'a> {
    pub fn new(loc: Localizer<'a>) -> Self {
        Self { loc }
    }

    pub fn health_label(&self, outputs: &StageOutputs<'_>) -> String {
        self.loc
            .text(&format!("label.{}", outputs.scorecard.health_label.as_str()))
    }

    /// Opening, up to two alerts, the runway outlook, then the label's outlook.
    pub fn compose(&self, outputs: &StageOutputs<'_>) -> String {
        let loc = &self.loc;
        let scorecard = outputs.scorecard;

        let opening = loc.render(
            "narrative.opening",
            &[
                ("business", outputs.ratios.snapshot.business_name.clone()),
                ("label", self.health_label(outputs)),
                ("credit", format::ratio(scorecard.credit_score)),
                ("risk", format::ratio(outputs.risk_score)),
            ],
        );

        let top: Vec<String> = top_alerts(outputs.alerts, 2)
            .into_iter()
            .map(|a| RiskAlertEngine::render_one(a, loc).message)
            .collect();
        let alerts = match top.as_slice() {
            [] => loc.text("narrative.alerts.none"),
            [first] => loc.render("narrative.alerts.one", &[("first", first.clone())]),
            [first, second, ..] => loc.render(
                "narrative.alerts.two",
                &[("first", first.clone()), ("second", second.clone())],
            ),
        };

        let forecast = loc.text(&format!(
            "narrative.forecast.{}",
            outputs.forecast.runway.as_str()
        ));
        let outlook = loc.text(&format!(
            "narrative.outlook.{}",
            scorecard.health_label.as_str()
        ));

        tracing::debug!(
            "Composing narrative for {} with {} alerts",
            outputs.ratios.snapshot.business_name,
            outputs.alerts.len()
        );
        [opening, alerts, forecast, outlook].join(" ")
    }
}

/// Highest severity first; equal severity keeps declaration order.
pub fn top_alerts(alerts: &[FiredAlert], limit: usize) -> Vec<&FiredAlert> {
    let mut ranked: Vec<&FiredAlert> = alerts.iter().collect();
    ranked.sort_by(|a, b| b.severity.cmp(&a.severity));
    ranked.truncate(limit);
    ranked
}
