//! Risk Alert Module
//!
//! Evaluates a fixed, ordered rule list against the ratio set. Output order follows
//! rule declaration order, not severity.

use std::collections::HashSet;

use assessment_core::format;
use assessment_core::{
    AlertRule, AssessmentError, Localizer, RatioKey, RatioSet, RatioStage, RiskAlert, Severity,
    Stage, Trigger,
};
use serde::{Deserialize, Serialize};

/// A rule that fired, with the value that tripped it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiredAlert {
    pub rule_id: String,
    pub ratio: RatioKey,
    pub value: f64,
    pub trigger: Trigger,
    pub severity: Severity,
}

pub struct RiskAlertEngine {
    rules: Vec<AlertRule>,
}

impl RiskAlertEngine {
    pub fn new(rules: Vec<AlertRule>) -> Self {
        Self { rules }
    }

    pub fn evaluate(&self, ratios: &RatioSet) -> Vec<FiredAlert> {
        let mut seen = HashSet::new();
        let mut fired = Vec::new();

        for rule in &self.rules {
            if seen.contains(rule.id.as_str()) {
                continue;
            }
            // Absent data is the scoring model's concern, not a policy breach
            let Some(value) = ratios.get(rule.ratio) else {
                continue;
            };
            if rule.trigger.fires(value) {
                seen.insert(rule.id.as_str());
                fired.push(FiredAlert {
                    rule_id: rule.id.clone(),
                    ratio: rule.ratio,
                    value,
                    trigger: rule.trigger,
                    severity: rule.severity,
                });
            }
        }

        fired
    }

    pub fn any_high_severity(alerts: &[FiredAlert]) -> bool {
        alerts.iter().any(|a| a.severity == Severity::High)
    }

    pub fn render(alerts: &[FiredAlert], loc: &Localizer<'_>) -> Vec<RiskAlert> {
        alerts.iter().map(|a| Self::render_one(a, loc)).collect()
    }

    /// Rules without a dedicated template (custom configurations) use a generic sentence.
    pub fn render_one(alert: &FiredAlert, loc: &Localizer<'_>) -> RiskAlert {
        let value = format::ratio_value(alert.ratio, alert.value);
        let threshold = format::ratio_value(alert.ratio, alert.trigger.threshold());
        let key = format!("alert.{}", alert.rule_id);

        let message = if loc.has(&key) {
            loc.render(&key, &[("value", value), ("threshold", threshold)])
        } else {
            let generic = match alert.trigger {
                Trigger::Below(_) => "alert.generic.below",
                Trigger::AtOrAbove(_) => "alert.generic.at_or_above",
            };
            loc.render(
                generic,
                &[
                    ("ratio", loc.text(&format!("ratio.{}", alert.ratio.as_str()))),
                    ("value", value),
                    ("threshold", threshold),
                ],
            )
        };

        RiskAlert { message }
    }
}

impl RatioStage for RiskAlertEngine {
    type Output = Vec<FiredAlert>;

    const STAGE: Stage = Stage::Alerts;

    fn run(&self, ratios: &RatioSet) -> Result<Vec<FiredAlert>, AssessmentError> {
        let fired = self.evaluate(ratios);
        tracing::debug!(
            "{} of {} alert rules fired for {}",
            fired.len(),
            self.rules.len(),
            ratios.snapshot.business_name
        );
        Ok(fired)
    }
}
