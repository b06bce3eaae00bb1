use assessment_core::scale::round_to;
use assessment_core::{Localizer, Metric, RatioKey, Unit};
use benchmark_engine::BenchmarkEngine;

use crate::StageOutputs;

/// One metric per ratio, in ratio declaration order.
///
/// Percent ratios are shown as percentages; every value is rounded to two decimals
/// and is `null` when the ratio is absent.
pub fn project_metrics(outputs: &StageOutputs<'_>, loc: &Localizer<'_>) -> Vec<Metric> {
    let snapshot = &outputs.ratios.snapshot;

    outputs
        .ratios
        .iter()
        .map(|ratio| {
            let key = ratio.key.as_str();
            let name = loc.text(&format!("metric.{}.name", key));

            let mut insight = match (ratio.key, ratio.value) {
                (RatioKey::CashRunway, None) => loc.text("metric.cash_runway.no_burn"),
                (_, None) => loc.text("metric.unavailable"),
                (_, Some(_)) => loc.text(&format!("metric.{}.insight", key)),
            };

            if let Some(comparison) = outputs.benchmark.comparison(ratio.key) {
                insight.push(' ');
                insight.push_str(&BenchmarkEngine::position_note(comparison, loc));
            }

            // Flagged, never rejected at validation
            if ratio.key == RatioKey::TaxCoverage && snapshot.deductions > snapshot.tax_liability {
                insight.push(' ');
                insight.push_str(&loc.text("metric.tax_coverage.excess"));
            }

            let value = ratio.value.map(|v| match ratio.key.unit() {
                Unit::Percent => round_to(v * 100.0, 2),
                Unit::Multiple | Unit::Months => round_to(v, 2),
            });

            Metric {
                name,
                value,
                insight,
            }
        })
        .collect()
}
