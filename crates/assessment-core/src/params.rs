//! Tunable parameter set.
//!
//! Every weight, anchor and threshold the engines use lives here so a deployment can
//! recalibrate without touching code. `Default` is a reasonable placeholder calibration
//! for small and medium enterprises, not ground truth.

use serde::{Deserialize, Serialize};

use crate::error::ParamsError;
use crate::types::{Category, HealthLabel, RatioKey, Severity};

/// One value per scoring category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerCategory<T> {
    pub liquidity: T,
    pub leverage: T,
    pub profitability: T,
    pub efficiency: T,
    pub growth: T,
}

impl<T: Copy> PerCategory<T> {
    pub fn uniform(value: T) -> Self {
        Self {
            liquidity: value,
            leverage: value,
            profitability: value,
            efficiency: value,
            growth: value,
        }
    }

    pub fn get(&self, category: Category) -> T {
        match category {
            Category::Liquidity => self.liquidity,
            Category::Leverage => self.leverage,
            Category::Profitability => self.profitability,
            Category::Efficiency => self.efficiency,
            Category::Growth => self.growth,
        }
    }
}

/// Linear mapping of one ratio onto 0..=100 for a category.
///
/// `worst` maps to 0 and `best` to 100; `best < worst` expresses "lower is better".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreAnchor {
    pub category: Category,
    pub ratio: RatioKey,
    pub worst: f64,
    pub best: f64,
    /// Score when the ratio is absent. Falls back to `absent_penalty`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absent_score: Option<f64>,
}

/// Inclusive lower bound of a health band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthBand {
    pub label: HealthLabel,
    pub min_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringParams {
    pub weights: PerCategory<f64>,
    pub anchors: Vec<ScoreAnchor>,
    /// Score contributed by an anchor whose ratio is absent.
    pub absent_penalty: f64,
    /// Ordered from the highest band down; the last band should start at 0.
    pub health_bands: Vec<HealthBand>,
    /// Share of the risk score driven by liquidity and leverage weakness.
    pub risk_emphasis: f64,
    /// Added to the risk score when any high-severity alert fired.
    pub high_severity_surcharge: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        use Category::*;
        use RatioKey::*;

        let anchor = |category, ratio, worst, best| ScoreAnchor {
            category,
            ratio,
            worst,
            best,
            absent_score: None,
        };
        let band = |label, min_score| HealthBand { label, min_score };

        Self {
            weights: PerCategory {
                liquidity: 0.20,
                leverage: 0.25,
                profitability: 0.25,
                efficiency: 0.15,
                growth: 0.15,
            },
            anchors: vec![
                anchor(Liquidity, QuickRatio, 0.3, 1.0),
                anchor(Liquidity, CurrentRatio, 0.5, 1.5),
                // Leverage is absent once the operating surplus is gone, which is the worst case
                ScoreAnchor {
                    absent_score: Some(0.0),
                    ..anchor(Category::Leverage, RatioKey::Leverage, 4.0, 1.0)
                },
                anchor(Profitability, GrossMargin, 0.10, 0.40),
                anchor(Profitability, NetMargin, 0.0, 0.20),
                anchor(Efficiency, OperatingEfficiency, 0.95, 0.60),
                anchor(Efficiency, InventoryTurnover, 2.0, 8.0),
                anchor(Growth, RevenueGrowth, -0.10, 0.15),
            ],
            absent_penalty: 40.0,
            health_bands: vec![
                band(HealthLabel::Strong, 80.0),
                band(HealthLabel::Stable, 60.0),
                band(HealthLabel::Watch, 40.0),
                band(HealthLabel::Distressed, 0.0),
            ],
            risk_emphasis: 0.4,
            high_severity_surcharge: 10.0,
        }
    }
}

/// Comparison applied by an alert rule. `Below` is strict, `AtOrAbove` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "threshold", rename_all = "snake_case")]
pub enum Trigger {
    Below(f64),
    AtOrAbove(f64),
}

impl Trigger {
    pub fn fires(&self, value: f64) -> bool {
        match *self {
            Trigger::Below(threshold) => value < threshold,
            Trigger::AtOrAbove(threshold) => value >= threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        match *self {
            Trigger::Below(t) | Trigger::AtOrAbove(t) => t,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    /// Stable identity; also the phrasebook key suffix (`alert.<id>`).
    pub id: String,
    pub ratio: RatioKey,
    pub trigger: Trigger,
    pub severity: Severity,
}

pub fn default_alert_rules() -> Vec<AlertRule> {
    let rule = |id: &str, ratio, trigger, severity| AlertRule {
        id: id.to_string(),
        ratio,
        trigger,
        severity,
    };

    vec![
        rule("low_quick_ratio", RatioKey::QuickRatio, Trigger::Below(0.5), Severity::High),
        rule("high_leverage", RatioKey::Leverage, Trigger::AtOrAbove(3.0), Severity::High),
        rule("short_runway", RatioKey::CashRunway, Trigger::Below(2.0), Severity::High),
        rule(
            "revenue_contraction",
            RatioKey::RevenueGrowth,
            Trigger::Below(-0.10),
            Severity::Medium,
        ),
        rule("negative_net_margin", RatioKey::NetMargin, Trigger::Below(0.0), Severity::Medium),
        // Fires whenever high_leverage does and keeps firing once the surplus turns negative
        rule(
            "low_debt_service_coverage",
            RatioKey::DebtServiceCoverage,
            Trigger::Below(1.1),
            Severity::High,
        ),
        rule("low_tax_coverage", RatioKey::TaxCoverage, Trigger::Below(0.5), Severity::Medium),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationParams {
    /// A component scoring strictly below its threshold gets a recommendation.
    pub watch_thresholds: PerCategory<f64>,
    pub working_capital_quick_below: f64,
    /// Leverage must stay strictly below this for borrowing headroom.
    pub working_capital_max_leverage: f64,
    pub invoice_receivables_to_payables_at_or_above: f64,
    pub consolidation_leverage_at_or_above: f64,
}

impl Default for RecommendationParams {
    fn default() -> Self {
        Self {
            watch_thresholds: PerCategory::uniform(60.0),
            working_capital_quick_below: 1.0,
            working_capital_max_leverage: 2.5,
            invoice_receivables_to_payables_at_or_above: 1.2,
            consolidation_leverage_at_or_above: 3.0,
        }
    }
}

/// Runway classification: critical below the first bound, comfortable above the
/// second, tight in between (both bounds inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastParams {
    pub critical_below_months: f64,
    pub comfortable_above_months: f64,
}

impl Default for ForecastParams {
    fn default() -> Self {
        Self {
            critical_below_months: 1.0,
            // A 3.6 month runway on the reference snapshot must read as tight
            comfortable_above_months: 6.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkParams {
    /// Deviations at or below this (in band widths) are not material.
    pub materiality: f64,
    /// How many deviations the summary sentence names.
    pub summary_limit: usize,
}

impl Default for BenchmarkParams {
    fn default() -> Self {
        Self {
            materiality: 0.0,
            summary_limit: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentParams {
    pub scoring: ScoringParams,
    pub alerts: Vec<AlertRule>,
    pub recommendations: RecommendationParams,
    pub forecast: ForecastParams,
    pub benchmark: BenchmarkParams,
}

impl Default for AssessmentParams {
    fn default() -> Self {
        Self {
            scoring: ScoringParams::default(),
            alerts: default_alert_rules(),
            recommendations: RecommendationParams::default(),
            forecast: ForecastParams::default(),
            benchmark: BenchmarkParams::default(),
        }
    }
}

impl AssessmentParams {
    /// Parse a (possibly partial) JSON parameter file; omitted sections keep defaults.
    pub fn from_json(raw: &str) -> Result<Self, ParamsError> {
        let params: Self = serde_json::from_str(raw)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        let scoring = &self.scoring;

        for category in Category::ALL {
            let w = scoring.weights.get(category);
            if !(0.0..=1.0).contains(&w) {
                return Err(ParamsError::WeightOutOfRange(category.as_str()));
            }
            if !scoring.anchors.iter().any(|a| a.category == category) {
                return Err(ParamsError::UnanchoredCategory(category.as_str()));
            }
        }

        let total: f64 = Category::ALL.iter().map(|c| scoring.weights.get(*c)).sum();
        if (total - 1.0).abs() > 1e-6 {
            return Err(ParamsError::WeightsDoNotSumToOne(total));
        }

        if let Some(a) = scoring.anchors.iter().find(|a| a.worst == a.best) {
            return Err(ParamsError::DegenerateAnchor {
                ratio: a.ratio.as_str(),
            });
        }

        if !(0.0..=100.0).contains(&scoring.absent_penalty) {
            return Err(ParamsError::Penalty(scoring.absent_penalty));
        }
        if let Some(score) = scoring
            .anchors
            .iter()
            .filter_map(|a| a.absent_score)
            .find(|s| !(0.0..=100.0).contains(s))
        {
            return Err(ParamsError::Penalty(score));
        }

        let bands = &scoring.health_bands;
        if bands.is_empty() {
            return Err(ParamsError::HealthBands("at least one band is required".to_string()));
        }
        if bands.windows(2).any(|w| w[0].min_score <= w[1].min_score) {
            return Err(ParamsError::HealthBands(
                "bands must be ordered by strictly decreasing lower bound".to_string(),
            ));
        }
        if bands.last().map(|b| b.min_score > 0.0).unwrap_or(true) {
            return Err(ParamsError::HealthBands("the lowest band must start at 0".to_string()));
        }

        let forecast = &self.forecast;
        if forecast.critical_below_months >= forecast.comfortable_above_months {
            return Err(ParamsError::RunwayBands {
                critical: forecast.critical_below_months,
                comfortable: forecast.comfortable_above_months,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        assert!(AssessmentParams::default().validate().is_ok());
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut params = AssessmentParams::default();
        params.scoring.weights.growth = 0.30;
        assert!(matches!(
            params.validate(),
            Err(ParamsError::WeightsDoNotSumToOne(_))
        ));
    }

    #[test]
    fn test_unsorted_health_bands_rejected() {
        let mut params = AssessmentParams::default();
        params.scoring.health_bands.swap(0, 1);
        assert!(matches!(params.validate(), Err(ParamsError::HealthBands(_))));
    }

    #[test]
    fn test_runway_bands_rejected_when_inverted() {
        let mut params = AssessmentParams::default();
        params.forecast.critical_below_months = 8.0;
        assert!(matches!(params.validate(), Err(ParamsError::RunwayBands { .. })));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let raw = r#"{
            "forecast": { "critical_below_months": 2.0 },
            "benchmark": { "summary_limit": 3 }
        }"#;
        let params = AssessmentParams::from_json(raw).unwrap();

        assert_eq!(params.forecast.critical_below_months, 2.0);
        assert_eq!(params.forecast.comfortable_above_months, 6.0);
        assert_eq!(params.benchmark.summary_limit, 3);
        assert_eq!(params.alerts.len(), default_alert_rules().len());
    }

    #[test]
    fn test_alert_rule_json_shape() {
        let rule: AlertRule = serde_json::from_str(
            r#"{ "id": "thin_margin", "ratio": "gross_margin",
                 "trigger": { "op": "below", "threshold": 0.15 }, "severity": "medium" }"#,
        )
        .unwrap();
        assert_eq!(rule.trigger, Trigger::Below(0.15));
        assert!(rule.trigger.fires(0.1));
        assert!(!rule.trigger.fires(0.15));
    }

    #[test]
    fn test_leverage_anchor_floors_when_absent() {
        let scoring = ScoringParams::default();
        let leverage = scoring
            .anchors
            .iter()
            .find(|a| a.ratio == RatioKey::Leverage)
            .unwrap();
        assert_eq!(leverage.absent_score, Some(0.0));
        assert!(scoring
            .anchors
            .iter()
            .filter(|a| a.ratio != RatioKey::Leverage)
            .all(|a| a.absent_score.is_none()));
    }

    #[test]
    fn test_out_of_range_absent_score_rejected() {
        let mut params = AssessmentParams::default();
        params.scoring.anchors[0].absent_score = Some(120.0);
        assert!(matches!(params.validate(), Err(ParamsError::Penalty(_))));
    }

    #[test]
    fn test_at_or_above_is_inclusive() {
        let trigger = Trigger::AtOrAbove(3.0);
        assert!(trigger.fires(3.0));
        assert!(!trigger.fires(2.999));
    }
}
