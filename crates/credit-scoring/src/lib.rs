//! Credit Scoring Module
//!
//! Maps ratios to per-category component scores, aggregates them into a credit
//! score, and derives the risk score and health label.

use assessment_core::format;
use assessment_core::scale::{interpolate_score, mean, round_to};
use assessment_core::{
    AssessmentError, Category, ComponentScore, HealthLabel, Localizer, PerCategory, RatioSet,
    RatioStage, ScoringParams, Stage,
};
use serde::{Deserialize, Serialize};

/// Score for one category before rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: Category,
    /// 0 to 100
    pub score: f64,
    /// Value of [`Category::primary_ratio`], if present.
    pub primary_value: Option<f64>,
}

/// Output of the scoring stage. The risk score is finished later, once alerts are known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    pub components: Vec<CategoryScore>,
    /// Weighted sum of the component scores, rounded to two decimals.
    pub credit_score: f64,
    pub health_label: HealthLabel,
}

impl Scorecard {
    pub fn component(&self, category: Category) -> Option<&CategoryScore> {
        self.components.iter().find(|c| c.category == category)
    }
}

pub struct ScoringModel {
    params: ScoringParams,
}

impl ScoringModel {
    pub fn new(params: ScoringParams) -> Self {
        Self { params }
    }

    /// Mean of the category's anchor scores. An absent ratio contributes the anchor's
    /// absent score (or the fixed penalty) instead of being skipped, so missing data
    /// never raises a score.
    pub fn score_category(&self, category: Category, ratios: &RatioSet) -> CategoryScore {
        let anchor_scores: Vec<f64> = self
            .params
            .anchors
            .iter()
            .filter(|a| a.category == category)
            .map(|a| match ratios.get(a.ratio) {
                Some(value) => interpolate_score(value, a.worst, a.best),
                None => a.absent_score.unwrap_or(self.params.absent_penalty),
            })
            .collect();

        let score = if anchor_scores.is_empty() {
            self.params.absent_penalty
        } else {
            mean(&anchor_scores)
        };

        CategoryScore {
            category,
            score,
            primary_value: ratios.get(category.primary_ratio()),
        }
    }

    /// First band whose inclusive lower bound the score reaches.
    pub fn health_label(&self, credit_score: f64) -> HealthLabel {
        self.params
            .health_bands
            .iter()
            .find(|band| credit_score >= band.min_score)
            .or(self.params.health_bands.last())
            .map(|band| band.label)
            .unwrap_or(HealthLabel::Distressed)
    }

    /// Complement of the credit score, tilted towards liquidity and leverage
    /// weakness, plus a surcharge when a high-severity alert fired.
    pub fn risk_score(&self, scorecard: &Scorecard, high_severity_alert: bool) -> f64 {
        let weakness = |category| {
            scorecard
                .component(category)
                .map(|c| 100.0 - c.score)
                .unwrap_or(100.0 - self.params.absent_penalty)
        };
        let emphasis = self.params.risk_emphasis.clamp(0.0, 1.0);
        let structural = mean(&[weakness(Category::Liquidity), weakness(Category::Leverage)]);

        let mut risk = (1.0 - emphasis) * (100.0 - scorecard.credit_score) + emphasis * structural;
        if high_severity_alert {
            risk += self.params.high_severity_surcharge;
        }
        round_to(risk.clamp(0.0, 100.0), 2)
    }

    /// One rendered component per category, in report order.
    ///
    /// The insight reads as weak when the score falls below the category's watch threshold.
    pub fn render(
        &self,
        scorecard: &Scorecard,
        watch_thresholds: &PerCategory<f64>,
        loc: &Localizer<'_>,
    ) -> Vec<ComponentScore> {
        scorecard
            .components
            .iter()
            .map(|c| {
                let name = loc.text(&format!("category.{}", c.category.as_str()));
                let insight = match c.primary_value {
                    None => loc.text(&format!("insight.{}.absent", c.category.as_str())),
                    Some(value) => {
                        let tone = if c.score < watch_thresholds.get(c.category) {
                            "weak"
                        } else {
                            "good"
                        };
                        loc.render(
                            &format!("insight.{}.{}", c.category.as_str(), tone),
                            &[(
                                "value",
                                format::ratio_value(c.category.primary_ratio(), value),
                            )],
                        )
                    }
                };
                ComponentScore {
                    name,
                    score: round_to(c.score, 2),
                    insight,
                }
            })
            .collect()
    }
}

impl RatioStage for ScoringModel {
    type Output = Scorecard;

    const STAGE: Stage = Stage::Scoring;

    fn run(&self, ratios: &RatioSet) -> Result<Scorecard, AssessmentError> {
        let components: Vec<CategoryScore> = Category::ALL
            .iter()
            .map(|c| self.score_category(*c, ratios))
            .collect();

        let weighted: f64 = components
            .iter()
            .map(|c| c.score * self.params.weights.get(c.category))
            .sum();
        if !weighted.is_finite() {
            return Err(AssessmentError::new(
                Stage::Scoring,
                "weighted credit score is not finite",
            ));
        }

        let credit_score = round_to(weighted.clamp(0.0, 100.0), 2);
        let health_label = self.health_label(credit_score);
        tracing::debug!(
            "Scored {}: credit {:.2} ({})",
            ratios.snapshot.business_name,
            credit_score,
            health_label.as_str()
        );

        Ok(Scorecard {
            components,
            credit_score,
            health_label,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assessment_core::{FinancialSnapshot, Language, Phrasebook, RatioKey};
    use ratio_analysis::RatioEngine;

    fn example_snapshot() -> FinancialSnapshot {
        FinancialSnapshot {
            business_name: "Apex Traders".to_string(),
            industry: "Retail".to_string(),
            region: "Maharashtra".to_string(),
            revenue: 1_250_000.0,
            prior_revenue: 1_180_000.0,
            expenses: 860_000.0,
            cogs: 620_000.0,
            receivables: 180_000.0,
            payables: 140_000.0,
            inventory: 220_000.0,
            debt: 350_000.0,
            cash_on_hand: 90_000.0,
            monthly_burn: 25_000.0,
            tax_liability: 52_000.0,
            deductions: 18_000.0,
        }
    }

    fn model() -> ScoringModel {
        ScoringModel::new(ScoringParams::default())
    }

    fn scorecard(snapshot: &FinancialSnapshot) -> Scorecard {
        let ratios = RatioEngine::new().compute(snapshot).unwrap();
        model().run(&ratios).unwrap()
    }

    #[test]
    fn test_example_scores_in_range() {
        let card = scorecard(&example_snapshot());
        assert_eq!(card.components.len(), 5);
        assert!(card.components.iter().all(|c| (0.0..=100.0).contains(&c.score)));
        assert!((0.0..=100.0).contains(&card.credit_score));

        // Quick ratio ~1.93 and current ratio 3.5 are both past their best anchors
        let liquidity = card.component(Category::Liquidity).unwrap();
        assert_eq!(liquidity.score, 100.0);
        assert_eq!(card.health_label, HealthLabel::Strong);
    }

    #[test]
    fn test_absent_ratios_take_penalty_not_zero() {
        let mut snapshot = example_snapshot();
        snapshot.payables = 0.0;
        let card = scorecard(&snapshot);

        let liquidity = card.component(Category::Liquidity).unwrap();
        assert_eq!(liquidity.score, ScoringParams::default().absent_penalty);
        assert_eq!(liquidity.primary_value, None);
    }

    #[test]
    fn test_liquidity_monotonic_in_cash() {
        let mut snapshot = example_snapshot();
        snapshot.receivables = 10_000.0;
        snapshot.inventory = 5_000.0;
        snapshot.cash_on_hand = 0.0;

        let mut previous = -1.0;
        for step in 0..40 {
            snapshot.cash_on_hand = step as f64 * 7_500.0;
            let score = scorecard(&snapshot)
                .component(Category::Liquidity)
                .unwrap()
                .score;
            assert!(score >= previous, "liquidity dropped at step {step}");
            previous = score;
        }
        assert_eq!(previous, 100.0);
    }

    #[test]
    fn test_sliding_into_loss_never_raises_scores() {
        let m = model();
        let mut snapshot = example_snapshot();
        snapshot.revenue = 1_000_000.0;
        snapshot.debt = 350_000.0;

        let mut previous_credit = f64::MAX;
        let mut previous_leverage = f64::MAX;
        for expenses in (950_000..=1_100_000).step_by(5_000) {
            snapshot.expenses = expenses as f64;
            let card = scorecard(&snapshot);
            let leverage = card.component(Category::Leverage).unwrap().score;

            assert!(card.credit_score <= previous_credit, "credit rose at {expenses}");
            assert!(leverage <= previous_leverage, "leverage rose at {expenses}");
            previous_credit = card.credit_score;
            previous_leverage = leverage;
        }

        // No operating surplus at all scores the same as unserviceable debt
        snapshot.expenses = 1_000_000.0;
        assert_eq!(scorecard(&snapshot).component(Category::Leverage).unwrap().score, 0.0);
        snapshot.expenses = 999_000.0;
        let barely = scorecard(&snapshot);
        snapshot.expenses = 1_050_000.0;
        let loss = scorecard(&snapshot);
        assert!(loss.credit_score <= barely.credit_score);
        assert!(m.risk_score(&loss, false) >= m.risk_score(&barely, false));
    }

    #[test]
    fn test_health_band_lower_bound_inclusive() {
        let m = model();
        assert_eq!(m.health_label(80.0), HealthLabel::Strong);
        assert_eq!(m.health_label(79.99), HealthLabel::Stable);
        assert_eq!(m.health_label(60.0), HealthLabel::Stable);
        assert_eq!(m.health_label(40.0), HealthLabel::Watch);
        assert_eq!(m.health_label(39.99), HealthLabel::Distressed);
        assert_eq!(m.health_label(0.0), HealthLabel::Distressed);
    }

    #[test]
    fn test_risk_score_bounds_and_surcharge() {
        let m = model();
        let card = scorecard(&example_snapshot());

        let calm = m.risk_score(&card, false);
        let alarmed = m.risk_score(&card, true);
        assert!((0.0..=100.0).contains(&calm));
        assert!(alarmed > calm);
        assert!(alarmed <= 100.0);

        let worst = Scorecard {
            components: Category::ALL
                .iter()
                .map(|c| CategoryScore {
                    category: *c,
                    score: 0.0,
                    primary_value: None,
                })
                .collect(),
            credit_score: 0.0,
            health_label: HealthLabel::Distressed,
        };
        assert_eq!(m.risk_score(&worst, true), 100.0);
    }

    #[test]
    fn test_risk_leans_on_liquidity_and_leverage() {
        let m = model();
        let component = |category, score| CategoryScore {
            category,
            score,
            primary_value: None,
        };
        let card = |liquidity: f64, growth: f64| Scorecard {
            components: vec![
                component(Category::Liquidity, liquidity),
                component(Category::Leverage, 100.0),
                component(Category::Profitability, 100.0),
                component(Category::Efficiency, 100.0),
                component(Category::Growth, growth),
            ],
            // Same credit score in both cases
            credit_score: 85.0,
            health_label: HealthLabel::Strong,
        };
        assert!(m.risk_score(&card(25.0, 100.0), false) > m.risk_score(&card(100.0, 0.0), false));
    }

    #[test]
    fn test_custom_weights_change_credit_score() {
        let mut params = ScoringParams::default();
        params.weights = PerCategory {
            liquidity: 0.0,
            leverage: 0.0,
            profitability: 0.0,
            efficiency: 0.0,
            growth: 1.0,
        };
        let ratios = RatioEngine::new().compute(&example_snapshot()).unwrap();
        let card = ScoringModel::new(params).run(&ratios).unwrap();
        let growth = card.component(Category::Growth).unwrap().score;
        assert_eq!(card.credit_score, round_to(growth, 2));
    }

    #[test]
    fn test_render_localizes_names_only() {
        let book = Phrasebook::bundled().unwrap();
        let m = model();
        let card = scorecard(&example_snapshot());
        let watch = PerCategory::uniform(60.0);

        let en = m.render(&card, &watch, &book.localizer(Language::English));
        let hi = m.render(&card, &watch, &book.localizer(Language::Hindi));

        assert_eq!(en[0].name, "Liquidity");
        assert_ne!(en[0].name, hi[0].name);
        let en_scores: Vec<f64> = en.iter().map(|c| c.score).collect();
        let hi_scores: Vec<f64> = hi.iter().map(|c| c.score).collect();
        assert_eq!(en_scores, hi_scores);
        assert!(en[0].insight.contains("1.93"));
    }

    #[test]
    fn test_primary_ratio_recorded() {
        let card = scorecard(&example_snapshot());
        let growth = card.component(Category::Growth).unwrap();
        assert_eq!(growth.category.primary_ratio(), RatioKey::RevenueGrowth);
        assert!(growth.primary_value.unwrap() > 0.05);
    }
}
