//! Recommendation Engine
//!
//! Turns weak categories into advice and matches financing-gap patterns to products.

use assessment_core::format;
use assessment_core::{
    Category, Localizer, PerCategory, ProductRecommendation, RatioKey, RatioSet, Recommendation,
    RecommendationParams,
};
use credit_scoring::Scorecard;
use risk_alerts::FiredAlert;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Product {
    WorkingCapitalLoan,
    InvoiceDiscounting,
    DebtConsolidationLoan,
}

impl Product {
    pub fn as_str(&self) -> &'static str {
        match self {
            Product::WorkingCapitalLoan => "working_capital_loan",
            Product::InvoiceDiscounting => "invoice_discounting",
            Product::DebtConsolidationLoan => "debt_consolidation_loan",
        }
    }
}

/// A weak category with the value its advice quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weakness {
    pub category: Category,
    pub score: f64,
    pub primary_value: Option<f64>,
}

/// A matched financing pattern and the figures that triggered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMatch {
    pub product: Product,
    pub ratio: RatioKey,
    pub value: f64,
    pub threshold: f64,
    /// Leverage quoted alongside the working-capital pattern.
    pub leverage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecommendationPlan {
    pub weaknesses: Vec<Weakness>,
    pub products: Vec<ProductMatch>,
}

pub struct RecommendationEngine {
    params: RecommendationParams,
}

impl RecommendationEngine {
    pub fn new(params: RecommendationParams) -> Self {
        Self { params }
    }

    pub fn watch_thresholds(&self) -> &PerCategory<f64> {
        &self.params.watch_thresholds
    }

    pub fn plan(
        &self,
        ratios: &RatioSet,
        scorecard: &Scorecard,
        alerts: &[FiredAlert],
    ) -> RecommendationPlan {
        let plan = RecommendationPlan {
            weaknesses: self.weaknesses(scorecard, alerts),
            products: self.products(ratios),
        };
        tracing::debug!(
            "{} weak categories, {} product matches",
            plan.weaknesses.len(),
            plan.products.len()
        );
        plan
    }

    /// At most one entry per category, in category order. A category is weak when
    /// it scores below its watch threshold or an alert fired on its primary ratio.
    pub fn weaknesses(&self, scorecard: &Scorecard, alerts: &[FiredAlert]) -> Vec<Weakness> {
        scorecard
            .components
            .iter()
            .filter(|c| {
                c.score < self.params.watch_thresholds.get(c.category)
                    || alerts.iter().any(|a| a.ratio == c.category.primary_ratio())
            })
            .map(|c| Weakness {
                category: c.category,
                score: c.score,
                primary_value: c.primary_value,
            })
            .collect()
    }

    pub fn products(&self, ratios: &RatioSet) -> Vec<ProductMatch> {
        let p = &self.params;
        let quick = ratios.get(RatioKey::QuickRatio);
        let leverage = ratios.get(RatioKey::Leverage);
        let net_margin = ratios.get(RatioKey::NetMargin);
        let mut matches = Vec::new();

        // Thin liquidity with room to borrow; absent leverage means no surplus to lend against
        if let (Some(q), Some(l)) = (quick, leverage) {
            if q < p.working_capital_quick_below && l < p.working_capital_max_leverage {
                matches.push(ProductMatch {
                    product: Product::WorkingCapitalLoan,
                    ratio: RatioKey::QuickRatio,
                    value: q,
                    threshold: p.working_capital_quick_below,
                    leverage: Some(l),
                });
            }
        }

        if let Some(rp) = ratios.get(RatioKey::ReceivablesToPayables) {
            if rp >= p.invoice_receivables_to_payables_at_or_above {
                matches.push(ProductMatch {
                    product: Product::InvoiceDiscounting,
                    ratio: RatioKey::ReceivablesToPayables,
                    value: rp,
                    threshold: p.invoice_receivables_to_payables_at_or_above,
                    leverage: None,
                });
            }
        }

        if let (Some(l), Some(nm)) = (leverage, net_margin) {
            if l >= p.consolidation_leverage_at_or_above && nm > 0.0 {
                matches.push(ProductMatch {
                    product: Product::DebtConsolidationLoan,
                    ratio: RatioKey::Leverage,
                    value: l,
                    threshold: p.consolidation_leverage_at_or_above,
                    leverage: None,
                });
            }
        }

        matches
    }

    pub fn render_recommendations(
        plan: &RecommendationPlan,
        loc: &Localizer<'_>,
    ) -> Vec<Recommendation> {
        plan.weaknesses
            .iter()
            .map(|w| {
                let text = match w.primary_value {
                    Some(value) => loc.render(
                        &format!("rec.{}", w.category.as_str()),
                        &[(
                            "value",
                            format::ratio_value(w.category.primary_ratio(), value),
                        )],
                    ),
                    None => loc.render(
                        "rec.absent",
                        &[(
                            "category",
                            loc.text(&format!("category.{}", w.category.as_str())),
                        )],
                    ),
                };
                Recommendation { text }
            })
            .collect()
    }

    pub fn render_products(
        plan: &RecommendationPlan,
        loc: &Localizer<'_>,
    ) -> Vec<ProductRecommendation> {
        plan.products
            .iter()
            .map(|m| {
                let prefix = format!("product.{}", m.product.as_str());
                let mut args = vec![
                    ("value", format::ratio_value(m.ratio, m.value)),
                    ("threshold", format::ratio_value(m.ratio, m.threshold)),
                ];
                if let Some(l) = m.leverage {
                    args.push(("leverage", format::ratio_value(RatioKey::Leverage, l)));
                }
                ProductRecommendation {
                    name: loc.text(&format!("{}.name", prefix)),
                    rationale: loc.render(&format!("{}.rationale", prefix), &args),
                }
            })
            .collect()
    }
}
