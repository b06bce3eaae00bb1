use assessment_core::{AssessmentError, FinancialSnapshot, Ratio, RatioKey, RatioSet, Stage};

/// Derives every ratio in [`RatioKey::ALL`] from a snapshot.
///
/// A zero denominator yields an absent value, never an error and never a substitute.
/// A non-finite result from a non-zero denominator is an internal failure.
pub struct RatioEngine;

impl Default for RatioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RatioEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn compute(&self, snapshot: &FinancialSnapshot) -> Result<RatioSet, AssessmentError> {
        let mut ratios = Vec::with_capacity(RatioKey::ALL.len());

        for key in RatioKey::ALL {
            let value = self.calculate(key, snapshot);
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(AssessmentError::new(
                        Stage::Ratios,
                        format!("{} evaluated to a non-finite value", key.as_str()),
                    ));
                }
            }
            ratios.push(Ratio {
                key,
                value,
                formula: key.formula().to_string(),
            });
        }

        let absent: Vec<&str> = ratios
            .iter()
            .filter(|r| r.value.is_none())
            .map(|r| r.key.as_str())
            .collect();
        if !absent.is_empty() {
            tracing::debug!("Absent ratios for {}: {:?}", snapshot.business_name, absent);
        }

        Ok(RatioSet::new(snapshot.clone(), ratios))
    }

    fn calculate(&self, key: RatioKey, s: &FinancialSnapshot) -> Option<f64> {
        match key {
            RatioKey::CurrentRatio => self.calculate_current_ratio(s),
            RatioKey::QuickRatio => self.calculate_quick_ratio(s),
            RatioKey::Leverage => self.calculate_leverage(s),
            RatioKey::GrossMargin => divide(s.revenue - s.cogs, s.revenue),
            RatioKey::NetMargin => divide(s.operating_surplus(), s.revenue),
            RatioKey::OperatingEfficiency => divide(s.expenses, s.revenue),
            RatioKey::ReceivablesToPayables => divide(s.receivables, s.payables),
            RatioKey::RevenueGrowth => divide(s.revenue - s.prior_revenue, s.prior_revenue),
            RatioKey::CashRunway => self.calculate_cash_runway(s),
            RatioKey::InventoryTurnover => divide(s.revenue, s.inventory),
            RatioKey::WorkingCapitalCycle => {
                divide(s.receivables + s.inventory - s.payables, s.revenue)
            }
            RatioKey::DebtServiceCoverage => divide(s.operating_surplus(), s.debt),
            RatioKey::TaxCoverage => divide(s.deductions, s.tax_liability),
        }
    }

    fn calculate_current_ratio(&self, s: &FinancialSnapshot) -> Option<f64> {
        divide(s.cash_on_hand + s.receivables + s.inventory, s.payables)
    }

    fn calculate_quick_ratio(&self, s: &FinancialSnapshot) -> Option<f64> {
        divide(s.cash_on_hand + s.receivables, s.payables)
    }

    /// Only defined while the business runs an operating surplus.
    fn calculate_leverage(&self, s: &FinancialSnapshot) -> Option<f64> {
        let surplus = s.operating_surplus();
        if surplus > 0.0 {
            Some(s.debt / surplus)
        } else {
            None
        }
    }

    /// Zero burn means "not burning cash", which is absent rather than infinite.
    fn calculate_cash_runway(&self, s: &FinancialSnapshot) -> Option<f64> {
        divide(s.cash_on_hand, s.monthly_burn)
    }
}

fn divide(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn approx(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("ratio should be present");
        assert!(
            (actual - expected).abs() < 1e-4,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_example_ratios() {
        let set = RatioEngine::new().compute(&example_snapshot()).unwrap();

        approx(set.get(RatioKey::QuickRatio), 270_000.0 / 140_000.0);
        approx(set.get(RatioKey::CurrentRatio), 490_000.0 / 140_000.0);
        approx(set.get(RatioKey::Leverage), 350_000.0 / 390_000.0);
        approx(set.get(RatioKey::GrossMargin), 0.504);
        approx(set.get(RatioKey::NetMargin), 0.312);
        approx(set.get(RatioKey::OperatingEfficiency), 0.688);
        approx(set.get(RatioKey::ReceivablesToPayables), 180.0 / 140.0);
        approx(set.get(RatioKey::RevenueGrowth), 70_000.0 / 1_180_000.0);
        approx(set.get(RatioKey::CashRunway), 3.6);
        approx(set.get(RatioKey::TaxCoverage), 18.0 / 52.0);
    }

    #[test]
    fn test_every_ratio_carries_formula() {
        let set = RatioEngine::new().compute(&example_snapshot()).unwrap();
        assert_eq!(set.iter().count(), RatioKey::ALL.len());
        for ratio in set.iter() {
            assert_eq!(ratio.formula, ratio.key.formula());
        }
    }

    #[test]
    fn test_zero_payables_yields_absent_liquidity() {
        let mut snapshot = example_snapshot();
        snapshot.payables = 0.0;
        let set = RatioEngine::new().compute(&snapshot).unwrap();

        assert_eq!(set.get(RatioKey::QuickRatio), None);
        assert_eq!(set.get(RatioKey::CurrentRatio), None);
        assert_eq!(set.get(RatioKey::ReceivablesToPayables), None);
        // Unrelated ratios are untouched
        assert!(set.get(RatioKey::GrossMargin).is_some());
    }

    #[test]
    fn test_leverage_absent_without_surplus() {
        let mut snapshot = example_snapshot();
        snapshot.expenses = snapshot.revenue;
        let set = RatioEngine::new().compute(&snapshot).unwrap();
        assert_eq!(set.get(RatioKey::Leverage), None);

        snapshot.expenses = snapshot.revenue + 1.0;
        let set = RatioEngine::new().compute(&snapshot).unwrap();
        assert_eq!(set.get(RatioKey::Leverage), None);
    }

    #[test]
    fn test_zero_debt_is_zero_leverage_not_absent() {
        let mut snapshot = example_snapshot();
        snapshot.debt = 0.0;
        let set = RatioEngine::new().compute(&snapshot).unwrap();
        assert_eq!(set.get(RatioKey::Leverage), Some(0.0));
        assert_eq!(set.get(RatioKey::DebtServiceCoverage), None);
    }

    #[test]
    fn test_no_burn_means_absent_runway() {
        let mut snapshot = example_snapshot();
        snapshot.monthly_burn = 0.0;
        let set = RatioEngine::new().compute(&snapshot).unwrap();
        assert_eq!(set.get(RatioKey::CashRunway), None);
    }

    #[test]
    fn test_negative_growth_allowed() {
        let mut snapshot = example_snapshot();
        snapshot.prior_revenue = 1_500_000.0;
        let set = RatioEngine::new().compute(&snapshot).unwrap();
        assert!(set.get(RatioKey::RevenueGrowth).unwrap() < 0.0);
    }

    #[test]
    fn test_zero_revenue_leaves_margins_absent() {
        let mut snapshot = example_snapshot();
        snapshot.revenue = 0.0;
        let set = RatioEngine::new().compute(&snapshot).unwrap();
        assert_eq!(set.get(RatioKey::GrossMargin), None);
        assert_eq!(set.get(RatioKey::NetMargin), None);
        assert_eq!(set.get(RatioKey::OperatingEfficiency), None);
        assert_eq!(set.get(RatioKey::WorkingCapitalCycle), None);
    }

    #[test]
    fn test_overflow_is_an_assessment_error() {
        let mut snapshot = example_snapshot();
        snapshot.cash_on_hand = f64::MAX;
        snapshot.receivables = f64::MAX;
        let err = RatioEngine::new().compute(&snapshot).unwrap_err();
        assert_eq!(err.stage, Stage::Ratios);
    }
}
