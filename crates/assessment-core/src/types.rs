use serde::{Deserialize, Serialize};

/// Canonical, validated figures for one assessment.
///
/// Only built by [`crate::validate_intake`] in production code; every amount is finite
/// and non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub business_name: String,
    pub industry: String,
    pub region: String,
    pub revenue: f64,
    pub prior_revenue: f64,
    pub expenses: f64,
    pub cogs: f64,
    pub receivables: f64,
    pub payables: f64,
    pub inventory: f64,
    pub debt: f64,
    pub cash_on_hand: f64,
    pub monthly_burn: f64,
    pub tax_liability: f64,
    pub deductions: f64,
}

impl FinancialSnapshot {
    /// Revenue minus operating expenses.
    pub fn operating_surplus(&self) -> f64 {
        self.revenue - self.expenses
    }
}

/// How a ratio is displayed as a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Percent,
    Multiple,
    Months,
}

/// Every ratio the engine derives, in declaration order.
///
/// Declaration order is load-bearing: it breaks ties in the benchmark summary and
/// orders the metric list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioKey {
    CurrentRatio,
    QuickRatio,
    Leverage,
    GrossMargin,
    NetMargin,
    OperatingEfficiency,
    ReceivablesToPayables,
    RevenueGrowth,
    CashRunway,
    InventoryTurnover,
    WorkingCapitalCycle,
    DebtServiceCoverage,
    TaxCoverage,
}

impl RatioKey {
    pub const ALL: [RatioKey; 13] = [
        RatioKey::CurrentRatio,
        RatioKey::QuickRatio,
        RatioKey::Leverage,
        RatioKey::GrossMargin,
        RatioKey::NetMargin,
        RatioKey::OperatingEfficiency,
        RatioKey::ReceivablesToPayables,
        RatioKey::RevenueGrowth,
        RatioKey::CashRunway,
        RatioKey::InventoryTurnover,
        RatioKey::WorkingCapitalCycle,
        RatioKey::DebtServiceCoverage,
        RatioKey::TaxCoverage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RatioKey::CurrentRatio => "current_ratio",
            RatioKey::QuickRatio => "quick_ratio",
            RatioKey::Leverage => "leverage",
            RatioKey::GrossMargin => "gross_margin",
            RatioKey::NetMargin => "net_margin",
            RatioKey::OperatingEfficiency => "operating_efficiency",
            RatioKey::ReceivablesToPayables => "receivables_to_payables",
            RatioKey::RevenueGrowth => "revenue_growth",
            RatioKey::CashRunway => "cash_runway",
            RatioKey::InventoryTurnover => "inventory_turnover",
            RatioKey::WorkingCapitalCycle => "working_capital_cycle",
            RatioKey::DebtServiceCoverage => "debt_service_coverage",
            RatioKey::TaxCoverage => "tax_coverage",
        }
    }

    /// Formula identity carried alongside each computed value.
    pub fn formula(&self) -> &'static str {
        match self {
            RatioKey::CurrentRatio => "(cash_on_hand + receivables + inventory) / payables",
            RatioKey::QuickRatio => "(cash_on_hand + receivables) / payables",
            RatioKey::Leverage => "debt / (revenue - expenses), surplus > 0",
            RatioKey::GrossMargin => "(revenue - cogs) / revenue",
            RatioKey::NetMargin => "(revenue - expenses) / revenue",
            RatioKey::OperatingEfficiency => "expenses / revenue",
            RatioKey::ReceivablesToPayables => "receivables / payables",
            RatioKey::RevenueGrowth => "(revenue - prior_revenue) / prior_revenue",
            RatioKey::CashRunway => "cash_on_hand / monthly_burn",
            RatioKey::InventoryTurnover => "revenue / inventory",
            RatioKey::WorkingCapitalCycle => "(receivables + inventory - payables) / revenue",
            RatioKey::DebtServiceCoverage => "(revenue - expenses) / debt",
            RatioKey::TaxCoverage => "deductions / tax_liability",
        }
    }

    pub fn unit(&self) -> Unit {
        match self {
            RatioKey::GrossMargin
            | RatioKey::NetMargin
            | RatioKey::OperatingEfficiency
            | RatioKey::RevenueGrowth
            | RatioKey::WorkingCapitalCycle => Unit::Percent,
            RatioKey::CashRunway => Unit::Months,
            _ => Unit::Multiple,
        }
    }
}

/// A derived ratio. `value` is `None` when the computation is undefined, which is
/// a different state from zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ratio {
    pub key: RatioKey,
    pub value: Option<f64>,
    pub formula: String,
}

/// The snapshot plus every ratio derived from it, in [`RatioKey::ALL`] order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioSet {
    pub snapshot: FinancialSnapshot,
    ratios: Vec<Ratio>,
}

impl RatioSet {
    pub fn new(snapshot: FinancialSnapshot, mut ratios: Vec<Ratio>) -> Self {
        ratios.sort_by_key(|r| r.key);
        Self { snapshot, ratios }
    }

    pub fn get(&self, key: RatioKey) -> Option<f64> {
        self.ratio(key).and_then(|r| r.value)
    }

    pub fn ratio(&self, key: RatioKey) -> Option<&Ratio> {
        self.ratios.iter().find(|r| r.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ratio> {
        self.ratios.iter()
    }
}

/// Scoring categories, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Liquidity,
    Leverage,
    Profitability,
    Efficiency,
    Growth,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Liquidity,
        Category::Leverage,
        Category::Profitability,
        Category::Efficiency,
        Category::Growth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Liquidity => "liquidity",
            Category::Leverage => "leverage",
            Category::Profitability => "profitability",
            Category::Efficiency => "efficiency",
            Category::Growth => "growth",
        }
    }

    /// The ratio quoted when describing or advising on this category.
    pub fn primary_ratio(&self) -> RatioKey {
        match self {
            Category::Liquidity => RatioKey::QuickRatio,
            Category::Leverage => RatioKey::Leverage,
            Category::Profitability => RatioKey::NetMargin,
            Category::Efficiency => RatioKey::OperatingEfficiency,
            Category::Growth => RatioKey::RevenueGrowth,
        }
    }
}

/// Coarse band derived from the credit score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthLabel {
    Strong,
    Stable,
    Watch,
    Distressed,
}

impl HealthLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthLabel::Strong => "strong",
            HealthLabel::Stable => "stable",
            HealthLabel::Watch => "watch",
            HealthLabel::Distressed => "distressed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

// ---- report -------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub name: String,
    pub score: f64,
    pub insight: String,
}

/// A rendered risk warning. Serialized as a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskAlert {
    pub message: String,
}

/// Display projection of a ratio. `value` is `null` when the ratio is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: Option<f64>,
    pub insight: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recommendation {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecommendation {
    pub name: String,
    pub rationale: String,
}

/// Final report. Owned by the caller; the engine keeps no reference to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub risk_score: f64,
    pub credit_score: f64,
    pub health_label: String,
    pub component_scores: Vec<ComponentScore>,
    pub risk_alerts: Vec<RiskAlert>,
    pub metrics: Vec<Metric>,
    pub recommendations: Vec<Recommendation>,
    pub product_recommendations: Vec<ProductRecommendation>,
    pub benchmark_summary: String,
    pub forecast_summary: String,
    pub narrative: String,
}
