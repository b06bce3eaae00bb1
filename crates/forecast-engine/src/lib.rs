//! Forecast Engine
//!
//! Two short horizons: a qualitative read of the cash runway and a one-period
//! linear revenue projection.

use assessment_core::format;
use assessment_core::{
    AssessmentError, ForecastParams, Localizer, RatioKey, RatioSet, RatioStage, Stage,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class", content = "months", rename_all = "snake_case")]
pub enum RunwayOutlook {
    /// Monthly burn is zero; runway is not limited by burn.
    NoBurn,
    Critical(f64),
    Tight(f64),
    Comfortable(f64),
}

impl RunwayOutlook {
    pub fn classify(runway: Option<f64>, params: &ForecastParams) -> Self {
        match runway {
            None => RunwayOutlook::NoBurn,
            Some(m) if m < params.critical_below_months => RunwayOutlook::Critical(m),
            Some(m) if m > params.comfortable_above_months => RunwayOutlook::Comfortable(m),
            Some(m) => RunwayOutlook::Tight(m),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunwayOutlook::NoBurn => "no_burn",
            RunwayOutlook::Critical(_) => "critical",
            RunwayOutlook::Tight(_) => "tight",
            RunwayOutlook::Comfortable(_) => "comfortable",
        }
    }

    pub fn months(&self) -> Option<f64> {
        match *self {
            RunwayOutlook::NoBurn => None,
            RunwayOutlook::Critical(m)
            | RunwayOutlook::Tight(m)
            | RunwayOutlook::Comfortable(m) => Some(m),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevenueProjection {
    pub current: f64,
    pub growth: f64,
    pub projected: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub runway: RunwayOutlook,
    /// `None` when growth is undefined (no prior-period revenue).
    pub revenue: Option<RevenueProjection>,
}

pub struct ForecastEngine {
    params: ForecastParams,
}

impl ForecastEngine {
    pub fn new(params: ForecastParams) -> Self {
        Self { params }
    }

    pub fn forecast(&self, ratios: &RatioSet) -> Forecast {
        let runway = RunwayOutlook::classify(ratios.get(RatioKey::CashRunway), &self.params);

        let current = ratios.snapshot.revenue;
        let revenue = ratios.get(RatioKey::RevenueGrowth).map(|growth| RevenueProjection {
            current,
            growth,
            projected: current * (1.0 + growth),
        });

        Forecast { runway, revenue }
    }

    /// Single sentence: runway clause, then revenue clause.
    pub fn summarize(forecast: &Forecast, loc: &Localizer<'_>) -> String {
        let runway_key = format!("forecast.runway.{}", forecast.runway.as_str());
        let runway = match forecast.runway.months() {
            Some(m) => loc.render(&runway_key, &[("months", format::months(m))]),
            None => loc.text(&runway_key),
        };

        let revenue = match forecast.revenue {
            None => loc.text("forecast.revenue.no_baseline"),
            Some(p) => {
                let amount = format::amount(p.projected);
                let growth = format::percent(p.growth);
                if p.growth > 0.0 {
                    loc.render(
                        "forecast.revenue.growing",
                        &[("amount", amount), ("growth", growth)],
                    )
                } else if p.growth < 0.0 {
                    loc.render(
                        "forecast.revenue.declining",
                        &[("amount", amount), ("growth", growth)],
                    )
                } else {
                    loc.render("forecast.revenue.flat", &[("amount", amount)])
                }
            }
        };

        loc.render("forecast.summary", &[("runway", runway), ("revenue", revenue)])
    }
}

impl RatioStage for ForecastEngine {
    type Output = Forecast;

    const STAGE: Stage = Stage::Forecast;

    fn run(&self, ratios: &RatioSet) -> Result<Forecast, AssessmentError> {
        let forecast = self.forecast(ratios);
        if let Some(p) = &forecast.revenue {
            if !p.projected.is_finite() {
                return Err(AssessmentError::new(
                    Stage::Forecast,
                    "revenue projection is not finite",
                ));
            }
        }
        tracing::debug!(
            "Runway outlook for {}: {}",
            ratios.snapshot.business_name,
            forecast.runway.as_str()
        );
        Ok(forecast)
    }
}
