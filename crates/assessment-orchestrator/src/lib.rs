//! Sequences the engines for one assessment and assembles the report.
//!
//! The only component that knows stage ordering: validation, ratios, the four
//! independent ratio stages, recommendations, then narrative.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use assessment_core::{
    resolve_language, validate_intake, AssessmentError, AssessmentParams, AssessmentReport,
    EngineError, FinancialSnapshot, Language, LanguagePolicy, Phrasebook, RatioSet, RatioStage,
    Stage,
};
use benchmark_engine::{BenchmarkEngine, BenchmarkOutcome, BenchmarkTable};
use credit_scoring::{Scorecard, ScoringModel};
use forecast_engine::{Forecast, ForecastEngine};
use narrative_composer::{project_metrics, NarrativeComposer, StageOutputs};
use ratio_analysis::RatioEngine;
use recommendation_engine::RecommendationEngine;
use risk_alerts::{FiredAlert, RiskAlertEngine};
use serde::{Deserialize, Serialize};

/// How the four independent ratio stages are scheduled. Both produce identical reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One blocking task per stage, joined before recommendations run.
    #[default]
    Concurrent,
    Sequential,
}

impl std::str::FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "concurrent" => Ok(ExecutionMode::Concurrent),
            "sequential" => Ok(ExecutionMode::Sequential),
            other => Err(format!("unknown execution mode '{}'", other)),
        }
    }
}

/// Outputs of the fan-out stages.
struct RatioStageOutputs {
    scorecard: Scorecard,
    alerts: Vec<FiredAlert>,
    benchmark: BenchmarkOutcome,
    forecast: Forecast,
}

/// Holds only read-only, shareable state; one instance serves every request.
pub struct AssessmentOrchestrator {
    ratio_engine: RatioEngine,
    scoring: Arc<ScoringModel>,
    alerts: Arc<RiskAlertEngine>,
    benchmark: Arc<BenchmarkEngine>,
    forecast: Arc<ForecastEngine>,
    recommendations: RecommendationEngine,
    phrasebook: Arc<Phrasebook>,
    language_policy: LanguagePolicy,
    mode: ExecutionMode,
}

impl AssessmentOrchestrator {
    pub fn new(
        params: AssessmentParams,
        table: Arc<BenchmarkTable>,
        phrasebook: Arc<Phrasebook>,
    ) -> Self {
        Self {
            ratio_engine: RatioEngine::new(),
            scoring: Arc::new(ScoringModel::new(params.scoring)),
            alerts: Arc::new(RiskAlertEngine::new(params.alerts)),
            benchmark: Arc::new(BenchmarkEngine::new(table, params.benchmark)),
            forecast: Arc::new(ForecastEngine::new(params.forecast)),
            recommendations: RecommendationEngine::new(params.recommendations),
            phrasebook,
            language_policy: LanguagePolicy::default(),
            mode: ExecutionMode::default(),
        }
    }

    pub fn with_language_policy(mut self, policy: LanguagePolicy) -> Self {
        self.language_policy = policy;
        self
    }

    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Validate a raw intake payload, then assess it.
    ///
    /// Validation and language errors return before any computation stage runs.
    pub async fn assess(&self, raw: &serde_json::Value) -> Result<AssessmentReport, EngineError> {
        let intake = validate_intake(raw)?;
        let language = resolve_language(&intake.language_code, self.language_policy)?;
        Ok(self.assess_snapshot(intake.snapshot, language).await?)
    }

    /// Assess an already validated snapshot.
    pub async fn assess_snapshot(
        &self,
        snapshot: FinancialSnapshot,
        language: Language,
    ) -> Result<AssessmentReport, AssessmentError> {
        let started = Instant::now();
        tracing::info!(
            "Starting assessment for {} ({} / {}, language: {}, mode: {:?})",
            snapshot.business_name,
            snapshot.industry,
            snapshot.region,
            language.code(),
            self.mode
        );

        let result = self.run_pipeline(snapshot, language).await;
        match &result {
            Ok(report) => tracing::info!(
                "Assessment complete in {:?}: credit {:.2}, risk {:.2}, {} alerts",
                started.elapsed(),
                report.credit_score,
                report.risk_score,
                report.risk_alerts.len()
            ),
            Err(e) => tracing::error!("Assessment failed in {} stage: {}", e.stage, e.reason),
        }
        result
    }

    async fn run_pipeline(
        &self,
        snapshot: FinancialSnapshot,
        language: Language,
    ) -> Result<AssessmentReport, AssessmentError> {
        let ratios = Arc::new(guard(Stage::Ratios, || self.ratio_engine.compute(&snapshot))?);

        let stages = match self.mode {
            ExecutionMode::Concurrent => self.run_concurrent(&ratios).await?,
            ExecutionMode::Sequential => self.run_sequential(&ratios)?,
        };

        let risk_score = self.scoring.risk_score(
            &stages.scorecard,
            RiskAlertEngine::any_high_severity(&stages.alerts),
        );

        let loc = self.phrasebook.localizer(language);

        let plan = guard(Stage::Recommendations, || {
            Ok(self
                .recommendations
                .plan(&ratios, &stages.scorecard, &stages.alerts))
        })?;

        guard(Stage::Narrative, || {
            let outputs = StageOutputs {
                ratios: &ratios,
                scorecard: &stages.scorecard,
                risk_score,
                alerts: &stages.alerts,
                benchmark: &stages.benchmark,
                forecast: &stages.forecast,
            };
            let composer = NarrativeComposer::new(loc);

            Ok(AssessmentReport {
                risk_score,
                credit_score: stages.scorecard.credit_score,
                health_label: composer.health_label(&outputs),
                component_scores: self.scoring.render(
                    &stages.scorecard,
                    self.recommendations.watch_thresholds(),
                    &loc,
                ),
                risk_alerts: RiskAlertEngine::render(&stages.alerts, &loc),
                metrics: project_metrics(&outputs, &loc),
                recommendations: RecommendationEngine::render_recommendations(&plan, &loc),
                product_recommendations: RecommendationEngine::render_products(&plan, &loc),
                benchmark_summary: self.benchmark.summarize(&stages.benchmark, &loc),
                forecast_summary: ForecastEngine::summarize(&stages.forecast, &loc),
                narrative: composer.compose(&outputs),
            })
        })
    }

    /// Fan out on the blocking pool and join all four. Failures are checked in a
    /// fixed stage order so the reported error never depends on scheduling.
    async fn run_concurrent(
        &self,
        ratios: &Arc<RatioSet>,
    ) -> Result<RatioStageOutputs, AssessmentError> {
        let (scorecard, alerts, benchmark, forecast) = tokio::join!(
            spawn_stage(self.scoring.clone(), ratios.clone()),
            spawn_stage(self.alerts.clone(), ratios.clone()),
            spawn_stage(self.benchmark.clone(), ratios.clone()),
            spawn_stage(self.forecast.clone(), ratios.clone()),
        );

        Ok(RatioStageOutputs {
            scorecard: scorecard?,
            alerts: alerts?,
            benchmark: benchmark?,
            forecast: forecast?,
        })
    }

    fn run_sequential(&self, ratios: &RatioSet) -> Result<RatioStageOutputs, AssessmentError> {
        Ok(RatioStageOutputs {
            scorecard: run_stage(self.scoring.as_ref(), ratios)?,
            alerts: run_stage(self.alerts.as_ref(), ratios)?,
            benchmark: run_stage(self.benchmark.as_ref(), ratios)?,
            forecast: run_stage(self.forecast.as_ref(), ratios)?,
        })
    }
}

async fn spawn_stage<S>(stage: Arc<S>, ratios: Arc<RatioSet>) -> Result<S::Output, AssessmentError>
where
    S: RatioStage + 'static,
{
    match tokio::task::spawn_blocking(move || stage.run(&ratios)).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(AssessmentError::new(S::STAGE, "stage panicked")),
        Err(_) => Err(AssessmentError::new(S::STAGE, "stage task was cancelled")),
    }
}

fn run_stage<S: RatioStage>(stage: &S, ratios: &RatioSet) -> Result<S::Output, AssessmentError> {
    guard(S::STAGE, || stage.run(ratios))
}

/// Run `f`, turning a panic into an [`AssessmentError`] for `stage`.
fn guard<T>(
    stage: Stage,
    f: impl FnOnce() -> Result<T, AssessmentError>,
) -> Result<T, AssessmentError> {
    catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|_| Err(AssessmentError::new(stage, "stage panicked")))
}
