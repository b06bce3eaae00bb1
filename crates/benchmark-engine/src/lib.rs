//! Benchmark Engine
//!
//! Places each ratio against the reference band for the business's peer group and
//! condenses the material deviations into one sentence.

mod table;

pub use table::{Band, BandSet, BenchmarkTable, BenchmarkTableError, IndustryBenchmarks, PeerLevel};

use std::sync::Arc;

use assessment_core::format;
use assessment_core::{
    AssessmentError, BenchmarkParams, Localizer, RatioKey, RatioSet, RatioStage, Stage,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Below,
    Within,
    Above,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Below => "below",
            Position::Within => "within",
            Position::Above => "above",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub ratio: RatioKey,
    pub value: f64,
    pub band: Band,
    pub position: Position,
    /// Distance outside the band, in band widths. Zero when within.
    pub deviation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkOutcome {
    pub industry: String,
    pub region: String,
    pub peer: PeerLevel,
    /// In ratio declaration order.
    pub comparisons: Vec<Comparison>,
}

impl BenchmarkOutcome {
    pub fn comparison(&self, ratio: RatioKey) -> Option<&Comparison> {
        self.comparisons.iter().find(|c| c.ratio == ratio)
    }
}

pub fn compare(ratio: RatioKey, value: f64, band: Band) -> Comparison {
    // Zero-width bands measure distance against the band's own magnitude
    let width = match band.high - band.low {
        w if w > 0.0 => w,
        _ => band.low.abs().max(1.0),
    };

    let (position, distance) = if value < band.low {
        (Position::Below, band.low - value)
    } else if value > band.high {
        (Position::Above, value - band.high)
    } else {
        (Position::Within, 0.0)
    };

    Comparison {
        ratio,
        value,
        band,
        position,
        deviation: distance / width,
    }
}

pub struct BenchmarkEngine {
    table: Arc<BenchmarkTable>,
    params: BenchmarkParams,
}

impl BenchmarkEngine {
    pub fn new(table: Arc<BenchmarkTable>, params: BenchmarkParams) -> Self {
        Self { table, params }
    }

    /// Ratios that are absent, or have no band at any level, are not compared.
    pub fn benchmark(&self, ratios: &RatioSet) -> BenchmarkOutcome {
        let snapshot = &ratios.snapshot;
        let resolved = self.table.resolve(&snapshot.industry, &snapshot.region);

        if resolved.level != PeerLevel::Region {
            tracing::warn!(
                "No regional benchmarks for {} / {}, using {:?} level bands",
                snapshot.industry,
                snapshot.region,
                resolved.level
            );
        }

        let comparisons = ratios
            .iter()
            .filter_map(|r| {
                let value = r.value?;
                let band = resolved.bands.get(&r.key)?;
                Some(compare(r.key, value, *band))
            })
            .collect();

        BenchmarkOutcome {
            industry: snapshot.industry.clone(),
            region: snapshot.region.clone(),
            peer: resolved.level,
            comparisons,
        }
    }

    /// Largest material deviations first; equal deviations keep declaration order.
    pub fn material_deviations<'a>(&self, outcome: &'a BenchmarkOutcome) -> Vec<&'a Comparison> {
        let mut deviations: Vec<&Comparison> = outcome
            .comparisons
            .iter()
            .filter(|c| c.position != Position::Within && c.deviation > self.params.materiality)
            .collect();
        deviations.sort_by(|a, b| b.deviation.total_cmp(&a.deviation));
        deviations.truncate(self.params.summary_limit);
        deviations
    }

    pub fn summarize(&self, outcome: &BenchmarkOutcome, loc: &Localizer<'_>) -> String {
        if outcome.comparisons.is_empty() {
            return loc.text("benchmark.summary.no_data");
        }

        let peers = match outcome.peer {
            PeerLevel::Region => loc.render(
                "benchmark.peer.region",
                &[
                    ("industry", outcome.industry.clone()),
                    ("region", outcome.region.clone()),
                ],
            ),
            PeerLevel::Industry => loc.render(
                "benchmark.peer.industry",
                &[("industry", outcome.industry.clone())],
            ),
            PeerLevel::Global => loc.text("benchmark.peer.global"),
        };

        let deviations = self.material_deviations(outcome);
        if deviations.is_empty() {
            return loc.render("benchmark.summary.aligned", &[("peers", peers)]);
        }

        let items: Vec<String> = deviations
            .iter()
            .map(|c| {
                loc.render(
                    &format!("benchmark.item.{}", c.position.as_str()),
                    &[
                        ("ratio", loc.text(&format!("ratio.{}", c.ratio.as_str()))),
                        ("value", format::ratio_value(c.ratio, c.value)),
                        ("low", format::ratio_value(c.ratio, c.band.low)),
                        ("high", format::ratio_value(c.ratio, c.band.high)),
                    ],
                )
            })
            .collect();

        loc.render(
            "benchmark.summary.deviations",
            &[("peers", peers), ("items", items.join("; "))],
        )
    }

    /// Short position note appended to a metric insight.
    pub fn position_note(comparison: &Comparison, loc: &Localizer<'_>) -> String {
        loc.render(
            &format!("benchmark.position.{}", comparison.position.as_str()),
            &[
                ("low", format::ratio_value(comparison.ratio, comparison.band.low)),
                ("high", format::ratio_value(comparison.ratio, comparison.band.high)),
            ],
        )
    }
}

impl RatioStage for BenchmarkEngine {
    type Output = BenchmarkOutcome;

    const STAGE: Stage = Stage::Benchmark;

    fn run(&self, ratios: &RatioSet) -> Result<BenchmarkOutcome, AssessmentError> {
        let outcome = self.benchmark(ratios);
        tracing::debug!(
            "Benchmarked {} ratios against table {} ({:?} peers)",
            outcome.comparisons.len(),
            self.table.version,
            outcome.peer
        );
        Ok(outcome)
    }
}
