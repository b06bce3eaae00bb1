//! Versioned reference bands keyed by industry and region.

use std::collections::BTreeMap;

use assessment_core::RatioKey;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const BUNDLED_TABLE: &str = include_str!("../data/benchmarks.json");

#[derive(Error, Debug)]
pub enum BenchmarkTableError {
    #[error("invalid benchmark table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{scope}: band for {ratio} has low {low} above high {high}")]
    InvertedBand {
        scope: String,
        ratio: &'static str,
        low: f64,
        high: f64,
    },

    #[error("{scope}: band for {ratio} is not finite")]
    NonFiniteBand { scope: String, ratio: &'static str },

    #[error("industry '{0}' is listed more than once")]
    DuplicateIndustry(String),
}

/// Expected range for one ratio, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub low: f64,
    pub high: f64,
}

pub type BandSet = BTreeMap<RatioKey, Band>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndustryBenchmarks {
    pub industry: String,
    #[serde(default)]
    pub default: BandSet,
    #[serde(default)]
    pub regions: BTreeMap<String, BandSet>,
}

/// How specific the matched peer group is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerLevel {
    Region,
    Industry,
    Global,
}

/// Bands resolved for one (industry, region) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBands {
    pub level: PeerLevel,
    pub bands: BandSet,
}

/// Read-only after load; shared across requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkTable {
    pub version: String,
    pub published: NaiveDate,
    pub global: BandSet,
    #[serde(default)]
    pub industries: Vec<IndustryBenchmarks>,
}

impl BenchmarkTable {
    pub fn bundled() -> Result<Self, BenchmarkTableError> {
        Self::from_json(BUNDLED_TABLE)
    }

    pub fn from_json(raw: &str) -> Result<Self, BenchmarkTableError> {
        let table: Self = serde_json::from_str(raw)?;
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<(), BenchmarkTableError> {
        check_bands("global", &self.global)?;

        let mut seen = Vec::new();
        for entry in &self.industries {
            let key = normalize(&entry.industry);
            if seen.contains(&key) {
                return Err(BenchmarkTableError::DuplicateIndustry(entry.industry.clone()));
            }
            seen.push(key);

            check_bands(&entry.industry, &entry.default)?;
            for (region, bands) in &entry.regions {
                check_bands(&format!("{} / {}", entry.industry, region), bands)?;
            }
        }
        Ok(())
    }

    /// Most specific bands available, per ratio: region, then industry default,
    /// then global. `level` reports the most specific level that matched at all.
    pub fn resolve(&self, industry: &str, region: &str) -> ResolvedBands {
        let mut bands = self.global.clone();

        let Some(entry) = self
            .industries
            .iter()
            .find(|e| normalize(&e.industry) == normalize(industry))
        else {
            return ResolvedBands {
                level: PeerLevel::Global,
                bands,
            };
        };
        bands.extend(entry.default.iter().map(|(k, v)| (*k, *v)));

        let regional = entry
            .regions
            .iter()
            .find(|(name, _)| normalize(name) == normalize(region))
            .map(|(_, b)| b);

        match regional {
            Some(regional) => {
                bands.extend(regional.iter().map(|(k, v)| (*k, *v)));
                ResolvedBands {
                    level: PeerLevel::Region,
                    bands,
                }
            }
            None => ResolvedBands {
                level: PeerLevel::Industry,
                bands,
            },
        }
    }
}

fn check_bands(scope: &str, bands: &BandSet) -> Result<(), BenchmarkTableError> {
    for (ratio, band) in bands {
        if !band.low.is_finite() || !band.high.is_finite() {
            return Err(BenchmarkTableError::NonFiniteBand {
                scope: scope.to_string(),
                ratio: ratio.as_str(),
            });
        }
        if band.low > band.high {
            return Err(BenchmarkTableError::InvertedBand {
                scope: scope.to_string(),
                ratio: ratio.as_str(),
                low: band.low,
                high: band.high,
            });
        }
    }
    Ok(())
}

fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}
