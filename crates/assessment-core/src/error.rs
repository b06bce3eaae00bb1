use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bad, missing or out-of-range input. Always fixable by the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("{field}: required field is missing")]
    Missing { field: &'static str },

    #[error("{field}: expected a number")]
    NotNumeric { field: &'static str },

    #[error("{field}: value must be finite")]
    NotFinite { field: &'static str },

    #[error("{field}: must be zero or greater (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("{field}: expected text")]
    NotText { field: &'static str },

    #[error("{field}: must not be blank")]
    Blank { field: &'static str },
}

impl ValidationError {
    /// Name of the offending request field, if the error is tied to one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::NotAnObject => None,
            ValidationError::Missing { field }
            | ValidationError::NotNumeric { field }
            | ValidationError::NotFinite { field }
            | ValidationError::Negative { field, .. }
            | ValidationError::NotText { field }
            | ValidationError::Blank { field } => Some(field),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported language: {code}")]
pub struct UnsupportedLanguageError {
    pub code: String,
}

/// Computation stages that can fail after validation succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Ratios,
    Scoring,
    Alerts,
    Benchmark,
    Forecast,
    Recommendations,
    Narrative,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Ratios => "ratios",
            Stage::Scoring => "scoring",
            Stage::Alerts => "alerts",
            Stage::Benchmark => "benchmark",
            Stage::Forecast => "forecast",
            Stage::Recommendations => "recommendations",
            Stage::Narrative => "narrative",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unexpected failure inside a computation stage. Fatal for the request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{stage} stage failed: {reason}")]
pub struct AssessmentError {
    pub stage: Stage,
    pub reason: String,
}

impl AssessmentError {
    pub fn new(stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

/// Everything an assessment request can fail with.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    UnsupportedLanguage(#[from] UnsupportedLanguageError),

    #[error(transparent)]
    Assessment(#[from] AssessmentError),
}

/// Rejected parameter set. Raised at startup, never per request.
#[derive(Error, Debug)]
pub enum ParamsError {
    #[error("category weights must sum to 1.0 (got {0})")]
    WeightsDoNotSumToOne(f64),

    #[error("weight for {0} must be between 0 and 1")]
    WeightOutOfRange(&'static str),

    #[error("scoring anchor for {ratio} has identical worst and best values")]
    DegenerateAnchor { ratio: &'static str },

    #[error("category {0} has no scoring anchors")]
    UnanchoredCategory(&'static str),

    #[error("health bands: {0}")]
    HealthBands(String),

    #[error("runway bands: critical {critical} must be below comfortable {comfortable}")]
    RunwayBands { critical: f64, comfortable: f64 },

    #[error("absent-ratio score must lie within 0..=100 (got {0})")]
    Penalty(f64),

    #[error("invalid parameter file: {0}")]
    Parse(#[from] serde_json::Error),
}
