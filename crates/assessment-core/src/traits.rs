use crate::{AssessmentError, RatioSet, Stage};

/// A computation stage that reads only the ratio set.
///
/// Stages implementing this have no data dependency on each other, so the
/// orchestrator may run them in any order or concurrently.
pub trait RatioStage: Send + Sync {
    type Output: Send + 'static;

    const STAGE: Stage;

    fn run(&self, ratios: &RatioSet) -> Result<Self::Output, AssessmentError>;
}
