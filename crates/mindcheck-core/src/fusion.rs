//! Fusion of the classifier estimate with the narrative's self-reported value,
//! and assembly of the final result.
//!
//! Precedence: a value extracted from the narrative wins; otherwise the
//! classifier probability, scaled to percent, is reported. The extracted
//! value is clamped to `[0, 100]` so the reported probability always stays
//! on the percent scale.

use chrono::{SubsecRound, Utc};
use tracing::{debug, warn};

use crate::assessment::{
    EstimatorResult, FALLBACK_NARRATIVE, FusedResult, NarrativeResult, ProbabilitySource,
};
use crate::schema::DeploymentKind;

/// Both probabilities of one assessment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedProbability {
    /// Classifier estimate, 0–1.
    pub model: f64,
    /// Reported value, 0–100.
    pub reported: f64,
    pub source: ProbabilitySource,
}

pub fn resolve(estimate: &EstimatorResult, extracted: Option<f64>) -> ResolvedProbability {
    match extracted.filter(|v| !v.is_nan()) {
        Some(value) => {
            let reported = value.clamp(0.0, 100.0);
            if reported != value {
                warn!(extracted = value, reported, "narrative probability out of range, clamped");
            }
            ResolvedProbability {
                model: estimate.probability,
                reported,
                source: ProbabilitySource::Narrative,
            }
        }
        None => {
            debug!(
                probability = estimate.probability,
                "no narrative probability, falling back to the classifier"
            );
            ResolvedProbability {
                model: estimate.probability,
                reported: estimate.percent(),
                source: ProbabilitySource::Model,
            }
        }
    }
}

/// Package the stage outputs into the outward-facing result.
///
/// A degraded narrative is replaced by [`FALLBACK_NARRATIVE`].
pub fn assemble(
    deployment: DeploymentKind,
    estimate: &EstimatorResult,
    resolved: ResolvedProbability,
    narrative: &NarrativeResult,
    identifier: Option<String>,
) -> FusedResult {
    let (narrative_text, narrative_degraded) = match narrative.usable_text() {
        Some(text) => (text.to_string(), false),
        None => (FALLBACK_NARRATIVE.to_string(), true),
    };

    FusedResult {
        deployment,
        label: estimate.label.clone(),
        model_probability: resolved.model,
        reported_probability: resolved.reported,
        probability_source: resolved.source,
        narrative_text,
        narrative_degraded,
        identifier,
        // Millisecond precision, matching the audit export.
        assessed_at: Utc::now().trunc_subsecs(3),
    }
}
