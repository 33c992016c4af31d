//! Values passed between the pipeline stages and the terminal result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::DeploymentKind;

/// Substituted for the narrative whenever the generator fails or returns nothing usable.
pub const FALLBACK_NARRATIVE: &str = "We were unable to generate a detailed report at this time \
due to an issue with the AI model. We recommend reaching out to a mental health professional \
for a comprehensive assessment and support.";

/// Classifier output: one label from the deployment's label table and the
/// probability (0–1) of the target class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorResult {
    pub label: String,
    pub probability: f64,
}

impl EstimatorResult {
    pub fn new(label: impl Into<String>, probability: f64) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }

    /// The probability on the 0–100 scale used for reporting.
    pub fn percent(&self) -> f64 {
        self.probability * 100.0
    }
}

/// Outcome of the single narrative call.
///
/// A present `error` means `text` must be ignored, whatever it holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NarrativeResult {
    pub text: String,
    pub error: Option<String>,
}

impl NarrativeResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            error: Some(error.into()),
        }
    }

    /// The text downstream stages may read, if any.
    pub fn usable_text(&self) -> Option<&str> {
        if self.error.is_some() {
            return None;
        }
        let text = self.text.trim();
        if text.is_empty() { None } else { Some(text) }
    }

    pub fn is_degraded(&self) -> bool {
        self.usable_text().is_none()
    }
}

/// Which signal produced the reported probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbabilitySource {
    /// Parsed from the marker line of the narrative.
    Narrative,
    /// The classifier's probability scaled to percent.
    Model,
}

impl ProbabilitySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Narrative => "narrative",
            Self::Model => "model",
        }
    }
}

/// The terminal, outward-facing result of one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FusedResult {
    pub deployment: DeploymentKind,
    #[serde(rename = "prediction")]
    pub label: String,
    /// Classifier estimate, 0–1.
    pub model_probability: f64,
    /// Final reported value, 0–100.
    pub reported_probability: f64,
    pub probability_source: ProbabilitySource,
    pub narrative_text: String,
    /// True when `narrative_text` is the fallback paragraph.
    pub narrative_degraded: bool,
    /// Caller-supplied, passed through untouched.
    pub identifier: Option<String>,
    pub assessed_at: DateTime<Utc>,
}
