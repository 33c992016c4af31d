//! One request through the whole chain:
//! normalize → estimate → narrate → extract → resolve → assemble.
//!
//! Input rejection and estimator errors stop the chain before the narrative
//! call. Narrative failures never do; they degrade the result instead.

use std::sync::Arc;

use mindcheck_ai::Estimator;
use mindcheck_core::{
    AssessError, EstimatorResult, FeatureRecord, FusedResult, assemble, normalize, resolve,
};
use mindcheck_narrative::{NarrativeRequest, NarrativeService, PromptContext, request_narrative};
use serde_json::Value;
use tracing::{info, warn};

use crate::deployment::Deployment;

/// Key holding the caller's opaque identifier.
pub const IDENTIFIER_KEY: &str = "user_id";

/// Everything decided before the narrative call.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub record: FeatureRecord,
    pub estimate: EstimatorResult,
    pub request: NarrativeRequest,
    pub identifier: Option<String>,
}

/// Immutable, shareable across concurrent requests.
#[derive(Clone)]
pub struct Assessor {
    deployment: &'static Deployment,
    estimator: Estimator,
    narrative: Arc<dyn NarrativeService>,
    model: String,
}

impl Assessor {
    pub fn new(
        deployment: &'static Deployment,
        estimator: Estimator,
        narrative: Arc<dyn NarrativeService>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            deployment,
            estimator,
            narrative,
            model: model.into(),
        }
    }

    pub fn deployment(&self) -> &'static Deployment {
        self.deployment
    }

    /// Validate the request, run the estimator and render the narrative
    /// request. No external call happens here.
    pub fn prepare(&self, raw: &Value) -> Result<Prepared, AssessError> {
        let d = self.deployment;
        let record = normalize(&d.schema(), raw).inspect_err(|e| {
            warn!(deployment = %d.kind, error = %e, "request rejected");
        })?;
        let estimate = self.estimator.estimate(&record)?;

        let request = NarrativeRequest::from_template(
            self.model.clone(),
            &d.template,
            &PromptContext {
                record: &record,
                estimate: &estimate,
                marker: d.marker,
            },
            d.max_tokens,
            d.temperature,
        );

        Ok(Prepared {
            record,
            estimate,
            request,
            identifier: read_identifier(raw),
        })
    }

    pub async fn assess(&self, raw: &Value) -> Result<FusedResult, AssessError> {
        let prepared = self.prepare(raw)?;
        let d = self.deployment;

        let narrative = request_narrative(self.narrative.as_ref(), &prepared.request).await;
        let extracted = narrative.usable_text().and_then(|t| d.marker.extract(t));
        if narrative.usable_text().is_some() && extracted.is_none() {
            info!(marker = d.marker.label, "narrative has no usable marker line");
        }

        let resolved = resolve(&prepared.estimate, extracted);
        let result = assemble(
            d.kind,
            &prepared.estimate,
            resolved,
            &narrative,
            prepared.identifier,
        );

        info!(
            deployment = %d.kind,
            label = %result.label,
            reported = result.reported_probability,
            source = result.probability_source.as_str(),
            degraded = result.narrative_degraded,
            "assessment complete"
        );
        Ok(result)
    }
}

/// The caller's identifier, as text. Strings pass through, numbers are
/// rendered; anything else is treated as absent.
pub fn read_identifier(raw: &Value) -> Option<String> {
    match raw.get(IDENTIFIER_KEY)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
