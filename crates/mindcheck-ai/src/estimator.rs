//! The quantitative estimator: feature record → label + probability.

use std::sync::Arc;

use mindcheck_core::{AssessError, EstimatorResult, FeatureRecord};
use tracing::{debug, info};

use crate::classifier::{Classifier, ClassifierError};
use crate::labels::LabelTable;

/// Estimator for one deployment. Built once at start-up, cheap to clone.
#[derive(Clone)]
pub enum Estimator {
    /// A loaded classifier and the label table its classes map onto.
    Model {
        classifier: Arc<dyn Classifier>,
        labels: LabelTable,
    },
    /// Deployments without a classifier report a fixed prior.
    Prior(EstimatorResult),
}

impl Estimator {
    pub fn model(classifier: Arc<dyn Classifier>, labels: LabelTable) -> Self {
        Self::Model { classifier, labels }
    }

    pub fn prior(label: impl Into<String>, probability: f64) -> Self {
        Self::Prior(EstimatorResult::new(label, probability.clamp(0.0, 1.0)))
    }

    pub fn estimate(&self, record: &FeatureRecord) -> Result<EstimatorResult, AssessError> {
        match self {
            Self::Prior(prior) => {
                debug!(label = %prior.label, probability = prior.probability, "using prior estimate");
                Ok(prior.clone())
            }
            Self::Model { classifier, labels } => {
                let result = run_model(classifier.as_ref(), labels, &record.vector())
                    .map_err(|e| AssessError::Estimator(e.to_string()))?;
                info!(label = %result.label, probability = result.probability, "classifier estimate");
                Ok(result)
            }
        }
    }
}

fn run_model(
    classifier: &dyn Classifier,
    labels: &LabelTable,
    features: &[f64],
) -> Result<EstimatorResult, ClassifierError> {
    let predicted = classifier.predict(features)?;
    let proba = classifier.predict_proba(features)?;

    if proba.len() != labels.len() {
        return Err(ClassifierError::Shape(format!(
            "{} class probabilities for {} labels",
            proba.len(),
            labels.len()
        )));
    }
    if let Some((class, p)) = proba
        .iter()
        .enumerate()
        .find(|(_, p)| !(0.0..=1.0).contains(*p))
    {
        return Err(ClassifierError::Inference(format!(
            "probability {p} for class {class} is outside [0, 1]"
        )));
    }

    let label = labels.label(predicted).ok_or_else(|| {
        ClassifierError::Inference(format!("predicted class {predicted} has no label"))
    })?;
    let probability = proba[labels.reported_class(predicted)];

    Ok(EstimatorResult::new(label, probability))
}
