//! ONNX Runtime classifier for exported tabular models.
//!
//! Expects the usual converter layout: one float input of shape
//! `[batch, n_features]`, a label output, and a final probability output of
//! shape `[batch, n_classes]` (no ZipMap).

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use crate::classifier::{Classifier, ClassifierError};

pub struct OnnxClassifier {
    // `Session::run` needs exclusive access; requests share one session.
    session: Mutex<Session>,
    n_features: Option<usize>,
    proba_output: usize,
}

impl OnnxClassifier {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        anyhow::ensure!(path.exists(), "model not found: {}", path.display());

        let session = Session::builder()?.commit_from_file(path)?;
        anyhow::ensure!(
            !session.outputs().is_empty(),
            "{} declares no outputs",
            path.display()
        );
        let n_features = session.inputs().first().and_then(|i| last_dim(i.dtype()));
        let proba_output = session.outputs().len() - 1;

        info!(model = %path.display(), features = ?n_features, "loaded ONNX classifier");
        Ok(Self {
            session: Mutex::new(session),
            n_features,
            proba_output,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ClassifierError> {
        if let Some(expected) = self.n_features
            && expected != features.len()
        {
            return Err(ClassifierError::FeatureCount {
                expected,
                actual: features.len(),
            });
        }

        let input: Vec<f32> = features.iter().map(|&x| x as f32).collect();
        let shape = [1i64, input.len() as i64];
        let tensor = Tensor::from_array((shape, input.into_boxed_slice()))
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ClassifierError::Inference("session lock poisoned".into()))?;
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let (_, data) = outputs[self.proba_output]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;
        if data.is_empty() {
            return Err(ClassifierError::Empty);
        }
        Ok(data.iter().map(|&p| f64::from(p)).collect())
    }
}

/// Last dimension of a tensor type, when static.
fn last_dim(value_type: &ort::value::ValueType) -> Option<usize> {
    match value_type {
        ort::value::ValueType::Tensor { shape, .. } => shape
            .last()
            .and_then(|&d| if d > 0 { Some(d as usize) } else { None }),
        _ => None,
    }
}
