//! Model artifacts on disk.
//!
//! JSON artifacts carry the model kind and its parameters:
//!
//! ```json
//! {"kind": "logistic", "weights": [[0.1, -0.4]], "bias": [0.2]}
//! {"kind": "centroid", "centroids": [[...], [...], [...]], "temperature": 0.1}
//! ```
//!
//! Both accept an optional `"scaler": {"mean": [...], "scale": [...]}`.
//! Files ending in `.onnx` load through ONNX Runtime when the `onnx` feature
//! is enabled.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use crate::classifier::{CentroidClassifier, Classifier, LogisticClassifier, Scaler};

fn default_temperature() -> f64 {
    0.1
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelArtifact {
    Logistic {
        weights: Vec<Vec<f64>>,
        bias: Vec<f64>,
        #[serde(default)]
        scaler: Option<Scaler>,
    },
    Centroid {
        centroids: Vec<Vec<f64>>,
        #[serde(default = "default_temperature")]
        temperature: f64,
        #[serde(default)]
        scaler: Option<Scaler>,
    },
}

impl ModelArtifact {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("parsing model artifact")
    }

    pub fn into_classifier(self) -> anyhow::Result<Arc<dyn Classifier>> {
        let classifier: Arc<dyn Classifier> = match self {
            Self::Logistic {
                weights,
                bias,
                scaler,
            } => Arc::new(LogisticClassifier::new(weights, bias, scaler)?),
            Self::Centroid {
                centroids,
                temperature,
                scaler,
            } => Arc::new(CentroidClassifier::new(centroids, temperature, scaler)?),
        };
        Ok(classifier)
    }
}

/// Load a classifier once at start-up.
pub fn load_classifier(path: &Path) -> anyhow::Result<Arc<dyn Classifier>> {
    anyhow::ensure!(path.exists(), "model artifact not found: {}", path.display());

    if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("onnx")) {
        return load_onnx(path);
    }

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading model artifact {}", path.display()))?;
    let classifier = ModelArtifact::from_json(&json)?.into_classifier()?;
    info!(
        path = %path.display(),
        features = ?classifier.n_features(),
        "loaded model artifact"
    );
    Ok(classifier)
}

#[cfg(feature = "onnx")]
fn load_onnx(path: &Path) -> anyhow::Result<Arc<dyn Classifier>> {
    Ok(Arc::new(crate::onnx::OnnxClassifier::load(path)?))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(path: &Path) -> anyhow::Result<Arc<dyn Classifier>> {
    anyhow::bail!(
        "{} is an ONNX model; rebuild with the `onnx` feature to load it",
        path.display()
    )
}
