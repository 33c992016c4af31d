//! Classifiers behind the estimator.
//!
//! A [`Classifier`] maps a feature vector to per-class probabilities. Two
//! in-process models are provided, both loaded from JSON artifacts:
//!
//! - [`LogisticClassifier`]: linear scores, sigmoid for a single weight row,
//!   softmax otherwise.
//! - [`CentroidClassifier`]: cosine similarity to one centroid per class,
//!   turned into probabilities with a temperature-scaled softmax.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("malformed model: {0}")]
    Shape(String),

    #[error("classifier returned no probabilities")]
    Empty,

    #[error("inference failed: {0}")]
    Inference(String),
}

/// An already-initialized model. Shared read-only across requests.
pub trait Classifier: Send + Sync {
    /// Expected feature-vector length, when the model declares one.
    fn n_features(&self) -> Option<usize>;

    /// One probability per class, in label-table order.
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ClassifierError>;

    /// Index of the predicted class.
    fn predict(&self, features: &[f64]) -> Result<usize, ClassifierError> {
        let proba = self.predict_proba(features)?;
        argmax(&proba).ok_or(ClassifierError::Empty)
    }
}

/// Per-feature standardization applied before scoring: `(x - mean) / scale`.
#[derive(Debug, Clone, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler {
    fn validate(&self, n_features: usize) -> Result<(), ClassifierError> {
        if self.mean.len() != n_features || self.scale.len() != n_features {
            return Err(ClassifierError::Shape(format!(
                "scaler has {}/{} entries for {n_features} features",
                self.mean.len(),
                self.scale.len()
            )));
        }
        Ok(())
    }

    fn apply(&self, features: &[f64]) -> Vec<f64> {
        features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| if *s == 0.0 { x - m } else { (x - m) / s })
            .collect()
    }
}

// ── Logistic ──

/// Multinomial (or binary) logistic regression.
pub struct LogisticClassifier {
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    scaler: Option<Scaler>,
    dim: usize,
}

impl LogisticClassifier {
    /// `weights` holds one row per class, or a single row for a binary model
    /// whose row scores the positive class (index 1).
    pub fn new(
        weights: Vec<Vec<f64>>,
        bias: Vec<f64>,
        scaler: Option<Scaler>,
    ) -> Result<Self, ClassifierError> {
        let dim = weights
            .first()
            .map(|w| w.len())
            .ok_or_else(|| ClassifierError::Shape("no weight rows".into()))?;
        if dim == 0 {
            return Err(ClassifierError::Shape("empty weight row".into()));
        }
        if weights.iter().any(|w| w.len() != dim) {
            return Err(ClassifierError::Shape("ragged weight rows".into()));
        }
        if bias.len() != weights.len() {
            return Err(ClassifierError::Shape(format!(
                "{} bias terms for {} weight rows",
                bias.len(),
                weights.len()
            )));
        }
        if let Some(s) = &scaler {
            s.validate(dim)?;
        }
        Ok(Self {
            weights,
            bias,
            scaler,
            dim,
        })
    }

    /// Number of classes scored (2 for a single weight row).
    pub fn n_classes(&self) -> usize {
        if self.weights.len() == 1 { 2 } else { self.weights.len() }
    }
}

impl Classifier for LogisticClassifier {
    fn n_features(&self) -> Option<usize> {
        Some(self.dim)
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ClassifierError> {
        check_len(self.dim, features)?;
        let x = match &self.scaler {
            Some(s) => s.apply(features),
            None => features.to_vec(),
        };

        let scores: Vec<f64> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(w, b)| dot(w, &x) + b)
            .collect();

        if let [score] = scores.as_slice() {
            let p = sigmoid(*score);
            return Ok(vec![1.0 - p, p]);
        }
        Ok(softmax(&scores, 1.0))
    }
}

// ── Centroid ──

/// Nearest-centroid classifier over L2-normalized feature vectors.
pub struct CentroidClassifier {
    centroids: Vec<Vec<f64>>,
    temperature: f64,
    scaler: Option<Scaler>,
    dim: usize,
}

impl CentroidClassifier {
    /// `centroids` holds one vector per class in label-table order; they are
    /// normalized here.
    pub fn new(
        centroids: Vec<Vec<f64>>,
        temperature: f64,
        scaler: Option<Scaler>,
    ) -> Result<Self, ClassifierError> {
        let dim = centroids
            .first()
            .map(|c| c.len())
            .ok_or_else(|| ClassifierError::Shape("no centroids".into()))?;
        if dim == 0 || centroids.iter().any(|c| c.len() != dim) {
            return Err(ClassifierError::Shape("centroids must share a non-zero dimension".into()));
        }
        if !(temperature.is_finite() && temperature > 0.0) {
            return Err(ClassifierError::Shape(format!("temperature must be positive, got {temperature}")));
        }
        if let Some(s) = &scaler {
            s.validate(dim)?;
        }

        let centroids = centroids
            .into_iter()
            .map(|mut c| {
                normalize(&mut c);
                c
            })
            .collect();

        Ok(Self {
            centroids,
            temperature,
            scaler,
            dim,
        })
    }

    pub fn n_classes(&self) -> usize {
        self.centroids.len()
    }

    /// Cosine similarity of `features` to every centroid.
    pub fn similarities(&self, features: &[f64]) -> Result<Vec<f64>, ClassifierError> {
        check_len(self.dim, features)?;
        let mut x = match &self.scaler {
            Some(s) => s.apply(features),
            None => features.to_vec(),
        };
        normalize(&mut x);
        Ok(self.centroids.iter().map(|c| dot(&x, c)).collect())
    }
}

impl Classifier for CentroidClassifier {
    fn n_features(&self) -> Option<usize> {
        Some(self.dim)
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ClassifierError> {
        let sims = self.similarities(features)?;
        Ok(softmax(&sims, self.temperature))
    }
}

// ── Helpers ──

fn check_len(expected: usize, features: &[f64]) -> Result<(), ClassifierError> {
    if features.len() != expected {
        return Err(ClassifierError::FeatureCount {
            expected,
            actual: features.len(),
        });
    }
    Ok(())
}

pub(crate) fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if best.is_none_or(|(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Numerically stable softmax of `scores / temperature`.
fn softmax(scores: &[f64], temperature: f64) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores
        .iter()
        .map(|s| ((s - max) / temperature).exp())
        .collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// L2-normalize a vector in place.
fn normalize(v: &mut [f64]) {
    let norm: f64 = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
