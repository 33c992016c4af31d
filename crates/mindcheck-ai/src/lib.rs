//! Quantitative estimation: a classifier seam, label tables, model artifacts,
//! and ONNX Runtime inference behind the `onnx` feature.

mod artifact;
mod classifier;
mod estimator;
mod labels;
#[cfg(feature = "onnx")]
mod onnx;

pub use artifact::{ModelArtifact, load_classifier};
pub use classifier::{CentroidClassifier, Classifier, ClassifierError, LogisticClassifier, Scaler};
pub use estimator::Estimator;
pub use labels::{DEPRESSION_LABELS, EMOTION_LABELS, LabelTable, ProbabilityTarget};
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;
