pub mod assessment;
pub mod error;
pub mod features;
pub mod fusion;
pub mod marker;
pub mod schema;

pub use assessment::{
    EstimatorResult, FALLBACK_NARRATIVE, FusedResult, NarrativeResult, ProbabilitySource,
};
pub use error::AssessError;
pub use features::{FeatureRecord, FeatureValue, normalize};
pub use fusion::{ResolvedProbability, assemble, resolve};
pub use marker::{MarkerPattern, extract_marker};
pub use schema::{CategoryMap, DeploymentKind, FieldKind, FieldSpec, InputSchema};
