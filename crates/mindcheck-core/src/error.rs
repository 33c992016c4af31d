use thiserror::Error;

/// Request-level failures of the assessment pipeline.
///
/// A narrative-service failure is not in this list: it is absorbed into a
/// degraded [`FusedResult`](crate::FusedResult) instead of failing the request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssessError {
    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("Missing feature: {0}")]
    MissingField(String),

    #[error(
        "Invalid input data: some features could not be converted to numeric values ({})",
        .fields.join(", ")
    )]
    InvalidInput { fields: Vec<String> },

    #[error("estimator error: {0}")]
    Estimator(String),
}

impl AssessError {
    /// Whether the request was rejected before any classifier or narrative call.
    pub fn is_input_rejection(&self) -> bool {
        matches!(
            self,
            Self::NotAnObject | Self::MissingField(_) | Self::InvalidInput { .. }
        )
    }
}
