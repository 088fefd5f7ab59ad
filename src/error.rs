use std::num::ParseFloatError;
use thiserror::Error;

/// Error type for building, fitting and querying models.
///
/// Every variant is a usage error reported at the point of misuse: the numeric code itself has no
/// transient failure, so nothing is ever retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// `predict` (or any query) was called before a successful `fit`.
    #[error("the model is not trained, call fit first")]
    UntrainedModel,

    /// Invalid hyper-parameters, detected in the constructor.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Rows or columns don't line up with the model or with each other.
    #[error("shape mismatch on {what}: expected {expected}, got {got}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("cannot fit on an empty dataset")]
    EmptyDataset,

    /// NAN or infinite values are not supported.
    #[error("found a non finite value in the {what}")]
    NonFinite { what: &'static str },

    #[error("cannot parse the data: {0}")]
    Parse(String),
}

impl From<ParseFloatError> for FitError {
    fn from(err: ParseFloatError) -> Self {
        FitError::Parse(err.to_string())
    }
}

pub type FitResult<T> = Result<T, FitError>;

pub(crate) static SHOULD_NOT_HAPPEN: &str =
    "There is an unexpected error in rtree-boost. Please raise a bug.";
