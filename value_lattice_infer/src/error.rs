//! Inference error types

use thiserror::Error;

/// Error raised by the inference solver.
///
/// Targets that simply cannot be resolved are not errors: they are left out
/// of the [`InferenceResult`](crate::InferenceResult).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    /// The constraint map is inconsistent, e.g. two types that are equal by
    /// construction turned out to differ. Indicates a broken constraint source.
    #[error("InternalError: {0}")]
    Internal(String),

    /// A constraint or lookup named a type variable that is not a target.
    #[error("UnknownTarget: {0} is not an inference target")]
    UnknownTarget(String),
}

impl InferenceError {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        InferenceError::Internal(message.into())
    }
}
