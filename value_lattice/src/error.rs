//! Construction errors for abstract values.
//!
//! Precision loss is never an error: it degrades the fact to the lattice top.
//! These errors cover malformed inputs that the caller must not proceed with.

use thiserror::Error;

/// Error raised when building an abstract value from malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Range bounds are inconsistent.
    #[error("InvalidRange: from {from} is greater than to {to}")]
    InvalidRange {
        /// Lower bound
        from: i64,
        /// Upper bound
        to: i64,
    },

    /// A value-set annotation listed no values.
    #[error("EmptyValueList: a value set needs at least one value")]
    EmptyValueList,

    /// A value does not match the kind of the set being built.
    #[error("KindMismatch: expected {expected} value, found {found}")]
    KindMismatch {
        /// Kind of the set being built
        expected: String,
        /// Kind of the offending value
        found: String,
    },
}
