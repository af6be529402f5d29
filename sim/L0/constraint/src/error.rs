//! Error types for constraint sets and constrained solvers.

use thiserror::Error;

/// Errors reported by [`ConstraintSet`](crate::ConstraintSet) management and
/// the constrained dynamics solvers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    /// `bind` called on a set that is already bound.
    #[error("constraint set is already bound; call reset() before binding again")]
    AlreadyBound,

    /// Operation requires a bound set.
    #[error("constraint set is not bound to a model")]
    NotBound,

    /// Rows cannot be added once the set is bound.
    #[error("cannot add constraints to a bound constraint set")]
    AddAfterBind,

    /// `bind` called on a set without rows.
    #[error("constraint set has no rows")]
    EmptySet,

    /// A row references a body the model does not have (or the world body).
    #[error("invalid body id {body_id}: constraints need a moving body in 1..{nbody}")]
    InvalidBody {
        /// The offending body id.
        body_id: usize,
        /// Number of bodies in the model.
        nbody: usize,
    },

    /// The constraint direction has zero (or non-finite) length.
    #[error("constraint direction must be a finite non-zero vector")]
    InvalidDirection,

    /// Another group already uses this name.
    #[error("duplicate constraint name: {0}")]
    DuplicateName(String),

    /// Another group already uses this caller id.
    #[error("duplicate constraint id: {0}")]
    DuplicateId(u32),

    /// No group carries this name.
    #[error("unknown constraint name: {0}")]
    UnknownName(String),

    /// No group carries this caller id.
    #[error("unknown constraint id: {0}")]
    UnknownId(u32),

    /// No group carries this assigned id.
    #[error("unknown assigned constraint id: {0}")]
    UnknownAssignedId(u32),

    /// Group index out of range.
    #[error("group index {index} out of range (set has {ngroups} groups)")]
    InvalidGroupIndex {
        /// The requested index.
        index: usize,
        /// Number of groups in the set.
        ngroups: usize,
    },

    /// An input vector or model does not match the bound dimensions.
    #[error("{what} has length {actual}, expected {expected}")]
    DimensionMismatch {
        /// What was checked (e.g. "q", "tau").
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// A factorization or linear solve could not proceed.
    #[error("singular system during {stage}")]
    SingularSystem {
        /// Which solve failed.
        stage: &'static str,
    },
}

/// Check a vector length against the bound dimension.
pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), ConstraintError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ConstraintError::DimensionMismatch {
            what,
            expected,
            actual,
        })
    }
}
