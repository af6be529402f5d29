//! Enums and error types shared across the dynamics pipeline.

use thiserror::Error;

/// Joint type (single-axis joints only).
///
/// Multi-DOF joints are expressed as several single-axis joints attached to
/// one body and applied in declaration order: a planar joint is two slides
/// and a hinge, an Euler ZYX ball is three hinges, and a floating base is
/// three slides followed by three hinges. This keeps `nq == nv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MjJointType {
    /// Revolute joint about `jnt_axis` through `jnt_pos` (1 DOF).
    #[default]
    Hinge,
    /// Prismatic joint along `jnt_axis` (1 DOF).
    Slide,
}

impl MjJointType {
    /// Number of position coordinates.
    #[must_use]
    pub const fn nq(self) -> usize {
        1
    }

    /// Number of velocity DOFs.
    #[must_use]
    pub const fn nv(self) -> usize {
        1
    }
}

/// Errors from the numerical kernels of the dynamics pipeline.
///
/// Factorizations return these instead of silently producing NaNs, so a
/// caller can tell a degenerate mass matrix apart from a bad constraint
/// system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepError {
    /// Cholesky decomposition hit a non-positive pivot.
    CholeskyFailed,
    /// LU decomposition hit a (numerically) zero pivot.
    LuSingular,
    /// Sparse LᵀDL factorization of the mass matrix hit a non-positive pivot.
    MassMatrixSingular {
        /// DOF whose pivot failed.
        dof: usize,
    },
}

impl std::fmt::Display for StepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CholeskyFailed => write!(f, "Cholesky decomposition failed (matrix not SPD)"),
            Self::LuSingular => write!(f, "LU decomposition failed (singular pivot)"),
            Self::MassMatrixSingular { dof } => {
                write!(f, "mass matrix factorization failed at DOF {dof}")
            }
        }
    }
}

impl std::error::Error for StepError {}

/// Errors raised while assembling a [`Model`](super::Model).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// The parent body does not exist yet.
    #[error("invalid parent body {parent} (model has {nbody} bodies)")]
    InvalidParent {
        /// Requested parent id.
        parent: usize,
        /// Bodies currently in the model.
        nbody: usize,
    },

    /// A joint axis has (near) zero length.
    #[error("joint {index} of new body has a zero-length axis")]
    ZeroJointAxis {
        /// Position of the joint within the body's joint list.
        index: usize,
    },

    /// Mass or inertia is negative or not finite.
    #[error("invalid inertial parameters: {0}")]
    InvalidInertia(String),

    /// A body name is used twice.
    #[error("duplicate body name: {0}")]
    DuplicateBodyName(String),
}

impl ModelError {
    /// Create an invalid inertia error.
    pub fn invalid_inertia(msg: impl Into<String>) -> Self {
        Self::InvalidInertia(msg.into())
    }
}
