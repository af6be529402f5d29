//! Configuration for constraint sets.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Dense linear solver used for the augmented (KKT) systems and for the
/// small coupling systems of the Kokkevis and range-space methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LinearSolver {
    /// Householder QR. Robust for the indefinite KKT matrix.
    #[default]
    HouseholderQr,
    /// LU with full pivoting.
    FullPivLu,
    /// LU with partial (row) pivoting. Fastest, least robust.
    PartialPivLu,
}

/// Baumgarte stabilization coefficients of one constraint group.
///
/// The stabilization term added to the constraint acceleration target is
/// `-2α·velocity_error - β²·position_error`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BaumgarteParameters {
    /// Velocity feedback coefficient.
    pub alpha: f64,
    /// Position feedback coefficient.
    pub beta: f64,
}

impl BaumgarteParameters {
    /// Create a coefficient pair.
    #[must_use]
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    /// Critically damped pair for a time constant `t_stab` (seconds):
    /// `α = β = 1 / t_stab`.
    #[must_use]
    pub fn from_time_constant(t_stab: f64) -> Self {
        let k = 1.0 / t_stab;
        Self { alpha: k, beta: k }
    }
}

/// Configuration for a [`ConstraintSet`](crate::ConstraintSet).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConstraintSetConfig {
    /// Dense solver for the augmented systems.
    pub linear_solver: LinearSolver,

    /// Coefficients given to every new group.
    pub default_baumgarte: BaumgarteParameters,

    /// Whether new groups start with stabilization enabled.
    pub baumgarte_enabled: bool,

    /// Two contact points on the same body closer than this (body
    /// coordinates, meters) are treated as one contact when grouping rows.
    pub point_tolerance: f64,
}

impl Default for ConstraintSetConfig {
    fn default() -> Self {
        Self {
            linear_solver: LinearSolver::HouseholderQr,
            default_baumgarte: BaumgarteParameters::default(),
            baumgarte_enabled: false,
            point_tolerance: 1e-12,
        }
    }
}

impl ConstraintSetConfig {
    /// Configuration with stabilization enabled on every new group.
    #[must_use]
    pub fn stabilized(params: BaumgarteParameters) -> Self {
        Self {
            default_baumgarte: params,
            baumgarte_enabled: true,
            ..Self::default()
        }
    }

    /// Set the dense linear solver.
    #[must_use]
    pub fn with_linear_solver(mut self, solver: LinearSolver) -> Self {
        self.linear_solver = solver;
        self
    }

    /// Set the default Baumgarte coefficients (does not enable them).
    #[must_use]
    pub fn with_baumgarte(mut self, params: BaumgarteParameters) -> Self {
        self.default_baumgarte = params;
        self
    }

    /// Set the contact-point merge tolerance.
    #[must_use]
    pub fn with_point_tolerance(mut self, tolerance: f64) -> Self {
        self.point_tolerance = tolerance;
        self
    }
}
