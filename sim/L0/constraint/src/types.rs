//! Row, group and force-report types.

use std::ops::Range;

use nalgebra::{Matrix3, Vector3};
use sim_core::SpatialVector;

use crate::config::BaumgarteParameters;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One scalar contact constraint: the point `point` (body coordinates) of
/// body `body_id` must not accelerate along the world direction `normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactRow {
    /// Constrained body.
    pub body_id: usize,
    /// Contact point in body coordinates.
    pub point: Vector3<f64>,
    /// Unit constraint direction in world coordinates.
    pub normal: Vector3<f64>,
    /// Index of the group the row belongs to.
    pub group: usize,
}

/// Rows sharing one contact point, with their lookup keys and
/// stabilization settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConstraintGroup {
    /// Optional human-readable name.
    pub name: Option<String>,
    /// Optional caller-supplied id.
    pub user_id: Option<u32>,
    /// Id assigned by the set (unique per set, in creation order).
    pub assigned_id: u32,
    /// Constrained body.
    pub body_id: usize,
    /// Contact point in body coordinates.
    pub point: Vector3<f64>,
    /// Rows of the group (contiguous).
    pub rows: Range<usize>,
    /// Stabilization coefficients.
    pub baumgarte: BaumgarteParameters,
    /// Whether stabilization is applied by the solvers.
    pub baumgarte_enabled: bool,
}

impl ConstraintGroup {
    /// Number of rows in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the group has no rows (never true for a group in a set).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A coordinate frame given by its origin `r` and orientation `e`, both
/// relative to the frame of the body it is attached to.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpatialFrame {
    /// Frame origin.
    pub r: Vector3<f64>,
    /// Frame orientation.
    pub e: Matrix3<f64>,
}

impl SpatialFrame {
    /// Frame at `r` aligned with its parent.
    #[must_use]
    pub fn at(r: Vector3<f64>) -> Self {
        Self {
            r,
            e: Matrix3::identity(),
        }
    }
}

/// Forces of one contact group, reported on both sides of the contact.
///
/// Index 0 is the contacting body side, index 1 the ground (body 0).
/// Spatial forces are `[torque; force]` expressed in the matching frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupForces {
    /// Body ids of the two sides.
    pub body_ids: [usize; 2],
    /// Frames in which the forces are expressed.
    pub frames: [SpatialFrame; 2],
    /// Total spatial force of the group on each side.
    pub forces: [SpatialVector; 2],
    /// The same, per row of the group.
    pub row_forces: Vec<[SpatialVector; 2]>,
}
