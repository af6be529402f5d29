//! Model struct definition and field accessors.
//!
//! [`Model`] is the static description of an articulated system: the
//! kinematic tree, inertial parameters, joint definitions and the sparsity
//! layout of the joint-space inertia factor. It is assembled body by body
//! (see `model_init.rs`) and then shared read-only by every pipeline stage.

use nalgebra::{DVector, UnitQuaternion, Vector3};

use super::enums::MjJointType;

/// Static model definition (like mjModel).
///
/// # Memory Layout
///
/// Arrays are indexed by their respective IDs:
/// - `body_*` arrays indexed by `body_id` (0 = world)
/// - `jnt_*` arrays indexed by `joint_id`
/// - `dof_*` arrays indexed by `dof_id` (velocity dimension index)
///
/// Bodies are stored in topological order: a body's parent always has a
/// smaller id. DOFs inherit that order, so `dof_parent[i] < i`.
#[derive(Debug, Clone)]
#[allow(non_snake_case)] // qLD_* matches MuJoCo naming convention
pub struct Model {
    // ==================== Metadata ====================
    /// Model name.
    pub name: String,

    // ==================== Dimensions ====================
    /// Number of generalized position coordinates.
    pub nq: usize,
    /// Number of generalized velocity coordinates (DOFs). Equal to `nq`.
    pub nv: usize,
    /// Number of bodies (including world body 0).
    pub nbody: usize,
    /// Number of joints.
    pub njnt: usize,

    // ==================== Bodies (indexed by body_id) ====================
    /// Parent body (world body 0 is its own parent).
    pub body_parent: Vec<usize>,
    /// First joint of the body.
    pub body_jnt_adr: Vec<usize>,
    /// Number of joints attached to the body.
    pub body_jnt_num: Vec<usize>,
    /// First DOF of the body.
    pub body_dof_adr: Vec<usize>,
    /// Number of DOFs of the body.
    pub body_dof_num: Vec<usize>,
    /// Deepest DOF that moves the body: its own last DOF, or the nearest
    /// ancestor's last DOF for bodies without joints. `None` for bodies
    /// welded to the world.
    pub body_dof_leaf: Vec<Option<usize>>,
    /// Body frame offset in the parent frame.
    pub body_pos: Vec<Vector3<f64>>,
    /// Body frame orientation relative to the parent frame.
    pub body_quat: Vec<UnitQuaternion<f64>>,
    /// Center of mass in the body frame.
    pub body_ipos: Vec<Vector3<f64>>,
    /// Principal inertia frame orientation in the body frame.
    pub body_iquat: Vec<UnitQuaternion<f64>>,
    /// Body mass.
    pub body_mass: Vec<f64>,
    /// Principal moments of inertia about the center of mass.
    pub body_inertia: Vec<Vector3<f64>>,
    /// Optional body name.
    pub body_name: Vec<Option<String>>,

    // ==================== Joints (indexed by jnt_id) ====================
    /// Joint type.
    pub jnt_type: Vec<MjJointType>,
    /// Body the joint moves.
    pub jnt_body: Vec<usize>,
    /// Address in `qpos`.
    pub jnt_qpos_adr: Vec<usize>,
    /// Address in `qvel`.
    pub jnt_dof_adr: Vec<usize>,
    /// Joint anchor in the body frame.
    pub jnt_pos: Vec<Vector3<f64>>,
    /// Unit joint axis in the body frame.
    pub jnt_axis: Vec<Vector3<f64>>,
    /// Optional joint name.
    pub jnt_name: Vec<Option<String>>,

    // ==================== DOFs (indexed by dof_id) ====================
    /// Body the DOF belongs to.
    pub dof_body: Vec<usize>,
    /// Joint the DOF belongs to.
    pub dof_jnt: Vec<usize>,
    /// Parent DOF in the kinematic tree (`None` for root DOFs).
    pub dof_parent: Vec<Option<usize>>,

    // ==================== Sparse LDL layout ====================
    // Computed once from `dof_parent`; only the values in `Data::qLD_data`
    // change between evaluations.
    /// Starting address of row k's entries in `Data::qLD_data` (length `nv`).
    pub qLD_rowadr: Vec<usize>,
    /// Non-zeros in row k including the diagonal (length `nv`).
    /// `rownnz[k] - 1` is the depth of DOF k in the `dof_parent` tree.
    pub qLD_rownnz: Vec<usize>,
    /// Column indices: ancestors ascending, then `k` itself (length `qLD_nnz`).
    pub qLD_colind: Vec<usize>,
    /// Total number of non-zeros across all rows.
    pub qLD_nnz: usize,

    // ==================== Options ====================
    /// Default configuration (length `nq`).
    pub qpos0: DVector<f64>,
    /// Gravity in the world frame.
    pub gravity: Vector3<f64>,
}

impl Model {
    /// CSR metadata of the LᵀDL factor as `(rowadr, rownnz, colind)`.
    #[must_use]
    pub fn qld_csr(&self) -> (&[usize], &[usize], &[usize]) {
        (&self.qLD_rowadr, &self.qLD_rownnz, &self.qLD_colind)
    }

    /// Look up a body id by name.
    #[must_use]
    pub fn body_id(&self, name: &str) -> Option<usize> {
        self.body_name
            .iter()
            .position(|n| n.as_deref() == Some(name))
    }

    /// Look up a joint id by name.
    #[must_use]
    pub fn joint_id(&self, name: &str) -> Option<usize> {
        self.jnt_name
            .iter()
            .position(|n| n.as_deref() == Some(name))
    }

    /// Total mass of all bodies.
    #[must_use]
    pub fn total_mass(&self) -> f64 {
        self.body_mass.iter().sum()
    }
}
