//! Constraint sets: row registration, grouping, binding and lookup.
//!
//! A [`ConstraintSet`] goes through a short lifecycle:
//!
//! ```text
//! new() ──add_contact_*──▶ rows ──bind(model)──▶ bound ──solver calls──▶ …
//!                            ▲                      │
//!                            └──────── reset() ─────┘
//! ```
//!
//! Binding validates the rows against a model, allocates every workspace
//! buffer the solvers need and builds the lookup tables. Solver calls only
//! touch the workspace and the result vectors; rows and groups are frozen
//! while bound.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector, Vector3};
use sim_core::{Data, Model, SpatialVector};
use tracing::debug;

use crate::config::{BaumgarteParameters, ConstraintSetConfig};
use crate::error::{ConstraintError, check_len};
use crate::types::{ConstraintGroup, ContactRow};

/// Buffers shared by the solvers, sized at bind time.
///
/// Every solver call overwrites the fields it reads before reading them;
/// nothing carries over between calls except the allocation.
#[derive(Debug, Clone)]
#[allow(non_snake_case)] // G, K follow the usual constrained-dynamics notation
pub struct ConstraintWorkspace {
    /// Kinematic/dynamic cache for the current state.
    pub data: Data,
    /// Constraint Jacobian (rows × nv).
    pub G: DMatrix<f64>,
    /// Acceleration-level constraint target `γ` (per row).
    pub gamma: DVector<f64>,
    /// Baumgarte term of each row (zero for disabled groups).
    pub stabilization: DVector<f64>,
    /// Generalized bias force `C(q, q̇)`.
    pub bias: DVector<f64>,
    /// Dense augmented matrix of the direct and impulse solves.
    pub kkt_matrix: DMatrix<f64>,
    /// Right-hand side of the augmented system.
    pub kkt_rhs: DVector<f64>,
    /// Solution of the augmented system.
    pub kkt_solution: DVector<f64>,
    /// Coupling matrix between rows (`G·H⁻¹·Gᵀ`), rows × rows.
    pub K: DMatrix<f64>,
    /// `H⁻¹·Gᵀ` (nv × rows), range-space method.
    pub minv_gt: DMatrix<f64>,
    /// Unconstrained joint acceleration.
    pub qddot0: DVector<f64>,
    /// Constraint-direction point accelerations under `qddot0`, Kokkevis method.
    pub accel0: DVector<f64>,
    /// World position of each row's contact point.
    pub points: Vec<Vector3<f64>>,
    /// Per-body spatial force buffer for acceleration-delta passes.
    pub cfrc: Vec<SpatialVector>,
}

impl ConstraintWorkspace {
    fn new(model: &Model, nrows: usize) -> Self {
        let nv = model.nv;
        let nkkt = nv + nrows;
        Self {
            data: model.make_data(),
            G: DMatrix::zeros(nrows, nv),
            gamma: DVector::zeros(nrows),
            stabilization: DVector::zeros(nrows),
            bias: DVector::zeros(nv),
            kkt_matrix: DMatrix::zeros(nkkt, nkkt),
            kkt_rhs: DVector::zeros(nkkt),
            kkt_solution: DVector::zeros(nkkt),
            K: DMatrix::zeros(nrows, nrows),
            minv_gt: DMatrix::zeros(nv, nrows),
            qddot0: DVector::zeros(nv),
            accel0: DVector::zeros(nrows),
            points: vec![Vector3::zeros(); nrows],
            cfrc: vec![SpatialVector::zeros(); model.nbody],
        }
    }
}

/// Everything that only exists while the set is bound.
#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub(crate) nv: usize,
    pub(crate) nbody: usize,
    by_name: HashMap<String, usize>,
    by_id: HashMap<u32, usize>,
    by_assigned_id: HashMap<u32, usize>,
    pub(crate) workspace: ConstraintWorkspace,
}

/// An ordered set of point-contact constraint rows bundled into groups.
///
/// # Example
///
/// ```
/// use nalgebra::{DVector, Vector3};
/// use sim_constraint::{ConstraintSet, forward_dynamics_constraints_direct};
/// use sim_core::Model;
///
/// let model = Model::floating_body(1.0, Vector3::zeros(), Vector3::repeat(0.1));
/// let mut cs = ConstraintSet::new();
/// cs.add_contact_constraint(1, Vector3::new(0.0, 0.0, -0.5), Vector3::z(), Some("foot"), None)
///     .unwrap();
/// cs.bind(&model).unwrap();
///
/// let zero = DVector::zeros(model.nv);
/// let qddot = forward_dynamics_constraints_direct(&model, &zero, &zero, &zero, &mut cs).unwrap();
/// assert!(qddot[2].abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct ConstraintSet {
    pub(crate) config: ConstraintSetConfig,
    pub(crate) rows: Vec<ContactRow>,
    pub(crate) groups: Vec<ConstraintGroup>,
    next_assigned_id: u32,
    pub(crate) binding: Option<Binding>,
    pub(crate) force: DVector<f64>,
    pub(crate) impulse: DVector<f64>,
    pub(crate) qdot_plus: DVector<f64>,
}

impl Default for ConstraintSet {
    fn default() -> Self {
        Self::with_config(ConstraintSetConfig::default())
    }
}

impl ConstraintSet {
    /// Empty set with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty set with the given configuration.
    #[must_use]
    pub fn with_config(config: ConstraintSetConfig) -> Self {
        Self {
            config,
            rows: Vec::new(),
            groups: Vec::new(),
            next_assigned_id: 0,
            binding: None,
            force: DVector::zeros(0),
            impulse: DVector::zeros(0),
            qdot_plus: DVector::zeros(0),
        }
    }

    /// The set's configuration.
    #[must_use]
    pub fn config(&self) -> &ConstraintSetConfig {
        &self.config
    }

    // ==================== Registration ====================

    /// Add one contact row and return the assigned id of its group.
    ///
    /// The row joins the most recent group when it targets the same body
    /// at the same body-local point (within
    /// [`ConstraintSetConfig::point_tolerance`]) and its name and id are
    /// absent or equal to the group's. Otherwise it starts a new group.
    ///
    /// # Errors
    ///
    /// [`ConstraintError::AddAfterBind`] when bound,
    /// [`ConstraintError::InvalidDirection`] for a zero `normal`,
    /// [`ConstraintError::InvalidBody`] for the world body, and
    /// [`ConstraintError::DuplicateName`] / [`ConstraintError::DuplicateId`]
    /// when a new group would reuse another group's key.
    pub fn add_contact_constraint(
        &mut self,
        body_id: usize,
        point: Vector3<f64>,
        normal: Vector3<f64>,
        name: Option<&str>,
        user_id: Option<u32>,
    ) -> Result<u32, ConstraintError> {
        self.check_can_add(body_id)?;
        let normal = unit_direction(&normal)?;

        let joins_last = self.groups.last().is_some_and(|group| {
            group.body_id == body_id
                && (group.point - point).norm() <= self.config.point_tolerance
                && name.is_none_or(|n| group.name.as_deref() == Some(n))
                && user_id.is_none_or(|id| group.user_id == Some(id))
        });
        if !joins_last {
            self.open_group(body_id, point, name, user_id)?;
        }
        Ok(self.push_row(body_id, point, normal))
    }

    /// Add a new group with one row per direction at a single contact
    /// point. Unlike [`add_contact_constraint`](Self::add_contact_constraint)
    /// this never merges into the previous group.
    ///
    /// # Errors
    ///
    /// As for [`add_contact_constraint`](Self::add_contact_constraint); an
    /// empty `normals` slice is rejected with
    /// [`ConstraintError::InvalidDirection`]. Nothing is added on error.
    pub fn add_contact_group(
        &mut self,
        body_id: usize,
        point: Vector3<f64>,
        normals: &[Vector3<f64>],
        name: Option<&str>,
        user_id: Option<u32>,
    ) -> Result<u32, ConstraintError> {
        self.check_can_add(body_id)?;
        if normals.is_empty() {
            return Err(ConstraintError::InvalidDirection);
        }
        let units = normals
            .iter()
            .map(unit_direction)
            .collect::<Result<Vec<_>, _>>()?;

        self.open_group(body_id, point, name, user_id)?;
        let mut assigned = 0;
        for normal in units {
            assigned = self.push_row(body_id, point, normal);
        }
        Ok(assigned)
    }

    fn check_can_add(&self, body_id: usize) -> Result<(), ConstraintError> {
        if self.binding.is_some() {
            return Err(ConstraintError::AddAfterBind);
        }
        if body_id == 0 {
            return Err(ConstraintError::InvalidBody { body_id, nbody: 0 });
        }
        Ok(())
    }

    fn open_group(
        &mut self,
        body_id: usize,
        point: Vector3<f64>,
        name: Option<&str>,
        user_id: Option<u32>,
    ) -> Result<(), ConstraintError> {
        if let Some(name) = name {
            if self.groups.iter().any(|g| g.name.as_deref() == Some(name)) {
                return Err(ConstraintError::DuplicateName(name.to_string()));
            }
        }
        if let Some(id) = user_id {
            if self.groups.iter().any(|g| g.user_id == Some(id)) {
                return Err(ConstraintError::DuplicateId(id));
            }
        }

        let start = self.rows.len();
        self.groups.push(ConstraintGroup {
            name: name.map(str::to_string),
            user_id,
            assigned_id: self.next_assigned_id,
            body_id,
            point,
            rows: start..start,
            baumgarte: self.config.default_baumgarte,
            baumgarte_enabled: self.config.baumgarte_enabled,
        });
        self.next_assigned_id += 1;
        Ok(())
    }

    /// Append a row to the last group and return that group's assigned id.
    fn push_row(&mut self, body_id: usize, point: Vector3<f64>, normal: Vector3<f64>) -> u32 {
        let group_index = self.groups.len() - 1;
        self.rows.push(ContactRow {
            body_id,
            point,
            normal,
            group: group_index,
        });
        let group = &mut self.groups[group_index];
        group.rows.end = self.rows.len();
        group.assigned_id
    }

    // ==================== Binding ====================

    /// Validate the rows against `model`, allocate the workspace and build
    /// the lookup tables.
    ///
    /// # Errors
    ///
    /// [`ConstraintError::AlreadyBound`], [`ConstraintError::EmptySet`], or
    /// [`ConstraintError::InvalidBody`] for a row whose body is not a
    /// moving body of `model`.
    pub fn bind(&mut self, model: &Model) -> Result<(), ConstraintError> {
        if self.binding.is_some() {
            return Err(ConstraintError::AlreadyBound);
        }
        if self.rows.is_empty() {
            return Err(ConstraintError::EmptySet);
        }
        if let Some(row) = self.rows.iter().find(|r| r.body_id == 0 || r.body_id >= model.nbody) {
            return Err(ConstraintError::InvalidBody {
                body_id: row.body_id,
                nbody: model.nbody,
            });
        }

        let mut by_name = HashMap::new();
        let mut by_id = HashMap::new();
        let mut by_assigned_id = HashMap::new();
        for (index, group) in self.groups.iter().enumerate() {
            if let Some(name) = &group.name {
                by_name.insert(name.clone(), index);
            }
            if let Some(id) = group.user_id {
                by_id.insert(id, index);
            }
            by_assigned_id.insert(group.assigned_id, index);
        }

        let nrows = self.rows.len();
        self.force = DVector::zeros(nrows);
        self.impulse = DVector::zeros(nrows);
        self.qdot_plus = DVector::zeros(model.nv);
        self.binding = Some(Binding {
            nv: model.nv,
            nbody: model.nbody,
            by_name,
            by_id,
            by_assigned_id,
            workspace: ConstraintWorkspace::new(model, nrows),
        });

        debug!(
            rows = nrows,
            groups = self.groups.len(),
            nv = model.nv,
            model = %model.name,
            "bound constraint set"
        );
        Ok(())
    }

    /// Return to the unbound state: the workspace, lookup tables and
    /// results are dropped, rows and groups are kept.
    pub fn reset(&mut self) {
        self.binding = None;
        self.force = DVector::zeros(0);
        self.impulse = DVector::zeros(0);
        self.qdot_plus = DVector::zeros(0);
    }

    /// Independent unbound copy with the same rows, groups and settings.
    #[must_use]
    pub fn unbound_copy(&self) -> Self {
        let mut copy = Self::with_config(self.config);
        copy.rows.clone_from(&self.rows);
        copy.groups.clone_from(&self.groups);
        copy.next_assigned_id = self.next_assigned_id;
        copy
    }

    /// Whether [`bind`](Self::bind) has succeeded since the last reset.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub(crate) fn binding(&self) -> Result<&Binding, ConstraintError> {
        self.binding.as_ref().ok_or(ConstraintError::NotBound)
    }

    /// Check the model and state dimensions against the binding, then load
    /// the state and update kinematics.
    pub(crate) fn prepare_state(
        &mut self,
        model: &Model,
        q: &DVector<f64>,
        qdot: &DVector<f64>,
    ) -> Result<(), ConstraintError> {
        self.check_model(model)?;
        check_len("q", model.nq, q.len())?;
        check_len("qdot", model.nv, qdot.len())?;
        let binding = self.binding.as_mut().ok_or(ConstraintError::NotBound)?;
        binding.workspace.data.set_state(model, q, qdot);
        Ok(())
    }

    pub(crate) fn check_model(&self, model: &Model) -> Result<(), ConstraintError> {
        let binding = self.binding()?;
        check_len("model nv", binding.nv, model.nv)?;
        check_len("model nbody", binding.nbody, model.nbody)
    }

    // ==================== Accessors ====================

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the set has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows in declaration order.
    #[must_use]
    pub fn rows(&self) -> &[ContactRow] {
        &self.rows
    }

    /// All groups in creation order.
    #[must_use]
    pub fn groups(&self) -> &[ConstraintGroup] {
        &self.groups
    }

    /// Number of groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Group by index.
    ///
    /// # Errors
    ///
    /// [`ConstraintError::InvalidGroupIndex`] if out of range.
    pub fn group(&self, index: usize) -> Result<&ConstraintGroup, ConstraintError> {
        self.groups.get(index).ok_or(ConstraintError::InvalidGroupIndex {
            index,
            ngroups: self.groups.len(),
        })
    }

    fn group_mut(&mut self, index: usize) -> Result<&mut ConstraintGroup, ConstraintError> {
        let ngroups = self.groups.len();
        self.groups
            .get_mut(index)
            .ok_or(ConstraintError::InvalidGroupIndex { index, ngroups })
    }

    /// Constraint forces (multipliers) of the last acceleration-level solve,
    /// one per row. Empty while unbound.
    #[must_use]
    pub fn force(&self) -> &DVector<f64> {
        &self.force
    }

    /// Impulses of the last impulse solve, one per row.
    #[must_use]
    pub fn impulse(&self) -> &DVector<f64> {
        &self.impulse
    }

    /// Post-impulse generalized velocity of the last impulse solve.
    #[must_use]
    pub fn qdot_plus(&self) -> &DVector<f64> {
        &self.qdot_plus
    }

    /// Solver workspace of the last call, for diagnostics.
    ///
    /// # Errors
    ///
    /// [`ConstraintError::NotBound`] while unbound.
    pub fn workspace(&self) -> Result<&ConstraintWorkspace, ConstraintError> {
        self.binding().map(|b| &b.workspace)
    }

    // ==================== Lookup ====================

    /// Group index by name.
    ///
    /// # Errors
    ///
    /// [`ConstraintError::NotBound`] or [`ConstraintError::UnknownName`].
    pub fn group_index_by_name(&self, name: &str) -> Result<usize, ConstraintError> {
        self.binding()?
            .by_name
            .get(name)
            .copied()
            .ok_or_else(|| ConstraintError::UnknownName(name.to_string()))
    }

    /// Group index by caller-supplied id.
    ///
    /// # Errors
    ///
    /// [`ConstraintError::NotBound`] or [`ConstraintError::UnknownId`].
    pub fn group_index_by_id(&self, user_id: u32) -> Result<usize, ConstraintError> {
        self.binding()?
            .by_id
            .get(&user_id)
            .copied()
            .ok_or(ConstraintError::UnknownId(user_id))
    }

    /// Group index by assigned id.
    ///
    /// # Errors
    ///
    /// [`ConstraintError::NotBound`] or [`ConstraintError::UnknownAssignedId`].
    pub fn group_index_by_assigned_id(&self, assigned_id: u32) -> Result<usize, ConstraintError> {
        self.binding()?
            .by_assigned_id
            .get(&assigned_id)
            .copied()
            .ok_or(ConstraintError::UnknownAssignedId(assigned_id))
    }

    // ==================== Baumgarte ====================

    /// Stabilization coefficients of a group.
    ///
    /// # Errors
    ///
    /// [`ConstraintError::InvalidGroupIndex`].
    pub fn baumgarte_parameters(&self, group: usize) -> Result<BaumgarteParameters, ConstraintError> {
        self.group(group).map(|g| g.baumgarte)
    }

    /// Set the stabilization coefficients of a group.
    ///
    /// # Errors
    ///
    /// [`ConstraintError::InvalidGroupIndex`].
    pub fn set_baumgarte_parameters(
        &mut self,
        group: usize,
        params: BaumgarteParameters,
    ) -> Result<(), ConstraintError> {
        self.group_mut(group)?.baumgarte = params;
        Ok(())
    }

    /// Enable or disable stabilization of a group.
    ///
    /// # Errors
    ///
    /// [`ConstraintError::InvalidGroupIndex`].
    pub fn set_baumgarte_enabled(&mut self, group: usize, enabled: bool) -> Result<(), ConstraintError> {
        self.group_mut(group)?.baumgarte_enabled = enabled;
        Ok(())
    }

    /// Whether stabilization of a group is enabled.
    ///
    /// # Errors
    ///
    /// [`ConstraintError::InvalidGroupIndex`].
    pub fn is_baumgarte_enabled(&self, group: usize) -> Result<bool, ConstraintError> {
        self.group(group).map(|g| g.baumgarte_enabled)
    }

    /// Stabilization force `-2α·velocity_error - β²·position_error` of a
    /// group for caller-supplied per-row errors.
    ///
    /// # Errors
    ///
    /// [`ConstraintError::InvalidGroupIndex`], or
    /// [`ConstraintError::DimensionMismatch`] if an error vector does not
    /// have one entry per row of the group.
    pub fn calc_baumgarte_stabilization_force(
        &self,
        group: usize,
        position_error: &DVector<f64>,
        velocity_error: &DVector<f64>,
    ) -> Result<DVector<f64>, ConstraintError> {
        let g = self.group(group)?;
        check_len("position error", g.len(), position_error.len())?;
        check_len("velocity error", g.len(), velocity_error.len())?;
        Ok(position_error.zip_map(velocity_error, |pe, ve| {
            stabilization_force(&g.baumgarte, pe, ve)
        }))
    }
}

/// `-2α·v - β²·p` for one row.
pub(crate) fn stabilization_force(params: &BaumgarteParameters, position_error: f64, velocity_error: f64) -> f64 {
    -2.0 * params.alpha * velocity_error - params.beta * params.beta * position_error
}

fn unit_direction(normal: &Vector3<f64>) -> Result<Vector3<f64>, ConstraintError> {
    let norm = normal.norm();
    if !(norm > 0.0) || !norm.is_finite() {
        return Err(ConstraintError::InvalidDirection);
    }
    Ok(normal / norm)
}
