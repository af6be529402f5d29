//! Spatial algebra utilities for 6D motion and force vectors.
//!
//! Implements Featherstone's spatial vector algebra used throughout the
//! dynamics pipeline (CRBA, RNE, ABA, forward kinematics). Functions here
//! are pure math with no pipeline state dependencies.

use nalgebra::{Matrix3, Matrix6, Vector3, Vector6};

/// 6D spatial vector: [angular (3), linear (3)].
///
/// Following Featherstone's convention:
/// - Motion vectors: [ω, v] (angular velocity, linear velocity)
/// - Force vectors: [τ, f] (torque, force)
pub type SpatialVector = Vector6<f64>;

/// Angular (upper) half of a spatial vector.
#[inline]
#[must_use]
pub fn angular(v: &SpatialVector) -> Vector3<f64> {
    Vector3::new(v[0], v[1], v[2])
}

/// Linear (lower) half of a spatial vector.
#[inline]
#[must_use]
pub fn linear(v: &SpatialVector) -> Vector3<f64> {
    Vector3::new(v[3], v[4], v[5])
}

/// Assemble a spatial vector from its angular and linear halves.
#[inline]
#[must_use]
pub fn spatial(ang: &Vector3<f64>, lin: &Vector3<f64>) -> SpatialVector {
    SpatialVector::new(ang.x, ang.y, ang.z, lin.x, lin.y, lin.z)
}

/// Spatial cross product for motion vectors: v ×ₘ s.
#[allow(clippy::inline_always)] // Hot in every recursive pass
#[inline(always)]
#[must_use]
pub fn spatial_cross_motion(v: SpatialVector, s: SpatialVector) -> SpatialVector {
    let w = angular(&v);
    let v_lin = linear(&v);
    let s_ang = angular(&s);
    let s_lin = linear(&s);
    spatial(&w.cross(&s_ang), &(w.cross(&s_lin) + v_lin.cross(&s_ang)))
}

/// Spatial cross product for force vectors: v ×* f.
#[allow(clippy::inline_always)] // Hot in every recursive pass
#[inline(always)]
#[must_use]
pub fn spatial_cross_force(v: SpatialVector, f: SpatialVector) -> SpatialVector {
    let w = angular(&v);
    let v_lin = linear(&v);
    let f_ang = angular(&f);
    let f_lin = linear(&f);
    spatial(&(w.cross(&f_ang) + v_lin.cross(&f_lin)), &w.cross(&f_lin))
}

/// Spatial force about the world origin of a pure force `f` acting at `point`.
#[inline]
#[must_use]
pub fn point_force(point: &Vector3<f64>, f: &Vector3<f64>) -> SpatialVector {
    spatial(&point.cross(f), f)
}

/// Compute a body's spatial inertia about the world origin.
///
/// - `mass`: body mass
/// - `inertia_diag`: principal moments about the center of mass
/// - `i_mat`: rotation from the principal frame to world
/// - `h`: center of mass position in world (relative to the reference point)
///
/// ```text
/// I = [ R·diag·Rᵀ + m(|h|²·1 − h·hᵀ)   m[h]× ]
///     [ m[h]×ᵀ                         m·1   ]
/// ```
///
/// Computed once per body in FK and consumed directly by CRBA, RNE and ABA.
#[must_use]
pub fn compute_body_spatial_inertia(
    mass: f64,
    inertia_diag: Vector3<f64>,
    i_mat: &Matrix3<f64>,
    h: Vector3<f64>,
) -> Matrix6<f64> {
    let i_com = i_mat * Matrix3::from_diagonal(&inertia_diag) * i_mat.transpose();
    let i_ref = i_com + (Matrix3::identity() * h.norm_squared() - h * h.transpose()) * mass;
    let mh_cross = (h * mass).cross_matrix();

    let mut crb = Matrix6::zeros();
    crb.fixed_view_mut::<3, 3>(0, 0).copy_from(&i_ref);
    crb.fixed_view_mut::<3, 3>(0, 3).copy_from(&mh_cross);
    crb.fixed_view_mut::<3, 3>(3, 0).copy_from(&mh_cross.transpose());
    crb.fixed_view_mut::<3, 3>(3, 3)
        .copy_from(&(Matrix3::identity() * mass));
    crb
}
