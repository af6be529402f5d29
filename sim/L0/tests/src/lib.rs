//! Shared fixtures for the conformance tests.
//!
//! Models are built directly through [`Model::add_body`]; states come from a
//! small linear congruential generator so every run sees the same numbers.

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]

use nalgebra::{DVector, Vector3};
use sim_constraint::{ConstraintError, ConstraintSet};
use sim_core::{BodySpec, JointSpec, Model, ModelError};

/// Deterministic pseudo-random generator (Knuth's MMIX constants).
#[derive(Debug, Clone)]
pub struct Lcg(u64);

impl Lcg {
    /// Generator with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Uniform sample in `[-1, 1)`.
    #[allow(clippy::cast_precision_loss)]
    pub fn next_symmetric(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((self.0 >> 11) as f64 / (1u64 << 53) as f64).mul_add(2.0, -1.0)
    }

    /// Vector of `n` samples scaled by `scale`.
    pub fn vector(&mut self, n: usize, scale: f64) -> DVector<f64> {
        DVector::from_fn(n, |_, _| scale * self.next_symmetric())
    }
}

/// Random `(q, qdot, tau)` for a model.
pub fn random_state(model: &Model, rng: &mut Lcg) -> (DVector<f64>, DVector<f64>, DVector<f64>) {
    (
        rng.vector(model.nq, 0.5),
        rng.vector(model.nv, 1.0),
        rng.vector(model.nv, 2.0),
    )
}

/// Unit box sliding and spinning in the xy-plane.
#[must_use]
pub fn planar_box() -> Model {
    Model::planar_body(1.0, Vector3::zeros(), Vector3::new(1.0 / 6.0, 1.0 / 6.0, 1.0 / 6.0))
}

/// Free rigid body with its center of mass off the body origin.
#[must_use]
pub fn floating_body() -> Model {
    Model::floating_body(2.5, Vector3::new(0.02, -0.01, 0.05), Vector3::new(0.08, 0.12, 0.1))
}

/// Serial chain of `links` bodies fixed to the world, each moved by a
/// three-axis rotation, so the model has `3·links` DOFs.
///
/// # Errors
///
/// Propagates model-construction errors (none for valid `links`).
pub fn fixed_base_chain(links: usize) -> Result<Model, ModelError> {
    let mut model = Model::empty();
    model.name = format!("fixed_base_{}dof", 3 * links);
    let mut parent = 0;
    for i in 0..links {
        let pos = if i == 0 { Vector3::zeros() } else { Vector3::new(0.0, 0.0, -0.5) };
        parent = model.add_body(
            parent,
            BodySpec::new(1.0, Vector3::new(0.0, 0.0, -0.25), Vector3::new(0.02, 0.02, 0.005))
                .at(pos)
                .named(format!("link_{i}")),
            &JointSpec::rotation_zyx(),
        )?;
    }
    Ok(model)
}

/// Floating base with a chain of `links` hinge bodies hanging below it
/// (`6 + links` DOFs).
///
/// # Errors
///
/// Propagates model-construction errors.
pub fn floating_chain(links: usize) -> Result<Model, ModelError> {
    let mut model = Model::empty();
    model.name = format!("floating_chain_{}dof", 6 + links);
    let mut parent = model.add_body(
        0,
        BodySpec::new(3.0, Vector3::zeros(), Vector3::new(0.1, 0.15, 0.2)).named("base"),
        &JointSpec::floating(),
    )?;
    for i in 0..links {
        let axis = match i % 3 {
            0 => Vector3::y(),
            1 => Vector3::x(),
            _ => Vector3::z(),
        };
        parent = model.add_body(
            parent,
            BodySpec::new(0.7, Vector3::new(0.0, 0.0, -0.15), Vector3::new(0.01, 0.01, 0.004))
                .at(Vector3::new(0.0, 0.0, -0.3))
                .named(format!("link_{i}")),
            &[JointSpec::hinge(axis)],
        )?;
    }
    Ok(model)
}

/// Body ids of the end effectors of [`humanoid`].
#[derive(Debug, Clone, Copy)]
pub struct HumanoidFeet {
    /// Left foot.
    pub left_foot: usize,
    /// Right foot.
    pub right_foot: usize,
    /// Left hand.
    pub left_hand: usize,
    /// Right hand.
    pub right_hand: usize,
}

/// Branched humanoid: floating pelvis, torso, head, two three-segment legs
/// and two two-segment arms.
///
/// # Errors
///
/// Propagates model-construction errors.
pub fn humanoid() -> Result<(Model, HumanoidFeet), ModelError> {
    let mut model = Model::empty();
    model.name = "humanoid".to_string();

    let pelvis = model.add_body(
        0,
        BodySpec::new(10.0, Vector3::zeros(), Vector3::new(0.1, 0.08, 0.12)).named("pelvis"),
        &JointSpec::floating(),
    )?;
    let torso = model.add_body(
        pelvis,
        BodySpec::new(20.0, Vector3::new(0.0, 0.0, 0.25), Vector3::new(0.4, 0.35, 0.15))
            .at(Vector3::new(0.0, 0.0, 0.1))
            .named("torso"),
        &JointSpec::rotation_zyx(),
    )?;
    model.add_body(
        torso,
        BodySpec::new(5.0, Vector3::new(0.0, 0.0, 0.1), Vector3::repeat(0.02))
            .at(Vector3::new(0.0, 0.0, 0.5))
            .named("head"),
        &[JointSpec::hinge(Vector3::z()), JointSpec::hinge(Vector3::y())],
    )?;

    let leg = |model: &mut Model, side: f64, tag: &str| -> Result<usize, ModelError> {
        let thigh = model.add_body(
            pelvis,
            BodySpec::new(7.0, Vector3::new(0.0, 0.0, -0.2), Vector3::new(0.1, 0.1, 0.02))
                .at(Vector3::new(0.0, 0.1 * side, -0.05))
                .named(format!("{tag}_thigh")),
            &JointSpec::rotation_zyx(),
        )?;
        let shank = model.add_body(
            thigh,
            BodySpec::new(3.5, Vector3::new(0.0, 0.0, -0.2), Vector3::new(0.05, 0.05, 0.01))
                .at(Vector3::new(0.0, 0.0, -0.45))
                .named(format!("{tag}_shank")),
            &[JointSpec::hinge(Vector3::y())],
        )?;
        model.add_body(
            shank,
            BodySpec::new(1.2, Vector3::new(0.05, 0.0, -0.03), Vector3::new(0.004, 0.01, 0.01))
                .at(Vector3::new(0.0, 0.0, -0.42))
                .named(format!("{tag}_foot")),
            &[JointSpec::hinge(Vector3::y()), JointSpec::hinge(Vector3::x())],
        )
    };
    let left_foot = leg(&mut model, 1.0, "left")?;
    let right_foot = leg(&mut model, -1.0, "right")?;

    let arm = |model: &mut Model, side: f64, tag: &str| -> Result<usize, ModelError> {
        let upper = model.add_body(
            torso,
            BodySpec::new(2.0, Vector3::new(0.0, 0.0, -0.14), Vector3::new(0.015, 0.015, 0.003))
                .at(Vector3::new(0.0, 0.2 * side, 0.45))
                .named(format!("{tag}_upper_arm")),
            &JointSpec::rotation_zyx(),
        )?;
        model.add_body(
            upper,
            BodySpec::new(1.5, Vector3::new(0.0, 0.0, -0.13), Vector3::new(0.01, 0.01, 0.002))
                .at(Vector3::new(0.0, 0.0, -0.3))
                .named(format!("{tag}_hand")),
            &[JointSpec::hinge(Vector3::y())],
        )
    };
    let left_hand = arm(&mut model, 1.0, "left")?;
    let right_hand = arm(&mut model, -1.0, "right")?;

    Ok((
        model,
        HumanoidFeet {
            left_foot,
            right_foot,
            left_hand,
            right_hand,
        },
    ))
}

/// Three orthogonal rows at one point, as one named group.
///
/// # Errors
///
/// Propagates registration errors.
pub fn add_point_contact(
    cs: &mut ConstraintSet,
    body_id: usize,
    point: Vector3<f64>,
    name: &str,
) -> Result<u32, ConstraintError> {
    cs.add_contact_group(
        body_id,
        point,
        &[Vector3::x(), Vector3::y(), Vector3::z()],
        Some(name),
        None,
    )
}

/// Contact set on a humanoid: both feet fully constrained at the heel and
/// the left hand pressed against a wall along x.
///
/// # Errors
///
/// Propagates registration and binding errors.
pub fn humanoid_contacts(model: &Model, feet: HumanoidFeet) -> Result<ConstraintSet, ConstraintError> {
    let mut cs = ConstraintSet::new();
    add_point_contact(&mut cs, feet.left_foot, Vector3::new(-0.05, 0.0, -0.06), "left_heel")?;
    cs.add_contact_group(feet.left_foot, Vector3::new(0.15, 0.0, -0.06), &[Vector3::z()], Some("left_toe"), None)?;
    add_point_contact(&mut cs, feet.right_foot, Vector3::new(-0.05, 0.0, -0.06), "right_heel")?;
    cs.add_contact_group(feet.right_foot, Vector3::new(0.15, 0.0, -0.06), &[Vector3::z()], Some("right_toe"), None)?;
    cs.add_contact_group(feet.left_hand, Vector3::new(0.0, 0.0, -0.25), &[Vector3::x()], Some("left_hand"), None)?;
    cs.bind(model)?;
    Ok(cs)
}
