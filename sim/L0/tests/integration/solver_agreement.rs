//! Cross-solver agreement.
//!
//! The direct method is the reference; the range-space and Kokkevis methods
//! must reproduce its accelerations and forces on every fixture, for random
//! states and after repeated calls on the same set.

use approx::assert_relative_eq;
use nalgebra::{DVector, Vector3};
use sim_constraint::{
    ConstrainedDynamics, ConstraintSet, ConstraintSetConfig, LinearSolver, SolverKind,
    forward_dynamics_constraints_direct, forward_dynamics_contacts_kokkevis,
};
use sim_conformance_tests::{
    Lcg, add_point_contact, fixed_base_chain, floating_body, floating_chain, humanoid,
    humanoid_contacts, planar_box, random_state,
};
use sim_core::Model;

/// `‖a − b‖ ≤ tol · max(1, ‖b‖)`.
fn assert_close(a: &DVector<f64>, b: &DVector<f64>, tol: f64, what: &str) {
    let scale = b.norm().max(1.0);
    let diff = (a - b).norm();
    assert!(diff <= tol * scale, "{what}: |a - b| = {diff:e} exceeds {tol:e} * {scale}");
}

/// Run every solver on independent copies of `cs` and compare against the
/// direct method.
fn check_all_solvers(model: &Model, cs: &ConstraintSet, seed: u64, samples: usize, tol: f64) {
    let mut rng = Lcg::new(seed);
    let mut sets: Vec<_> = SolverKind::ALL
        .iter()
        .map(|_| {
            let mut copy = cs.unbound_copy();
            copy.bind(model).unwrap();
            copy
        })
        .collect();

    for _ in 0..samples {
        let (q, qdot, tau) = random_state(model, &mut rng);
        let mut results = Vec::new();
        for (kind, set) in SolverKind::ALL.iter().zip(sets.iter_mut()) {
            let qddot = kind.forward_dynamics(model, &q, &qdot, &tau, set).unwrap();
            results.push((kind.name(), qddot, set.force().clone()));
        }
        let (_, reference_qddot, reference_force) = &results[0];
        for (name, qddot, force) in &results[1..] {
            assert_close(qddot, reference_qddot, tol, &format!("{} qddot on {}", name, model.name));
            assert_close(force, reference_force, tol, &format!("{} force on {}", name, model.name));
        }
    }
}

#[test]
fn planar_box_corner_pinned() {
    let model = planar_box();
    let mut cs = ConstraintSet::new();
    cs.add_contact_group(1, Vector3::new(0.5, 0.5, 0.0), &[Vector3::x(), Vector3::y()], Some("corner"), None)
        .unwrap();
    check_all_solvers(&model, &cs, 1, 5, 1e-11);
}

#[test]
fn free_body_single_point() {
    let model = floating_body();
    let mut cs = ConstraintSet::new();
    add_point_contact(&mut cs, 1, Vector3::new(0.1, -0.1, -0.3), "foot").unwrap();
    check_all_solvers(&model, &cs, 2, 5, 1e-11);
}

#[test]
fn fixed_base_six_and_nine_dof() {
    for links in [2, 3] {
        let model = fixed_base_chain(links).unwrap();
        let mut cs = ConstraintSet::new();
        add_point_contact(&mut cs, links, Vector3::new(0.0, 0.0, -0.5), "tip").unwrap();
        check_all_solvers(&model, &cs, 3 + links as u64, 5, 1e-10);
    }
}

#[test]
fn floating_twelve_dof_chain() {
    let model = floating_chain(6).unwrap();
    assert_eq!(model.nv, 12);
    let mut cs = ConstraintSet::new();
    add_point_contact(&mut cs, model.nbody - 1, Vector3::new(0.0, 0.0, -0.3), "tip").unwrap();
    cs.add_contact_group(1, Vector3::new(0.1, 0.0, 0.0), &[Vector3::z()], Some("base"), None)
        .unwrap();
    check_all_solvers(&model, &cs, 7, 5, 1e-10);
}

#[test]
fn humanoid_double_stance_with_hand() {
    let (model, feet) = humanoid().unwrap();
    let cs = humanoid_contacts(&model, feet).unwrap();
    check_all_solvers(&model, &cs, 11, 5, 1e-9);
}

#[test]
fn solvers_agree_for_every_dense_method() {
    let (model, feet) = humanoid().unwrap();
    let base = humanoid_contacts(&model, feet).unwrap();
    let mut rng = Lcg::new(21);
    let (q, qdot, tau) = random_state(&model, &mut rng);

    let mut reference = base.unbound_copy();
    reference.bind(&model).unwrap();
    let expected = forward_dynamics_constraints_direct(&model, &q, &qdot, &tau, &mut reference).unwrap();

    for method in [LinearSolver::FullPivLu, LinearSolver::PartialPivLu] {
        let mut cs = ConstraintSet::with_config(ConstraintSetConfig::default().with_linear_solver(method));
        for group in base.groups() {
            let normals: Vec<_> = base.rows()[group.rows.clone()].iter().map(|r| r.normal).collect();
            cs.add_contact_group(group.body_id, group.point, &normals, group.name.as_deref(), group.user_id)
                .unwrap();
        }
        cs.bind(&model).unwrap();
        let qddot = forward_dynamics_constraints_direct(&model, &q, &qdot, &tau, &mut cs).unwrap();
        assert_close(&qddot, &expected, 1e-9, "dense method");
    }
}

#[test]
fn repeated_kokkevis_calls_match_direct() {
    let model = floating_chain(6).unwrap();
    let mut cs = ConstraintSet::new();
    add_point_contact(&mut cs, model.nbody - 1, Vector3::new(0.0, 0.0, -0.3), "tip").unwrap();
    cs.bind(&model).unwrap();
    let mut reference = cs.unbound_copy();
    reference.bind(&model).unwrap();

    let mut rng = Lcg::new(5);
    let (q, qdot, tau) = random_state(&model, &mut rng);
    let expected = forward_dynamics_constraints_direct(&model, &q, &qdot, &tau, &mut reference).unwrap();

    for _ in 0..3 {
        let qddot = forward_dynamics_contacts_kokkevis(&model, &q, &qdot, &tau, &mut cs).unwrap();
        assert_relative_eq!(qddot, expected, epsilon = 1e-10, max_relative = 1e-10);
        assert_relative_eq!(cs.force().clone(), reference.force().clone(), epsilon = 1e-10, max_relative = 1e-10);
    }
}

#[test]
fn resting_free_body_carries_its_weight() {
    let model = Model::floating_body(4.0, Vector3::zeros(), Vector3::new(0.2, 0.3, 0.4));
    let zero = DVector::zeros(model.nv);
    let mut qddots = Vec::new();
    for kind in SolverKind::ALL {
        let mut cs = ConstraintSet::new();
        cs.add_contact_constraint(1, Vector3::new(0.0, 0.0, -0.5), Vector3::z(), Some("ground"), None)
            .unwrap();
        cs.bind(&model).unwrap();
        let qddot = kind.forward_dynamics(&model, &zero, &zero, &zero, &mut cs).unwrap();

        let normal_acc = cs.workspace().unwrap().G.row(0).dot(&qddot.transpose());
        assert_relative_eq!(normal_acc, 0.0, epsilon = 1e-11);
        assert_relative_eq!(cs.force()[0], 4.0 * 9.81, epsilon = 1e-11, max_relative = 1e-11);
        qddots.push(qddot);
    }
    for qddot in &qddots[1..] {
        assert_relative_eq!(qddot.clone(), qddots[0].clone(), epsilon = 1e-11);
    }
}
