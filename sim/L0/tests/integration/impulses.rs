//! Velocity-level impulses at impact.

use approx::assert_relative_eq;
use nalgebra::{DVector, Vector3};
use sim_constraint::{
    ConstraintSet, compute_constraint_impulses_direct, compute_constraint_impulses_range_space_sparse,
};
use sim_conformance_tests::{Lcg, add_point_contact, floating_body, humanoid, humanoid_contacts, random_state};
use sim_core::point_velocity_at;

#[test]
fn contact_points_stop_after_impact() {
    let (model, feet) = humanoid().unwrap();
    let mut dense = humanoid_contacts(&model, feet).unwrap();
    let mut sparse = dense.unbound_copy();
    sparse.bind(&model).unwrap();
    let mut rng = Lcg::new(41);
    let mut data = model.make_data();

    for _ in 0..3 {
        let (q, qdot_minus, _) = random_state(&model, &mut rng);
        let a = compute_constraint_impulses_direct(&model, &q, &qdot_minus, &mut dense).unwrap();
        let b = compute_constraint_impulses_range_space_sparse(&model, &q, &qdot_minus, &mut sparse).unwrap();

        assert_relative_eq!(a, b, epsilon = 1e-10, max_relative = 1e-10);
        assert_relative_eq!(dense.impulse().clone(), sparse.impulse().clone(), epsilon = 1e-9, max_relative = 1e-9);
        assert_eq!(sparse.qdot_plus(), &b);

        for row in dense.rows() {
            let v = point_velocity_at(&model, &mut data, &q, &a, row.body_id, &row.point);
            assert!(row.normal.dot(&v).abs() < 1e-10, "row on body {} still moving", row.body_id);
        }
    }
}

#[test]
fn falling_body_lands_with_momentum_change() {
    let model = floating_body();
    let mut cs = ConstraintSet::new();
    add_point_contact(&mut cs, 1, Vector3::new(0.02, -0.01, -0.2), "contact").unwrap();
    cs.bind(&model).unwrap();

    // Straight down through the center of mass: only linear momentum changes.
    let q = DVector::zeros(model.nq);
    let mut qdot_minus = DVector::zeros(model.nv);
    qdot_minus[2] = -2.0;
    let qdot_plus = compute_constraint_impulses_direct(&model, &q, &qdot_minus, &mut cs).unwrap();

    assert_relative_eq!(qdot_plus.norm(), 0.0, epsilon = 1e-12);
    assert_relative_eq!(cs.impulse()[2], 2.5 * 2.0, epsilon = 1e-12);
    assert_relative_eq!(cs.impulse()[0], 0.0, epsilon = 1e-12);
    assert_relative_eq!(cs.impulse()[1], 0.0, epsilon = 1e-12);
}

#[test]
fn second_impulse_is_zero() {
    let (model, feet) = humanoid().unwrap();
    let mut cs = humanoid_contacts(&model, feet).unwrap();
    let mut rng = Lcg::new(43);
    let (q, qdot_minus, _) = random_state(&model, &mut rng);

    let qdot_plus = compute_constraint_impulses_range_space_sparse(&model, &q, &qdot_minus, &mut cs).unwrap();
    let again = compute_constraint_impulses_range_space_sparse(&model, &q, &qdot_plus, &mut cs).unwrap();
    assert_relative_eq!(again, qdot_plus, epsilon = 1e-10);
    assert_relative_eq!(cs.impulse().norm(), 0.0, epsilon = 1e-9);
}
