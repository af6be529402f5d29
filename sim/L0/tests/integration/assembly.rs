//! Initial-state assembly.

use approx::assert_relative_eq;
use nalgebra::DVector;
use sim_constraint::{ConstraintError, calc_assembly_q, calc_assembly_qdot};
use sim_conformance_tests::{Lcg, humanoid, humanoid_contacts, random_state};
use sim_core::point_velocity_at;

#[test]
fn humanoid_velocity_is_made_consistent() {
    let (model, feet) = humanoid().unwrap();
    let mut cs = humanoid_contacts(&model, feet).unwrap();
    let mut rng = Lcg::new(61);
    let (q, qdot_init, _) = random_state(&model, &mut rng);
    let weights = DVector::repeat(model.nv, 1.0);

    let qdot = calc_assembly_qdot(&model, &q, &qdot_init, &mut cs, &weights).unwrap();

    let mut data = model.make_data();
    for row in cs.rows() {
        let v = point_velocity_at(&model, &mut data, &q, &qdot, row.body_id, &row.point);
        assert!(row.normal.dot(&v).abs() < 1e-10);
    }
    // The projection only removes the constrained part.
    assert!((&qdot - &qdot_init).norm() <= qdot_init.norm());
}

#[test]
fn heavy_weights_pin_coordinates() {
    let (model, feet) = humanoid().unwrap();
    let mut cs = humanoid_contacts(&model, feet).unwrap();
    let mut rng = Lcg::new(62);
    let (q, qdot_init, _) = random_state(&model, &mut rng);

    // Pelvis DOFs much heavier than the rest: the legs absorb the change.
    let weights = DVector::from_fn(model.nv, |i, _| if i < 6 { 1e6 } else { 1.0 });
    let qdot = calc_assembly_qdot(&model, &q, &qdot_init, &mut cs, &weights).unwrap();
    let pelvis_change = (qdot.rows(0, 6) - qdot_init.rows(0, 6)).norm();
    let rest_change = (qdot.rows(6, model.nv - 6) - qdot_init.rows(6, model.nv - 6)).norm();
    assert!(pelvis_change < 1e-3 * rest_change, "pelvis moved {pelvis_change:e} vs {rest_change:e}");
}

#[test]
fn contact_configuration_needs_no_projection() {
    let (model, feet) = humanoid().unwrap();
    let mut cs = humanoid_contacts(&model, feet).unwrap();
    let mut rng = Lcg::new(63);
    let (q, _, _) = random_state(&model, &mut rng);
    let weights = DVector::repeat(model.nv, 1.0);

    let result = calc_assembly_q(&model, &q, &mut cs, &weights, 1e-12, 10).unwrap();
    assert!(result.converged);
    assert_eq!(result.iterations_used, 0);
    assert_relative_eq!(result.constraint_error, 0.0);
    assert_eq!(result.q, q);

    assert!(matches!(
        calc_assembly_q(&model, &DVector::zeros(3), &mut cs, &weights, 1e-12, 10),
        Err(ConstraintError::DimensionMismatch { what: "q", .. })
    ));
}
