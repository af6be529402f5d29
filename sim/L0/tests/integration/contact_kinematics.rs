//! Contact kinematics checked by independent recomputation.
//!
//! After a solve, `sim-core`'s point kinematics are evaluated from scratch
//! at the returned `q̈` and compared with what the rows demand.

use approx::assert_relative_eq;
use nalgebra::{DVector, Vector3};
use sim_constraint::{
    BaumgarteParameters, ConstrainedDynamics, ConstraintSet, ConstraintSetConfig, SolverKind,
    forward_dynamics_constraints_direct,
};
use sim_conformance_tests::{Lcg, add_point_contact, floating_chain, humanoid, humanoid_contacts, random_state};
use sim_core::{Model, mj_crba, mj_inverse, mj_rne, point_acceleration_at, point_velocity_at};

#[test]
fn constrained_points_do_not_accelerate() {
    let (model, feet) = humanoid().unwrap();
    let base = humanoid_contacts(&model, feet).unwrap();
    let mut rng = Lcg::new(31);
    let mut data = model.make_data();

    for kind in SolverKind::ALL {
        let mut cs = base.unbound_copy();
        cs.bind(&model).unwrap();
        let (q, qdot, tau) = random_state(&model, &mut rng);
        let qddot = kind.forward_dynamics(&model, &q, &qdot, &tau, &mut cs).unwrap();

        for row in cs.rows() {
            let acc = point_acceleration_at(&model, &mut data, &q, &qdot, &qddot, row.body_id, &row.point);
            assert!(
                row.normal.dot(&acc).abs() < 1e-8,
                "{}: row on body {} accelerates {:e} along its normal",
                kind.name(),
                row.body_id,
                row.normal.dot(&acc)
            );
        }
    }
}

#[test]
fn equations_of_motion_hold_with_contact_forces() {
    let model = floating_chain(4).unwrap();
    let mut cs = ConstraintSet::new();
    add_point_contact(&mut cs, model.nbody - 1, Vector3::new(0.0, 0.0, -0.3), "tip").unwrap();
    cs.bind(&model).unwrap();
    let mut rng = Lcg::new(8);
    let (q, qdot, tau) = random_state(&model, &mut rng);

    let qddot = forward_dynamics_constraints_direct(&model, &q, &qdot, &tau, &mut cs).unwrap();

    // τ + Gᵀλ must equal the inverse-dynamics force of the solved motion.
    let mut data = model.make_data();
    data.set_state(&model, &q, &qdot);
    data.qacc.copy_from(&qddot);
    mj_inverse(&model, &mut data);
    let g = cs.workspace().unwrap().G.clone();
    let expected = &tau + g.transpose() * cs.force();
    assert_relative_eq!(data.qfrc_inverse, expected, epsilon = 1e-9, max_relative = 1e-9);

    // Same through the mass matrix.
    mj_crba(&model, &mut data).unwrap();
    mj_rne(&model, &mut data);
    let via_mass = &data.qM * &qddot + &data.qfrc_bias;
    assert_relative_eq!(via_mass, expected, epsilon = 1e-9, max_relative = 1e-9);
}

#[test]
fn forces_are_equal_and_opposite_along_normal() {
    let (model, feet) = humanoid().unwrap();
    let mut cs = humanoid_contacts(&model, feet).unwrap();
    let q = DVector::zeros(model.nq);
    let qdot = DVector::zeros(model.nv);
    let tau = DVector::zeros(model.nv);
    forward_dynamics_constraints_direct(&model, &q, &qdot, &tau, &mut cs).unwrap();

    for group in 0..cs.group_count() {
        let forces = cs.calc_forces(group, &model, &q, &qdot, false, true).unwrap();
        assert_eq!(forces.body_ids, [0, 0]);
        let on_body = forces.forces[0].fixed_rows::<3>(3).into_owned();
        let on_ground = forces.forces[1].fixed_rows::<3>(3).into_owned();
        assert_relative_eq!(on_body, -on_ground, epsilon = 1e-12);

        let rows = cs.groups()[group].rows.clone();
        for (row_forces, r) in forces.row_forces.iter().zip(rows) {
            let normal = cs.rows()[r].normal;
            let magnitude = cs.force()[r];
            assert_relative_eq!(normal.dot(&row_forces[0].fixed_rows::<3>(3)), magnitude, epsilon = 1e-12);
            assert_relative_eq!(normal.dot(&row_forces[1].fixed_rows::<3>(3)), -magnitude, epsilon = 1e-12);
        }
    }
}

#[test]
fn velocity_error_scales_with_injected_offset() {
    let model = floating_chain(3).unwrap();
    let mut cs = ConstraintSet::new();
    let tip = model.nbody - 1;
    let point = Vector3::new(0.0, 0.0, -0.3);
    add_point_contact(&mut cs, tip, point, "tip").unwrap();
    cs.bind(&model).unwrap();

    let mut rng = Lcg::new(13);
    let (q, qdot, _) = random_state(&model, &mut rng);
    let zero = DVector::zeros(model.nv);

    // Zero generalized velocity: no motion along any row.
    let at_rest = cs.calc_velocity_error(0, &model, &q, &zero, true).unwrap();
    assert_relative_eq!(at_rest.norm(), 0.0, epsilon = 1e-15);

    let one = cs.calc_velocity_error(0, &model, &q, &qdot, true).unwrap();
    let three = cs.calc_velocity_error(0, &model, &q, &(&qdot * 3.0), true).unwrap();
    assert_relative_eq!(three, &one * 3.0, epsilon = 1e-12);

    let mut data = model.make_data();
    let v = point_velocity_at(&model, &mut data, &q, &qdot, tip, &point);
    assert_relative_eq!(one, DVector::from_vec(vec![v.x, v.y, v.z]), epsilon = 1e-12);

    assert_eq!(cs.calc_position_error(0, &model, &q, true).unwrap(), DVector::zeros(3));
}

#[test]
fn baumgarte_damps_normal_velocity() {
    let model = Model::floating_body(1.0, Vector3::zeros(), Vector3::repeat(0.1));
    let params = BaumgarteParameters::new(4.0, 2.0);
    let mut cs = ConstraintSet::with_config(ConstraintSetConfig::stabilized(params));
    cs.add_contact_constraint(1, Vector3::new(0.0, 0.0, -0.5), Vector3::z(), None, None).unwrap();
    cs.bind(&model).unwrap();
    assert!(cs.is_baumgarte_enabled(0).unwrap());

    // Sinking at 0.1 m/s: the solved point acceleration is -2α·v_n upward.
    let q = DVector::zeros(model.nq);
    let mut qdot = DVector::zeros(model.nv);
    qdot[2] = -0.1;
    let zero = DVector::zeros(model.nv);

    for kind in SolverKind::ALL {
        let qddot = kind.forward_dynamics(&model, &q, &qdot, &zero, &mut cs).unwrap();
        let mut data = model.make_data();
        let acc = point_acceleration_at(&model, &mut data, &q, &qdot, &qddot, 1, &Vector3::new(0.0, 0.0, -0.5));
        assert_relative_eq!(acc.z, -2.0 * 4.0 * -0.1, epsilon = 1e-10);
    }

    let force = cs
        .calc_baumgarte_stabilization_force(0, &DVector::from_vec(vec![0.01]), &DVector::from_vec(vec![-0.1]))
        .unwrap();
    assert_relative_eq!(force[0], -2.0 * 4.0 * -0.1 - 4.0 * 0.01, epsilon = 1e-15);
}
