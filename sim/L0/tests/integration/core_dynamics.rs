//! Core dynamics primitives against each other.

use approx::assert_relative_eq;
use nalgebra::{DMatrix, DVector, Vector3};
use sim_conformance_tests::{Lcg, fixed_base_chain, floating_chain, humanoid, random_state};
use sim_core::linalg::{cholesky_in_place, cholesky_solve_in_place};
use sim_core::{
    Model, mj_aba, mj_crba, mj_inverse, mj_jac_point, mj_rne, mj_solve_m, point_position,
};

fn models() -> Vec<Model> {
    vec![
        fixed_base_chain(3).unwrap(),
        floating_chain(6).unwrap(),
        humanoid().unwrap().0,
    ]
}

#[test]
fn mass_matrix_matches_inverse_dynamics_columns() {
    let mut rng = Lcg::new(51);
    for model in models() {
        let (q, qdot, _) = random_state(&model, &mut rng);
        let mut data = model.make_data();
        data.set_state(&model, &q, &qdot);
        mj_crba(&model, &mut data).unwrap();
        mj_rne(&model, &mut data);
        let mass = data.qM.clone();
        let bias = data.qfrc_bias.clone();

        assert_relative_eq!(mass, mass.transpose(), epsilon = 1e-12);
        for col in 0..model.nv {
            data.qacc = DVector::zeros(model.nv);
            data.qacc[col] = 1.0;
            mj_inverse(&model, &mut data);
            let column = &data.qfrc_inverse - &bias;
            assert_relative_eq!(column, mass.column(col).into_owned(), epsilon = 1e-10);
        }
    }
}

#[test]
fn sparse_solve_matches_dense_cholesky() {
    let mut rng = Lcg::new(52);
    for model in models() {
        let (q, qdot, tau) = random_state(&model, &mut rng);
        let mut data = model.make_data();
        data.set_state(&model, &q, &qdot);
        mj_crba(&model, &mut data).unwrap();

        let mut sparse = tau.clone();
        mj_solve_m(&model, &data, &mut sparse);

        let mut factor: DMatrix<f64> = data.qM.clone();
        cholesky_in_place(&mut factor).unwrap();
        let mut dense = tau.clone();
        cholesky_solve_in_place(&factor, &mut dense);

        assert_relative_eq!(sparse, dense, epsilon = 1e-10, max_relative = 1e-10);
    }
}

#[test]
fn aba_matches_crba_and_rne() {
    let mut rng = Lcg::new(53);
    for model in models() {
        let (q, qdot, tau) = random_state(&model, &mut rng);
        let mut data = model.make_data();
        data.set_state(&model, &q, &qdot);
        data.qfrc_applied.copy_from(&tau);

        mj_crba(&model, &mut data).unwrap();
        mj_rne(&model, &mut data);
        let mut expected = &tau - &data.qfrc_bias;
        mj_solve_m(&model, &data, &mut expected);

        mj_aba(&model, &mut data);
        assert_relative_eq!(data.qacc, expected, epsilon = 1e-9, max_relative = 1e-9);
    }
}

#[test]
fn point_jacobian_matches_finite_differences() {
    let (model, _) = humanoid().unwrap();
    let mut rng = Lcg::new(54);
    let (q, _, _) = random_state(&model, &mut rng);
    let zero = DVector::zeros(model.nv);
    let local = Vector3::new(0.05, -0.02, -0.1);
    let body = model.nbody - 1;

    let mut data = model.make_data();
    data.set_state(&model, &q, &zero);
    let world = point_position(&model, &data, body, &local);
    let jac = mj_jac_point(&model, &data, body, &world);

    let h = 1e-7;
    for dof in 0..model.nv {
        let mut plus = q.clone();
        plus[dof] += h;
        let mut minus = q.clone();
        minus[dof] -= h;
        data.set_state(&model, &plus, &zero);
        let p_plus = point_position(&model, &data, body, &local);
        data.set_state(&model, &minus, &zero);
        let p_minus = point_position(&model, &data, body, &local);
        let fd = (p_plus - p_minus) / (2.0 * h);
        let column = Vector3::new(jac[(0, dof)], jac[(1, dof)], jac[(2, dof)]);
        assert_relative_eq!(column, fd, epsilon = 1e-6);
    }
}
