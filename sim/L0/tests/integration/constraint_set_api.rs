//! Constraint set bookkeeping: grouping, lookups and the bind lifecycle.

use nalgebra::{DVector, Vector3};
use sim_constraint::{ConstraintError, ConstraintSet, forward_dynamics_constraints_range_space_sparse};
use sim_conformance_tests::{add_point_contact, floating_body, humanoid, humanoid_contacts};

#[test]
fn lookups_resolve_to_the_same_group() {
    let (model, feet) = humanoid().unwrap();
    let mut cs = ConstraintSet::new();
    add_point_contact(&mut cs, feet.left_foot, Vector3::zeros(), "left").unwrap();
    let assigned = cs
        .add_contact_group(feet.right_foot, Vector3::zeros(), &[Vector3::z()], Some("right"), Some(100))
        .unwrap();
    cs.bind(&model).unwrap();

    let index = cs.group_index_by_name("right").unwrap();
    assert_eq!(index, 1);
    assert_eq!(cs.group_index_by_id(100).unwrap(), index);
    assert_eq!(cs.group_index_by_assigned_id(assigned).unwrap(), index);
    assert_eq!(cs.group(index).unwrap().rows, 3..4);

    // Unknown keys are errors, not index 0.
    assert!(matches!(cs.group_index_by_name("left_hand"), Err(ConstraintError::UnknownName(_))));
    assert_eq!(cs.group_index_by_id(7), Err(ConstraintError::UnknownId(7)));
    assert_eq!(cs.group_index_by_assigned_id(42), Err(ConstraintError::UnknownAssignedId(42)));
}

#[test]
fn rows_at_a_shared_point_merge_unless_keys_differ() {
    let mut cs = ConstraintSet::new();
    let p = Vector3::new(0.0, 0.1, -0.2);
    let first = cs.add_contact_constraint(1, p, Vector3::x(), Some("a"), None).unwrap();
    let second = cs.add_contact_constraint(1, p, Vector3::y(), None, None).unwrap();
    let third = cs.add_contact_constraint(1, p, Vector3::z(), Some("b"), None).unwrap();

    assert_eq!(first, second);
    assert_ne!(second, third);
    assert_eq!(cs.group_count(), 2);
    assert_eq!(cs.len(), 3);
    assert_eq!(cs.groups()[1].name.as_deref(), Some("b"));
}

#[test]
fn lifecycle_errors() {
    let model = floating_body();
    let mut cs = ConstraintSet::new();
    let zero = DVector::zeros(model.nv);

    assert_eq!(cs.bind(&model), Err(ConstraintError::EmptySet));
    cs.add_contact_constraint(1, Vector3::zeros(), Vector3::z(), None, None).unwrap();
    assert_eq!(
        forward_dynamics_constraints_range_space_sparse(&model, &zero, &zero, &zero, &mut cs),
        Err(ConstraintError::NotBound)
    );

    cs.bind(&model).unwrap();
    assert_eq!(cs.bind(&model), Err(ConstraintError::AlreadyBound));
    assert_eq!(
        cs.add_contact_constraint(1, Vector3::zeros(), Vector3::x(), None, None),
        Err(ConstraintError::AddAfterBind)
    );
    assert_eq!(
        forward_dynamics_constraints_range_space_sparse(&model, &DVector::zeros(3), &zero, &zero, &mut cs),
        Err(ConstraintError::DimensionMismatch { what: "q", expected: 6, actual: 3 })
    );

    cs.reset();
    assert!(!cs.is_bound());
    assert_eq!(cs.len(), 1);
    assert_eq!(cs.force().len(), 0);
}

#[test]
fn binding_to_a_different_model_is_rejected_at_solve_time() {
    let model = floating_body();
    let (other, _) = humanoid().unwrap();
    let mut cs = ConstraintSet::new();
    cs.add_contact_constraint(1, Vector3::zeros(), Vector3::z(), None, None).unwrap();
    cs.bind(&model).unwrap();

    let q = DVector::zeros(other.nq);
    let v = DVector::zeros(other.nv);
    assert!(matches!(
        forward_dynamics_constraints_range_space_sparse(&other, &q, &v, &v, &mut cs),
        Err(ConstraintError::DimensionMismatch { what: "model nv", .. })
    ));
}

#[test]
fn unbound_copy_is_independent_of_its_source() {
    let (model, feet) = humanoid().unwrap();
    let source = humanoid_contacts(&model, feet).unwrap();
    let mut copy = source.unbound_copy();

    assert!(source.is_bound());
    assert!(!copy.is_bound());
    assert_eq!(copy.groups(), source.groups());

    copy.add_contact_group(feet.right_hand, Vector3::zeros(), &[Vector3::y()], Some("right_hand"), None)
        .unwrap();
    copy.set_baumgarte_enabled(0, true).unwrap();
    assert_eq!(copy.group_count(), source.group_count() + 1);
    assert!(!source.is_baumgarte_enabled(0).unwrap());
    assert!(matches!(source.group_index_by_name("right_hand"), Err(ConstraintError::UnknownName(_))));
}
