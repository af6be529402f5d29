//! Integration tests for the constrained dynamics crates.
//!
//! These tests check the solvers against each other and against independent
//! recomputation through `sim-core`:
//! - Direct, range-space and Kokkevis methods agree on every fixture
//! - Constrained points do not accelerate (or move, after an impulse)
//! - Constraint set bookkeeping behaves across bind/reset cycles
//! - Core dynamics primitives agree with each other

pub mod assembly;
pub mod constraint_set_api;
pub mod contact_kinematics;
pub mod core_dynamics;
pub mod impulses;
pub mod solver_agreement;
