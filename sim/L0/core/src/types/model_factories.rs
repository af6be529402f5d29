//! Factory methods for common mechanical systems.
//!
//! These constructors produce pre-configured [`Model`] instances for
//! canonical test systems (pendulums, free bodies, planar boxes). Used by
//! inline tests and by `sim-conformance-tests`.

use nalgebra::Vector3;

use super::model::Model;
use super::model_init::{BodySpec, JointSpec};

impl Model {
    /// Create an n-link serial pendulum (hinge joints only).
    ///
    /// This creates a serial chain of `n` bodies connected by hinge joints,
    /// all rotating around the Y axis. Each body has a point mass at its end.
    ///
    /// # Arguments
    /// * `n` - Number of links (must be >= 1)
    /// * `link_length` - Length of each link (meters)
    /// * `link_mass` - Mass of each link (kg)
    ///
    /// # Panics
    /// Panics if `n` is 0 (requires at least 1 link).
    #[must_use]
    pub fn n_link_pendulum(n: usize, link_length: f64, link_mass: f64) -> Self {
        assert!(n >= 1, "n_link_pendulum requires at least 1 link");

        let mut model = Self::empty();
        model.name = format!("{n}_link_pendulum");

        for i in 0..n {
            // Body frame sits at the joint; the point mass hangs one link below.
            let pos = if i == 0 {
                Vector3::zeros()
            } else {
                Vector3::new(0.0, 0.0, -link_length)
            };
            let body = BodySpec::new(
                link_mass,
                Vector3::new(0.0, 0.0, -link_length),
                Vector3::new(0.001, 0.001, 0.001),
            )
            .at(pos)
            .named(format!("link_{i}"));
            let joint = JointSpec::hinge(Vector3::y()).named(format!("hinge_{i}"));
            model.push_body(i, body, &[joint]);
        }

        model
    }

    /// Single rigid body attached to the world by a 6-DOF floating joint
    /// (translation xyz, then rotation zyx).
    #[must_use]
    pub fn floating_body(mass: f64, com: Vector3<f64>, inertia: Vector3<f64>) -> Self {
        let mut model = Self::empty();
        model.name = "floating_body".to_string();
        model.push_body(
            0,
            BodySpec::new(mass, com, inertia).named("body"),
            &JointSpec::floating(),
        );
        model
    }

    /// Single rigid body moving in the world xy-plane (slides x/y, hinge z).
    #[must_use]
    pub fn planar_body(mass: f64, com: Vector3<f64>, inertia: Vector3<f64>) -> Self {
        let mut model = Self::empty();
        model.name = "planar_body".to_string();
        model.push_body(
            0,
            BodySpec::new(mass, com, inertia).named("body"),
            &JointSpec::planar_xy(),
        );
        model
    }
}
