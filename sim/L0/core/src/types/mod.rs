//! Core type definitions: Model, Data, enums and construction helpers.

pub(crate) mod data;
pub(crate) mod enums;
pub(crate) mod model;
pub(crate) mod model_factories;
pub(crate) mod model_init;

pub use data::Data;
pub use enums::{MjJointType, ModelError, StepError};
pub use model::Model;
pub use model_init::{BodySpec, JointSpec};
