use serde::{Deserialize, Serialize};

use crate::Scalar;

/// Step size control parameters for [crate::ExplicitRk].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "T: Scalar + Deserialize<'de>"))]
pub struct ExplicitRkConfig<T> {
    pub minimum_timestep: T,
    pub maximum_error_test_failures: usize,
    pub maximum_timestep_growth: T,
    pub minimum_timestep_shrink: T,
}

impl<T: Scalar> Default for ExplicitRkConfig<T> {
    fn default() -> Self {
        Self {
            minimum_timestep: T::constant(1e-13),
            maximum_error_test_failures: 40,
            maximum_timestep_growth: T::constant(10.0),
            minimum_timestep_shrink: T::constant(0.2),
        }
    }
}
