//! Ensembles of nearby Lorenz trajectories.
//!
//! A scene starts `n_points` trajectories from `origin + (0, 0, n * epsilon)` and samples them all
//! with the same parameters, so that the divergence of nearby states can be shown side by side.
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{InvalidArgumentError, LorenzsolError},
    invalid_argument_error,
    trajectory::{sample_times, DEFAULT_DT},
    LorenzParameters, Trajectory, TrajectorySampler,
};

/// Separation along `z` between neighbouring initial states.
pub const DEFAULT_EPSILON: f64 = 1e-5;
pub const DEFAULT_ORIGIN: [f64; 3] = [10.0, 10.0, 10.0];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    pub parameters: LorenzParameters<f64>,
    pub n_points: usize,
    pub epsilon: f64,
    pub evolution_time: f64,
    pub dt: f64,
    pub origin: [f64; 3],
}

impl SceneConfig {
    fn preset(rho: f64, n_points: usize, evolution_time: f64) -> Self {
        Self {
            parameters: LorenzParameters::classical(rho),
            n_points,
            epsilon: DEFAULT_EPSILON,
            evolution_time,
            dt: DEFAULT_DT,
            origin: DEFAULT_ORIGIN,
        }
    }

    /// Ten points on the wide `rho = 50` attractor.
    pub fn lorenz_attractor() -> Self {
        Self::preset(50.0, 10, 30.0)
    }

    /// Twenty points on the `rho = 50` attractor, evolved for longer.
    pub fn lorenz_attractor_long() -> Self {
        Self::preset(50.0, 20, 50.0)
    }

    /// Ten points on the classical butterfly.
    pub fn classical_lorenz_attractor() -> Self {
        Self::preset(28.0, 10, 30.0)
    }

    /// Two points on the classical butterfly.
    pub fn twin_lorenz_attractor() -> Self {
        Self::preset(28.0, 2, 30.0)
    }

    pub fn initial_states(&self) -> Vec<Vector3<f64>> {
        let origin = Vector3::from(self.origin);
        (0..self.n_points)
            .map(|n| origin + Vector3::new(0.0, 0.0, n as f64 * self.epsilon))
            .collect()
    }

    pub fn validate(&self) -> Result<(), LorenzsolError> {
        if self.n_points == 0 {
            return Err(invalid_argument_error!(EmptyEnsemble));
        }
        if !(self.epsilon > 0.0) || !self.epsilon.is_finite() {
            return Err(LorenzsolError::from(
                InvalidArgumentError::NonPositivePerturbation {
                    epsilon: self.epsilon,
                },
            ));
        }
        if !self.origin.iter().all(|x| x.is_finite()) {
            return Err(invalid_argument_error!(
                Other,
                format!("origin must be finite, got {:?}", self.origin)
            ));
        }
        sample_times(self.evolution_time, self.dt).map(|_| ())
    }

    /// Sample every trajectory of the scene with the default sampler.
    pub fn sample(&self) -> Result<Ensemble, LorenzsolError> {
        self.sample_with(&TrajectorySampler::default())
    }

    pub fn sample_with(&self, sampler: &TrajectorySampler<f64>) -> Result<Ensemble, LorenzsolError> {
        self.validate()?;
        let trajectories = self
            .initial_states()
            .into_iter()
            .map(|y0| sampler.sample(&self.parameters, y0, self.evolution_time, self.dt))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            n_points = self.n_points,
            rho = self.parameters.rho,
            evolution_time = self.evolution_time,
            "sampled scene"
        );
        Ok(Ensemble {
            config: self.clone(),
            trajectories,
        })
    }
}

/// The sampled trajectories of one [SceneConfig], all on the same time grid.
#[derive(Debug, Clone)]
pub struct Ensemble {
    config: SceneConfig,
    trajectories: Vec<Trajectory<f64>>,
}

impl Ensemble {
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn trajectories(&self) -> &[Trajectory<f64>] {
        &self.trajectories
    }

    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    /// Number of samples in each trajectory.
    pub fn nsamples(&self) -> usize {
        self.trajectories.first().map_or(0, Trajectory::len)
    }

    pub fn positions_at(&self, elapsed: f64) -> Vec<Vector3<f64>> {
        self.trajectories
            .iter()
            .map(|traj| traj.position_at(elapsed))
            .collect()
    }

    /// Largest distance between any two members at sample `index`, `None` past the end.
    pub fn max_spread_at(&self, index: usize) -> Option<f64> {
        let points = self
            .trajectories
            .iter()
            .map(|traj| traj.point(index))
            .collect::<Option<Vec<_>>>()?;
        let mut spread = 0.0_f64;
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                spread = spread.max((a - b).norm());
            }
        }
        Some(spread)
    }

    /// Time of the first sample at which the members are spread by more than `threshold`.
    pub fn divergence_time(&self, threshold: f64) -> Option<f64> {
        let first = self.trajectories.first()?;
        (0..self.nsamples())
            .find(|&i| self.max_spread_at(i).is_some_and(|s| s > threshold))
            .map(|i| first.time(i))
    }
}
