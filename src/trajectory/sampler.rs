use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::Trajectory;
use crate::{
    error::{InvalidArgumentError, LorenzsolError},
    ode_equations::lorenz::{lorenz_problem, LorenzParameters},
    ExplicitRkConfig, OdeEquations, OdeSolverMethod, Op, Scalar, Tableau,
};

/// Output spacing used by the scenes when none is given.
pub const DEFAULT_DT: f64 = 0.01;
pub const DEFAULT_RTOL: f64 = 1e-6;
pub const DEFAULT_ATOL: f64 = 1e-6;
/// Largest output grid [sample_times] will build.
pub const MAX_SAMPLES: usize = 1 << 27;

/// The embedded Runge-Kutta pair used to integrate a trajectory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RkMethod {
    /// Dormand-Prince 5(4)
    #[default]
    Dopri5,
    /// Tsitouras 5(4)
    Tsit45,
}

impl RkMethod {
    pub fn tableau<T: Scalar>(&self) -> Tableau<T> {
        match self {
            RkMethod::Dopri5 => Tableau::dopri5(),
            RkMethod::Tsit45 => Tableau::tsit45(),
        }
    }
}

/// The half-open output grid `{0, dt, 2 dt, ...}` strictly below `duration`, with `ceil(duration / dt)` entries.
///
/// The grid always holds at least the initial time. Grids longer than [MAX_SAMPLES] are rejected.
pub fn sample_times<T: Scalar>(duration: T, dt: T) -> Result<Vec<T>, LorenzsolError> {
    if !(duration > T::zero()) || !duration.is_finite() {
        return Err(LorenzsolError::from(
            InvalidArgumentError::NonPositiveDuration {
                duration: duration.to_f64_lossy(),
            },
        ));
    }
    if !(dt > T::zero()) || !dt.is_finite() {
        return Err(LorenzsolError::from(
            InvalidArgumentError::NonPositiveTimeStep {
                dt: dt.to_f64_lossy(),
            },
        ));
    }
    // duration / dt can underflow to zero, the initial state is always sampled
    let samples = (duration / dt).ceil();
    let n = match samples.to_usize() {
        Some(n) if n <= MAX_SAMPLES => n.max(1),
        _ => {
            return Err(LorenzsolError::from(InvalidArgumentError::TooManySamples {
                samples: samples.to_f64_lossy(),
                max: MAX_SAMPLES,
            }))
        }
    };
    Ok((0..n).map(|i| T::constant(i as f64) * dt).collect())
}

/// Sample the Lorenz system from `initial_state` every `dt` for `t` in `[0, duration)`, using
/// Dormand-Prince 5(4) with `rtol = atol = 1e-6`.
///
/// # Example
///
/// ```
/// use lorenzsol::{sample_trajectory, LorenzParameters};
/// use nalgebra::Vector3;
///
/// let params = LorenzParameters::classical(28.0);
/// let traj = sample_trajectory(&params, Vector3::new(10.0, 10.0, 10.0), 0.02, 0.01).unwrap();
/// assert_eq!(traj.len(), 2);
/// assert_eq!(traj.first(), Vector3::new(10.0, 10.0, 10.0));
/// ```
pub fn sample_trajectory<T: Scalar>(
    params: &LorenzParameters<T>,
    initial_state: Vector3<T>,
    duration: T,
    dt: T,
) -> Result<Trajectory<T>, LorenzsolError> {
    TrajectorySampler::default().sample(params, initial_state, duration, dt)
}

/// Samples Lorenz trajectories with a chosen Runge-Kutta pair, tolerances and step size control.
///
/// The integrator takes its own adaptive steps, `dt` only sets the density of the output,
/// which is read off the dense output of the integrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "T: Scalar + Deserialize<'de>"))]
pub struct TrajectorySampler<T: Scalar = f64> {
    pub method: RkMethod,
    pub rtol: T,
    pub atol: T,
    pub config: ExplicitRkConfig<T>,
}

impl<T: Scalar> Default for TrajectorySampler<T> {
    fn default() -> Self {
        Self {
            method: RkMethod::default(),
            rtol: T::constant(DEFAULT_RTOL),
            atol: T::constant(DEFAULT_ATOL),
            config: ExplicitRkConfig::default(),
        }
    }
}

impl<T: Scalar> TrajectorySampler<T> {
    pub fn with_method(mut self, method: RkMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_tolerances(mut self, rtol: T, atol: T) -> Self {
        self.rtol = rtol;
        self.atol = atol;
        self
    }

    pub fn with_config(mut self, config: ExplicitRkConfig<T>) -> Self {
        self.config = config;
        self
    }

    /// Sample one trajectory. The arguments are validated before any integration is attempted,
    /// integration failures are returned as they come out of the solver.
    pub fn sample(
        &self,
        params: &LorenzParameters<T>,
        initial_state: Vector3<T>,
        duration: T,
        dt: T,
    ) -> Result<Trajectory<T>, LorenzsolError> {
        let t_eval = sample_times(duration, dt)?;
        let problem = lorenz_problem(*params, initial_state, self.rtol, self.atol)?;
        let tableau = self.method.tableau();
        let state = problem.rk_state(&tableau)?;
        let mut solver =
            problem.explicit_rk_solver_with_config(state, tableau, self.config.clone())?;
        let ys = solver.solve_dense(&t_eval).map_err(|err| {
            warn!(%err, method = ?self.method, "trajectory sampling failed");
            err
        })?;

        let statistics = solver.get_statistics();
        debug!(
            method = ?self.method,
            samples = t_eval.len(),
            steps = statistics.number_of_steps,
            error_test_failures = statistics.number_of_error_test_failures,
            rhs_calls = problem.eqn.rhs().statistics().number_of_calls,
            "sampled trajectory"
        );
        Trajectory::new(ys.transpose(), dt)
    }
}

#[cfg(test)]
mod test {
    use nalgebra::Vector3;

    use super::*;

    fn classical() -> LorenzParameters<f64> {
        LorenzParameters::classical(28.0)
    }

    fn origin() -> Vector3<f64> {
        Vector3::new(10.0, 10.0, 10.0)
    }

    #[test]
    fn grid_is_half_open() {
        assert_eq!(sample_times(0.02, 0.01).unwrap(), vec![0.0, 0.01]);
        assert_eq!(sample_times(0.025, 0.01).unwrap().len(), 3);
        assert_eq!(sample_times(0.3, 0.1).unwrap().len(), 3);
        assert_eq!(sample_times(30.0, 0.01).unwrap().len(), 3000);
        // a step longer than the duration still gives the initial state
        assert_eq!(sample_times(0.5, 1.0).unwrap(), vec![0.0]);
        // and so does a ratio that underflows
        assert_eq!(sample_times(5e-324, 1e300).unwrap(), vec![0.0]);
        let traj = sample_trajectory(&classical(), origin(), 5e-324, 1e300).unwrap();
        assert_eq!(traj.len(), 1);
        assert_eq!(traj.first(), origin());
    }

    #[test]
    fn oversized_grid_is_rejected() {
        for (duration, dt) in [(1e17, 1e-2), (1e300, 1e-300), (1e6, 1e-6)] {
            let err = sample_times(duration, dt).err().unwrap();
            assert!(
                matches!(
                    err,
                    LorenzsolError::InvalidArgument(InvalidArgumentError::TooManySamples { .. })
                ),
                "{duration}, {dt}: {err}"
            );
        }
        let err = sample_trajectory(&classical(), origin(), 1e17, 1e-2)
            .err()
            .unwrap();
        assert!(!err.is_integration_failure(), "{err}");
    }

    #[test]
    fn invalid_arguments_are_rejected() {
        for (duration, dt) in [
            (0.0, 0.01),
            (-1.0, 0.01),
            (f64::NAN, 0.01),
            (f64::INFINITY, 0.01),
            (1.0, 0.0),
            (1.0, -0.01),
            (1.0, f64::NAN),
        ] {
            let err = sample_trajectory(&classical(), origin(), duration, dt)
                .err()
                .unwrap();
            assert!(
                matches!(err, LorenzsolError::InvalidArgument(_)),
                "{duration}, {dt}: {err}"
            );
            assert!(!err.is_integration_failure());
        }
    }

    #[test]
    fn invalid_arguments_are_checked_before_integration() {
        // a non-finite initial state would otherwise fail in the integrator
        let err = sample_trajectory(
            &classical(),
            Vector3::new(f64::NAN, 0.0, 0.0),
            -1.0,
            0.01,
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            LorenzsolError::InvalidArgument(InvalidArgumentError::NonPositiveDuration { .. })
        ));
    }

    #[test]
    fn non_finite_inputs_are_integration_failures() {
        let err = sample_trajectory(&classical(), Vector3::new(f64::INFINITY, 0.0, 0.0), 1.0, 0.01)
            .err()
            .unwrap();
        assert!(err.is_integration_failure(), "{err}");

        let params = LorenzParameters::new(10.0, f64::NAN, 8.0 / 3.0);
        let err = sample_trajectory(&params, origin(), 1.0, 0.01)
            .err()
            .unwrap();
        assert!(err.is_integration_failure(), "{err}");
    }

    #[test]
    fn two_point_trajectory() {
        let traj = sample_trajectory(&classical(), origin(), 0.02, 0.01).unwrap();
        assert_eq!(traj.len(), 2);
        assert_eq!(traj.first(), origin());
        let expected = Vector3::new(10.080827, 11.657197, 10.809505);
        assert!((traj.last() - expected).amax() < 1e-4, "{}", traj.last());
    }

    #[test]
    fn length_and_first_point() {
        for (duration, dt) in [(1.0, 0.01), (2.5, 0.1), (0.05, 0.01), (3.0, 0.07)] {
            let traj = sample_trajectory(&classical(), origin(), duration, dt).unwrap();
            assert_eq!(traj.len(), sample_times(duration, dt).unwrap().len());
            assert_eq!(traj.len(), (duration / dt).ceil() as usize);
            assert!((traj.first() - origin()).amax() < 1e-9);
            assert!(traj.end_time() < duration);
        }
    }

    #[test]
    fn sampling_is_deterministic() {
        let sampler = TrajectorySampler::default();
        let a = sampler.sample(&classical(), origin(), 5.0, 0.01).unwrap();
        let b = sampler.sample(&classical(), origin(), 5.0, 0.01).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn dt_only_changes_output_density() {
        let fine = sample_trajectory(&classical(), origin(), 1.0, 0.01).unwrap();
        let coarse = sample_trajectory(&classical(), origin(), 1.0, 0.1).unwrap();
        for i in 0..coarse.len() {
            let diff = (fine.point(10 * i).unwrap() - coarse.point(i).unwrap()).amax();
            assert!(diff < 1e-4, "i = {i}, diff = {diff}");
        }
    }

    #[test]
    fn nearby_states_diverge() {
        let epsilon = 1e-5;
        let a = sample_trajectory(&classical(), origin(), 30.0, 0.01).unwrap();
        let b = sample_trajectory(
            &classical(),
            origin() + Vector3::new(0.0, 0.0, epsilon),
            30.0,
            0.01,
        )
        .unwrap();

        // still close after one time unit, growth bounded by a generous Lyapunov exponent
        let max_early = (0..=100)
            .map(|i| (a.point(i).unwrap() - b.point(i).unwrap()).norm())
            .fold(0.0, f64::max);
        assert!(max_early > 0.0);
        assert!(max_early < epsilon * 2.0_f64.exp(), "{max_early}");

        // visibly separated by the end
        let max_late = (2500..a.len())
            .map(|i| (a.point(i).unwrap() - b.point(i).unwrap()).norm())
            .fold(0.0, f64::max);
        assert!(max_late > 1.0, "{max_late}");
    }

    #[test]
    fn classical_trajectory_is_bounded() {
        let traj = sample_trajectory(&classical(), origin(), 50.0, 0.01).unwrap();
        let max = traj.as_matrix().amax();
        assert!(max < 100.0, "{max}");
        assert!(max > 10.0);
    }

    #[test]
    fn tsit45_agrees_with_dopri5() {
        let sampler = TrajectorySampler::default().with_method(RkMethod::Tsit45);
        let a = sampler.sample(&classical(), origin(), 1.0, 0.01).unwrap();
        let b = sample_trajectory(&classical(), origin(), 1.0, 0.01).unwrap();
        assert_eq!(a.first(), b.first());
        assert!((a.as_matrix() - b.as_matrix()).amax() < 1e-3);
    }

    #[test]
    fn tighter_tolerances_agree() {
        let tight = TrajectorySampler::default().with_tolerances(1e-10, 1e-10);
        let a = tight.sample(&classical(), origin(), 1.0, 0.01).unwrap();
        let b = sample_trajectory(&classical(), origin(), 1.0, 0.01).unwrap();
        assert!((a.as_matrix() - b.as_matrix()).amax() < 1e-3);
    }

    #[test]
    fn restrictive_config_is_an_integration_failure() {
        let sampler = TrajectorySampler::default().with_config(ExplicitRkConfig {
            minimum_timestep: 1.0,
            ..ExplicitRkConfig::default()
        });
        // the first rejected step anywhere along the attractor is below the minimum
        let err = sampler
            .sample(&classical(), origin(), 30.0, 0.01)
            .err()
            .unwrap();
        assert!(err.is_integration_failure(), "{err}");
    }

    #[test]
    fn single_precision() {
        let params = LorenzParameters::<f32>::classical(28.0);
        let sampler = TrajectorySampler::<f32>::default().with_tolerances(1e-4, 1e-4);
        let traj = sampler
            .sample(&params, Vector3::new(10.0, 10.0, 10.0), 0.5, 0.01)
            .unwrap();
        assert_eq!(traj.len(), 50);
        assert_eq!(traj.first(), Vector3::new(10.0, 10.0, 10.0));
    }

    #[test]
    fn sampler_config_deserializes_with_defaults() {
        let sampler: TrajectorySampler<f64> =
            serde_json::from_str(r#"{"method": "Tsit45", "rtol": 1e-8}"#).unwrap();
        assert_eq!(sampler.method, RkMethod::Tsit45);
        assert_eq!(sampler.rtol, 1e-8);
        assert_eq!(sampler.atol, DEFAULT_ATOL);
        assert_eq!(sampler.config, ExplicitRkConfig::default());
    }
}
