//! # Lorenzsol
//!
//! Lorenzsol samples trajectories of the Lorenz system
//!
//! $$
//! \frac{dx}{dt} = \sigma (y - x), \quad \frac{dy}{dt} = x (\rho - z) - y, \quad \frac{dz}{dt} = x y - \beta z
//! $$
//!
//! on a uniform output grid, for use by an animation or rendering layer. The system is integrated with
//! an adaptive explicit Runge-Kutta method, and the samples are read off the dense output of the integrator,
//! so the output spacing `dt` is independent of the integrator's internal step.
//!
//! ## Sampling a trajectory
//!
//! Use [sample_trajectory] with a set of [LorenzParameters], an initial state, a duration and an output step.
//! `rho` must always be given, use [LorenzParameters::classical] for the usual `sigma = 10`, `beta = 8/3`.
//! For a different Runge-Kutta pair, tolerances or step size control use a [TrajectorySampler].
//!
//! A [Trajectory] can be played back with [Trajectory::position_at] and [Trajectory::tail], which map an
//! elapsed animation time to a position and to the recently traced path.
//!
//! ## Scenes
//!
//! A [SceneConfig] describes an ensemble of trajectories started a small distance `epsilon` apart, which
//! is sampled into an [Ensemble]. Presets are provided for the attractor scenes, e.g. [SceneConfig::lorenz_attractor].
//!
//! ## The integrator
//!
//! The explicit Runge-Kutta solver [ExplicitRk] can also be used directly on any set of [OdeEquations],
//! for example one assembled with the [OdeBuilder]. Two tableaus are provided, [Tableau::dopri5] and [Tableau::tsit45].
//! The solver implements [OdeSolverMethod], which gives [OdeSolverMethod::step], [OdeSolverMethod::set_stop_time],
//! [OdeSolverMethod::interpolate] and the higher level [OdeSolverMethod::solve] and [OdeSolverMethod::solve_dense].
//!
//! ## Logging
//!
//! Lorenzsol emits [tracing] events: accepted steps at `trace` level, rejected steps and sampling summaries at
//! `debug` and integration failures at `warn`. Install any subscriber to see them.

pub mod error;
pub mod ode_equations;
pub mod ode_solver;
pub mod op;
pub mod scalar;
pub mod scene;
pub mod trajectory;
pub mod vector;

pub use error::{InvalidArgumentError, LorenzsolError, OdeSolverError};
pub use ode_equations::{
    lorenz::{
        lorenz_field, lorenz_problem, LorenzEquations, LorenzInit, LorenzParameters, LorenzRhs,
    },
    OdeEquations, OdeSolverEquations,
};
pub use ode_solver::{
    builder::OdeBuilder,
    config::ExplicitRkConfig,
    explicit_rk::ExplicitRk,
    method::{OdeSolverMethod, OdeSolverStopReason},
    problem::OdeSolverProblem,
    runge_kutta::RkStatistics,
    state::RkState,
    tableau::Tableau,
};
pub use op::{
    closure::Closure, constant_closure::ConstantClosure, ConstantOp, NonLinearOp, Op,
    OpStatistics,
};
pub use scalar::Scalar;
pub use scene::{Ensemble, SceneConfig};
pub use trajectory::{
    sample_times, sample_trajectory, RkMethod, Trajectory, TrajectorySampler,
};
pub use vector::Vector;
