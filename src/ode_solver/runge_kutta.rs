use nalgebra::{ComplexField, DMatrix, DVector};
use num_traits::{One, Zero};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::{
    error::{LorenzsolError, OdeSolverError},
    ode_solver_error, NonLinearOp, OdeEquations, OdeSolverProblem, OdeSolverStopReason, RkState,
    Scalar, Tableau, Vector,
};

#[derive(Clone, Debug, Serialize, Default)]
pub struct RkStatistics {
    pub number_of_steps: usize,
    pub number_of_error_test_failures: usize,
}

/// A Runge-Kutta method.
///
/// The particular method is defined by the [Tableau] used to create the solver.
/// If the `beta` matrix of the [Tableau] is present this is used for interpolation, otherwise hermite interpolation is used.
///
/// Restrictions:
/// - The upper triangular and diagonal parts of the `a` matrix must be zero (i.e. explicit).
/// - The last row of the `a` matrix must be the same as the `b` vector, and the last element of the `c` vector must be 1 (i.e. first same as last)
pub(crate) struct Rk<'a, Eqn>
where
    Eqn: OdeEquations,
{
    problem: &'a OdeSolverProblem<Eqn>,
    tableau: Tableau<Eqn::T>,
    state: RkState<Eqn::T>,
    old_state: RkState<Eqn::T>,
    a_rows: Vec<DVector<Eqn::T>>,
    statistics: RkStatistics,
    tstop: Option<Eqn::T>,
    diff: DMatrix<Eqn::T>,
    error: DVector<Eqn::T>,
    is_state_mutated: bool,
}

impl<'a, Eqn> Rk<'a, Eqn>
where
    Eqn: OdeEquations,
{
    pub(crate) fn new(
        problem: &'a OdeSolverProblem<Eqn>,
        state: RkState<Eqn::T>,
        tableau: Tableau<Eqn::T>,
    ) -> Result<Self, LorenzsolError> {
        state.check_consistent_with_problem(problem)?;

        let nstates = state.y.len();
        let s = tableau.s();

        // row i of a, restricted to the stages that are already known when stage i is computed
        let mut a_rows = Vec::with_capacity(s);
        for i in 0..s {
            let mut row = Vec::with_capacity(i);
            for j in 0..i {
                row.push(tableau.a()[(i, j)]);
            }
            a_rows.push(DVector::from_vec(row));
        }

        let diff = DMatrix::zeros(nstates, s);
        let error = DVector::zeros(nstates);
        let old_state = state.clone();

        Ok(Self {
            problem,
            tableau,
            state,
            old_state,
            a_rows,
            statistics: RkStatistics::default(),
            tstop: None,
            diff,
            error,
            is_state_mutated: false,
        })
    }

    pub(crate) fn check_explicit_rk(tableau: &Tableau<Eqn::T>) -> Result<(), LorenzsolError> {
        // check that the upper triangular and diagonal parts of a are zero
        let s = tableau.s();
        for i in 0..s {
            for j in i..s {
                if tableau.a()[(i, j)] != Eqn::T::zero() {
                    return Err(ode_solver_error!(
                        InvalidTableau,
                        format!(
                            "Invalid tableau, expected a(i, j) = 0 for i >= j, but found a({}, {}) = {}",
                            i,
                            j,
                            tableau.a()[(i, j)]
                        )
                    ));
                }
            }
        }

        // check last row of a is the same as b
        for i in 0..s {
            if tableau.a()[(s - 1, i)] != tableau.b()[i] {
                return Err(ode_solver_error!(
                    InvalidTableau,
                    "Invalid tableau, expected a(s-1, i) = b(i)"
                ));
            }
        }

        // check that last c is 1
        if tableau.c()[s - 1] != Eqn::T::one() {
            return Err(ode_solver_error!(
                InvalidTableau,
                "Invalid tableau, expected c(s-1) = 1"
            ));
        }

        // check that first c is 0
        if tableau.c()[0] != Eqn::T::zero() {
            return Err(ode_solver_error!(
                InvalidTableau,
                "Invalid tableau, expected c(0) = 0"
            ));
        }
        Ok(())
    }

    pub(crate) fn tableau(&self) -> &Tableau<Eqn::T> {
        &self.tableau
    }

    pub(crate) fn get_statistics(&self) -> &RkStatistics {
        &self.statistics
    }

    pub(crate) fn set_state(&mut self, state: RkState<Eqn::T>) {
        self.is_state_mutated = true;
        self.state = state;
    }

    pub(crate) fn into_state(self) -> RkState<Eqn::T> {
        self.state
    }

    pub(crate) fn order(&self) -> usize {
        self.tableau.order()
    }

    pub(crate) fn problem(&self) -> &'a OdeSolverProblem<Eqn> {
        self.problem
    }

    pub(crate) fn state(&self) -> &RkState<Eqn::T> {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut RkState<Eqn::T> {
        self.is_state_mutated = true;
        &mut self.state
    }

    pub(crate) fn set_stop_time(&mut self, tstop: Eqn::T) -> Result<(), LorenzsolError> {
        self.tstop = Some(tstop);
        match self.handle_tstop(tstop) {
            Ok(None) => Ok(()),
            Ok(Some(_)) => {
                self.tstop = None;
                Err(LorenzsolError::from(OdeSolverError::StopTimeAtCurrentTime))
            }
            Err(err) => {
                self.tstop = None;
                Err(err)
            }
        }
    }

    pub(crate) fn start_step(&mut self) -> Result<Eqn::T, LorenzsolError> {
        if self.is_state_mutated {
            self.state.check_consistent_with_problem(self.problem)?;
            // reinitialise tstop if needed
            if let Some(t_stop) = self.tstop {
                self.set_stop_time(t_stop)?;
            }
            self.is_state_mutated = false;
        }
        if !self.state.y.all_finite() {
            return Err(LorenzsolError::from(OdeSolverError::NonFiniteState {
                time: self.state.t.to_f64_lossy(),
            }));
        }
        Ok(self.state.h)
    }

    /// Step size scaling `0.9 * error_norm^(-1 / (2 * (order + 1)))`, clamped to `[min_factor, max_factor]`.
    ///
    /// `error_norm` is a mean squared norm, hence the extra factor of two in the exponent.
    pub(crate) fn factor(
        &self,
        error_norm: Eqn::T,
        safety_factor: f64,
        min_factor: Eqn::T,
        max_factor: Eqn::T,
    ) -> Eqn::T {
        if !error_norm.is_finite() {
            return min_factor;
        }
        let safety = Eqn::T::constant(0.9 * safety_factor);
        let mut factor =
            safety * error_norm.powf(Eqn::T::constant(-0.5 / (self.order() as f64 + 1.0)));
        if factor < min_factor {
            factor = min_factor;
        }
        if factor > max_factor {
            factor = max_factor;
        }
        factor
    }

    /// The first stage is the derivative at the start of the step, which is already known.
    pub(crate) fn start_step_attempt(&mut self, h: Eqn::T) {
        self.diff
            .column_mut(0)
            .axpy(h, &self.state.dy, Eqn::T::zero());
    }

    pub(crate) fn do_stage(&mut self, i: usize, h: Eqn::T) {
        let t = self.state.t + self.tableau.c()[i] * h;

        // y_i = y + sum_j a_ij * h * k_j
        self.old_state.y.copy_from(&self.state.y);
        self.old_state.y.gemv(
            Eqn::T::one(),
            &self.diff.columns(0, i),
            &self.a_rows[i],
            Eqn::T::one(),
        );

        // update diff with the stage derivative
        self.problem
            .eqn
            .rhs()
            .call_inplace(&self.old_state.y, t, &mut self.old_state.dy);
        self.diff
            .column_mut(i)
            .axpy(h, &self.old_state.dy, Eqn::T::zero());
    }

    fn handle_tstop(
        &mut self,
        tstop: Eqn::T,
    ) -> Result<Option<OdeSolverStopReason>, LorenzsolError> {
        let state = &mut self.state;
        // check if the we are at tstop
        let troundoff = Eqn::T::constant(100.0) * Eqn::T::EPSILON * (state.t.abs() + state.h.abs());
        if (state.t - tstop).abs() <= troundoff {
            return Ok(Some(OdeSolverStopReason::TstopReached));
        } else if (state.h > Eqn::T::zero() && tstop < state.t - troundoff)
            || (state.h < Eqn::T::zero() && tstop > state.t + troundoff)
        {
            return Err(LorenzsolError::from(
                OdeSolverError::StopTimeBeforeCurrentTime {
                    stop_time: tstop.to_f64_lossy(),
                    state_time: state.t.to_f64_lossy(),
                },
            ));
        }

        // check if the next step will be beyond tstop, if so adjust the step size
        if (state.h > Eqn::T::zero() && state.t + state.h > tstop + troundoff)
            || (state.h < Eqn::T::zero() && state.t + state.h < tstop - troundoff)
        {
            let factor = (tstop - state.t) / state.h;
            state.h *= factor;
        }
        Ok(None)
    }

    /// Mean squared norm of the embedded error estimate, scaled by the tolerances at the start of the step.
    pub(crate) fn error_norm(&mut self) -> Eqn::T {
        self.error
            .gemv(Eqn::T::one(), &self.diff, self.tableau.d(), Eqn::T::zero());
        let atol = &self.problem.atol;
        let rtol = self.problem.rtol;
        self.error.squared_norm(&self.state.y, atol, rtol)
    }

    pub(crate) fn error_test_fail(
        &mut self,
        h: Eqn::T,
        nattempts: usize,
        max_error_test_fails: usize,
        min_timestep: Eqn::T,
    ) -> Result<(), LorenzsolError> {
        self.statistics.number_of_error_test_failures += 1;
        debug!(t = %self.state.t, h = %h, nattempts, "error test failed");
        // if too many error test failures, then fail
        if nattempts >= max_error_test_fails {
            warn!(t = %self.state.t, nattempts, "too many error test failures");
            return Err(LorenzsolError::from(
                OdeSolverError::TooManyErrorTestFailures {
                    time: self.state.t.to_f64_lossy(),
                },
            ));
        }
        // if step size too small, then fail
        if h.abs() < min_timestep {
            warn!(t = %self.state.t, h = %h, "step size too small");
            return Err(LorenzsolError::from(OdeSolverError::StepSizeTooSmall {
                time: self.state.t.to_f64_lossy(),
            }));
        }
        Ok(())
    }

    pub(crate) fn step_accepted(
        &mut self,
        h: Eqn::T,
        new_h: Eqn::T,
    ) -> Result<OdeSolverStopReason, LorenzsolError> {
        // the last stage already holds y and dy at the end of the step
        self.old_state.t = self.state.t + h;
        self.old_state.h = new_h;
        std::mem::swap(&mut self.old_state, &mut self.state);

        // update statistics
        self.statistics.number_of_steps += 1;
        trace!(t = %self.state.t, h = %h, "step accepted");

        if !self.state.y.all_finite() {
            warn!(t = %self.state.t, "non-finite state");
            return Err(LorenzsolError::from(OdeSolverError::NonFiniteState {
                time: self.state.t.to_f64_lossy(),
            }));
        }

        // check if the we are at tstop
        if let Some(tstop) = self.tstop {
            if let Some(OdeSolverStopReason::TstopReached) = self.handle_tstop(tstop)? {
                self.state.t = tstop;
                self.tstop = None; // reset tstop
                return Ok(OdeSolverStopReason::TstopReached);
            }
        }

        // just a normal step, no tstop reached
        Ok(OdeSolverStopReason::InternalTimestep)
    }

    fn interpolate_from_diff(
        y0: &DVector<Eqn::T>,
        beta_f: &DVector<Eqn::T>,
        diff: &DMatrix<Eqn::T>,
        ret: &mut DVector<Eqn::T>,
    ) {
        // ret = old_y + sum_{i=0}^{s_star-1} beta[i] * diff[:, i]
        ret.copy_from(y0);
        ret.gemv(Eqn::T::one(), diff, beta_f, Eqn::T::one());
    }

    fn interpolate_beta_function(theta: Eqn::T, beta: &DMatrix<Eqn::T>) -> DVector<Eqn::T> {
        let poly_order = beta.ncols();
        let mut thetav = Vec::with_capacity(poly_order);
        thetav.push(theta);
        for i in 1..poly_order {
            thetav.push(theta * thetav[i - 1]);
        }
        // beta_poly = beta * thetav
        beta * DVector::from_vec(thetav)
    }

    fn interpolate_hermite(
        theta: Eqn::T,
        u0: &DVector<Eqn::T>,
        u1: &DVector<Eqn::T>,
        diff: &DMatrix<Eqn::T>,
        y: &mut DVector<Eqn::T>,
    ) {
        let one = Eqn::T::one();
        let two = Eqn::T::constant(2.0);
        let f0 = diff.column(0);
        let f1 = diff.column(diff.ncols() - 1);

        y.copy_from(u1);
        *y -= u0;
        y.axpy(theta - one, &f0, one - two * theta);
        y.axpy(theta, &f1, one);
        y.axpy(one - theta, u0, theta * (theta - one));
        y.axpy(theta, u1, one);
    }

    pub(crate) fn interpolate_inplace(
        &self,
        t: Eqn::T,
        ret: &mut DVector<Eqn::T>,
    ) -> Result<(), LorenzsolError> {
        if ret.len() != self.state.y.len() {
            return Err(LorenzsolError::from(
                OdeSolverError::InterpolationVectorWrongSize {
                    expected: self.state.y.len(),
                    found: ret.len(),
                },
            ));
        }
        if t == self.state.t {
            ret.copy_from(&self.state.y);
            return Ok(());
        }
        if self.is_state_mutated {
            return Err(ode_solver_error!(InterpolationTimeOutsideCurrentStep));
        }

        // check that t is within the current step depending on the direction
        let troundoff = Eqn::T::constant(100.0)
            * Eqn::T::EPSILON
            * (self.state.t.abs() + self.state.h.abs());
        let is_forward = self.state.h > Eqn::T::zero();
        if (is_forward && (t > self.state.t + troundoff || t < self.old_state.t - troundoff))
            || (!is_forward && (t < self.state.t - troundoff || t > self.old_state.t + troundoff))
        {
            return Err(ode_solver_error!(InterpolationTimeOutsideCurrentStep));
        }

        let dt = self.state.t - self.old_state.t;
        let theta = if dt == Eqn::T::zero() {
            Eqn::T::one()
        } else {
            (t - self.old_state.t) / dt
        };
        if let Some(beta) = self.tableau.beta() {
            let beta_f = Self::interpolate_beta_function(theta, beta);
            Self::interpolate_from_diff(&self.old_state.y, &beta_f, &self.diff, ret);
        } else {
            Self::interpolate_hermite(theta, &self.old_state.y, &self.state.y, &self.diff, ret);
        }
        Ok(())
    }
}
