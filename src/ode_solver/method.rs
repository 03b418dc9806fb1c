use nalgebra::{DMatrix, DVector};
use num_traits::Zero;

use crate::{
    error::{LorenzsolError, OdeSolverError},
    ode_solver_error, OdeEquations, OdeSolverProblem, Op, RkState,
};

#[derive(Debug, PartialEq)]
pub enum OdeSolverStopReason {
    InternalTimestep,
    TstopReached,
}

/// Trait for ODE solver methods. This is the main user interface for the ODE solvers.
///
/// The solver is responsible for stepping the solution (given in the [RkState]), and interpolating the solution at a given time.
///
/// # Example
///
/// ```
/// use lorenzsol::{OdeEquations, OdeSolverMethod};
///
/// fn solve_ode<'a, Eqn>(solver: &mut impl OdeSolverMethod<'a, Eqn>, t: Eqn::T) -> nalgebra::DVector<Eqn::T>
/// where
///    Eqn: OdeEquations + 'a,
/// {
///     while solver.state().t <= t {
///         solver.step().unwrap();
///     }
///     solver.interpolate(t).unwrap()
/// }
/// ```
pub trait OdeSolverMethod<'a, Eqn>
where
    Self: Sized,
    Eqn: OdeEquations + 'a,
{
    /// Get the current problem
    fn problem(&self) -> &'a OdeSolverProblem<Eqn>;

    /// Replace the current state of the solver with a new state.
    fn set_state(&mut self, state: RkState<Eqn::T>);

    /// Take the current state of the solver, returning it to the user.
    fn into_state(self) -> RkState<Eqn::T>;

    /// Get the current state of the solver
    fn state(&self) -> &RkState<Eqn::T>;

    /// Get a mutable reference to the current state of the solver
    /// Note that calling this will cause the next call to `step` to perform some reinitialisation to take into
    /// account the mutated state, and interpolation is only possible at the current time until the next step is taken.
    fn state_mut(&mut self) -> &mut RkState<Eqn::T>;

    /// Step the solution forward by one step, altering the internal state of the solver.
    /// The return value is a `Result` containing the reason for stopping the solver, possible reasons are:
    /// - `InternalTimestep`: The solver has taken a step forward in time, the internal state of the solver is at time self.state().t
    /// - `TstopReached`: The solver has reached the stop time set by [Self::set_stop_time], the internal state of the solver is at time `tstop`, which is the same as `self.state().t`
    fn step(&mut self) -> Result<OdeSolverStopReason, LorenzsolError>;

    /// Set a stop time for the solver. The solver will stop when the internal time reaches this time.
    /// Once it stops, the stop time is unset. If `tstop` is at or before the current internal time, an error is returned.
    fn set_stop_time(&mut self, tstop: Eqn::T) -> Result<(), LorenzsolError>;

    /// Interpolate the solution at a given time. This time should be between the current time and the last solver time step
    fn interpolate(&self, t: Eqn::T) -> Result<DVector<Eqn::T>, LorenzsolError> {
        let nstates = self.problem().eqn.rhs().nstates();
        let mut y = DVector::zeros(nstates);
        self.interpolate_inplace(t, &mut y)?;
        Ok(y)
    }

    /// Interpolate the solution at a given time and place in `y`. This time should be between the current time and the last solver time step
    fn interpolate_inplace(&self, t: Eqn::T, y: &mut DVector<Eqn::T>)
        -> Result<(), LorenzsolError>;

    /// Get the current order of accuracy of the solver (e.g. explict euler method is first-order)
    fn order(&self) -> usize;

    /// Solve the ODE from the current time to `final_time`.
    ///
    /// This method integrates the system and returns the solution at adaptive timepoints chosen by the solver's
    /// internal error control mechanism. This is useful when you want the minimal number of timepoints for a given accuracy.
    ///
    /// # Returns
    /// A tuple of `(solution_matrix, times)` where:
    /// - `solution_matrix` is a dense matrix with one column per solution time and one row per state variable
    /// - `times` is a vector of times at which the solution was evaluated
    ///
    /// # Post-condition
    /// After the solver finishes, the internal state of the solver is at time `final_time`.
    fn solve(
        &mut self,
        final_time: Eqn::T,
    ) -> Result<(DMatrix<Eqn::T>, Vec<Eqn::T>), LorenzsolError> {
        let nrows = self.problem().eqn.rhs().nstates();
        const INITIAL_NCOLS: usize = 10;
        let mut ret_y = DMatrix::zeros(nrows, INITIAL_NCOLS);
        let mut ret_t = Vec::new();

        // do the main loop
        write_out(self, &mut ret_y, &mut ret_t);
        self.set_stop_time(final_time)?;
        loop {
            match self.step()? {
                OdeSolverStopReason::InternalTimestep => {
                    write_out(self, &mut ret_y, &mut ret_t);
                }
                OdeSolverStopReason::TstopReached => {
                    write_out(self, &mut ret_y, &mut ret_t);
                    break;
                }
            }
        }
        let ntimes = ret_t.len();
        ret_y.resize_mut(nrows, ntimes, Eqn::T::zero());
        Ok((ret_y, ret_t))
    }

    /// Solve the ODE from the current time to `t_eval[t_eval.len()-1]`, evaluating at specified times.
    ///
    /// This method integrates the system and returns the solution interpolated at the specified times.
    /// The solver uses its own internal timesteps for accuracy, but the output is interpolated to the
    /// requested evaluation times.
    ///
    /// # Arguments
    /// - `t_eval`: A slice of times at which to evaluate the solution. Times should be in increasing order
    ///   and not before the current time.
    ///
    /// # Returns
    /// A dense matrix with one column per evaluation time (in the same order as `t_eval`) and one row per state variable.
    ///
    /// # Post-condition
    /// After the solver finishes, the internal state of the solver is at time `t_eval[t_eval.len()-1]`.
    fn solve_dense(&mut self, t_eval: &[Eqn::T]) -> Result<DMatrix<Eqn::T>, LorenzsolError> {
        let nstates = self.problem().eqn.rhs().nstates();
        let t0 = self.state().t;
        let Some(&t_last) = t_eval.last() else {
            return Err(ode_solver_error!(InvalidTEval));
        };
        if t_eval[0] < t0 || t_eval.windows(2).any(|w| w[0] > w[1]) {
            return Err(ode_solver_error!(InvalidTEval));
        }
        let mut ret = DMatrix::zeros(nstates, t_eval.len());
        let mut tmp_nstates = DVector::zeros(nstates);

        // a grid that ends at the current time needs no integration
        if t_last > t0 {
            self.set_stop_time(t_last)?;
        }
        for (i, t) in t_eval.iter().enumerate() {
            while self.state().t < *t {
                if let OdeSolverStopReason::TstopReached = self.step()? {
                    break;
                }
            }
            self.interpolate_inplace(*t, &mut tmp_nstates)?;
            ret.column_mut(i).copy_from(&tmp_nstates);
        }
        Ok(ret)
    }
}

/// utility function to write out the solution at a given timepoint
/// This function is used by the `solve` method to write out the solution at a given timepoint.
fn write_out<'a, Eqn: OdeEquations + 'a, S: OdeSolverMethod<'a, Eqn>>(
    s: &S,
    ret_y: &mut DMatrix<Eqn::T>,
    ret_t: &mut Vec<Eqn::T>,
) {
    let state = s.state();
    ret_t.push(state.t);
    let i = ret_t.len() - 1;
    if i >= ret_y.ncols() {
        const GROWTH_FACTOR: usize = 2;
        let (nrows, ncols) = ret_y.shape();
        ret_y.resize_mut(nrows, GROWTH_FACTOR * ncols, Eqn::T::zero());
    }
    ret_y.column_mut(i).copy_from(&state.y);
}

#[cfg(test)]
mod test {
    use crate::{
        error::{LorenzsolError, OdeSolverError},
        ode_equations::test_models::exponential_decay::exponential_decay_problem,
        OdeSolverMethod,
    };

    #[test]
    fn test_solve() {
        let (problem, _soln) = exponential_decay_problem::<f64>();
        let mut s = problem.dopri5().unwrap();

        let final_time = 10.0;
        let (y, t) = s.solve(final_time).unwrap();
        assert!((t[0] - 0.0).abs() < 1e-10);
        assert!((t[t.len() - 1] - final_time).abs() < 1e-10);
        assert_eq!(y.ncols(), t.len());
        assert!(t.windows(2).all(|w| w[0] < w[1]));
        for (i, t_i) in t.iter().enumerate() {
            let expect = (-0.1 * t_i).exp();
            assert!((y[(0, i)] - expect).abs() < 1e-5, "t = {t_i}");
            assert!((y[(1, i)] - expect).abs() < 1e-5, "t = {t_i}");
        }
        assert_eq!(s.state().t, final_time);
    }

    #[test]
    fn test_solve_dense() {
        let (problem, _soln) = exponential_decay_problem::<f64>();
        let mut s = problem.dopri5().unwrap();

        let t_eval = vec![0.0, 1.0, 7.0, 10.0];
        let y = s.solve_dense(t_eval.as_slice()).unwrap();
        assert_eq!(y.ncols(), t_eval.len());
        assert_eq!(y[(0, 0)], 1.0);
        for (i, t) in t_eval.iter().enumerate() {
            let expect = (-0.1 * t).exp();
            assert!((y[(0, i)] - expect).abs() < 1e-5, "t = {t}");
        }
        assert_eq!(s.state().t, 10.0);
    }

    #[test]
    fn test_solve_dense_at_current_time_only() {
        let (problem, _soln) = exponential_decay_problem::<f64>();
        let mut s = problem.dopri5().unwrap();
        let y = s.solve_dense(&[0.0]).unwrap();
        assert_eq!(y.ncols(), 1);
        assert_eq!(y[(0, 0)], 1.0);
        assert_eq!(y[(1, 0)], 1.0);
        assert_eq!(s.state().t, 0.0);
    }

    #[test]
    fn test_solve_dense_rejects_bad_t_eval() {
        let (problem, _soln) = exponential_decay_problem::<f64>();
        let mut s = problem.dopri5().unwrap();
        for t_eval in [vec![], vec![1.0, 0.5], vec![-1.0, 0.0]] {
            let err = s.solve_dense(t_eval.as_slice()).err().unwrap();
            assert!(
                matches!(
                    err,
                    LorenzsolError::OdeSolverError(OdeSolverError::InvalidTEval)
                ),
                "{t_eval:?}"
            );
        }
    }
}
