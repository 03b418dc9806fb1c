use nalgebra::DVector;

use crate::{
    error::{LorenzsolError, OdeSolverError},
    ConstantOp, NonLinearOp, OdeEquations, OdeSolverProblem, Op, Scalar, Vector,
};

/// State of a Runge-Kutta solver: the solution `y`, its time derivative `dy` at time `t`,
/// and the step size `h` that will be attempted next.
#[derive(Clone, Debug)]
pub struct RkState<T: Scalar> {
    pub y: DVector<T>,
    pub dy: DVector<T>,
    pub t: T,
    pub h: T,
}

impl<T: Scalar> RkState<T> {
    /// Create a new solver state from an ODE problem.
    /// This function will set the initial step size based on the given solver order.
    ///
    /// Fails with [OdeSolverError::NonFiniteState] if the initial condition or its derivative is not finite.
    pub fn new<Eqn>(
        problem: &OdeSolverProblem<Eqn>,
        solver_order: usize,
    ) -> Result<Self, LorenzsolError>
    where
        Eqn: OdeEquations<T = T>,
    {
        let mut ret = Self::new_without_initialise(problem)?;
        ret.set_step_size(problem, solver_order);
        Ok(ret)
    }

    /// Create a new solver state from an ODE problem, without computing an initial step size.
    /// The step size is set to `problem.h0`.
    pub fn new_without_initialise<Eqn>(
        problem: &OdeSolverProblem<Eqn>,
    ) -> Result<Self, LorenzsolError>
    where
        Eqn: OdeEquations<T = T>,
    {
        let t = problem.t0;
        let h = problem.h0;
        let y = problem.eqn.init().call(t);
        if !y.all_finite() {
            return Err(LorenzsolError::from(OdeSolverError::NonFiniteState {
                time: t.to_f64_lossy(),
            }));
        }
        let dy = problem.eqn.rhs().call(&y, t);
        if !dy.all_finite() {
            return Err(LorenzsolError::from(OdeSolverError::NonFiniteState {
                time: t.to_f64_lossy(),
            }));
        }
        Ok(Self { y, dy, t, h })
    }

    pub fn check_consistent_with_problem<Eqn>(
        &self,
        problem: &OdeSolverProblem<Eqn>,
    ) -> Result<(), LorenzsolError>
    where
        Eqn: OdeEquations<T = T>,
    {
        let nstates = problem.eqn.rhs().nstates();
        if self.y.len() != nstates {
            return Err(LorenzsolError::from(OdeSolverError::StateProblemMismatch {
                expected: nstates,
                found: self.y.len(),
            }));
        }
        if self.dy.len() != nstates {
            return Err(LorenzsolError::from(OdeSolverError::StateProblemMismatch {
                expected: nstates,
                found: self.dy.len(),
            }));
        }
        Ok(())
    }

    /// Estimate a first step size from the norms of the initial state, its derivative and a trial
    /// explicit Euler step of the derivative (Hairer, Norsett & Wanner, Solving ODEs I, II.4).
    ///
    /// Costs one extra evaluation of the right-hand side.
    pub fn set_step_size<Eqn>(&mut self, problem: &OdeSolverProblem<Eqn>, solver_order: usize)
    where
        Eqn: OdeEquations<T = T>,
    {
        let atol = &problem.atol;
        let rtol = problem.rtol;
        let is_neg_h = problem.h0 < T::zero();

        let y0 = &self.y;
        let f0 = &self.dy;
        let d0 = y0.squared_norm(y0, atol, rtol).sqrt();
        let d1 = f0.squared_norm(y0, atol, rtol).sqrt();

        let h0 = if d0 < T::constant(1e-5) || d1 < T::constant(1e-5) {
            T::constant(1e-6)
        } else {
            T::constant(0.01) * (d0 / d1)
        };

        // make sure we preserve the sign of h0
        let (y1, t1) = if is_neg_h {
            (y0 - f0 * h0, self.t - h0)
        } else {
            (y0 + f0 * h0, self.t + h0)
        };
        let f1 = problem.eqn.rhs().call(&y1, t1);

        let df = f1 - f0;
        let d2 = df.squared_norm(y0, atol, rtol).sqrt() / h0.abs();

        let mut max_d = d2;
        if max_d < d1 {
            max_d = d1;
        }
        let h1 = if max_d < T::constant(1e-15) {
            let h1 = h0 * T::constant(1e-3);
            if h1 < T::constant(1e-6) {
                T::constant(1e-6)
            } else {
                h1
            }
        } else {
            (T::constant(0.01) / max_d).powf(T::one() / T::constant(1.0 + solver_order as f64))
        };

        self.h = T::constant(100.0) * h0;
        if self.h > h1 {
            self.h = h1;
        }

        if is_neg_h {
            self.h = -self.h;
        }
    }
}
