use nalgebra::DVector;
use std::rc::Rc;

use crate::{
    error::{LorenzsolError, OdeSolverError},
    ode_solver_error,
    op::{closure::Closure, constant_closure::ConstantClosure, BuilderOp},
    ConstantOp, NonLinearOp, OdeSolverEquations, OdeSolverProblem, Scalar,
};

/// Builder for ODE problems. Use methods to set parameters and then call [OdeBuilder::build] when done.
///
/// # Example
///
/// ```rust
/// use lorenzsol::{OdeBuilder, OdeSolverMethod};
///
/// let problem = OdeBuilder::<f64>::new()
///   .rtol(1e-6)
///   .p([0.1])
///   .rhs(
///     // dy/dt = -ay
///     |x, p, _t, y| {
///       y[0] = -p[0] * x[0];
///     },
///   )
///   .init(
///     // y(0) = 1
///    |_p, _t, y| y[0] = 1.0,
///    1,
///   )
///   .build()
///   .unwrap();
///
/// let mut solver = problem.dopri5().unwrap();
/// let t = 0.4;
/// while solver.state().t <= t {
///     solver.step().unwrap();
/// }
/// let y = solver.interpolate(t);
/// ```
pub struct OdeBuilder<T: Scalar = f64, Rhs = (), Init = ()> {
    t0: T,
    h0: T,
    rtol: T,
    atol: Vec<T>,
    p: Vec<T>,
    rhs: Option<Rhs>,
    init: Option<Init>,
}

impl<T: Scalar> Default for OdeBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> OdeBuilder<T> {
    /// Create a new builder with default parameters:
    /// - t0 = 0.0
    /// - h0 = 1.0
    /// - rtol = 1e-6
    /// - atol = [1e-6]
    /// - p = []
    pub fn new() -> Self {
        Self {
            t0: T::zero(),
            h0: T::one(),
            rtol: T::constant(1e-6),
            atol: vec![T::constant(1e-6)],
            p: vec![],
            rhs: None,
            init: None,
        }
    }
}

impl<T: Scalar, Rhs, Init> OdeBuilder<T, Rhs, Init> {
    /// Set the right-hand side of the ODE.
    ///
    /// # Arguments
    ///
    /// - `rhs`: Function of type Fn(x: &V, p: &V, t: S, y: &mut V) that computes the right-hand side of the ODE.
    pub fn rhs<F>(self, rhs: F) -> OdeBuilder<T, Closure<T, F>, Init>
    where
        F: Fn(&DVector<T>, &DVector<T>, T, &mut DVector<T>),
    {
        let nstates = 0;
        OdeBuilder {
            rhs: Some(Closure::new(rhs, nstates, nstates, Rc::new(DVector::zeros(0)))),
            init: self.init,
            t0: self.t0,
            h0: self.h0,
            rtol: self.rtol,
            atol: self.atol,
            p: self.p,
        }
    }

    /// Set the initial condition of the ODE.
    ///
    /// # Arguments
    ///
    /// - `init`: Function of type Fn(p: &V, t: S, y: &mut V) that computes the initial state.
    /// - `nstates`: Number of states in the ODE.
    pub fn init<I>(self, init: I, nstates: usize) -> OdeBuilder<T, Rhs, ConstantClosure<T, I>>
    where
        I: Fn(&DVector<T>, T, &mut DVector<T>),
    {
        OdeBuilder {
            rhs: self.rhs,
            init: Some(ConstantClosure::new(
                init,
                nstates,
                Rc::new(DVector::zeros(0)),
            )),
            t0: self.t0,
            h0: self.h0,
            rtol: self.rtol,
            atol: self.atol,
            p: self.p,
        }
    }

    pub fn t0(mut self, t0: f64) -> Self {
        self.t0 = T::constant(t0);
        self
    }

    pub fn h0(mut self, h0: f64) -> Self {
        self.h0 = T::constant(h0);
        self
    }

    /// Set the relative tolerance.
    pub fn rtol(mut self, rtol: f64) -> Self {
        self.rtol = T::constant(rtol);
        self
    }

    /// Set the absolute tolerance.
    pub fn atol<V>(mut self, atol: V) -> Self
    where
        V: IntoIterator<Item = f64>,
    {
        self.atol = atol.into_iter().map(T::constant).collect();
        self
    }

    /// Set the parameters.
    pub fn p<V>(mut self, p: V) -> Self
    where
        V: IntoIterator<Item = f64>,
    {
        self.p = p.into_iter().map(T::constant).collect();
        self
    }

    fn build_atol(atol: Vec<T>, nstates: usize) -> Result<DVector<T>, LorenzsolError> {
        if atol.iter().any(|&a| !(a > T::zero())) {
            return Err(ode_solver_error!(
                BuilderError,
                "Absolute tolerances must be positive"
            ));
        }
        if atol.len() == 1 {
            Ok(DVector::from_element(nstates, atol[0]))
        } else if atol.len() != nstates {
            Err(ode_solver_error!(
                BuilderError,
                format!(
                    "Invalid number of absolute tolerances. Expected 1 or {}, got {}.",
                    nstates,
                    atol.len()
                )
            ))
        } else {
            Ok(DVector::from_vec(atol))
        }
    }

    pub fn build(self) -> Result<OdeSolverProblem<OdeSolverEquations<T, Rhs, Init>>, LorenzsolError>
    where
        Rhs: NonLinearOp<T = T> + BuilderOp,
        Init: ConstantOp<T = T> + BuilderOp,
    {
        let p = Rc::new(DVector::from_vec(self.p));
        let mut rhs = self
            .rhs
            .ok_or(ode_solver_error!(BuilderError, "Missing right-hand side"))?;
        let mut init = self
            .init
            .ok_or(ode_solver_error!(BuilderError, "Missing initial state"))?;
        if !(self.rtol > T::zero()) {
            return Err(ode_solver_error!(
                BuilderError,
                "Relative tolerance must be positive"
            ));
        }

        init.set_params(p.clone());
        let y0 = init.call(self.t0);
        let nstates = y0.len();

        rhs.set_nstates(nstates);
        rhs.set_nout(nstates);
        rhs.set_params(p.clone());

        let atol = Self::build_atol(self.atol, nstates)?;
        let eqn = OdeSolverEquations::new(rhs, init, p);
        Ok(OdeSolverProblem::new(eqn, self.rtol, atol, self.t0, self.h0))
    }
}

#[cfg(test)]
mod test {
    use crate::{error::LorenzsolError, OdeBuilder, OdeEquations, Op};

    #[test]
    fn build_sizes_ops_from_initial_state() {
        let problem = OdeBuilder::<f64>::new()
            .p([0.5, 2.0])
            .rhs(|x, p, _t, y| {
                y[0] = -p[0] * x[0];
                y[1] = -p[0] * x[1];
            })
            .init(|p, _t, y| y.fill(p[1]), 2)
            .build()
            .unwrap();
        assert_eq!(problem.eqn.nstates(), 2);
        assert_eq!(problem.eqn.nparams(), 2);
        assert_eq!(problem.eqn.rhs().nout(), 2);
        assert_eq!(problem.atol.as_slice(), &[1e-6, 1e-6]);
        assert_eq!(problem.t0, 0.0);
    }

    #[test]
    fn build_checks_tolerances() {
        let builder = || {
            OdeBuilder::<f64>::new()
                .rhs(|x, _p, _t, y| y.copy_from(x))
                .init(|_p, _t, y| y.fill(1.0), 2)
        };
        let err = builder().atol([1e-6, 1e-6, 1e-6]).build().err().unwrap();
        assert!(matches!(err, LorenzsolError::OdeSolverError(_)));
        assert!(builder().rtol(-1.0).build().is_err());
        assert!(builder().atol([0.0]).build().is_err());
        assert!(builder().atol([1e-8, 1e-7]).build().is_ok());
    }
}
