//! The Lorenz system
//!
//! $$
//! \begin{aligned}
//! \frac{dx}{dt} &= \sigma (y - x) \\
//! \frac{dy}{dt} &= x (\rho - z) - y \\
//! \frac{dz}{dt} &= x y - \beta z
//! \end{aligned}
//! $$
//!
//! The system is autonomous, the time argument is accepted for symmetry with the solver interface and ignored.
use nalgebra::{DVector, Vector3};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

use crate::{
    error::{LorenzsolError, OdeSolverError},
    op::OpStatistics,
    ConstantOp, NonLinearOp, OdeEquations, OdeSolverProblem, Op, Scalar,
};

/// Default Prandtl number.
pub const DEFAULT_SIGMA: f64 = 10.0;
/// Default geometric factor.
pub const DEFAULT_BETA: f64 = 8.0 / 3.0;

/// The three parameters of the Lorenz vector field.
///
/// There is deliberately no `Default` impl: different scenes use different values of `rho`
/// (28 gives the classical butterfly, 50 a wider attractor), so it must always be chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LorenzParameters<T> {
    pub sigma: T,
    pub rho: T,
    pub beta: T,
}

impl<T: Scalar> LorenzParameters<T> {
    pub fn new(sigma: T, rho: T, beta: T) -> Self {
        Self { sigma, rho, beta }
    }

    /// `sigma = 10` and `beta = 8/3` with the given `rho`.
    pub fn classical(rho: T) -> Self {
        Self {
            sigma: T::constant(DEFAULT_SIGMA),
            rho,
            beta: T::constant(DEFAULT_BETA),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.sigma.is_finite() && self.rho.is_finite() && self.beta.is_finite()
    }

    /// parameters packed as `[sigma, rho, beta]`
    pub fn to_vector(&self) -> DVector<T> {
        DVector::from_vec(vec![self.sigma, self.rho, self.beta])
    }

    /// unpack `[sigma, rho, beta]`
    ///
    /// # Panics
    ///
    /// Panics if `p` does not have exactly three elements.
    pub fn from_vector(p: &DVector<T>) -> Self {
        assert_eq!(p.len(), 3, "expected [sigma, rho, beta]");
        Self::new(p[0], p[1], p[2])
    }
}

/// Evaluate the Lorenz vector field at `state`.
///
/// Pure and allocation free, defined for every finite input.
#[inline]
pub fn lorenz_field<T: Scalar>(
    _t: T,
    state: &Vector3<T>,
    params: &LorenzParameters<T>,
) -> Vector3<T> {
    let (x, y, z) = (state[0], state[1], state[2]);
    Vector3::new(
        params.sigma * (y - x),
        x * (params.rho - z) - y,
        x * y - params.beta * z,
    )
}

/// The Lorenz vector field as a right-hand side operator.
///
/// Writes straight into the output buffer provided by the solver, so a call performs no allocation.
pub struct LorenzRhs<T: Scalar> {
    params: LorenzParameters<T>,
    statistics: RefCell<OpStatistics>,
}

impl<T: Scalar> LorenzRhs<T> {
    pub fn new(params: LorenzParameters<T>) -> Self {
        Self {
            params,
            statistics: RefCell::new(OpStatistics::default()),
        }
    }

    pub fn params(&self) -> &LorenzParameters<T> {
        &self.params
    }
}

impl<T: Scalar> Op for LorenzRhs<T> {
    type T = T;
    fn nstates(&self) -> usize {
        3
    }
    fn nout(&self) -> usize {
        3
    }
    fn nparams(&self) -> usize {
        3
    }
    fn statistics(&self) -> OpStatistics {
        self.statistics.borrow().clone()
    }
}

impl<T: Scalar> NonLinearOp for LorenzRhs<T> {
    fn call_inplace(&self, x: &DVector<T>, _t: T, y: &mut DVector<T>) {
        self.statistics.borrow_mut().increment_call();
        let p = &self.params;
        y[0] = p.sigma * (x[1] - x[0]);
        y[1] = x[0] * (p.rho - x[2]) - x[1];
        y[2] = x[0] * x[1] - p.beta * x[2];
    }
}

/// Fixed initial state of a Lorenz trajectory.
pub struct LorenzInit<T: Scalar> {
    y0: Vector3<T>,
}

impl<T: Scalar> Op for LorenzInit<T> {
    type T = T;
    fn nstates(&self) -> usize {
        0
    }
    fn nout(&self) -> usize {
        3
    }
    fn nparams(&self) -> usize {
        0
    }
}

impl<T: Scalar> ConstantOp for LorenzInit<T> {
    fn call_inplace(&self, _t: T, y: &mut DVector<T>) {
        y.copy_from_slice(self.y0.as_slice());
    }
}

/// The Lorenz system together with one initial state.
pub struct LorenzEquations<T: Scalar> {
    rhs: LorenzRhs<T>,
    init: LorenzInit<T>,
}

impl<T: Scalar> LorenzEquations<T> {
    pub fn new(params: LorenzParameters<T>, initial_state: Vector3<T>) -> Self {
        Self {
            rhs: LorenzRhs::new(params),
            init: LorenzInit { y0: initial_state },
        }
    }

    pub fn params(&self) -> &LorenzParameters<T> {
        self.rhs.params()
    }

    pub fn initial_state(&self) -> &Vector3<T> {
        &self.init.y0
    }
}

impl<T: Scalar> OdeEquations for LorenzEquations<T> {
    type T = T;
    type Rhs = LorenzRhs<T>;
    type Init = LorenzInit<T>;

    fn rhs(&self) -> &LorenzRhs<T> {
        &self.rhs
    }

    fn init(&self) -> &LorenzInit<T> {
        &self.init
    }

    /// Replace `[sigma, rho, beta]`.
    ///
    /// # Panics
    ///
    /// Panics if `p` does not have exactly three elements, see [LorenzParameters::from_vector].
    fn set_params(&mut self, p: &DVector<T>) {
        // a fresh op also resets the call statistics
        self.rhs = LorenzRhs::new(LorenzParameters::from_vector(p));
    }

    fn get_params(&self, p: &mut DVector<T>) {
        p.copy_from(&self.rhs.params.to_vector());
    }
}

/// Build an [OdeSolverProblem] for the Lorenz system starting at `t = 0`.
pub fn lorenz_problem<T: Scalar>(
    params: LorenzParameters<T>,
    initial_state: Vector3<T>,
    rtol: T,
    atol: T,
) -> Result<OdeSolverProblem<LorenzEquations<T>>, LorenzsolError> {
    if !(rtol > T::zero()) || !(atol > T::zero()) {
        return Err(LorenzsolError::from(OdeSolverError::BuilderError(format!(
            "tolerances must be positive, got rtol = {rtol}, atol = {atol}"
        ))));
    }
    let eqn = LorenzEquations::new(params, initial_state);
    let atol = DVector::from_element(3, atol);
    Ok(OdeSolverProblem::new(eqn, rtol, atol, T::zero(), T::one()))
}
