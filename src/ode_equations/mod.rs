use nalgebra::DVector;
use std::rc::Rc;

use crate::{
    op::{BuilderOp, OpStatistics},
    ConstantOp, NonLinearOp, Op, Scalar,
};

pub mod lorenz;

#[cfg(test)]
pub mod test_models;

/// this is the trait that defines the ODE equations of the form
///
/// $$
///  \frac{dy}{dt} = F(t, y)
///  y(t_0) = y_0(t_0)
/// $$
///
/// The ODE equations are defined by:
/// - the right-hand side function `F(t, y)`, which is given as a [NonLinearOp] using the `Rhs` associated type and [OdeEquations::rhs] function,
/// - the initial condition `y_0(t_0)`, which is given as a [ConstantOp] using the `Init` associated type and [OdeEquations::init] function.
///
/// The explicit solvers in this crate only ever call the right-hand side, there is no mass matrix, root function or output function.
pub trait OdeEquations {
    type T: Scalar;
    type Rhs: NonLinearOp<T = Self::T>;
    type Init: ConstantOp<T = Self::T>;

    /// returns the right-hand side function `F(t, y)` as a [NonLinearOp]
    fn rhs(&self) -> &Self::Rhs;

    /// returns the initial condition, i.e. `y(t)`, where `t` is the initial time
    fn init(&self) -> &Self::Init;

    /// sets the current parameters of the equations
    fn set_params(&mut self, p: &DVector<Self::T>);

    /// copies the current parameters of the equations into `p`
    fn get_params(&self, p: &mut DVector<Self::T>);

    fn nstates(&self) -> usize {
        self.rhs().nstates()
    }

    fn nparams(&self) -> usize {
        self.rhs().nparams()
    }

    fn statistics(&self) -> OpStatistics {
        self.rhs().statistics()
    }
}

/// This struct implements the ODE equation trait [OdeEquations] for a given right-hand side op and initial condition op.
///
/// The parameter vector is shared between the two ops, and is replaced in both when [OdeEquations::set_params] is called.
pub struct OdeSolverEquations<T, Rhs, Init>
where
    T: Scalar,
{
    rhs: Rhs,
    init: Init,
    p: Rc<DVector<T>>,
}

impl<T, Rhs, Init> OdeSolverEquations<T, Rhs, Init>
where
    T: Scalar,
    Rhs: NonLinearOp<T = T> + BuilderOp,
    Init: ConstantOp<T = T> + BuilderOp,
{
    pub fn new(rhs: Rhs, init: Init, p: Rc<DVector<T>>) -> Self {
        Self { rhs, init, p }
    }

    pub fn params(&self) -> &DVector<T> {
        self.p.as_ref()
    }
}

impl<T, Rhs, Init> OdeEquations for OdeSolverEquations<T, Rhs, Init>
where
    T: Scalar,
    Rhs: NonLinearOp<T = T> + BuilderOp,
    Init: ConstantOp<T = T> + BuilderOp,
{
    type T = T;
    type Rhs = Rhs;
    type Init = Init;

    fn rhs(&self) -> &Rhs {
        &self.rhs
    }

    fn init(&self) -> &Init {
        &self.init
    }

    fn set_params(&mut self, p: &DVector<T>) {
        assert_eq!(p.len(), self.p.len(), "wrong number of parameters");
        self.p = Rc::new(p.clone());
        self.rhs.set_params(self.p.clone());
        self.init.set_params(self.p.clone());
    }

    fn get_params(&self, p: &mut DVector<T>) {
        p.copy_from(self.p.as_ref());
    }
}
