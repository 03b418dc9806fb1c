use nalgebra::DVector;
use serde::Serialize;
use std::rc::Rc;

use crate::Scalar;

pub mod closure;
pub mod constant_closure;

/// A generic operator trait.
///
/// Op is a trait for operators that, given a paramter vector `p`, operates on an input vector `x` to produce an output vector `y`.
/// It defines the number of states (i.e. length of `x`), the number of outputs (i.e. length of `y`), and number of parameters (i.e. length of `p`) of the operator.
pub trait Op {
    type T: Scalar;

    /// Return the number of input states of the operator.
    fn nstates(&self) -> usize;

    /// Return the number of outputs of the operator.
    fn nout(&self) -> usize;

    /// Return the number of parameters of the operator.
    fn nparams(&self) -> usize;

    /// Return statistics about the operator (e.g. how many times it was called)
    fn statistics(&self) -> OpStatistics {
        OpStatistics::default()
    }
}

/// An operator whose output depends on the input state and time, `y = F(x, t)`.
pub trait NonLinearOp: Op {
    /// Compute the operator `F(x, t)` at a given state and time, and store the result in `y`.
    fn call_inplace(&self, x: &DVector<Self::T>, t: Self::T, y: &mut DVector<Self::T>);

    /// Compute the operator `F(x, t)` at a given state and time.
    fn call(&self, x: &DVector<Self::T>, t: Self::T) -> DVector<Self::T> {
        let mut y = DVector::zeros(self.nout());
        self.call_inplace(x, t, &mut y);
        y
    }
}

/// An operator that only depends on time, `y = F(t)`, used for initial conditions.
pub trait ConstantOp: Op {
    /// Compute the operator `F(t)` at a given time, and store the result in `y`.
    fn call_inplace(&self, t: Self::T, y: &mut DVector<Self::T>);

    /// Compute the operator `F(t)` at a given time.
    fn call(&self, t: Self::T) -> DVector<Self::T> {
        let mut y = DVector::zeros(self.nout());
        ConstantOp::call_inplace(self, t, &mut y);
        y
    }
}

/// Operators created by the [crate::OdeBuilder] only learn their sizes once the initial state is known.
pub trait BuilderOp: Op {
    fn set_nstates(&mut self, nstates: usize);
    fn set_nout(&mut self, nout: usize);
    fn set_params(&mut self, p: Rc<DVector<Self::T>>);
}

#[derive(Default, Clone, Debug, Serialize)]
pub struct OpStatistics {
    pub number_of_calls: usize,
}

impl OpStatistics {
    pub fn increment_call(&mut self) {
        self.number_of_calls += 1;
    }
}
