use nalgebra::DVector;
use std::{cell::RefCell, rc::Rc};

use crate::Scalar;

use super::{BuilderOp, NonLinearOp, Op, OpStatistics};

/// A right-hand side given as a closure `Fn(x: &V, p: &V, t: T, y: &mut V)`.
///
/// The closure gets a shared reference to the parameter vector, which can be swapped with [BuilderOp::set_params]
/// without rebuilding the operator. Every call is counted in the operator [OpStatistics].
pub struct Closure<T, F>
where
    T: Scalar,
    F: Fn(&DVector<T>, &DVector<T>, T, &mut DVector<T>),
{
    func: F,
    nstates: usize,
    nout: usize,
    p: Rc<DVector<T>>,
    statistics: RefCell<OpStatistics>,
}

impl<T, F> Closure<T, F>
where
    T: Scalar,
    F: Fn(&DVector<T>, &DVector<T>, T, &mut DVector<T>),
{
    pub fn new(func: F, nstates: usize, nout: usize, p: Rc<DVector<T>>) -> Self {
        Self {
            func,
            nstates,
            nout,
            p,
            statistics: RefCell::new(OpStatistics::default()),
        }
    }
}

impl<T, F> Op for Closure<T, F>
where
    T: Scalar,
    F: Fn(&DVector<T>, &DVector<T>, T, &mut DVector<T>),
{
    type T = T;
    fn nstates(&self) -> usize {
        self.nstates
    }
    fn nout(&self) -> usize {
        self.nout
    }
    fn nparams(&self) -> usize {
        self.p.len()
    }
    fn statistics(&self) -> OpStatistics {
        self.statistics.borrow().clone()
    }
}

impl<T, F> BuilderOp for Closure<T, F>
where
    T: Scalar,
    F: Fn(&DVector<T>, &DVector<T>, T, &mut DVector<T>),
{
    fn set_nstates(&mut self, nstates: usize) {
        self.nstates = nstates;
    }
    fn set_nout(&mut self, nout: usize) {
        self.nout = nout;
    }
    fn set_params(&mut self, p: Rc<DVector<T>>) {
        self.p = p;
    }
}

impl<T, F> NonLinearOp for Closure<T, F>
where
    T: Scalar,
    F: Fn(&DVector<T>, &DVector<T>, T, &mut DVector<T>),
{
    fn call_inplace(&self, x: &DVector<T>, t: T, y: &mut DVector<T>) {
        self.statistics.borrow_mut().increment_call();
        (self.func)(x, self.p.as_ref(), t, y)
    }
}
