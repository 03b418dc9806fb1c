use nalgebra::DVector;
use std::rc::Rc;

use crate::Scalar;

use super::{BuilderOp, ConstantOp, Op};

/// An initial condition given as a closure `Fn(p: &V, t: T, y: &mut V)`.
pub struct ConstantClosure<T, I>
where
    T: Scalar,
    I: Fn(&DVector<T>, T, &mut DVector<T>),
{
    func: I,
    nout: usize,
    p: Rc<DVector<T>>,
}

impl<T, I> ConstantClosure<T, I>
where
    T: Scalar,
    I: Fn(&DVector<T>, T, &mut DVector<T>),
{
    pub fn new(func: I, nout: usize, p: Rc<DVector<T>>) -> Self {
        Self { func, nout, p }
    }
}

impl<T, I> Op for ConstantClosure<T, I>
where
    T: Scalar,
    I: Fn(&DVector<T>, T, &mut DVector<T>),
{
    type T = T;
    fn nstates(&self) -> usize {
        0
    }
    fn nout(&self) -> usize {
        self.nout
    }
    fn nparams(&self) -> usize {
        self.p.len()
    }
}

impl<T, I> BuilderOp for ConstantClosure<T, I>
where
    T: Scalar,
    I: Fn(&DVector<T>, T, &mut DVector<T>),
{
    fn set_nstates(&mut self, _nstates: usize) {
        // do nothing
    }
    fn set_nout(&mut self, nout: usize) {
        self.nout = nout;
    }
    fn set_params(&mut self, p: Rc<DVector<T>>) {
        self.p = p;
    }
}

impl<T, I> ConstantOp for ConstantClosure<T, I>
where
    T: Scalar,
    I: Fn(&DVector<T>, T, &mut DVector<T>),
{
    fn call_inplace(&self, t: T, y: &mut DVector<T>) {
        (self.func)(self.p.as_ref(), t, y)
    }
}
