use nalgebra::DVector;

use crate::{
    ode_solver::problem::OdeSolverSolution, op::closure::Closure,
    op::constant_closure::ConstantClosure, OdeBuilder, OdeSolverEquations, OdeSolverProblem,
    Scalar,
};

pub type ExponentialDecayRhs<T> =
    Closure<T, fn(&DVector<T>, &DVector<T>, T, &mut DVector<T>)>;
pub type ExponentialDecayInit<T> = ConstantClosure<T, fn(&DVector<T>, T, &mut DVector<T>)>;
pub type ExponentialDecayEquations<T> =
    OdeSolverEquations<T, ExponentialDecayRhs<T>, ExponentialDecayInit<T>>;

// exponential decay problem
// dy/dt = -ay (p = [a, y0])
fn exponential_decay<T: Scalar>(x: &DVector<T>, p: &DVector<T>, _t: T, y: &mut DVector<T>) {
    y.copy_from(x);
    *y *= -p[0];
}

fn exponential_decay_init<T: Scalar>(p: &DVector<T>, _t: T, y: &mut DVector<T>) {
    y.fill(p[1]);
}

/// Two uncoupled copies of `dy/dt = -0.1 y` with `y(0) = 1`, and the exact solution at `t = 0, 1, ..., 9`.
pub fn exponential_decay_problem<T: Scalar>() -> (
    OdeSolverProblem<ExponentialDecayEquations<T>>,
    OdeSolverSolution<T>,
) {
    let k = 0.1;
    let y0 = 1.0;
    let problem = OdeBuilder::<T>::new()
        .h0(1.0)
        .p([k, y0])
        .rhs(exponential_decay::<T> as fn(&DVector<T>, &DVector<T>, T, &mut DVector<T>))
        .init(
            exponential_decay_init::<T> as fn(&DVector<T>, T, &mut DVector<T>),
            2,
        )
        .build()
        .unwrap();
    let p = [T::constant(k), T::constant(y0)];
    let mut soln = OdeSolverSolution::default();
    for i in 0..10 {
        let t = T::constant(i as f64);
        let y0 = DVector::from_element(2, p[1]);
        let y = y0 * (-p[0] * t).exp();
        soln.push(y, t);
    }
    (problem, soln)
}
