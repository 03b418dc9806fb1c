use nalgebra::DVector;

use crate::Scalar;

/// Extra vector operations needed by the solvers, on top of what [nalgebra] provides.
pub trait Vector {
    type T: Scalar;

    /// returns \sum_i (x_i / (|y_i| * rtol + atol_i))^2 / n
    fn squared_norm(&self, y: &Self, atol: &Self, rtol: Self::T) -> Self::T;

    /// true if every element is finite (neither infinite nor NaN)
    fn all_finite(&self) -> bool;
}

impl<T: Scalar> Vector for DVector<T> {
    type T = T;

    fn squared_norm(&self, y: &Self, atol: &Self, rtol: T) -> T {
        let mut acc = T::zero();
        if y.len() != self.len() || y.len() != atol.len() {
            panic!("Vector lengths do not match");
        }
        for i in 0..self.len() {
            let xi = self[i];
            let yi = y[i];
            let ai = atol[i];
            let scaled = xi / (yi.abs() * rtol + ai);
            acc += scaled * scaled;
        }
        acc / T::constant(self.len() as f64)
    }

    fn all_finite(&self) -> bool {
        self.iter().all(|x| x.is_finite())
    }
}
