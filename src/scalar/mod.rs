use std::fmt::Display;

pub trait Scalar:
    nalgebra::Scalar
    + nalgebra::RealField
    + num_traits::FromPrimitive
    + num_traits::ToPrimitive
    + Display
    + Copy
    + PartialOrd
{
    const EPSILON: Self;

    /// Convert a literal constant into this scalar type.
    fn constant(value: f64) -> Self;

    /// Lossy conversion used when reporting times in error messages.
    fn to_f64_lossy(self) -> f64;
}

impl Scalar for f64 {
    const EPSILON: Self = f64::EPSILON;
    #[inline]
    fn constant(value: f64) -> Self {
        value
    }
    fn to_f64_lossy(self) -> f64 {
        self
    }
}

impl Scalar for f32 {
    const EPSILON: Self = f32::EPSILON;
    #[inline]
    fn constant(value: f64) -> Self {
        value as f32
    }
    fn to_f64_lossy(self) -> f64 {
        f64::from(self)
    }
}
