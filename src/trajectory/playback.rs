//! Mapping from elapsed animation time to positions along a [Trajectory].
//!
//! Both functions are pure, so a renderer can ask for any frame in any order.
use nalgebra::Vector3;

use super::Trajectory;
use crate::Scalar;

/// Length of the trailing path drawn behind each point, in time units of the system.
pub const DEFAULT_TIME_TRACED: f64 = 3.0;

impl<T: Scalar> Trajectory<T> {
    /// Position at time `elapsed`, linearly interpolated between the two bracketing samples.
    ///
    /// Clamped to the first sample for `elapsed <= 0` (or NaN) and to the last sample past [Self::end_time].
    pub fn position_at(&self, elapsed: T) -> Vector3<T> {
        if !(elapsed > T::zero()) {
            return self.first();
        }
        let s = elapsed / self.dt();
        let Some(i) = s.floor().to_usize() else {
            return self.last();
        };
        if i + 1 >= self.len() {
            return self.last();
        }
        let theta = s - T::constant(i as f64);
        let (Some(p0), Some(p1)) = (self.point(i), self.point(i + 1)) else {
            return self.last();
        };
        p0 + (p1 - p0) * theta
    }

    /// The recent path: every sample in `[elapsed - time_traced, elapsed)` followed by
    /// [Self::position_at] `elapsed`. Never empty.
    pub fn tail(&self, elapsed: T, time_traced: T) -> Vec<Vector3<T>> {
        let end = if elapsed > self.end_time() {
            self.end_time()
        } else if elapsed > T::zero() {
            elapsed
        } else {
            T::zero()
        };
        let start = end - time_traced;
        let first = if start > T::zero() {
            (start / self.dt()).ceil().to_usize().unwrap_or(self.len())
        } else {
            0
        };

        let mut ret: Vec<Vector3<T>> = (first..self.len())
            .take_while(|&i| self.time(i) < end)
            .filter(|&i| self.time(i) >= start)
            .filter_map(|i| self.point(i))
            .collect();
        ret.push(self.position_at(end));
        ret
    }
}
