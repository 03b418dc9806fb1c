//! Sampled trajectories of the Lorenz system.
//!
//! A [Trajectory] is the output of the [TrajectorySampler]: the states at the times `t_i = i * dt`,
//! `i = 0, 1, ..., N - 1`, stored as an `N x 3` matrix with one row per sample.
use nalgebra::{DMatrix, Vector3};

use crate::{
    error::{InvalidArgumentError, LorenzsolError},
    other_error, Scalar,
};

pub mod playback;
pub mod sampler;

pub use playback::DEFAULT_TIME_TRACED;
pub use sampler::{
    sample_times, sample_trajectory, RkMethod, TrajectorySampler, DEFAULT_ATOL, DEFAULT_DT,
    DEFAULT_RTOL, MAX_SAMPLES,
};

/// An immutable, time ordered sequence of states sampled on a uniform grid starting at `t = 0`.
///
/// A trajectory always holds at least one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory<T: Scalar> {
    points: DMatrix<T>,
    dt: T,
}

impl<T: Scalar> Trajectory<T> {
    /// Wrap an `N x 3` matrix of samples taken every `dt`.
    pub fn new(points: DMatrix<T>, dt: T) -> Result<Self, LorenzsolError> {
        if !(dt > T::zero()) || !dt.is_finite() {
            return Err(LorenzsolError::from(
                InvalidArgumentError::NonPositiveTimeStep {
                    dt: dt.to_f64_lossy(),
                },
            ));
        }
        if points.ncols() != 3 {
            return Err(other_error!(format!(
                "trajectory points must have 3 columns, got {}",
                points.ncols()
            )));
        }
        if points.nrows() == 0 {
            return Err(other_error!("trajectory must hold at least one sample"));
        }
        Ok(Self { points, dt })
    }

    pub fn len(&self) -> usize {
        self.points.nrows()
    }

    /// Always false, kept for symmetry with [Self::len].
    pub fn is_empty(&self) -> bool {
        self.points.nrows() == 0
    }

    pub fn dt(&self) -> T {
        self.dt
    }

    /// Sample time of row `i`.
    pub fn time(&self, i: usize) -> T {
        T::constant(i as f64) * self.dt
    }

    pub fn times(&self) -> Vec<T> {
        (0..self.len()).map(|i| self.time(i)).collect()
    }

    /// Time of the last sample. Note this is strictly less than the duration that was sampled.
    pub fn end_time(&self) -> T {
        self.time(self.len() - 1)
    }

    pub fn point(&self, i: usize) -> Option<Vector3<T>> {
        (i < self.len()).then(|| self.row(i))
    }

    pub fn first(&self) -> Vector3<T> {
        self.row(0)
    }

    pub fn last(&self) -> Vector3<T> {
        self.row(self.len() - 1)
    }

    pub fn points(&self) -> impl Iterator<Item = Vector3<T>> + '_ {
        (0..self.len()).map(move |i| self.row(i))
    }

    pub fn as_matrix(&self) -> &DMatrix<T> {
        &self.points
    }

    fn row(&self, i: usize) -> Vector3<T> {
        Vector3::new(
            self.points[(i, 0)],
            self.points[(i, 1)],
            self.points[(i, 2)],
        )
    }
}

#[cfg(test)]
mod test {
    use nalgebra::{DMatrix, Vector3};

    use super::Trajectory;
    use crate::error::{InvalidArgumentError, LorenzsolError};

    #[test]
    fn accessors() {
        let m = DMatrix::from_row_slice(3, 3, &[0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 2.0, 4.0, 6.0]);
        let traj = Trajectory::new(m.clone(), 0.5).unwrap();
        assert_eq!(traj.len(), 3);
        assert!(!traj.is_empty());
        assert_eq!(traj.dt(), 0.5);
        assert_eq!(traj.times(), vec![0.0, 0.5, 1.0]);
        assert_eq!(traj.end_time(), 1.0);
        assert_eq!(traj.first(), Vector3::zeros());
        assert_eq!(traj.last(), Vector3::new(2.0, 4.0, 6.0));
        assert_eq!(traj.point(1), Some(Vector3::new(1.0, 2.0, 3.0)));
        assert_eq!(traj.point(3), None);
        assert_eq!(traj.points().count(), 3);
        assert_eq!(traj.as_matrix(), &m);
    }

    #[test]
    fn rejects_malformed_tables() {
        assert!(Trajectory::new(DMatrix::<f64>::zeros(0, 3), 0.1).is_err());
        assert!(Trajectory::new(DMatrix::<f64>::zeros(2, 2), 0.1).is_err());
        assert!(matches!(
            Trajectory::new(DMatrix::<f64>::zeros(2, 3), 0.0),
            Err(LorenzsolError::InvalidArgument(
                InvalidArgumentError::NonPositiveTimeStep { .. }
            ))
        ));
    }
}
