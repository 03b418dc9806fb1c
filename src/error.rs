use thiserror::Error;

/// Custom error type for Lorenzsol
///
/// This error type is used to wrap all possible errors that can occur when sampling a trajectory.
/// Integration failures are reported through [OdeSolverError], bad caller input through [InvalidArgumentError].
#[derive(Error, Debug)]
pub enum LorenzsolError {
    #[error("ODE solver error: {0}")]
    OdeSolverError(#[from] OdeSolverError),
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgumentError),
    #[error("Error: {0}")]
    Other(String),
}

impl LorenzsolError {
    /// True if the error came out of the integrator rather than from validating the inputs.
    pub fn is_integration_failure(&self) -> bool {
        matches!(self, LorenzsolError::OdeSolverError(_))
    }
}

/// Possible errors that can occur when solving an ODE
#[derive(Debug, Error)]
pub enum OdeSolverError {
    #[error(
        "Stop time = {} is less than current state time = {}",
        stop_time,
        state_time
    )]
    StopTimeBeforeCurrentTime { stop_time: f64, state_time: f64 },
    #[error("Stop time is at the current state time")]
    StopTimeAtCurrentTime,
    #[error("Interpolation vector is not the correct length, expected {expected}, got {found}")]
    InterpolationVectorWrongSize { expected: usize, found: usize },
    #[error("Interpolation time is not within the current step")]
    InterpolationTimeOutsideCurrentStep,
    #[error("Exceeded maximum number of error test failures at time = {time}")]
    TooManyErrorTestFailures { time: f64 },
    #[error("Step size is too small at time = {time}")]
    StepSizeTooSmall { time: f64 },
    #[error("State contains non-finite values at time = {time}")]
    NonFiniteState { time: f64 },
    #[error("State has wrong length: expected {expected}, got {found}")]
    StateProblemMismatch { expected: usize, found: usize },
    #[error("t_eval must be non-empty, increasing and all values must be greater than or equal to the current time")]
    InvalidTEval,
    #[error("Builder error: {0}")]
    BuilderError(String),
    #[error("Invalid Tableau: {0}")]
    InvalidTableau(String),
    #[error("Error: {0}")]
    Other(String),
}

/// Possible errors caused by caller input, detected before any integration is attempted
#[derive(Debug, Error)]
pub enum InvalidArgumentError {
    #[error("Duration must be positive and finite, got {duration}")]
    NonPositiveDuration { duration: f64 },
    #[error("Time step must be positive and finite, got {dt}")]
    NonPositiveTimeStep { dt: f64 },
    #[error("Perturbation must be positive and finite, got {epsilon}")]
    NonPositivePerturbation { epsilon: f64 },
    #[error("An ensemble needs at least one initial state")]
    EmptyEnsemble,
    #[error("Grid of {samples} samples exceeds the maximum of {max}")]
    TooManySamples { samples: f64, max: usize },
    #[error("Error: {0}")]
    Other(String),
}

#[macro_export]
macro_rules! ode_solver_error {
    ($variant:ident) => {
        LorenzsolError::from(OdeSolverError::$variant)
    };
    ($variant:ident, $($arg:tt)*) => {
        LorenzsolError::from(OdeSolverError::$variant($($arg)*.to_string()))
    };
}

#[macro_export]
macro_rules! invalid_argument_error {
    ($variant:ident) => {
        LorenzsolError::from(InvalidArgumentError::$variant)
    };
    ($variant:ident, $($arg:tt)*) => {
        LorenzsolError::from(InvalidArgumentError::$variant($($arg)*.to_string()))
    };
}

#[macro_export]
macro_rules! other_error {
    ($msg:expr) => {
        LorenzsolError::Other($msg.to_string())
    };
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn integration_failures_are_distinguished_from_bad_input() {
        let err = LorenzsolError::from(OdeSolverError::StepSizeTooSmall { time: 1.5 });
        assert!(err.is_integration_failure());
        assert_eq!(
            err.to_string(),
            "ODE solver error: Step size is too small at time = 1.5"
        );

        let err = LorenzsolError::from(InvalidArgumentError::NonPositiveTimeStep { dt: 0.0 });
        assert!(!err.is_integration_failure());
        assert_eq!(
            err.to_string(),
            "Invalid argument: Time step must be positive and finite, got 0"
        );
    }

    #[test]
    fn error_macros_wrap_the_variant() {
        let err = ode_solver_error!(InvalidTableau, "bad c");
        assert!(matches!(
            err,
            LorenzsolError::OdeSolverError(OdeSolverError::InvalidTableau(ref s)) if s == "bad c"
        ));
        let err = invalid_argument_error!(EmptyEnsemble);
        assert!(matches!(
            err,
            LorenzsolError::InvalidArgument(InvalidArgumentError::EmptyEnsemble)
        ));
        let err = other_error!("oops");
        assert_eq!(err.to_string(), "Error: oops");
    }
}
