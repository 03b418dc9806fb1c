pub mod builder;
pub mod config;
pub mod explicit_rk;
pub mod method;
pub mod problem;
pub mod runge_kutta;
pub mod state;
pub mod tableau;

#[cfg(test)]
mod tests {
    use nalgebra::DVector;
    use num_traits::One;

    use super::problem::OdeSolverSolution;
    use crate::{
        error::{LorenzsolError, OdeSolverError},
        ExplicitRk, ExplicitRkConfig, OdeEquations, OdeSolverMethod, OdeSolverStopReason, RkState,
        Scalar,
    };

    /// rms of the error scaled by the problem tolerances
    fn scaled_error_norm<T: Scalar>(
        soln: &DVector<T>,
        expected: &DVector<T>,
        rtol: T,
        atol: &DVector<T>,
    ) -> T {
        let mut acc = T::zero();
        for i in 0..expected.len() {
            let scale = expected[i].abs() * rtol + atol[i];
            let e = (soln[i] - expected[i]) / scale;
            acc += e * e;
        }
        (acc / T::constant(expected.len() as f64)).sqrt()
    }

    pub fn test_ode_solver<'a, Eqn>(
        method: &mut impl OdeSolverMethod<'a, Eqn>,
        solution: OdeSolverSolution<Eqn::T>,
        use_tstop: bool,
    ) -> DVector<Eqn::T>
    where
        Eqn: OdeEquations + 'a,
    {
        for point in solution.solution_points.iter() {
            let soln = if use_tstop {
                match method.set_stop_time(point.t) {
                    Ok(_) => loop {
                        if let OdeSolverStopReason::TstopReached = method.step().unwrap() {
                            assert_eq!(method.state().t, point.t);
                            break method.state().y.clone();
                        }
                    },
                    Err(_) => method.state().y.clone(),
                }
            } else {
                while method.state().t < point.t {
                    method.step().unwrap();
                }
                method.interpolate(point.t).unwrap()
            };

            let problem = method.problem();
            let error_norm = scaled_error_norm(&soln, &point.state, problem.rtol, &problem.atol);
            assert!(
                error_norm < Eqn::T::constant(15.0),
                "error_norm: {} at t = {}",
                error_norm,
                point.t
            );
        }
        method.state().y.clone()
    }

    pub fn test_interpolate<'a, Eqn, Method>(mut s: Method)
    where
        Eqn: OdeEquations + 'a,
        Method: OdeSolverMethod<'a, Eqn>,
    {
        let t0 = s.state().t;
        let y0 = s.state().y.clone();
        let one = Eqn::T::one();
        assert_eq!(s.interpolate(t0).unwrap(), y0);
        assert!(s.interpolate(t0 + one).is_err());

        let mut wrong = DVector::zeros(y0.len() + 1);
        assert!(matches!(
            s.interpolate_inplace(t0, &mut wrong),
            Err(LorenzsolError::OdeSolverError(
                OdeSolverError::InterpolationVectorWrongSize { .. }
            ))
        ));

        s.step().unwrap();
        let t1 = s.state().t;
        assert!(s.interpolate(t1).is_ok());
        assert!(s.interpolate(t0).is_ok());
        assert!(s.interpolate(t1 + one).is_err());
    }

    pub fn test_state_mut<'a, Eqn, Method>(mut s: Method)
    where
        Eqn: OdeEquations + 'a,
        Method: OdeSolverMethod<'a, Eqn>,
    {
        let problem = s.problem();
        let pi = Eqn::T::constant(std::f64::consts::PI);
        s.state_mut().y[0] = pi;
        assert_eq!(s.state().y[0], pi);
        assert_eq!(s.interpolate(s.state().t).unwrap()[0], pi);

        // a mutated state can only be interpolated at the current time until the next step
        let t_mid = s.state().t + s.state().h / Eqn::T::constant(2.0);
        assert!(s.interpolate(t_mid).is_err());

        // reinit using state_mut and solve again from the start
        s.solve(Eqn::T::one()).unwrap();
        let state = RkState::new(problem, s.order()).unwrap();
        *s.state_mut() = state.clone();
        let (ys, ts) = s.solve(Eqn::T::one()).unwrap();
        assert_eq!(ts[0], state.t);
        assert_eq!(ys.column(0).into_owned(), state.y);
        assert_eq!(s.state().t, Eqn::T::one());
    }

    pub fn test_config<Eqn: OdeEquations>(mut s: ExplicitRk<'_, Eqn>) {
        // a huge first step is rejected, and its shrunk replacement is below the minimum
        s.state_mut().h = Eqn::T::one();
        s.config_mut().minimum_timestep = Eqn::T::constant(1e8);
        assert!(matches!(
            s.step(),
            Err(LorenzsolError::OdeSolverError(
                OdeSolverError::StepSizeTooSmall { .. }
            ))
        ));

        *s.config_mut() = ExplicitRkConfig {
            maximum_error_test_failures: 1,
            ..ExplicitRkConfig::default()
        };
        s.state_mut().h = Eqn::T::one();
        assert!(matches!(
            s.step(),
            Err(LorenzsolError::OdeSolverError(
                OdeSolverError::TooManyErrorTestFailures { .. }
            ))
        ));

        *s.config_mut() = ExplicitRkConfig::default();
        s.state_mut().h = Eqn::T::one();
        assert_eq!(s.step().unwrap(), OdeSolverStopReason::InternalTimestep);
    }
}
