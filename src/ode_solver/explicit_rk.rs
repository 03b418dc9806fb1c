use super::runge_kutta::{Rk, RkStatistics};
use crate::{
    error::LorenzsolError, ExplicitRkConfig, OdeEquations, OdeSolverMethod, OdeSolverProblem,
    OdeSolverStopReason, RkState, Tableau,
};
use nalgebra::DVector;
use num_traits::One;

/// An explicit Runge-Kutta method.
///
/// The particular method is defined by the [Tableau] used to create the solver.
/// If the `beta` matrix of the [Tableau] is present this is used for interpolation, otherwise hermite interpolation is used.
///
/// Restrictions:
/// - The upper triangular and diagonal parts of the `a` matrix must be zero (i.e. explicit).
/// - The last row of the `a` matrix must be the same as the `b` vector, and the last element of the `c` vector must be 1 (i.e. first same as last)
pub struct ExplicitRk<'a, Eqn>
where
    Eqn: OdeEquations,
{
    rk: Rk<'a, Eqn>,
    config: ExplicitRkConfig<Eqn::T>,
}

impl<'a, Eqn> ExplicitRk<'a, Eqn>
where
    Eqn: OdeEquations,
{
    pub fn new(
        problem: &'a OdeSolverProblem<Eqn>,
        state: RkState<Eqn::T>,
        tableau: Tableau<Eqn::T>,
    ) -> Result<Self, LorenzsolError> {
        Rk::<Eqn>::check_explicit_rk(&tableau)?;
        Ok(Self {
            rk: Rk::new(problem, state, tableau)?,
            config: ExplicitRkConfig::default(),
        })
    }

    pub fn get_statistics(&self) -> &RkStatistics {
        self.rk.get_statistics()
    }

    pub fn tableau(&self) -> &Tableau<Eqn::T> {
        self.rk.tableau()
    }

    pub fn config(&self) -> &ExplicitRkConfig<Eqn::T> {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ExplicitRkConfig<Eqn::T> {
        &mut self.config
    }
}

impl<'a, Eqn> OdeSolverMethod<'a, Eqn> for ExplicitRk<'a, Eqn>
where
    Eqn: OdeEquations + 'a,
{
    fn problem(&self) -> &'a OdeSolverProblem<Eqn> {
        self.rk.problem()
    }

    fn order(&self) -> usize {
        self.rk.order()
    }

    fn set_state(&mut self, state: RkState<Eqn::T>) {
        self.rk.set_state(state);
    }

    fn into_state(self) -> RkState<Eqn::T> {
        self.rk.into_state()
    }

    fn step(&mut self) -> Result<OdeSolverStopReason, LorenzsolError> {
        let mut h = self.rk.start_step()?;

        // loop until step is accepted
        let mut nattempts = 0;
        let factor = loop {
            // start a step attempt
            self.rk.start_step_attempt(h);
            for i in 1..self.rk.tableau().s() {
                self.rk.do_stage(i, h);
            }
            let error_norm = self.rk.error_norm();
            let factor = self.rk.factor(
                error_norm,
                1.0,
                self.config.minimum_timestep_shrink,
                self.config.maximum_timestep_growth,
            );
            if error_norm < Eqn::T::one() {
                break factor;
            }
            h *= factor;
            nattempts += 1;
            self.rk.error_test_fail(
                h,
                nattempts,
                self.config.maximum_error_test_failures,
                self.config.minimum_timestep,
            )?;
        };
        self.rk.step_accepted(h, h * factor)
    }

    fn set_stop_time(&mut self, tstop: Eqn::T) -> Result<(), LorenzsolError> {
        self.rk.set_stop_time(tstop)
    }

    fn interpolate_inplace(&self, t: Eqn::T, y: &mut DVector<Eqn::T>) -> Result<(), LorenzsolError> {
        self.rk.interpolate_inplace(t, y)
    }

    fn state(&self) -> &RkState<Eqn::T> {
        self.rk.state()
    }

    fn state_mut(&mut self) -> &mut RkState<Eqn::T> {
        self.rk.state_mut()
    }
}
