use nalgebra::DVector;

use crate::{
    error::LorenzsolError, ExplicitRk, ExplicitRkConfig, OdeEquations, RkState, Scalar, Tableau,
};

/// An initial value problem: a set of [OdeEquations], the tolerances used for error control, the
/// initial time `t0` and a reference initial step size `h0` (only its sign is used by [RkState::new]).
pub struct OdeSolverProblem<Eqn>
where
    Eqn: OdeEquations,
{
    pub eqn: Eqn,
    pub rtol: Eqn::T,
    pub atol: DVector<Eqn::T>,
    pub t0: Eqn::T,
    pub h0: Eqn::T,
}

macro_rules! rk_solver_from_tableau {
    ($method:ident, $method_solver:ident, $tableau:ident) => {
        pub fn $method_solver(
            &self,
            state: RkState<Eqn::T>,
        ) -> Result<ExplicitRk<'_, Eqn>, LorenzsolError> {
            self.explicit_rk_solver(state, Tableau::$tableau())
        }

        pub fn $method(&self) -> Result<ExplicitRk<'_, Eqn>, LorenzsolError> {
            let tableau = Tableau::$tableau();
            let state = self.rk_state(&tableau)?;
            self.explicit_rk_solver(state, tableau)
        }
    };
}

impl<Eqn> OdeSolverProblem<Eqn>
where
    Eqn: OdeEquations,
{
    pub fn new(eqn: Eqn, rtol: Eqn::T, atol: DVector<Eqn::T>, t0: Eqn::T, h0: Eqn::T) -> Self {
        Self {
            eqn,
            rtol,
            atol,
            t0,
            h0,
        }
    }

    pub fn eqn(&self) -> &Eqn {
        &self.eqn
    }

    pub fn eqn_mut(&mut self) -> &mut Eqn {
        &mut self.eqn
    }

    /// Create a new state for the Runge-Kutta solvers, with an initial step size suited to the order of `tableau`.
    pub fn rk_state(&self, tableau: &Tableau<Eqn::T>) -> Result<RkState<Eqn::T>, LorenzsolError> {
        RkState::new(self, tableau.order())
    }

    pub fn explicit_rk_solver(
        &self,
        state: RkState<Eqn::T>,
        tableau: Tableau<Eqn::T>,
    ) -> Result<ExplicitRk<'_, Eqn>, LorenzsolError> {
        ExplicitRk::new(self, state, tableau)
    }

    /// As [Self::explicit_rk_solver], with a non-default step size control.
    pub fn explicit_rk_solver_with_config(
        &self,
        state: RkState<Eqn::T>,
        tableau: Tableau<Eqn::T>,
        config: ExplicitRkConfig<Eqn::T>,
    ) -> Result<ExplicitRk<'_, Eqn>, LorenzsolError> {
        let mut solver = ExplicitRk::new(self, state, tableau)?;
        *solver.config_mut() = config;
        Ok(solver)
    }

    rk_solver_from_tableau!(dopri5, dopri5_solver, dopri5);
    rk_solver_from_tableau!(tsit45, tsit45_solver, tsit45);
}

#[derive(Debug, Clone)]
pub struct OdeSolverSolutionPoint<T: Scalar> {
    pub state: DVector<T>,
    pub t: T,
}

/// Reference solution of a problem, used to check the solvers.
pub struct OdeSolverSolution<T: Scalar> {
    pub solution_points: Vec<OdeSolverSolutionPoint<T>>,
    pub rtol: T,
    pub atol: DVector<T>,
}

impl<T: Scalar> OdeSolverSolution<T> {
    pub fn push(&mut self, state: DVector<T>, t: T) {
        // find the index to insert the new point keeping the times sorted
        let index = self
            .solution_points
            .iter()
            .position(|x| x.t > t)
            .unwrap_or(self.solution_points.len());
        self.solution_points
            .insert(index, OdeSolverSolutionPoint { state, t });
    }
}

impl<T: Scalar> Default for OdeSolverSolution<T> {
    fn default() -> Self {
        Self {
            solution_points: Vec::new(),
            rtol: T::constant(1e-6),
            atol: DVector::from_element(1, T::constant(1e-6)),
        }
    }
}
