use super::statistics::Statistics;
use crate::SolverError;
use gymnasium::Discrete;

/// A solver driven one episode at a time by external code.
pub trait MdpSolver {
    fn name(&self) -> &'static str;

    /// Runs one training iteration, updating the solver's tables and statistics.
    fn train_episode(&mut self) -> Result<(), SolverError>;

    /// Decision rule derived from the solver's current estimates.
    fn create_greedy_policy(&mut self) -> Box<dyn FnMut(Discrete) -> Discrete + '_>;

    fn statistics(&self) -> &Statistics;

    fn v_star(&self, s: Discrete) -> f64;

    fn q_star(&self, s: Discrete, a: Discrete) -> f64;

    fn pi_star(&self, s: Discrete) -> Discrete;

    /// Trains until the policy is stable or `num_iterations` episodes ran.
    /// Returns whether the policy is stable and the number of episodes run.
    fn exec(&mut self, num_iterations: Option<usize>) -> Result<(bool, usize), SolverError>;
}
