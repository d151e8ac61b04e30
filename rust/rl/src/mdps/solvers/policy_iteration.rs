use super::super::{
    mdp::{outcomes, validate_transitions, Mdp},
    mdp_solver::MdpSolver,
    statistics::{Statistic, Statistics},
};
use super::common::*;
use crate::{math, Options, SolverError};
use gymnasium::{Discrete, Transitions};
use ndarray::{Array1, Array2};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info, warn};

const NAME: &str = "Policy Iteration";

/// Values closer than this between two iterations mean the policy can no longer improve.
const VALUE_TOLERANCE: f64 = 1e-12;

/// Policy Iteration - Sutton & Barto 2018, section 4.3.
///
/// Each episode evaluates the current policy exactly, by solving the Bellman equation as a
/// linear system, and then makes the policy greedy with respect to the resulting values.
#[derive(Clone)]
pub struct PolicyIteration {
    mdp: Rc<dyn Mdp>,
    transitions: Rc<Transitions>,
    n_s: usize,
    n_a: usize,
    gamma: f64,
    num_iterations: Option<usize>,
    v: Array1<f64>,
    policy: Array2<f64>,
    changed_states: usize,
    statistics: Statistics,
}

impl PolicyIteration {
    /// Starts from all-zero values and the uniform random policy.
    pub fn new(mdp: Rc<dyn Mdp>, options: &Options) -> Result<Self, SolverError> {
        let n_s = mdp.n_s().ok_or(SolverError::NonDiscreteSpace {
            solver: NAME,
            kind: "state",
        })?;
        let n_a = mdp.n_a().ok_or(SolverError::NonDiscreteSpace {
            solver: NAME,
            kind: "action",
        })?;
        if n_s == 0 {
            return Err(SolverError::InvalidModel(format!(
                "'{}' has no states",
                mdp.name()
            )));
        }
        if n_a == 0 {
            return Err(SolverError::InvalidModel(format!(
                "'{}' has no actions",
                mdp.name()
            )));
        }
        options.validate()?;

        let transitions = mdp.transitions();
        validate_transitions(&transitions, n_s, n_a)?;

        Ok(Self {
            mdp,
            transitions,
            n_s,
            n_a,
            gamma: options.gamma,
            num_iterations: options.num_iterations,
            v: Array1::zeros(n_s),
            policy: Array2::from_elem((n_s, n_a), 1. / n_a as f64),
            changed_states: 0,
            statistics: Statistics::default(),
        })
    }

    pub fn mdp(&self) -> &dyn Mdp {
        self.mdp.as_ref()
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.v
    }

    /// `[S, A]` action probabilities.
    pub fn policy(&self) -> &Array2<f64> {
        &self.policy
    }

    /// Replaces the policy, which may be stochastic. Every row must be a distribution over actions.
    pub fn set_policy(&mut self, policy: Array2<f64>) -> Result<(), SolverError> {
        if policy.dim() != (self.n_s, self.n_a) {
            return Err(SolverError::InvalidModel(format!(
                "policy of shape {:?}, expected {:?}",
                policy.dim(),
                (self.n_s, self.n_a)
            )));
        }

        for (s, row) in policy.outer_iter().enumerate() {
            let total = row.sum();
            if row.iter().any(|&p| !p.is_finite() || p < 0.) || (total - 1.).abs() > 1e-6 {
                return Err(SolverError::InvalidModel(format!(
                    "policy row {s} is not a distribution: {row}"
                )));
            }
        }

        self.policy = policy;
        Ok(())
    }

    /// The linear system `A · V = b` whose solution is the value function of the current policy:
    ///
    /// `V[s] = Σ_a π[s][a] · Σ_(p, s', r) p · (r + γ · V[s'])`
    pub fn bellman_system(&self) -> (Array2<f64>, Array1<f64>) {
        let mut a = Array2::<f64>::eye(self.n_s);
        let mut b = Array1::<f64>::zeros(self.n_s);
        for (s, row) in self.policy.outer_iter().enumerate() {
            for (act, &action_prob) in row.iter().enumerate() {
                if action_prob == 0. {
                    continue;
                }

                for t in outcomes(&self.transitions, s, act) {
                    a[[s, t.next_state]] -= self.gamma * t.probability * action_prob;
                    b[s] += t.probability * action_prob * t.reward;
                }
            }
        }

        (a, b)
    }

    /// Evaluates the current policy exactly.
    ///
    /// Fails with [`SolverError::SingularSystem`] when the system has no unique solution, e.g.
    /// γ = 1 on a model with absorbing states. γ = 0 always works: the matrix is the identity.
    pub fn policy_eval(&mut self) -> Result<(), SolverError> {
        let (a, b) = self.bellman_system();

        self.v = math::solve(&a, &b).ok_or_else(|| {
            warn!(n_s = self.n_s, gamma = self.gamma, "singular policy evaluation system");
            SolverError::SingularSystem {
                n: self.n_s,
                gamma: self.gamma,
            }
        })?;
        debug!(n_s = self.n_s, value_sum = self.v.sum(), "evaluated policy");

        Ok(())
    }

    /// Makes every state's policy row one-hot at its best action under the current values.
    /// Returns the number of rows that changed.
    pub fn policy_improvement(&mut self) -> usize {
        let mut changed = 0;
        for s in 0..self.n_s {
            let best_action = math::argmax(self.one_step_lookahead(s).iter().copied());
            let row = one_hot(self.n_a, best_action);
            if self.policy.row(s) != row {
                changed += 1;
            }

            self.policy.row_mut(s).assign(&row);
        }

        changed
    }

    pub fn one_step_lookahead(&self, s: Discrete) -> Array1<f64> {
        one_step_lookahead(&self.transitions, &self.v, self.gamma, s, self.n_a)
    }
}

impl MdpSolver for PolicyIteration {
    fn name(&self) -> &'static str {
        NAME
    }

    /// One full policy iteration: evaluation, then improvement.
    ///
    /// Dynamic programming never steps through the environment, so `Rewards` is the sum of the
    /// state values and `Steps` is -1.
    fn train_episode(&mut self) -> Result<(), SolverError> {
        self.policy_eval()?;
        self.changed_states = self.policy_improvement();

        self.statistics.set(Statistic::Rewards, self.v.sum());
        self.statistics.set(Statistic::Steps, -1.);
        debug!(
            changed_states = self.changed_states,
            rewards = self.v.sum(),
            "improved policy"
        );

        Ok(())
    }

    /// The returned closure also rewrites the policy row of every state it is asked about to be
    /// one-hot at the greedy action, so querying it changes [`PolicyIteration::policy`].
    ///
    /// Panics if asked about a state outside the model.
    fn create_greedy_policy(&mut self) -> Box<dyn FnMut(Discrete) -> Discrete + '_> {
        Box::new(move |s| {
            let best_action = math::argmax(self.one_step_lookahead(s).iter().copied());
            self.policy
                .row_mut(s)
                .assign(&one_hot(self.n_a, best_action));
            best_action
        })
    }

    fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    fn v_star(&self, s: Discrete) -> f64 {
        self.v[s]
    }

    fn q_star(&self, s: Discrete, a: Discrete) -> f64 {
        q_value(&self.transitions, &self.v, self.gamma, s, a)
    }

    fn pi_star(&self, s: Discrete) -> Discrete {
        math::argmax(self.policy.row(s).iter().copied())
    }

    /// A policy is stable once improvement leaves it unchanged, or once evaluation stops raising
    /// any value (then every remaining change swaps between equally good actions).
    fn exec(&mut self, num_iterations: Option<usize>) -> Result<(bool, usize), SolverError> {
        let num_iterations = num_iterations.or(self.num_iterations);

        let mut prev_v: Option<Array1<f64>> = None;
        let mut i = 0;
        loop {
            if num_iterations.is_some_and(|n| i >= n) {
                info!(iterations = i, "policy not stable within the iteration cap");
                return Ok((false, i));
            }

            self.train_episode()?;
            i += 1;

            let values_settled = prev_v.as_ref().is_some_and(|prev| {
                prev.iter()
                    .zip(self.v.iter())
                    .all(|(p, v)| (p - v).abs() <= VALUE_TOLERANCE * (1. + v.abs()))
            });
            if self.changed_states == 0 || values_settled {
                info!(iterations = i, rewards = self.v.sum(), "policy stable");
                return Ok((true, i));
            }

            prev_v = Some(self.v.clone());
        }
    }
}

impl fmt::Display for PolicyIteration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(NAME)
    }
}
