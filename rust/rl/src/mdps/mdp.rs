use crate::SolverError;
use gymnasium::*;
use itertools::iproduct;
use std::rc::Rc;

/// Markov Decision Process - Sutton & Barto 2018.
pub trait Mdp {
    fn name(&self) -> &str;

    fn observation_space(&self) -> &ObsActSpace;

    fn action_space(&self) -> &ObsActSpace;

    fn transitions(&self) -> Rc<Transitions>;

    fn n_s(&self) -> Option<usize> {
        self.observation_space().discrete_n()
    }

    fn n_a(&self) -> Option<usize> {
        self.action_space().discrete_n()
    }
}

/// Outcomes of `a` in `s`. An `(s, a)` the model does not list has none.
pub fn outcomes(transitions: &Transitions, s: Discrete, a: Discrete) -> &[Transition] {
    transitions.get(&(s, a)).map(Vec::as_slice).unwrap_or(&[])
}

/// Checks that every listed `(s, a)` is in range, points at valid next states, and carries a
/// probability distribution.
pub fn validate_transitions(
    transitions: &Transitions,
    n_s: usize,
    n_a: usize,
) -> Result<(), SolverError> {
    if let Some(&(s, a)) = transitions.keys().find(|&&(s, a)| s >= n_s || a >= n_a) {
        return Err(SolverError::InvalidModel(format!(
            "({s}, {a}) is outside {n_s} states x {n_a} actions"
        )));
    }

    for (s, a) in iproduct!(0..n_s, 0..n_a) {
        let ts = outcomes(transitions, s, a);
        if ts.is_empty() {
            continue;
        }

        if let Some(t) = ts.iter().find(|t| t.next_state >= n_s) {
            return Err(SolverError::InvalidModel(format!(
                "({s}, {a}) leads to state {} of {n_s}",
                t.next_state
            )));
        }

        if let Some(t) = ts
            .iter()
            .find(|t| !t.probability.is_finite() || t.probability < 0. || !t.reward.is_finite())
        {
            return Err(SolverError::InvalidModel(format!(
                "({s}, {a}) has an invalid outcome {t:?}"
            )));
        }

        let total: f64 = ts.iter().map(|t| t.probability).sum();
        if (total - 1.).abs() > 1e-6 {
            return Err(SolverError::InvalidModel(format!(
                "probabilities of ({s}, {a}) sum to {total}"
            )));
        }
    }

    Ok(())
}
