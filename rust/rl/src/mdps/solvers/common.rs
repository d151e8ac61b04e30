use super::super::mdp::outcomes;
use gymnasium::{Discrete, Transitions};
use ndarray::Array1;

/// Expected return of taking `a` in `s` and following `v` afterwards.
pub fn q_value(
    transitions: &Transitions,
    v: &Array1<f64>,
    gamma: f64,
    s: Discrete,
    a: Discrete,
) -> f64 {
    outcomes(transitions, s, a)
        .iter()
        .map(|t| t.probability * (t.reward + gamma * v[t.next_state]))
        .sum()
}

/// Q-values of every action in `s`.
pub fn one_step_lookahead(
    transitions: &Transitions,
    v: &Array1<f64>,
    gamma: f64,
    s: Discrete,
    n_a: usize,
) -> Array1<f64> {
    (0..n_a)
        .map(|a| q_value(transitions, v, gamma, s, a))
        .collect()
}

pub fn one_hot(n: usize, i: usize) -> Array1<f64> {
    let mut row = Array1::zeros(n);
    row[i] = 1.;
    row
}
