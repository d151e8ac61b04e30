extern crate float_eq;
extern crate policy_iteration;
extern crate rstest;

use float_eq::*;
use gymnasium::{Discrete, Transition, Transitions};
use ndarray::Array2;
use policy_iteration::envs::{frozen_lake::*, tabular::TabularMdp};
use policy_iteration::mdps::solvers::common::q_value;
use policy_iteration::*;
use rand::prelude::*;
use rstest::rstest;
use std::rc::Rc;

fn frozen_lake(map_name: &str, is_slippery: bool) -> Rc<dyn Mdp> {
    Rc::new(FrozenLake::from_map_name(map_name, is_slippery).unwrap())
}

fn solver(mdp: Rc<dyn Mdp>, gamma: f64) -> PolicyIteration {
    PolicyIteration::new(mdp, &Options::new(gamma)).unwrap()
}

fn random_policy(rng: &mut StdRng, n_s: usize, n_a: usize) -> Array2<f64> {
    let mut policy = Array2::from_shape_fn((n_s, n_a), |_| rng.gen_range(0.0..1.0));
    for mut row in policy.outer_iter_mut() {
        let total = row.sum();
        row /= total;
    }
    policy
}

/// Reference values by sweeping the Bellman optimality operator to its fixed point.
fn value_iteration(mdp: &dyn Mdp, gamma: f64) -> Vec<f64> {
    let (n_s, n_a) = (mdp.n_s().unwrap(), mdp.n_a().unwrap());
    let transitions = mdp.transitions();
    let mut v = ndarray::Array1::<f64>::zeros(n_s);
    loop {
        let next = (0..n_s)
            .map(|s| {
                (0..n_a)
                    .map(|a| q_value(&transitions, &v, gamma, s, a))
                    .fold(f64::NEG_INFINITY, f64::max)
            })
            .collect::<ndarray::Array1<f64>>();
        let delta = (&next - &v).iter().fold(0., |m: f64, d| m.max(d.abs()));
        v = next;
        if delta < 1e-14 {
            return v.to_vec();
        }
    }
}

#[rstest]
#[case("4x4", 0.5)]
#[case("4x4", 0.9)]
#[case("8x8", 0.99)]
fn evaluation_solves_the_bellman_equation(#[case] map_name: &str, #[case] gamma: f64) {
    let rng = &mut StdRng::seed_from_u64(2718);
    let pi = &mut solver(frozen_lake(map_name, true), gamma);
    let (n_s, n_a) = pi.policy().dim();

    for _ in 0..5 {
        pi.set_policy(random_policy(rng, n_s, n_a)).unwrap();
        pi.policy_eval().unwrap();

        let (a, b) = pi.bellman_system();
        let residual = a.dot(pi.values()) - &b;
        assert!(residual.iter().all(|r| r.abs() < 1e-10), "{residual}");
    }
}

#[rstest]
#[case("4x4", true, 0.9)]
#[case("4x4", false, 0.9)]
#[case("8x8", true, 0.95)]
fn improvement_never_lowers_values(
    #[case] map_name: &str,
    #[case] is_slippery: bool,
    #[case] gamma: f64,
) {
    let rng = &mut StdRng::seed_from_u64(31415);
    let pi = &mut solver(frozen_lake(map_name, is_slippery), gamma);
    let (n_s, n_a) = pi.policy().dim();
    pi.set_policy(random_policy(rng, n_s, n_a)).unwrap();

    let mut prev = None;
    for _ in 0..10 {
        pi.train_episode().unwrap();
        if let Some(prev) = prev {
            assert!(
                pi.values()
                    .iter()
                    .zip(&prev)
                    .all(|(v, p): (&f64, &f64)| *v >= p - 1e-12),
                "{prev:?} -> {}",
                pi.values()
            );
        }
        prev = Some(pi.values().to_vec());
    }
}

#[rstest]
#[case("4x4", true, 0.9)]
#[case("4x4", false, 0.9)]
#[case("8x8", true, 0.9)]
#[case("8x8", false, 0.99)]
fn converges_to_the_optimal_values(
    #[case] map_name: &str,
    #[case] is_slippery: bool,
    #[case] gamma: f64,
) {
    let mdp = frozen_lake(map_name, is_slippery);
    let pi = &mut solver(Rc::clone(&mdp), gamma);

    let (stable, iterations) = pi.exec(Some(100)).unwrap();

    assert!(stable);
    assert!(iterations < 100);
    let n_s = mdp.n_s().unwrap();
    for s in 0..n_s {
        let best = (0..4).map(|a| pi.q_star(s, a)).fold(f64::NEG_INFINITY, f64::max);
        assert_float_eq!(pi.v_star(s), best, abs <= 1e-9);
        assert_float_eq!(pi.q_star(s, pi.pi_star(s)), best, abs <= 1e-9);
    }
    assert_float_eq!(
        pi.values().to_vec(),
        value_iteration(mdp.as_ref(), gamma),
        abs_all <= 1e-8
    );

    // Another episode cannot improve on the optimum.
    let values = pi.values().to_vec();
    pi.train_episode().unwrap();
    assert_float_eq!(pi.values().to_vec(), values, abs_all <= 1e-10);
}

#[test]
fn still_lake_values_are_discounted_path_lengths() {
    let gamma: f64 = 0.9;
    let pi = &mut solver(frozen_lake("4x4", false), gamma);

    assert!(pi.exec(None).unwrap().0);

    // Steps to the goal from every state, 0 for the holes and the goal itself.
    let steps = [6, 5, 4, 5, 5, 0, 3, 0, 4, 3, 2, 0, 0, 2, 1, 0];
    let expected = steps
        .iter()
        .map(|&d| if d == 0 { 0. } else { gamma.powi(d - 1) })
        .collect::<Vec<_>>();
    assert_float_eq!(pi.values().to_vec(), expected, abs_all <= 1e-10);
    assert_eq!(pi.pi_star(14), RIGHT);
    assert_eq!(pi.pi_star(10), DOWN);
    assert_eq!(pi.pi_star(6), DOWN);
}

#[test]
fn statistics_after_every_episode() {
    let pi = &mut solver(frozen_lake("8x8", true), 0.9);

    for _ in 0..4 {
        pi.train_episode().unwrap();

        let stats = pi.statistics();
        assert_eq!(stats.get(Statistic::Steps), -1.);
        assert_float_eq!(stats.get(Statistic::Rewards), pi.values().sum(), abs <= 1e-12);
    }
}

#[test]
fn greedy_policy_agrees_with_converged_policy() {
    let pi = &mut solver(frozen_lake("8x8", true), 0.9);
    pi.exec(None).unwrap();
    let pi_star = (0..64).map(|s| pi.pi_star(s)).collect::<Vec<_>>();

    let mut greedy = pi.create_greedy_policy();
    let actions = (0..64).map(&mut greedy).collect::<Vec<_>>();

    assert_eq!(actions, pi_star);
}

#[test]
fn undiscounted_lake_is_singular() {
    let pi = &mut solver(frozen_lake("4x4", true), 1.);

    let err = pi.exec(None).unwrap_err();

    assert!(matches!(err, SolverError::SingularSystem { n: 16, .. }));
}

fn det(next_state: Discrete, reward: f64) -> Vec<Transition> {
    vec![Transition {
        next_state,
        probability: 1.,
        reward,
        done: false,
    }]
}

#[test]
fn two_state_chain_prefers_the_bigger_loop() {
    let mdp = TabularMdp::new(
        "chain",
        2,
        2,
        Transitions::from([
            ((0, 0), det(0, 1.)),
            ((0, 1), det(1, 0.)),
            ((1, 0), det(0, 0.)),
            ((1, 1), det(1, 2.)),
        ]),
    )
    .unwrap();
    let pi = &mut solver(Rc::new(mdp), 0.9);

    let (stable, _) = pi.exec(None).unwrap();

    assert!(stable);
    assert_eq!((pi.pi_star(0), pi.pi_star(1)), (1, 1));
    assert_float_eq!(pi.values().to_vec(), vec![18., 20.], abs_all <= 1e-10);
}
