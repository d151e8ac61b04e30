use super::mdp::{outcomes, Mdp};
use gymnasium::{Discrete, Transition};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use serde::Serialize;

pub trait Weighted {
    fn p(&self) -> f64;
}

impl Weighted for Transition {
    fn p(&self) -> f64 {
        self.probability
    }
}

/// Samples one item in proportion to its weight. `None` if there is nothing to pick from.
pub fn pick_next<'a, T, R>(rng: &mut R, ts: &'a [T]) -> Option<&'a T>
where
    T: Weighted,
    R: Rng + ?Sized,
{
    let dist = WeightedIndex::new(ts.iter().map(|item| item.p())).ok()?;
    ts.get(dist.sample(rng))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpisodeStats {
    pub reward: f64,
    pub steps: usize,
    pub terminated: bool,
}

/// Follows `policy` through the model from `start` until a terminal outcome, a state-action pair
/// without outcomes, or `max_steps`.
pub fn run_episode<R>(
    mdp: &dyn Mdp,
    policy: &mut dyn FnMut(Discrete) -> Discrete,
    start: Discrete,
    max_steps: usize,
    rng: &mut R,
) -> EpisodeStats
where
    R: Rng + ?Sized,
{
    let transitions = mdp.transitions();
    let mut stats = EpisodeStats {
        reward: 0.,
        steps: 0,
        terminated: false,
    };

    let mut s = start;
    while stats.steps < max_steps {
        let a = policy(s);
        let Some(t) = pick_next(rng, outcomes(&transitions, s, a)) else {
            break;
        };

        stats.reward += t.reward;
        stats.steps += 1;
        if t.done {
            stats.terminated = true;
            break;
        }

        s = t.next_state;
    }

    stats
}
