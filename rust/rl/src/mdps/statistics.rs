use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Statistic {
    /// Return of the last episode. Dynamic-programming solvers report the sum of state values.
    Rewards,

    /// Length of the last episode, -1 when the solver never steps the environment.
    Steps,
}

impl Statistic {
    pub const ALL: [Statistic; 2] = [Statistic::Rewards, Statistic::Steps];
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Per-episode metrics a solver reports to whoever drives it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Statistics(BTreeMap<Statistic, f64>);

impl Default for Statistics {
    fn default() -> Self {
        Self(Statistic::ALL.into_iter().map(|k| (k, 0.)).collect())
    }
}

impl Statistics {
    pub fn get(&self, k: Statistic) -> f64 {
        self.0.get(&k).copied().unwrap_or_default()
    }

    pub fn set(&mut self, k: Statistic, v: f64) {
        self.0.insert(k, v);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Statistic, f64)> + '_ {
        self.0.iter().map(|(&k, &v)| (k, v))
    }
}
