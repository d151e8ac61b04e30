use crate::mdps::mdp::{validate_transitions, Mdp};
use crate::SolverError;
use gymnasium::*;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::rc::Rc;

/// An MDP whose whole model lives in memory.
#[derive(Debug, Clone)]
pub struct TabularMdp {
    name: String,
    obs_space: ObsActSpace,
    act_space: ObsActSpace,
    transitions: Rc<Transitions>,
}

/// On-disk form of a model. `transitions` uses the same layout as the gymnasium server:
/// `{ "s": { "a": [[probability, next_state, reward, done], ...] } }`.
#[derive(Debug, Deserialize)]
struct TabularMdpFile {
    name: String,
    n_s: usize,
    n_a: usize,
    transitions: Map<String, Value>,
}

impl TabularMdp {
    pub fn new(
        name: impl Into<String>,
        n_s: usize,
        n_a: usize,
        transitions: Transitions,
    ) -> Result<Self, SolverError> {
        validate_transitions(&transitions, n_s, n_a)?;

        Ok(Self::from_parts(name, n_s, n_a, transitions))
    }

    /// Skips validation. Only for tables built by this crate.
    pub(crate) fn from_parts(
        name: impl Into<String>,
        n_s: usize,
        n_a: usize,
        transitions: Transitions,
    ) -> Self {
        Self {
            name: name.into(),
            obs_space: ObsActSpace::Discrete { n: n_s },
            act_space: ObsActSpace::Discrete { n: n_a },
            transitions: Rc::new(transitions),
        }
    }

    pub fn from_json_str(data: &str) -> Result<Self, SolverError> {
        let file: TabularMdpFile = serde_json::from_str(data)?;
        let transitions = transitions_from_json(&file.transitions, file.n_s, file.n_a)?;

        Self::new(file.name, file.n_s, file.n_a, transitions)
    }
}

impl Mdp for TabularMdp {
    fn name(&self) -> &str {
        &self.name
    }

    fn observation_space(&self) -> &ObsActSpace {
        &self.obs_space
    }

    fn action_space(&self) -> &ObsActSpace {
        &self.act_space
    }

    fn transitions(&self) -> Rc<Transitions> {
        Rc::clone(&self.transitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_from_json() {
        let mdp = TabularMdp::from_json_str(
            r#"{
                "name": "coin",
                "n_s": 2,
                "n_a": 1,
                "transitions": {
                    "0": { "0": [[0.5, 0, 0.0, false], [0.5, 1, 1.0, true]] },
                    "1": { "0": [[1.0, 1, 0.0, true]] }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(mdp.name(), "coin");
        assert_eq!(mdp.n_s(), Some(2));
        assert_eq!(mdp.n_a(), Some(1));
        assert_eq!(mdp.transitions()[&(0, 0)].len(), 2);
    }

    #[test]
    fn invalid_model_is_rejected() {
        let err = TabularMdp::from_json_str(
            r#"{
                "name": "leaky",
                "n_s": 1,
                "n_a": 1,
                "transitions": { "0": { "0": [[0.5, 0, 0.0, false]] } }
            }"#,
        )
        .unwrap_err();

        assert!(matches!(err, SolverError::InvalidModel(_)));
    }

    #[test]
    fn truncated_table_is_a_gym_error() {
        let err = TabularMdp::from_json_str(
            r#"{ "name": "short", "n_s": 2, "n_a": 1, "transitions": {} }"#,
        )
        .unwrap_err();

        assert!(matches!(err, SolverError::Gym(GymError::Malformed(_))));
    }
}
