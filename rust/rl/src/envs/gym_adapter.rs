use crate::mdps::mdp::{validate_transitions, Mdp};
use crate::SolverError;
use gymnasium::*;
use std::rc::Rc;

/// An environment served by a gymnasium http server, seen as an MDP.
///
/// Spaces and `env.P` are fetched once. Environments without discrete spaces get an empty
/// transition table and are turned away by the solvers.
pub struct GymAdapter {
    name: String,
    env: Rc<Environment>,
    transitions: Rc<Transitions>,
}

impl GymAdapter {
    pub fn new(env: Rc<Environment>) -> Result<Self, SolverError> {
        let name = env.name()?;
        let transitions = match (
            env.observation_space().discrete_n(),
            env.action_space().discrete_n(),
        ) {
            (Some(n_s), Some(n_a)) => {
                let transitions = env.transitions()?;
                validate_transitions(&transitions, n_s, n_a)?;
                transitions
            }
            _ => Rc::new(Transitions::new()),
        };

        Ok(Self {
            name,
            env,
            transitions,
        })
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }
}

impl Mdp for GymAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn observation_space(&self) -> &ObsActSpace {
        self.env.observation_space()
    }

    fn action_space(&self) -> &ObsActSpace {
        self.env.action_space()
    }

    fn transitions(&self) -> Rc<Transitions> {
        Rc::clone(&self.transitions)
    }
}
