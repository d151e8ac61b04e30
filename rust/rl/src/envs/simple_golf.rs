use super::tabular::TabularMdp;
use crate::mdps::mdp::Mdp;
use gymnasium::*;
use std::rc::Rc;

/// Three holes: 0 is off the green, 1 is on the green, 2 is in the hole.
/// Actions: 0 hits the fairway, 1 chips back, 2 putts.
///
/// https://towardsdatascience.com/reinforcement-learning-an-easy-introduction-to-value-iteration-e4cfe0731fd5
#[derive(Debug, Clone)]
pub struct SimpleGolf {
    mdp: TabularMdp,
}

impl SimpleGolf {
    pub fn table() -> Transitions {
        Transitions::from([
            (
                (0, 0),
                vec![
                    Transition {
                        next_state: 1,
                        probability: 0.9,
                        reward: 0.,
                        done: false,
                    },
                    Transition {
                        next_state: 0,
                        probability: 0.1,
                        reward: 0.,
                        done: false,
                    },
                ],
            ),
            (
                (1, 1),
                vec![
                    Transition {
                        next_state: 0,
                        probability: 0.9,
                        reward: 0.,
                        done: false,
                    },
                    Transition {
                        next_state: 1,
                        probability: 0.1,
                        reward: 0.,
                        done: false,
                    },
                ],
            ),
            (
                (1, 2),
                vec![
                    Transition {
                        next_state: 2,
                        probability: 0.9,
                        reward: 10.,
                        done: true,
                    },
                    Transition {
                        next_state: 1,
                        probability: 0.1,
                        reward: 0.,
                        done: false,
                    },
                ],
            ),
        ])
    }
}

impl Default for SimpleGolf {
    fn default() -> Self {
        Self {
            mdp: TabularMdp::from_parts("SimpleGolf", 3, 3, Self::table()),
        }
    }
}

impl Mdp for SimpleGolf {
    fn name(&self) -> &str {
        self.mdp.name()
    }

    fn observation_space(&self) -> &ObsActSpace {
        self.mdp.observation_space()
    }

    fn action_space(&self) -> &ObsActSpace {
        self.mdp.action_space()
    }

    fn transitions(&self) -> Rc<Transitions> {
        self.mdp.transitions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdps::mdp::validate_transitions;

    #[test]
    fn table_is_valid() {
        let golf = SimpleGolf::default();

        assert_eq!(golf.n_s(), Some(3));
        assert_eq!(golf.n_a(), Some(3));
        assert!(validate_transitions(&golf.transitions(), 3, 3).is_ok());
    }
}
