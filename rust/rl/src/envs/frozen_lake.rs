use super::tabular::TabularMdp;
use crate::mdps::mdp::Mdp;
use crate::SolverError;
use gymnasium::*;
use std::rc::Rc;

pub const MAP_4X4: [&str; 4] = ["SFFF", "FHFH", "FFFH", "HFFG"];

pub const MAP_8X8: [&str; 8] = [
    "SFFFFFFF", "FFFFFFFF", "FFFHFFFF", "FFFFFHFF", "FFFHFFFF", "FHHFFFHF", "FHFFHFHF", "FFFHFFFG",
];

pub const LEFT: Discrete = 0;
pub const DOWN: Discrete = 1;
pub const RIGHT: Discrete = 2;
pub const UP: Discrete = 3;

const N_ACTIONS: usize = 4;

/// Gymnasium's `FrozenLake-v1` with its transition table built locally.
///
/// Cells are `S` (start), `F` (frozen), `H` (hole) and `G` (goal). Reaching `G` pays 1 and ends
/// the episode, falling into `H` ends it with nothing. On a slippery lake the agent moves in the
/// intended direction or in either perpendicular one, each with probability 1/3.
///
/// Refer: https://gymnasium.farama.org/environments/toy_text/frozen_lake/
#[derive(Debug, Clone)]
pub struct FrozenLake {
    desc: Vec<Vec<u8>>,
    mdp: TabularMdp,
}

impl FrozenLake {
    pub fn new<S: AsRef<str>>(desc: &[S], is_slippery: bool) -> Result<Self, SolverError> {
        let desc = desc
            .iter()
            .map(|row| row.as_ref().as_bytes().to_vec())
            .collect::<Vec<_>>();

        let nrow = desc.len();
        let ncol = desc.first().map_or(0, Vec::len);
        if nrow == 0 || ncol == 0 || desc.iter().any(|row| row.len() != ncol) {
            return Err(SolverError::InvalidModel(
                "lake must be a non-empty rectangle".to_string(),
            ));
        }
        if let Some(c) = desc.iter().flatten().find(|&&c| !b"SFHG".contains(&c)) {
            return Err(SolverError::InvalidModel(format!(
                "unknown lake cell '{}'",
                *c as char
            )));
        }
        if !desc.iter().flatten().any(|&c| c == b'S') {
            return Err(SolverError::InvalidModel("lake has no start".to_string()));
        }

        let lake = Lake {
            desc: &desc,
            nrow,
            ncol,
        };
        let transitions = lake.transitions(is_slippery);
        let mdp = TabularMdp::from_parts("FrozenLake-v1", nrow * ncol, N_ACTIONS, transitions);

        Ok(Self { desc, mdp })
    }

    /// `map_name` is one of Gymnasium's presets, `4x4` or `8x8`.
    pub fn from_map_name(map_name: &str, is_slippery: bool) -> Result<Self, SolverError> {
        match map_name {
            "4x4" => Self::new(&MAP_4X4, is_slippery),
            "8x8" => Self::new(&MAP_8X8, is_slippery),
            m => Err(SolverError::InvalidModel(format!("unknown map '{m}'"))),
        }
    }

    pub fn start_state(&self) -> Discrete {
        self.desc
            .iter()
            .flatten()
            .position(|&c| c == b'S')
            .unwrap_or_default()
    }
}

/// Borrowed view of a lake map while its transitions are built.
struct Lake<'a> {
    desc: &'a [Vec<u8>],
    nrow: usize,
    ncol: usize,
}

impl Lake<'_> {
    fn to_s(&self, row: usize, col: usize) -> Discrete {
        row * self.ncol + col
    }

    fn inc(&self, row: usize, col: usize, a: Discrete) -> (usize, usize) {
        match a {
            LEFT => (row, col.saturating_sub(1)),
            DOWN => ((row + 1).min(self.nrow - 1), col),
            RIGHT => (row, (col + 1).min(self.ncol - 1)),
            _ => (row.saturating_sub(1), col),
        }
    }

    fn outcome(&self, row: usize, col: usize, a: Discrete, probability: f64) -> Transition {
        let (new_row, new_col) = self.inc(row, col, a);
        let new_letter = self.desc[new_row][new_col];

        Transition {
            next_state: self.to_s(new_row, new_col),
            probability,
            reward: if new_letter == b'G' { 1. } else { 0. },
            done: new_letter == b'G' || new_letter == b'H',
        }
    }

    fn transitions(&self, is_slippery: bool) -> Transitions {
        let mut transitions = Transitions::new();
        for row in 0..self.nrow {
            for col in 0..self.ncol {
                let s = self.to_s(row, col);
                let letter = self.desc[row][col];
                for a in 0..N_ACTIONS {
                    let ts = if letter == b'G' || letter == b'H' {
                        vec![Transition {
                            next_state: s,
                            probability: 1.,
                            reward: 0.,
                            done: true,
                        }]
                    } else if is_slippery {
                        [(a + N_ACTIONS - 1) % N_ACTIONS, a, (a + 1) % N_ACTIONS]
                            .into_iter()
                            .map(|b| self.outcome(row, col, b, 1. / 3.))
                            .collect()
                    } else {
                        vec![self.outcome(row, col, a, 1.)]
                    };

                    transitions.insert((s, a), ts);
                }
            }
        }

        transitions
    }
}

impl Mdp for FrozenLake {
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
    use float_eq::*;
    use rstest::rstest;

    #[rstest]
    #[case("4x4", 16)]
    #[case("8x8", 64)]
    fn presets_are_valid(#[case] map_name: &str, #[case] n_s: usize) {
        for is_slippery in [false, true] {
            let fl = FrozenLake::from_map_name(map_name, is_slippery).unwrap();

            assert_eq!(fl.n_s(), Some(n_s));
            assert_eq!(fl.n_a(), Some(4));
            assert_eq!(fl.transitions().len(), n_s * 4);
            assert!(validate_transitions(&fl.transitions(), n_s, 4).is_ok());
        }
    }

    #[test]
    fn slippery_move_next_to_goal() {
        let fl = FrozenLake::new(&MAP_4X4, true).unwrap();
        let ts = fl.transitions();

        let right = &ts[&(14, RIGHT)];

        // Slips down (into the wall), goes right, or slips up.
        assert_eq!(
            right.iter().map(|t| t.next_state).collect::<Vec<_>>(),
            vec![14, 15, 10]
        );
        assert_float_eq!(
            right.iter().map(|t| t.reward).collect::<Vec<_>>(),
            vec![0., 1., 0.],
            abs_all <= 1e-12
        );
        assert_eq!(
            right.iter().map(|t| t.done).collect::<Vec<_>>(),
            vec![false, true, false]
        );
        assert_float_eq!(right[0].probability, 1. / 3., abs <= 1e-12);
    }

    #[test]
    fn walls_and_holes() {
        let fl = FrozenLake::new(&MAP_4X4, false).unwrap();
        let ts = fl.transitions();

        assert_eq!(ts[&(0, LEFT)][0].next_state, 0);
        assert_eq!(ts[&(0, UP)][0].next_state, 0);
        assert!(ts[&(1, DOWN)][0].done);
        assert_float_eq!(ts[&(1, DOWN)][0].reward, 0., abs <= 1e-12);
        // Holes and the goal are absorbing.
        for s in [5, 15] {
            assert_eq!(
                ts[&(s, RIGHT)],
                vec![Transition {
                    next_state: s,
                    probability: 1.,
                    reward: 0.,
                    done: true
                }]
            );
        }
    }

    #[test]
    fn custom_desc() {
        let fl = FrozenLake::new(&["GGGH", "GSGH", "GGGF", "FFFG"], false).unwrap();

        assert_eq!(fl.start_state(), 5);
        let down = &fl.transitions()[&(5, DOWN)];
        assert_eq!(down[0].next_state, 9);
        assert!(down[0].done);
        assert_float_eq!(down[0].reward, 1., abs <= 1e-12);
    }

    #[rstest]
    #[case(&[])]
    #[case(&["SF", "F"])]
    #[case(&["SX"])]
    #[case(&["FG"])]
    fn bad_desc(#[case] desc: &[&str]) {
        assert!(matches!(
            FrozenLake::new(desc, false),
            Err(SolverError::InvalidModel(_))
        ));
    }

    #[test]
    fn unknown_map_name() {
        assert!(FrozenLake::from_map_name("5x5", true).is_err());
    }
}
