use crate::SolverError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Solver options, loadable from JSON. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Discount factor.
    pub gamma: f64,

    /// Upper bound on outer iterations when driving the solver to a stable policy.
    pub num_iterations: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            gamma: 0.9,
            num_iterations: None,
        }
    }
}

impl Options {
    pub fn new(gamma: f64) -> Self {
        Self {
            gamma,
            ..Default::default()
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SolverError> {
        let data = fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn from_json_str(data: &str) -> Result<Self, SolverError> {
        let opts: Self = serde_json::from_str(data)?;
        opts.validate()?;
        Ok(opts)
    }

    /// γ = 0 is accepted; γ = 1 is accepted but only solvable for models without absorbing states.
    pub fn validate(&self) -> Result<(), SolverError> {
        if !self.gamma.is_finite() || !(0.0..=1.0).contains(&self.gamma) {
            return Err(SolverError::InvalidOptions(format!(
                "gamma must be in [0, 1], got {}",
                self.gamma
            )));
        }

        if self.num_iterations == Some(0) {
            return Err(SolverError::InvalidOptions(
                "num_iterations must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
