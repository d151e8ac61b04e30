use gymnasium::GymError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("{solver} cannot handle non-discrete {kind} spaces")]
    NonDiscreteSpace {
        solver: &'static str,
        kind: &'static str,
    },

    /// `A · V = b` has no unique solution. With γ = 1 any absorbing state makes its row zero.
    #[error("policy evaluation failed: the {n}x{n} linear system is singular (gamma = {gamma})")]
    SingularSystem { n: usize, gamma: f64 },

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Gymnasium error: {0}")]
    Gym(#[from] GymError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
