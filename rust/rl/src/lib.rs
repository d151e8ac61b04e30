//! Dynamic-programming solvers for finite Markov Decision Processes with a known model.

pub mod config;
pub mod envs;
mod error;
pub mod math;
pub mod mdps;

pub use config::Options;
pub use error::SolverError;
pub use mdps::{
    mdp::Mdp,
    mdp_solver::MdpSolver,
    solvers::policy_iteration::PolicyIteration,
    statistics::{Statistic, Statistics},
};
