use clap::{Parser, ValueEnum};
use gymnasium::{Discrete, Environment};
use policy_iteration::envs::{
    frozen_lake::FrozenLake, gym_adapter::GymAdapter, simple_golf::SimpleGolf,
    tabular::TabularMdp,
};
use policy_iteration::mdps::mdp_simulator::run_episode;
use policy_iteration::{Mdp, MdpSolver, Options, PolicyIteration, SolverError};
use rand::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EnvKind {
    /// FrozenLake built locally
    FrozenLake,
    SimpleGolf,
    /// Any discrete environment on a gymnasium http server
    Gym,
    /// A JSON model given with --model
    File,
}

#[derive(Debug, Parser)]
#[command(name = "policy-iteration")]
#[command(about = "Solves a finite MDP with Policy Iteration")]
struct Cli {
    #[arg(long, value_enum, default_value_t = EnvKind::FrozenLake)]
    env: EnvKind,

    /// FrozenLake map preset: 4x4 or 8x8
    #[arg(long, default_value = "4x4")]
    map: String,

    #[arg(long)]
    slippery: bool,

    #[arg(long, env = "GYM_URL", default_value = "http://127.0.0.1:40004")]
    gym_url: String,

    #[arg(long, default_value = "FrozenLake-v1")]
    gym_env: String,

    #[arg(long)]
    model: Option<PathBuf>,

    /// JSON options file, overridden by --gamma and --num-iterations
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    gamma: Option<f64>,

    #[arg(long)]
    num_iterations: Option<usize>,

    /// Episodes of the greedy policy to simulate on the model once solved
    #[arg(long, default_value_t = 100)]
    episodes: usize,

    #[arg(long, default_value_t = 100)]
    max_steps: usize,

    /// Start state of simulated episodes, the lake's 'S' or 0 when not given
    #[arg(long)]
    start: Option<Discrete>,

    #[arg(long, default_value_t = 2718)]
    seed: u64,
}

impl Cli {
    fn options(&self) -> Result<Options, SolverError> {
        let mut options = match &self.config {
            Some(path) => Options::from_json_file(path)?,
            None => Options::default(),
        };
        if let Some(gamma) = self.gamma {
            options.gamma = gamma;
        }
        if let Some(n) = self.num_iterations {
            options.num_iterations = Some(n);
        }

        options.validate()?;
        Ok(options)
    }

    fn mdp(&self) -> Result<(Rc<dyn Mdp>, Discrete), SolverError> {
        match self.env {
            EnvKind::FrozenLake => {
                let fl = FrozenLake::from_map_name(&self.map, self.slippery)?;
                let start = fl.start_state();
                Ok((Rc::new(fl), start))
            }

            EnvKind::SimpleGolf => Ok((Rc::new(SimpleGolf::default()), 0)),

            EnvKind::Gym => {
                let kwargs = if self.gym_env.starts_with("FrozenLake") {
                    vec![
                        ("map_name", Value::from(self.map.as_str())),
                        ("is_slippery", Value::from(self.slippery)),
                    ]
                } else {
                    vec![]
                };
                let env = Environment::new(&self.gym_url, &self.gym_env, None, None, None, &kwargs)?;
                info!(instance_id = env.instance_id(), "created gymnasium environment");
                Ok((Rc::new(GymAdapter::new(Rc::new(env))?), 0))
            }

            EnvKind::File => {
                let path = self.model.as_ref().ok_or_else(|| {
                    SolverError::InvalidOptions("--model is required with --env file".to_string())
                })?;
                let mdp = TabularMdp::from_json_str(&fs::read_to_string(path)?)?;
                Ok((Rc::new(mdp), 0))
            }
        }
    }
}

fn main() -> Result<(), SolverError> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let options = cli.options()?;
    let (mdp, default_start) = cli.mdp()?;
    info!(
        env = mdp.name(),
        n_s = ?mdp.n_s(),
        n_a = ?mdp.n_a(),
        gamma = options.gamma,
        "solving"
    );

    let pi = &mut PolicyIteration::new(Rc::clone(&mdp), &options)?;
    let (stable, iterations) = pi.exec(None)?;
    println!("{pi}: policy stable: {stable}, number of iterations: {iterations}");

    let n_s = pi.values().len();
    let v_star = (0..n_s).map(|s| pi.v_star(s)).collect::<Vec<_>>();
    println!("{v_star:?}");
    let pi_star = (0..n_s).map(|s| pi.pi_star(s)).collect::<Vec<_>>();
    println!("{pi_star:?}");
    println!("{}", serde_json::to_string(pi.statistics())?);

    if cli.episodes == 0 {
        return Ok(());
    }

    let start = cli.start.unwrap_or(default_start);
    if start >= n_s {
        return Err(SolverError::InvalidOptions(format!(
            "start state {start} is outside {n_s} states"
        )));
    }

    let rng = &mut StdRng::seed_from_u64(cli.seed);
    let mut greedy = pi.create_greedy_policy();
    let (mut total_reward, mut terminated) = (0., 0);
    for _ in 0..cli.episodes {
        let stats = run_episode(mdp.as_ref(), &mut *greedy, start, cli.max_steps, rng);
        total_reward += stats.reward;
        terminated += usize::from(stats.terminated);
    }
    println!(
        "Mean reward over {} episodes: {}, terminated: {terminated}",
        cli.episodes,
        total_reward / cli.episodes as f64
    );

    Ok(())
}
