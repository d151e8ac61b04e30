extern crate gymnasium;
extern crate serde_json;

use gymnasium::*;
use serde_json::to_value;

fn main() -> GymResult<()> {
    let envs = Environment::envs("http://127.0.0.1:40004")?;
    println!("Open environments: {:?}", envs);
    let env = Environment::new(
        "http://127.0.0.1:40004",
        "FrozenLake-v1",
        Some(100),
        Some(false),
        Some(true),
        &[
            ("map_name", to_value("8x8").unwrap()),
            ("is_slippery", to_value(true).unwrap()),
        ],
    )?;

    println!("observation space:\n{:?}\n", env.observation_space());
    println!("action space:\n{:?}\n", env.action_space());
    let transitions = env.transitions()?;
    println!("transtion (14, 2):\n{:?}\n", transitions[&(14, 2)]);

    Ok(())
}
