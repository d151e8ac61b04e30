extern crate reqwest;
extern crate serde;
extern crate serde_json;

mod error;

pub use error::{GymError, GymResult};

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::ser::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::rc::Rc;
use value_extensions::*;

pub type Discrete = usize;
pub type Continous = f64;

#[derive(Debug, Clone, PartialEq)]
pub enum ObsActSpace {
    /// Refer: https://www.gymlibrary.dev/api/spaces/#discrete
    Discrete { n: Discrete },

    /// Refer: https://www.gymlibrary.dev/api/spaces/#box
    Box {
        shape: Vec<Discrete>,
        high: Vec<Continous>,
        low: Vec<Continous>,
    },
}

impl ObsActSpace {
    pub fn from_json(info: &Map<String, Value>) -> GymResult<Self> {
        let name = info
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| GymError::malformed("space info has no name"))?;

        let field = |key: &str| {
            info.get(key)
                .ok_or_else(|| GymError::malformed(format!("{name} space info has no '{key}'")))
        };

        match name {
            "Discrete" => Ok(ObsActSpace::Discrete {
                n: as_discrete(field("n")?)?,
            }),
            "Box" => Ok(ObsActSpace::Box {
                shape: as_discrete_item_vec(field("shape")?)?,
                high: as_continous_item_vec(field("high")?)?,
                low: as_continous_item_vec(field("low")?)?,
            }),
            e => Err(GymError::UnsupportedSpace(e.to_string())),
        }
    }

    /// Number of elements of a discrete space, `None` for any other kind.
    pub fn discrete_n(&self) -> Option<Discrete> {
        match self {
            ObsActSpace::Discrete { n } => Some(*n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transition {
    pub next_state: Discrete,
    pub probability: Continous,
    pub reward: f64,
    pub done: bool,
}

/// Outcomes of taking action `a` in state `s`, keyed by `(s, a)`.
pub type Transitions = HashMap<(Discrete, Discrete), Vec<Transition>>;

/// Parses the transition table as served by `GET /v1/envs/{id}/transitions/`:
/// `{ "s": { "a": [[probability, next_state, reward, done], ...] } }`.
pub fn transitions_from_json(
    obj: &Map<String, Value>,
    n_s: Discrete,
    n_a: Discrete,
) -> GymResult<Transitions> {
    let mut transitions: Transitions = HashMap::new();
    for s in 0..n_s {
        let s_trans = obj
            .get(&s.to_string())
            .and_then(Value::as_object)
            .ok_or_else(|| GymError::malformed(format!("no transitions for state {s}")))?;
        for a in 0..n_a {
            let a_trans = s_trans
                .get(&a.to_string())
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    GymError::malformed(format!("no transitions for state {s}, action {a}"))
                })?;
            let ts = a_trans
                .iter()
                .map(transition_from_json)
                .collect::<GymResult<Vec<_>>>()?;

            transitions.insert((s, a), ts);
        }
    }

    Ok(transitions)
}

fn transition_from_json(t: &Value) -> GymResult<Transition> {
    match t.as_array().map(Vec::as_slice) {
        Some([p, next, r, done]) => Ok(Transition {
            probability: as_continous(p)?,
            next_state: as_discrete(next)?,
            reward: as_continous(r)?,
            done: done
                .as_bool()
                .ok_or_else(|| GymError::malformed(format!("{done} is not a bool")))?,
        }),
        _ => Err(GymError::malformed(format!("{t} is not a transition tuple"))),
    }
}

/// Create a gymnasium environment or get reference to an existing one.
/// NOTE: All APIs are sync for now as the server is expected to be local.
#[derive(Debug)]
pub struct Environment {
    client: Client,
    api_url: String,
    instance_id: String,
    obs_space: ObsActSpace,
    act_space: ObsActSpace,
}

impl Environment {
    pub fn envs(api_url: &str) -> GymResult<HashMap<String, String>> {
        let client = Client::new(api_url);

        let url = client.make_api_url("");
        let val = client.http_get(&url)?;

        let obj = val["all_envs"]
            .as_object()
            .ok_or_else(|| GymError::malformed("no all_envs returned"))?;

        Ok(obj
            .iter()
            .map(|(k, v)| (k.clone(), v.as_str().unwrap_or_default().to_string()))
            .collect())
    }

    pub fn new(
        api_url: &str,
        env_name: &str,
        max_episode_steps: Option<Discrete>,
        auto_reset: Option<bool>,
        disable_env_checker: Option<bool>,
        kwargs: &[(&str, Value)],
    ) -> GymResult<Self> {
        let mut body = HashMap::from([("env_id", Value::from(env_name))]);

        if let Some(max_episode_steps) = max_episode_steps {
            body.insert("max_episode_steps", Value::from(max_episode_steps));
        }

        if let Some(auto_reset) = auto_reset {
            body.insert("auto_reset", Value::from(auto_reset));
        }

        if let Some(disable_env_checker) = disable_env_checker {
            body.insert("disable_env_checker", Value::from(disable_env_checker));
        }

        let kwargs = kwargs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<Map<String, Value>>();
        body.insert("kwargs", Value::Object(kwargs));

        let c = Client::new(api_url);
        let base_url = c.make_api_url("");
        let obj = c.http_post(&base_url, &body)?;
        let inst_id = obj["instance_id"]
            .as_str()
            .ok_or_else(|| GymError::malformed("no instance_id returned"))?;

        Self::reference(api_url, inst_id)
    }

    pub fn reference(api_url: &str, instance_id: &str) -> GymResult<Self> {
        let client = Client::new(api_url);

        let obs_space = Self::fetch_space(&client, instance_id, "observation_space")?;
        let act_space = Self::fetch_space(&client, instance_id, "action_space")?;

        let env_api_url = client.make_api_url(&format!("{instance_id}/"));
        Ok(Self {
            client,
            api_url: env_api_url,
            instance_id: instance_id.to_string(),
            obs_space,
            act_space,
        })
    }

    fn fetch_space(client: &Client, instance_id: &str, which: &str) -> GymResult<ObsActSpace> {
        let url = client.make_api_url(&format!("{instance_id}/{which}/"));
        let obj = client.http_get(&url)?;
        let info = obj["info"]
            .as_object()
            .ok_or_else(|| GymError::malformed(format!("no info returned for {which}")))?;
        ObsActSpace::from_json(info)
    }

    pub fn client_base_url(&self) -> &str {
        self.client.base_url()
    }

    pub fn name(&self) -> GymResult<String> {
        let obj = self.client.http_get(&self.api_url)?;

        obj["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| GymError::malformed("no id returned"))
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// The Space object corresponding to valid actions, all valid actions should be contained with the space.
    /// For example, if the action space is of type Discrete and gives the value Discrete(2), this means there
    /// are two valid discrete actions: 0 & 1.
    /// Refer: https://gymnasium.farama.org/api/env/#gymnasium.Env.action_space
    pub fn action_space(&self) -> &ObsActSpace {
        &self.act_space
    }

    /// The Space object corresponding to valid observations, all valid observations should be contained with
    /// the space.
    /// Refer: https://gymnasium.farama.org/api/env/#gymnasium.Env.observation_space
    pub fn observation_space(&self) -> &ObsActSpace {
        &self.obs_space
    }

    /// Fetches `env.P` from the server. Only environments with discrete observation and
    /// action spaces expose one.
    pub fn transitions(&self) -> GymResult<Rc<Transitions>> {
        let (n_s, n_a) = match (self.observation_space(), self.action_space()) {
            (ObsActSpace::Discrete { n: n_s }, ObsActSpace::Discrete { n: n_a }) => (*n_s, *n_a),
            (o, a) => {
                return Err(GymError::UnsupportedSpace(format!(
                    "transitions need discrete observation and action spaces, got {o:?} and {a:?}"
                )))
            }
        };

        let url = self.make_api_url("transitions/");
        let obj = self.client.http_get(&url)?;
        let obj = obj["transitions"]
            .as_object()
            .ok_or_else(|| GymError::malformed("no transitions returned"))?;

        transitions_from_json(obj, n_s, n_a).map(Rc::new)
    }

    fn make_api_url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }
}

#[derive(Debug)]
pub struct Client {
    base_url: String,
    api_url: String,
    client: reqwest::blocking::Client,
}

impl Client {
    pub fn new(base_url: &str) -> Self {
        let mut base_url = base_url.replace("//localhost:", "//127.0.0.1:");
        if base_url.ends_with('/') {
            _ = base_url.remove(base_url.len() - 1);
        }

        let api_url = format!("{base_url}/v1/envs/");

        Self {
            base_url,
            api_url,
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn make_api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn http_get(&self, url: &str) -> GymResult<Value> {
        let res = self
            .client
            .get(url)
            .headers(Self::construct_common_headers())
            .send()?;
        Ok(res.error_for_status()?.json::<Value>()?)
    }

    fn http_post<T: Serialize>(&self, url: &str, body: &HashMap<&str, T>) -> GymResult<Value> {
        let res = self
            .client
            .post(url)
            .headers(Self::construct_common_headers())
            .json(body)
            .send()?;
        Ok(res.error_for_status()?.json::<Value>()?)
    }

    fn construct_common_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }
}

mod value_extensions {
    use super::*;

    pub fn as_discrete(val: &Value) -> GymResult<Discrete> {
        val.as_u64()
            .map(|x| x as Discrete)
            .ok_or_else(|| GymError::malformed(format!("{val} is not a non-negative integer")))
    }

    pub fn as_continous(val: &Value) -> GymResult<Continous> {
        val.as_f64()
            .ok_or_else(|| GymError::malformed(format!("{val} is not a number")))
    }

    pub fn as_discrete_item_vec(val: &Value) -> GymResult<Vec<Discrete>> {
        val.as_array()
            .ok_or_else(|| GymError::malformed(format!("{val} is not an array")))?
            .iter()
            .map(as_discrete)
            .collect()
    }

    pub fn as_continous_item_vec(val: &Value) -> GymResult<Vec<Continous>> {
        val.as_array()
            .ok_or_else(|| GymError::malformed(format!("{val} is not an array")))?
            .iter()
            .map(as_continous)
            .collect()
    }
}
