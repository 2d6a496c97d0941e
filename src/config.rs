use std::{fmt::Display, str::FromStr};

use tracing::warn;

/// Default bound on the number of episodes an agent may record before it gives up.
pub const EPISODE_THRESHOLD: usize = 500_000;

/// Knobs of an [`Agent`](crate::agent::Agent) run.
///
/// # Example
/// ```
/// use automata_explorer::prelude::*;
///
/// let config = AgentConfig::default().with_seed(7).with_max_resets(3);
/// assert_eq!(config.max_resets, 3);
/// assert!(config.reorientation);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// How often reorientation through memory replay is attempted before falling back to random walking.
    pub max_resets: usize,
    /// Whether reorientation through memory replay is used at all.
    pub reorientation: bool,
    /// Seed of the random generator, a random seed is used if this is `None`.
    pub seed: Option<u64>,
    /// Growth ceiling, the run ends with an error once memory holds this many episodes.
    pub max_episodes: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_resets: 1,
            reorientation: true,
            seed: None,
            max_episodes: EPISODE_THRESHOLD,
        }
    }
}

impl AgentConfig {
    /// Starts from the defaults and applies the overrides found in the environment variables `MAX_EPISODES` and
    /// `AGENT_SEED`. Values that cannot be parsed are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(max_episodes) = parse_var("MAX_EPISODES") {
            config.max_episodes = max_episodes;
        }
        if let Some(seed) = parse_var("AGENT_SEED") {
            config.seed = Some(seed);
        }
        config
    }

    /// Sets the reorientation retry bound.
    pub fn with_max_resets(mut self, max_resets: usize) -> Self {
        self.max_resets = max_resets;
        self
    }

    /// Enables or disables reorientation.
    pub fn with_reorientation(mut self, reorientation: bool) -> Self {
        self.reorientation = reorientation;
        self
    }

    /// Fixes the seed of the random generator.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the growth ceiling.
    pub fn with_max_episodes(mut self, max_episodes: usize) -> Self {
        self.max_episodes = max_episodes;
        self
    }

    /// Creates the random generator an agent draws from.
    pub fn rng(&self) -> fastrand::Rng {
        match self.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        }
    }
}

fn parse_var<T>(name: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    let value = std::env::var(name).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!("ignoring {name}={value}: {err}");
            None
        }
    }
}
