use tracing::{debug, trace, warn};

use super::Agent;
use crate::{environment::Environment, error::AgentError};

impl<E: Environment> Agent<E> {
    /// Gets back to the goal, preferably by replaying remembered history. Reorientation is attempted
    /// [`max_resets`](crate::config::AgentConfig::max_resets) times, after that (or if reorientation is disabled)
    /// the agent walks randomly until it reaches the goal.
    pub fn smart_reset(&mut self) -> Result<(), AgentError> {
        self.stats.resets += 1;
        if self.config.reorientation {
            for _ in 0..self.config.max_resets {
                if self.smart_reset_helper()? {
                    return Ok(());
                }
            }
            self.stats.reorient_failures += 1;
            warn!("reorientation failed, falling back to random walking");
        }
        self.reset()
    }

    /// Finds the earlier point in memory that matches the tail of memory the longest and replays the commands
    /// issued from there up to the goal that followed. Every observed sensor is compared with the one recorded
    /// back then. Returns true as soon as the goal is reached and false if there is nothing to replay or the
    /// environment behaves differently than remembered.
    pub fn smart_reset_helper(&mut self) -> Result<bool, AgentError> {
        let Some(start) = self.memory.max_matched_string_index() else {
            trace!("nothing in memory to reorient with");
            return Ok(false);
        };
        let Some(goal) = self.memory.find_last_goal(self.memory.len()) else {
            return Ok(false);
        };
        debug!("reorienting by replaying episodes {start}..{goal}");

        for k in start..goal {
            let (Some(command), Some(expected)) = (
                self.memory.get(k).and_then(|ep| ep.command),
                self.memory.get(k + 1).map(|ep| ep.sensor),
            ) else {
                return Ok(false);
            };
            let sensor = self.act(command)?;
            if sensor.is_goal() {
                return Ok(true);
            }
            if sensor != expected {
                debug!("replay of episode {k} diverged");
                return Ok(false);
            }
        }
        Ok(false)
    }

    /// Acts randomly until the goal is reached.
    pub fn reset(&mut self) -> Result<(), AgentError> {
        loop {
            let symbol = self.random_action();
            if self.act(symbol)?.is_goal() {
                return Ok(());
            }
        }
    }

    /// Draws a symbol uniformly from the alphabet.
    pub fn random_action(&mut self) -> char {
        self.alphabet[self.rng.usize(..self.alphabet.size())]
    }
}
