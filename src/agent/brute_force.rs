use tracing::{debug, info};

use super::Agent;
use crate::{environment::Environment, error::AgentError, path::Path};

impl<E: Environment> Agent<E> {
    /// Finds some path to the goal by random walking and trims it. The result becomes the best path.
    pub fn brute_force(&mut self) -> Result<Path, AgentError> {
        let found = self.generate_path()?;
        let trimmed = self.trim_path(&found)?;
        info!("brute force trimmed {found} down to {trimmed}");
        self.best = Some(trimmed.clone());
        Ok(trimmed)
    }

    /// Walks randomly until the goal is reached and makes the walk the best path.
    pub fn generate_path(&mut self) -> Result<Path, AgentError> {
        self.reset()?;
        self.stats.resets += 1;
        let path = self.memory.most_recent_path();
        self.best = Some(path.clone());
        Ok(path)
    }

    /// Issues the symbols of `path` one after another. Returns true as soon as the goal is sensed, even if
    /// some symbols were not issued yet.
    pub fn try_path(&mut self, path: &Path) -> Result<bool, AgentError> {
        for symbol in path.iter() {
            if self.act(symbol)?.is_goal() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Removes symbols from a path that leads to the goal as long as the result still leads to the goal. Each
    /// symbol is removed tentatively and put back if the shortened path fails, in which case the agent
    /// reorients before the next try. Passes over the path are repeated until one of them removes nothing, so
    /// removing any single symbol from the result breaks it. The agent has to be in the initial state.
    pub fn trim_path(&mut self, path: &Path) -> Result<Path, AgentError> {
        let mut trimmed = path.clone();
        loop {
            let mut removed_any = false;
            let mut i = 0;
            while i < trimmed.len() {
                let removed = trimmed.remove(i);
                if self.try_path(&trimmed)? {
                    debug!("{removed} at {i} is not needed, trying {trimmed}");
                    removed_any = true;
                    continue;
                }
                self.smart_reset()?;
                trimmed.insert(i, removed);

                let recent = self.memory.most_recent_path();
                if self.best.as_ref().map_or(true, |best| recent.len() < best.len()) {
                    debug!("reorientation found the shorter path {recent}");
                    self.best = Some(recent);
                }
                i += 1;
            }
            if !removed_any {
                return Ok(trimmed);
            }
        }
    }
}
