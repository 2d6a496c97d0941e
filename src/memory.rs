use itertools::Itertools;

use crate::{
    automaton::{StateId, INIT_STATE},
    path::Path,
    sensor::SensorEncoding,
    Show,
};

/// A single entry of the [`EpisodicMemory`]. An episode is created when the agent arrives somewhere: it stores
/// the sensor that was observed on arrival and the state the agent believed to be in afterwards. The command is
/// filled in once the agent acts from there, so the result of `command` is found in the *next* episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Episode {
    /// The command issued from this episode, `None` while it is still pending.
    pub command: Option<char>,
    /// Encoded sensor observed when arriving.
    pub sensor: SensorEncoding,
    /// The believed state on arrival.
    pub state: StateId,
}

impl Episode {
    /// Creates a pending episode, i.e. one for which no command has been issued yet.
    pub fn pending(sensor: SensorEncoding, state: StateId) -> Self {
        Self {
            command: None,
            sensor,
            state,
        }
    }

    /// Creates an episode whose command is already known.
    pub fn new(command: char, sensor: SensorEncoding, state: StateId) -> Self {
        Self {
            command: Some(command),
            sensor,
            state,
        }
    }

    /// Returns true if the goal was sensed when arriving in this episode.
    pub fn is_goal(&self) -> bool {
        self.sensor.is_goal()
    }
}

impl Show for Episode {
    fn show(&self) -> String {
        format!(
            "{}{}@{}",
            self.command.show(),
            self.sensor.show(),
            self.state
        )
    }
}

/// Append-only history of the interaction with the environment. Memory always holds at least the initial
/// placeholder episode, and its last episode is the pending one that the next command completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodicMemory {
    episodes: Vec<Episode>,
}

impl Default for EpisodicMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl EpisodicMemory {
    /// Creates a memory holding only the initial placeholder episode, which places the agent in the
    /// initial state.
    pub fn new() -> Self {
        Self {
            episodes: vec![Episode::pending(SensorEncoding::NoTransition, INIT_STATE)],
        }
    }

    /// Creates a memory from a sequence of episodes. Panics if `episodes` is empty.
    pub fn from_episodes<I: IntoIterator<Item = Episode>>(episodes: I) -> Self {
        let episodes = episodes.into_iter().collect_vec();
        assert!(!episodes.is_empty(), "memory needs at least one episode");
        Self { episodes }
    }

    /// Number of episodes, including the pending one.
    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    /// Memory is never empty, this exists for symmetry with [`Self::len`].
    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// Returns the episode at `index`.
    pub fn get(&self, index: usize) -> Option<&Episode> {
        self.episodes.get(index)
    }

    /// The pending episode.
    pub fn last(&self) -> &Episode {
        self.episodes
            .last()
            .expect("episodic memory always holds the initial episode")
    }

    /// All episodes in order.
    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    /// Iterates over all episodes in order.
    pub fn iter(&self) -> impl Iterator<Item = &Episode> + '_ {
        self.episodes.iter()
    }

    /// Completes the pending episode with the command that is issued from it.
    pub fn issue(&mut self, command: char) {
        if let Some(pending) = self.episodes.last_mut() {
            pending.command = Some(command);
        }
    }

    /// Records the arrival in `state` after sensing `sensor`, which opens a new pending episode.
    pub fn observe(&mut self, sensor: SensorEncoding, state: StateId) {
        self.episodes.push(Episode::pending(sensor, state));
    }

    /// Overwrites the believed states of the last episodes with the given ones, aligned at the end.
    pub fn relabel_tail<I>(&mut self, states: I)
    where
        I: IntoIterator<Item = StateId>,
        I::IntoIter: ExactSizeIterator,
    {
        let states = states.into_iter();
        let start = self.episodes.len().saturating_sub(states.len());
        for (episode, state) in self.episodes[start..].iter_mut().zip(states) {
            episode.state = state;
        }
    }

    /// Searches backwards from `before - 1` for an episode in which the goal was sensed and returns its
    /// index. The initial episode at index 0 is never considered.
    pub fn find_last_goal(&self, before: usize) -> Option<usize> {
        (1..before.min(self.len())).rev().find(|&i| self.episodes[i].is_goal())
    }

    /// Counts how many consecutive (command, result) pairs, going backwards from `candidate`, agree with the
    /// pairs at the tail of memory. A pair consists of the command of one episode and the sensor of the
    /// episode after it, so the command is aligned with the result it produced.
    pub fn matched_string_length(&self, candidate: usize) -> usize {
        let mut length = 0;
        let mut tail = self.len() - 1;
        for i in (0..=candidate).rev() {
            if tail < 1 || i + 1 >= tail {
                break;
            }
            let current = (self.episodes[tail - 1].command, self.episodes[tail].sensor);
            let previous = (self.episodes[i].command, self.episodes[i + 1].sensor);
            if current != previous {
                break;
            }
            length += 1;
            tail -= 1;
        }
        length
    }

    /// Finds the episode before the last goal at which the longest suffix of memory ends, i.e. the earlier
    /// counterpart of the pending episode. Candidates are scanned backwards from just before the last goal and
    /// the first one with the longest match is kept.
    ///
    /// Returns `None` if no goal was reached so far or the goal was reached with the latest action. If there is
    /// a previous goal but nothing matches, the initial episode (index 0) is returned.
    pub fn max_matched_string_index(&self) -> Option<usize> {
        let last_goal = self.find_last_goal(self.len())?;
        if last_goal == self.len() - 1 {
            return None;
        }

        let mut max_index = 0;
        let mut max_length = 0;
        for i in (0..last_goal).rev() {
            let length = self.matched_string_length(i);
            if length > max_length {
                max_length = length;
                max_index = i + 1;
            }
        }
        Some(max_index)
    }

    /// Returns the commands that were issued since the goal preceding the latest episode, i.e. the most recent
    /// path that led to the goal if the agent just reached it.
    pub fn most_recent_path(&self) -> Path {
        let end = self.len() - 1;
        let start = self.find_last_goal(end).unwrap_or(0);
        self.episodes[start..end]
            .iter()
            .filter_map(|episode| episode.command)
            .collect()
    }
}

impl Show for EpisodicMemory {
    fn show(&self) -> String {
        self.episodes
            .iter()
            .enumerate()
            .map(|(i, episode)| format!("{i}:{}", episode.show()))
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::{Episode, EpisodicMemory};
    use crate::sensor::SensorEncoding::{self, *};

    /// Builds a memory from (command, sensor) pairs, the believed state is irrelevant for matching.
    fn memory(history: &[(char, SensorEncoding)], pending: SensorEncoding) -> EpisodicMemory {
        EpisodicMemory::from_episodes(
            history
                .iter()
                .map(|&(c, s)| Episode::new(c, s, 1))
                .chain(std::iter::once(Episode::pending(pending, 1))),
        )
    }

    #[test]
    fn no_goal_no_match() {
        let mem = memory(&[('a', NoTransition), ('b', TransitionOnly)], NoTransition);
        assert_eq!(mem.find_last_goal(mem.len()), None);
        assert_eq!(mem.max_matched_string_index(), None);
    }

    #[test]
    fn just_reached_goal() {
        let mem = memory(&[('a', NoTransition), ('b', TransitionOnly)], Goal);
        assert_eq!(mem.find_last_goal(mem.len()), Some(2));
        assert_eq!(mem.max_matched_string_index(), None);
    }

    #[test]
    fn suffix_matching_is_offset_by_one() {
        // run "ab" reached the goal, a fresh run issued "a" and sensed a transition again
        let mem = memory(
            &[
                ('a', NoTransition),
                ('b', TransitionOnly),
                ('a', Goal),
            ],
            TransitionOnly,
        );
        assert_eq!(mem.matched_string_length(0), 1);
        assert_eq!(mem.matched_string_length(1), 0);
        assert_eq!(mem.max_matched_string_index(), Some(1));
    }

    #[test]
    fn falls_back_to_initial_episode() {
        let mem = memory(&[('a', NoTransition), ('b', TransitionOnly), ('b', Goal)], NoTransition);
        assert_eq!(mem.max_matched_string_index(), Some(0));
    }

    #[test]
    fn longest_match_wins() {
        // the tail "b->1, a->0" matches early on, "a->0" alone matches later
        let mem = memory(
            &[
                ('b', NoTransition),
                ('a', TransitionOnly),
                ('b', NoTransition),
                ('a', NoTransition),
                ('b', NoTransition),
                ('b', Goal),
                ('a', TransitionOnly),
            ],
            NoTransition,
        );
        assert_eq!(mem.matched_string_length(3), 1);
        assert_eq!(mem.matched_string_length(1), 2);
        assert_eq!(mem.max_matched_string_index(), Some(2));
    }

    #[test]
    fn most_recent_path_since_previous_goal() {
        let mut mem = memory(&[('a', NoTransition), ('b', TransitionOnly)], Goal);
        assert_eq!(mem.most_recent_path().to_string(), "ab");
        mem.issue('b');
        mem.observe(NoTransition, 1);
        mem.issue('a');
        mem.observe(Goal, 1);
        assert_eq!(mem.most_recent_path().to_string(), "ba");
    }

    #[test]
    fn relabel_aligns_at_the_end() {
        let mut mem = memory(&[('a', NoTransition), ('b', TransitionOnly)], Goal);
        mem.relabel_tail([4, 5]);
        let states: Vec<_> = mem.iter().map(|e| e.state).collect();
        assert_eq!(states, vec![1, 4, 5]);
    }
}
