use tracing::trace;

use crate::{
    alphabet::CharAlphabet,
    automaton::{HypothesisAutomaton, StateId, INIT_STATE},
    config::AgentConfig,
    environment::Environment,
    error::AgentError,
    hypothesis::ExplorationContext,
    memory::EpisodicMemory,
    path::Path,
    sensor::SensorEncoding,
    Show,
};

mod brute_force;
mod policy;
mod reorient;

/// Counters describing what an [`Agent`] did so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentStats {
    /// Number of times the agent had to get back to the goal, either by reorientation or by random walking.
    pub resets: usize,
    /// Number of times reorientation through memory replay failed and random walking took over.
    pub reorient_failures: usize,
    /// Number of merges of rows in the hypothesis automaton.
    pub merges: usize,
    /// Number of confirmed equivalence hypotheses.
    pub accepted: usize,
    /// Number of refuted equivalence hypotheses.
    pub rejected: usize,
    /// Number of states that were deleted because they could not be reached.
    pub pruned: usize,
}

/// An agent that acts on an [`Environment`] it knows nothing about except the alphabet, and learns from the two
/// sensor bits it gets back after every action.
///
/// It supports two modes of operation:
/// - [`Agent::map_state_machine`] builds a [`HypothesisAutomaton`] of the environment by exploring unknown
///   transitions and testing equivalence hypotheses.
/// - [`Agent::brute_force`] finds a path to the goal by random walking and then trims it symbol by symbol.
///
/// # Example
/// ```
/// use automata_explorer::prelude::*;
///
/// let machine = HiddenMachine::builder(CharAlphabet::of_size(2))
///     .with_transitions([(1, 'a', 2), (1, 'b', 1), (2, 'a', 2), (2, 'b', 0)])
///     .into_machine();
/// let mut agent = Agent::new(machine, AgentConfig::default().with_seed(1));
/// let best = agent.brute_force().unwrap();
/// assert_eq!(best.to_string(), "ab");
/// ```
#[derive(Debug, Clone)]
pub struct Agent<E> {
    env: E,
    alphabet: CharAlphabet,
    config: AgentConfig,
    rng: fastrand::Rng,
    memory: EpisodicMemory,
    automaton: HypothesisAutomaton,
    context: ExplorationContext,
    best: Option<Path>,
    candidate: Path,
    stats: AgentStats,
}

impl<E: Environment> Agent<E> {
    /// Creates an agent for `env`. Panics if the alphabet of `env` is empty.
    pub fn new(env: E, config: AgentConfig) -> Self {
        let alphabet = env.alphabet().clone();
        assert!(!alphabet.is_empty(), "cannot act with an empty alphabet");
        Self {
            rng: config.rng(),
            automaton: HypothesisAutomaton::new(alphabet.clone()),
            memory: EpisodicMemory::new(),
            context: ExplorationContext::new(),
            best: None,
            candidate: Path::default(),
            stats: AgentStats::default(),
            env,
            alphabet,
            config,
        }
    }

    /// The environment the agent acts on.
    pub fn environment(&self) -> &E {
        &self.env
    }

    /// Gives the environment back.
    pub fn into_environment(self) -> E {
        self.env
    }

    /// The configuration of the run.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Everything the agent did and observed so far.
    pub fn memory(&self) -> &EpisodicMemory {
        &self.memory
    }

    /// The learned model.
    pub fn automaton(&self) -> &HypothesisAutomaton {
        &self.automaton
    }

    /// Belief, plan, hypothesis and ledger of the current run.
    pub fn context(&self) -> &ExplorationContext {
        &self.context
    }

    /// The state the agent believes to be in.
    pub fn belief(&self) -> StateId {
        self.context.belief
    }

    /// The shortest path to the goal found so far.
    pub fn best(&self) -> Option<&Path> {
        self.best.as_ref()
    }

    /// The counters of the run.
    pub fn stats(&self) -> AgentStats {
        self.stats
    }

    /// The commands issued since the goal preceding the latest episode.
    pub fn most_recent_path(&self) -> Path {
        self.memory.most_recent_path()
    }

    fn ensure_below_ceiling(&self) -> Result<(), AgentError> {
        if self.memory.len() >= self.config.max_episodes {
            Err(AgentError::GrowthCeiling {
                limit: self.config.max_episodes,
            })
        } else {
            Ok(())
        }
    }

    /// Issues `symbol` without consulting or updating the hypothesis automaton and records the outcome with
    /// [`INIT_STATE`] as believed state. This is how brute force and reorientation act.
    fn act(&mut self, symbol: char) -> Result<SensorEncoding, AgentError> {
        if !self.alphabet.contains(symbol) {
            return Err(AgentError::UnknownSymbol(symbol));
        }
        self.ensure_below_ceiling()?;
        self.memory.issue(symbol);
        let sensor = self.env.tick(symbol).encode();
        self.memory.observe(sensor, INIT_STATE);
        trace!("acted {symbol} and sensed {}", sensor.show());
        Ok(sensor)
    }
}

impl<E: Environment> Show for Agent<E> {
    fn show(&self) -> String {
        self.automaton.show_with_belief(Some(self.context.belief))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        automaton::GOAL_STATE,
        environment::{HiddenMachine, HIDDEN_INIT},
        tests::ab_machine,
    };

    fn agent(seed: u64) -> Agent<HiddenMachine> {
        Agent::new(ab_machine(), AgentConfig::default().with_seed(seed))
    }

    #[test_log::test]
    fn reorientation_replays_remembered_suffix() {
        let mut agent = agent(0);
        assert!(agent.try_path(&Path::from("ab")).unwrap());
        assert!(!agent.try_path(&Path::from("a")).unwrap());

        let before = agent.memory().len();
        agent.smart_reset().unwrap();
        assert_eq!(agent.memory().len(), before + 1);
        let replayed = agent.memory().get(before - 1).unwrap();
        assert_eq!(replayed.command, Some('b'));
        assert!(agent.memory().last().is_goal());
        assert_eq!(agent.stats().reorient_failures, 0);
    }

    /// Runs "aba" to the goal and then "b", which loops in the initial state. Memory then suggests that 'a'
    /// leads to the goal, but it leads to state 2.
    fn misled_agent(config: AgentConfig) -> Agent<HiddenMachine> {
        let machine = HiddenMachine::builder(CharAlphabet::of_size(2))
            .with_transitions([(1, 'a', 2), (1, 'b', 1), (2, 'b', 2), (2, 'a', 0)])
            .into_machine();
        let mut agent = Agent::new(machine, config.with_seed(5));
        assert!(agent.try_path(&Path::from("aba")).unwrap());
        assert!(!agent.try_path(&Path::from("b")).unwrap());
        agent
    }

    #[test_log::test]
    fn reorientation_gives_up_on_divergence() {
        let mut agent = misled_agent(AgentConfig::default());
        let before = agent.memory().len();
        assert_eq!(agent.memory().max_matched_string_index(), Some(2));
        assert_eq!(agent.smart_reset_helper(), Ok(false));
        assert_eq!(agent.memory().len(), before + 1);
        assert_eq!(agent.memory().get(before - 1).unwrap().command, Some('a'));
        assert_eq!(agent.environment().state(), 2);

        let mut agent = misled_agent(AgentConfig::default().with_max_resets(0));
        agent.smart_reset().unwrap();
        assert!(agent.memory().last().is_goal());
        assert_eq!(agent.stats().resets, 1);
        assert_eq!(agent.stats().reorient_failures, 1);

        let mut agent = misled_agent(AgentConfig::default().with_reorientation(false));
        agent.smart_reset().unwrap();
        assert!(agent.memory().last().is_goal());
        assert_eq!(agent.stats().resets, 1);
        assert_eq!(agent.stats().reorient_failures, 0);

        let mut agent = misled_agent(AgentConfig::default());
        agent.smart_reset().unwrap();
        assert!(agent.memory().last().is_goal());
        assert_eq!(agent.stats().reorient_failures, 1);
        assert_eq!(agent.into_environment().state(), HIDDEN_INIT);
    }

    #[test_log::test]
    fn trimming_keeps_necessary_symbols() {
        let mut agent = agent(1);
        assert!(agent.try_path(&Path::from("ab")).unwrap());
        let trimmed = agent.trim_path(&Path::from("ab")).unwrap();
        assert_eq!(trimmed.to_string(), "ab");
    }

    #[test_log::test]
    fn trimming_removes_detours() {
        let mut agent = agent(2);
        let detour = Path::from("bbaab");
        assert!(agent.try_path(&detour).unwrap());
        let trimmed = agent.trim_path(&detour).unwrap();
        assert_eq!(trimmed.to_string(), "ab");
        assert_eq!(detour.len(), 5);
    }

    #[test_log::test]
    fn brute_force_finds_the_shortest_path() {
        for seed in 0..5 {
            let mut agent = agent(seed);
            let best = agent.brute_force().unwrap();
            assert_eq!(best.len(), 2);
            assert_eq!(agent.best(), Some(&best));
            assert!(agent.stats().resets >= 1);
            assert_eq!(agent.into_environment().state(), HIDDEN_INIT);
        }
    }

    #[test_log::test]
    fn mapping_the_running_example() {
        for seed in 0..5 {
            let mut agent = agent(seed);
            agent.map_state_machine().unwrap();
            let automaton = agent.automaton();
            assert!(automaton.mapping_complete());
            assert!(automaton.is_active(GOAL_STATE));
            assert!(automaton.row(GOAL_STATE).unwrap().is_all_goal());
            assert!(agent.best().unwrap().len() >= 2);
            assert!(agent.stats().accepted >= 1);
            trace!("mapped with seed {seed}\n{}", agent.show());
        }
    }

    #[cfg(feature = "random")]
    #[test_log::test]
    fn mapping_random_machines() {
        use crate::random::generate_random_machine;

        let mut rng = fastrand::Rng::with_seed(42);
        let mut completed = 0;
        for seed in 0..8 {
            let machine = generate_random_machine(3, 2, &mut rng);
            let shortest = machine.shortest_distance_to_goal().unwrap();
            let config = AgentConfig::default()
                .with_seed(seed)
                .with_max_episodes(50_000);
            let mut agent = Agent::new(machine, config);
            match agent.map_state_machine() {
                Ok(()) => {
                    completed += 1;
                    assert!(agent.automaton().mapping_complete());
                }
                Err(err) => assert_eq!(err, AgentError::GrowthCeiling { limit: 50_000 }),
            }
            if let Some(best) = agent.best() {
                assert!(best.len() >= shortest);
            }
        }
        assert!(completed > 0);
    }

    #[test_log::test]
    fn growth_ceiling_ends_the_run() {
        // the goal cannot be reached, so the agent acts randomly forever
        let machine = HiddenMachine::builder(CharAlphabet::of_size(2))
            .with_transitions([(1, 'a', 2), (2, 'b', 1)])
            .into_machine();
        let mut agent = Agent::new(machine, AgentConfig::default().with_seed(3).with_max_episodes(50));
        assert_eq!(
            agent.map_state_machine(),
            Err(AgentError::GrowthCeiling { limit: 50 })
        );
        assert_eq!(agent.memory().len(), 50);
        assert_eq!(agent.reset(), Err(AgentError::GrowthCeiling { limit: 50 }));
    }

    #[test]
    fn unknown_symbols_are_refused() {
        let mut agent = agent(4);
        assert_eq!(agent.make_move('z'), Err(AgentError::UnknownSymbol('z')));
        assert_eq!(
            agent.try_path(&Path::from("az")),
            Err(AgentError::UnknownSymbol('z'))
        );
    }
}
