use itertools::Itertools;
use tracing::{trace, warn};

use crate::{alphabet::CharAlphabet, sensor::SensorReading, Show};

/// The world an agent acts in. Environments are deterministic: given the same sequence of symbols they answer
/// with the same sequence of readings.
pub trait Environment {
    /// The symbols the environment understands, in a fixed order.
    fn alphabet(&self) -> &CharAlphabet;

    /// Executes one action and reports the raw sensor bits.
    fn tick(&mut self, symbol: char) -> SensorReading;
}

impl<E: Environment + ?Sized> Environment for &mut E {
    fn alphabet(&self) -> &CharAlphabet {
        E::alphabet(self)
    }

    fn tick(&mut self, symbol: char) -> SensorReading {
        E::tick(self, symbol)
    }
}

/// Index of the goal state of a [`HiddenMachine`].
pub const HIDDEN_GOAL: usize = 0;
/// Index of the state a [`HiddenMachine`] starts in and returns to after reaching the goal.
pub const HIDDEN_INIT: usize = 1;

/// A deterministic finite state machine given by an explicit transition table. State 0 is the goal and state 1
/// the initial state. Entering the goal is reported through [`SensorReading::is_goal`], after which the machine
/// is back in its initial state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiddenMachine {
    alphabet: CharAlphabet,
    transitions: Vec<Vec<usize>>,
    state: usize,
}

/// Collects `(source, symbol, target)` triples for the construction of a [`HiddenMachine`].
///
/// # Example
/// ```
/// use automata_explorer::prelude::*;
///
/// let mut machine = HiddenMachine::builder(CharAlphabet::of_size(2))
///     .with_transitions([(1, 'a', 2), (1, 'b', 1), (2, 'a', 2), (2, 'b', 0)])
///     .into_machine();
/// assert!(machine.tick('a').is_new_state);
/// assert!(machine.tick('b').is_goal);
/// ```
#[derive(Debug, Clone)]
pub struct HiddenMachineBuilder {
    alphabet: CharAlphabet,
    edges: Vec<(usize, char, usize)>,
}

impl HiddenMachineBuilder {
    /// Adds a single transition.
    pub fn with_transition(mut self, source: usize, symbol: char, target: usize) -> Self {
        self.edges.push((source, symbol, target));
        self
    }

    /// Adds a list of transitions.
    pub fn with_transitions<I>(mut self, edges: I) -> Self
    where
        I: IntoIterator<Item = (usize, char, usize)>,
    {
        self.edges.extend(edges);
        self
    }

    /// Builds the machine. It has as many states as the largest index mentioned plus one, but at least the
    /// goal and the initial state. Transitions that were not given are self-loops, later triples overwrite
    /// earlier ones.
    pub fn into_machine(self) -> HiddenMachine {
        let states = self
            .edges
            .iter()
            .flat_map(|(p, _, q)| [*p, *q])
            .max()
            .map_or(2, |max| (max + 1).max(2));
        let mut transitions = (0..states)
            .map(|q| vec![q; self.alphabet.size()])
            .collect_vec();
        for (source, symbol, target) in self.edges {
            match self.alphabet.position(symbol) {
                Some(pos) => transitions[source][pos] = target,
                None => warn!("ignoring transition on symbol {symbol} outside of the alphabet"),
            }
        }
        HiddenMachine {
            alphabet: self.alphabet,
            transitions,
            state: HIDDEN_INIT,
        }
    }
}

impl HiddenMachine {
    /// Starts building a machine over `alphabet`.
    pub fn builder(alphabet: CharAlphabet) -> HiddenMachineBuilder {
        HiddenMachineBuilder {
            alphabet,
            edges: vec![],
        }
    }

    /// Number of states, the goal included.
    pub fn size(&self) -> usize {
        self.transitions.len()
    }

    /// The state the machine is in.
    pub fn state(&self) -> usize {
        self.state
    }

    /// The successor of `state` on `symbol`.
    pub fn successor(&self, state: usize, symbol: char) -> Option<usize> {
        let pos = self.alphabet.position(symbol)?;
        self.transitions.get(state)?.get(pos).copied()
    }

    /// Puts the machine back into the initial state.
    pub fn reset(&mut self) {
        self.state = HIDDEN_INIT;
    }

    /// Computes the length of a shortest word leading from the initial state to the goal.
    pub fn shortest_distance_to_goal(&self) -> Option<usize> {
        let mut distance = vec![None; self.size()];
        distance[HIDDEN_INIT] = Some(0);
        let mut queue = std::collections::VecDeque::from([HIDDEN_INIT]);
        while let Some(q) = queue.pop_front() {
            let d = distance[q]?;
            for &p in &self.transitions[q] {
                if p == HIDDEN_GOAL {
                    return Some(d + 1);
                }
                if distance[p].is_none() {
                    distance[p] = Some(d + 1);
                    queue.push_back(p);
                }
            }
        }
        None
    }
}

impl Environment for HiddenMachine {
    fn alphabet(&self) -> &CharAlphabet {
        &self.alphabet
    }

    fn tick(&mut self, symbol: char) -> SensorReading {
        let Some(next) = self.successor(self.state, symbol) else {
            warn!("symbol {symbol} is not understood, nothing happens");
            return SensorReading::default();
        };
        let reading = SensorReading::new(next != self.state, next == HIDDEN_GOAL);
        trace!("hidden {} -{symbol}-> {next}", self.state);
        self.state = if reading.is_goal { HIDDEN_INIT } else { next };
        reading
    }
}

impl Show for HiddenMachine {
    fn show(&self) -> String {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            std::iter::once("Hidden".to_string()).chain(self.alphabet.universe().map(|s| s.show())),
        );
        for (q, row) in self.transitions.iter().enumerate().skip(1) {
            builder.push_record(std::iter::once(q.show()).chain(row.iter().map(|p| p.show())));
        }
        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_teleports_back() {
        let mut machine = crate::tests::ab_machine();
        assert_eq!(machine.size(), 3);
        assert_eq!(machine.tick('b'), SensorReading::new(false, false));
        assert_eq!(machine.tick('a'), SensorReading::new(true, false));
        assert_eq!(machine.tick('a'), SensorReading::new(false, false));
        assert_eq!(machine.tick('b'), SensorReading::new(true, true));
        assert_eq!(machine.state(), HIDDEN_INIT);
        assert_eq!(machine.shortest_distance_to_goal(), Some(2));
    }

    #[test]
    fn missing_transitions_are_loops() {
        let mut machine = HiddenMachine::builder(CharAlphabet::of_size(2))
            .with_transition(1, 'a', 3)
            .into_machine();
        assert_eq!(machine.size(), 4);
        assert_eq!(machine.successor(3, 'b'), Some(3));
        assert!(machine.tick('a').is_new_state);
        assert_eq!(machine.tick('z'), SensorReading::default());
        machine.reset();
        assert_eq!(machine.state(), HIDDEN_INIT);
        assert_eq!(machine.shortest_distance_to_goal(), None);
    }
}
