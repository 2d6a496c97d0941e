//! Library for inferring the structure of an unknown deterministic finite-state environment by acting on it.
//!
//! An [`Agent`](agent::Agent) only sees two sensor bits per action: whether the action moved the hidden machine
//! into a different state and whether it reached the distinguished goal state. From this feedback it grows a
//! [`HypothesisAutomaton`](automaton::HypothesisAutomaton), a partial and mutable transition table whose rows are
//! the states the agent believes to exist. Every unknown transition that is taken allocates a fresh state, so the
//! table starts out as an unrolling of the interaction history. It is folded back into a small automaton by
//! testing equivalence hypotheses: whenever the tail of the [`EpisodicMemory`](memory::EpisodicMemory) matches an
//! earlier stretch of history, the agent conjectures that the state it is in now is the state it was in back then,
//! plans a path from the earlier state to the goal with the backward [planner](planner::plan_path) and executes
//! it. Reaching the goal as predicted accepts the conjecture and merges the two rows, followed by a sweep that
//! merges every other pair of rows which became compatible. A failed experiment records the pair as
//! non-equivalent.
//!
//! Besides mapping, the agent implements a brute-force mode which finds some path to the goal by random walking
//! and trims it down symbol by symbol, using memory replay ([reorientation](agent::Agent::smart_reset)) to get
//! back to the goal after a failed attempt.
//!
//! The environment is abstracted by the [`Environment`](environment::Environment) trait, and
//! [`HiddenMachine`](environment::HiddenMachine) is a reference implementation backed by an explicit transition
//! table.
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use automata_explorer::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        agent::{Agent, AgentStats},
        alphabet::CharAlphabet,
        automaton::{HypothesisAutomaton, Recorded, StateId, TransitionRow, GOAL_STATE, INIT_STATE},
        config::AgentConfig,
        environment::{Environment, HiddenMachine},
        error::AgentError,
        hypothesis::{EquivalenceLedger, ExplorationContext, Hypothesis, Phase, StatePair, Verdict},
        memory::{Episode, EpisodicMemory},
        path::Path,
        planner::{plan_path, Plan, PlanDivergence, PlanError},
        sensor::{SensorEncoding, SensorReading},
        Set, Show,
    };
}

/// Module that contains the definition of the alphabet an environment is driven with.
pub mod alphabet;

/// Raw sensor bits and their three-way encoding.
pub mod sensor;

/// Episodic memory, the append-only log of everything the agent did and observed.
pub mod memory;

/// The hypothesis automaton, i.e. the agent's partial model of the environment.
pub mod automaton;

/// Backward breadth-first planning over the hypothesis automaton.
pub mod planner;

/// Equivalence hypotheses and the per-run exploration context that tracks them.
pub mod hypothesis;

/// The interface to the environment and a table-backed reference implementation.
pub mod environment;

/// Implements the generation of random hidden machines. This is feature gated behind the `random` feature.
#[cfg(feature = "random")]
pub mod random;

/// A thin container for sequences of symbols.
pub mod path;

/// Configuration of an agent run.
pub mod config;

/// Errors that end or disturb an agent run.
pub mod error;

/// The agent, which drives exploration, planning, reorientation and hypothesis testing.
pub mod agent;

/// Helper trait which can be used to display states, transitions and such.
pub trait Show {
    /// Returns a human readable representation of `self`, for a state index that should be
    /// for example 0, 1, 2, ... and for a plan it is the sequence of expected episodes.
    /// This is mainly used for debugging purposes.
    fn show(&self) -> String;
}

impl Show for usize {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Show for char {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Show for String {
    fn show(&self) -> String {
        self.clone()
    }
}

impl Show for Option<usize> {
    fn show(&self) -> String {
        match self {
            None => "?".to_string(),
            Some(x) => x.show(),
        }
    }
}

impl Show for Option<char> {
    fn show(&self) -> String {
        match self {
            None => "_".to_string(),
            Some(c) => c.show(),
        }
    }
}

impl<S: Show> Show for [S] {
    fn show(&self) -> String {
        format!(
            "\"{}\"",
            itertools::Itertools::join(&mut self.iter().map(|x| x.show()), "")
        )
    }
}

impl<S: Show> Show for Vec<S> {
    fn show(&self) -> String {
        self.as_slice().show()
    }
}

impl<S: Show, T: Show> Show for (S, T) {
    fn show(&self) -> String {
        format!("({}, {})", self.0.show(), self.1.show())
    }
}

impl<S: Show> Show for &S {
    fn show(&self) -> String {
        S::show(*self)
    }
}

/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
pub type Set<S> = fxhash::FxHashSet<S>;
