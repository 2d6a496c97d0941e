use thiserror::Error;

use crate::automaton::StateId;

/// Errors that end an agent run. Planning failures and diverging plans are not among them, the agent recovers
/// from those on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AgentError {
    /// Episodic memory reached the configured number of episodes.
    #[error("growth ceiling of {limit} episodes reached")]
    GrowthCeiling {
        /// The configured ceiling.
        limit: usize,
    },
    /// The believed state has no active row in the hypothesis automaton.
    #[error("believed state {0} does not exist in the hypothesis automaton")]
    InconsistentBelief(StateId),
    /// A symbol was issued that the environment does not know.
    #[error("symbol `{0}` is not part of the alphabet")]
    UnknownSymbol(char),
}
